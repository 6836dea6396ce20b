//! Order business logic - The buyer/seller workflow in front of a shipment.
//!
//! ```text
//! PENDING ──approve──▶ APPROVED ──ship──▶ SHIPPED ──receive──▶ DELIVERED
//!    │                    │
//!    └──────reject────────┴──▶ REJECTED
//! ```
//!
//! `DELIVERED` and `REJECTED` are terminal. Delivery happens when the buyer
//! receives the order's shipment, see `core::shipment::receive_shipment`.

use crate::{
    context::RequestContext,
    core::{
        batch as batch_core, party,
        shipment::{self, LineItem, ShipmentDetails},
    },
    entities::{
        Order, OrderItem,
        order::{self, OrderStatus},
        order_item,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// An order with its items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    /// The order row
    pub order: order::Model,
    /// Its items in insertion order
    pub items: Vec<order_item::Model>,
}

/// Whether an order may move from `from` to `to`.
#[must_use]
pub const fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(
        (from, to),
        (OrderStatus::Pending, OrderStatus::Approved)
            | (
                OrderStatus::Pending | OrderStatus::Approved,
                OrderStatus::Rejected
            )
            | (OrderStatus::Approved, OrderStatus::Shipped)
            | (OrderStatus::Shipped, OrderStatus::Delivered)
    )
}

fn ensure_transition(from: OrderStatus, to: OrderStatus) -> Result<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            entity: "Order",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

async fn set_status<C>(db: &C, order: order::Model, to: OrderStatus) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    ensure_transition(order.status, to)?;

    let mut active: order::ActiveModel = order.into();
    active.status = Set(to);
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    info!("Order {} is now {}", updated.id, updated.status);
    Ok(updated)
}

/// Places an order from the caller to `seller_id`.
///
/// Items are priced at each batch's wholesale price per unit. Stock is not
/// reserved; it is checked when the seller ships.
#[allow(clippy::cast_precision_loss)]
#[instrument(skip(db))]
pub async fn place_order(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    seller_id: i64,
    lines: Vec<LineItem>,
) -> Result<OrderDetails> {
    shipment::validate_lines(&lines)?;

    let txn = db.begin().await?;

    let buyer = party::require_party(&txn, ctx.party_id).await?;
    ctx.require_role(buyer.role)?;
    let seller = party::require_party(&txn, seller_id).await?;
    shipment::ensure_downstream(&seller, &buyer)?;

    let mut priced = Vec::with_capacity(lines.len());
    let mut total_amount = 0.0;
    for line in &lines {
        let batch = batch_core::require_batch(&txn, line.batch_id).await?;
        batch_core::ensure_not_recalled(&batch)?;
        total_amount += batch.price_per_unit * line.quantity as f64;
        priced.push((line, batch.price_per_unit));
    }

    let now = Utc::now();
    let order = order::ActiveModel {
        buyer_id: Set(buyer.id),
        seller_id: Set(seller.id),
        status: Set(OrderStatus::Pending),
        total_amount: Set(total_amount),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(priced.len());
    for (line, unit_price) in priced {
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            batch_id: Set(line.batch_id),
            quantity: Set(line.quantity),
            unit_price: Set(unit_price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    info!(
        "{} placed order {} with {} for {:.2}",
        buyer.name, order.id, seller.name, order.total_amount
    );
    Ok(OrderDetails { order, items })
}

/// Approves a pending order. Seller only.
#[instrument(skip(db))]
pub async fn approve_order(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    order_id: i64,
) -> Result<order::Model> {
    let order = require_order(db, order_id).await?;
    ctx.require_party(order.seller_id, "seller of this order")?;
    set_status(db, order, OrderStatus::Approved).await
}

/// Rejects a pending or approved order. Seller only.
#[instrument(skip(db))]
pub async fn reject_order(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    order_id: i64,
) -> Result<order::Model> {
    let order = require_order(db, order_id).await?;
    ctx.require_party(order.seller_id, "seller of this order")?;
    set_status(db, order, OrderStatus::Rejected).await
}

/// Ships an approved order: dispatches all of its items to the buyer in one
/// shipment linked to the order.
#[instrument(skip(db))]
pub async fn ship_order(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    order_id: i64,
    location: Option<String>,
) -> Result<ShipmentDetails> {
    let txn = db.begin().await?;

    let order = require_order(&txn, order_id).await?;
    ctx.require_party(order.seller_id, "seller of this order")?;
    ensure_transition(order.status, OrderStatus::Shipped)?;

    let seller = party::require_party(&txn, order.seller_id).await?;
    let buyer = party::require_party(&txn, order.buyer_id).await?;
    let lines: Vec<LineItem> = order_items(&txn, order.id)
        .await?
        .into_iter()
        .map(|item| LineItem {
            batch_id: item.batch_id,
            quantity: item.quantity,
        })
        .collect();

    let details =
        shipment::dispatch_lines(&txn, &seller, &buyer, Some(order.id), &lines, location).await?;
    set_status(&txn, order, OrderStatus::Shipped).await?;

    txn.commit().await?;
    Ok(details)
}

/// Marks a shipped order delivered. Called when its shipment is received.
pub(crate) async fn mark_delivered<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let order = require_order(db, order_id).await?;
    set_status(db, order, OrderStatus::Delivered).await
}

/// Finds an order by id, failing with `NotFound` if it does not exist.
pub async fn require_order<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))
}

/// An order together with its items.
pub async fn get_order<C>(db: &C, order_id: i64) -> Result<OrderDetails>
where
    C: ConnectionTrait,
{
    let order = require_order(db, order_id).await?;
    let items = order_items(db, order.id).await?;
    Ok(OrderDetails { order, items })
}

/// Items of an order in insertion order.
pub async fn order_items<C>(db: &C, order_id: i64) -> Result<Vec<order_item::Model>>
where
    C: ConnectionTrait,
{
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Orders a party placed, newest first.
pub async fn list_orders_for_buyer<C>(db: &C, buyer_id: i64) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::BuyerId.eq(buyer_id))
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Orders addressed to a seller, newest first.
pub async fn list_orders_for_seller<C>(db: &C, seller_id: i64) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::SellerId.eq(seller_id))
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{inventory, invoice};
    use crate::entities::shipment::ShipmentStatus;
    use crate::test_utils::*;
    use sea_orm::Iterable;

    fn line(batch_id: i64, quantity: i64) -> Vec<LineItem> {
        vec![LineItem { batch_id, quantity }]
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::{Approved, Delivered, Pending, Rejected, Shipped};

        let allowed = [
            (Pending, Approved),
            (Pending, Rejected),
            (Approved, Rejected),
            (Approved, Shipped),
            (Shipped, Delivered),
        ];
        for from in OrderStatus::iter() {
            for to in OrderStatus::iter() {
                assert_eq!(
                    can_transition(from, to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_order_lifecycle_issues_invoice() -> Result<()> {
        let (db, manufacturer, distributor, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-ORD", 50).await?;

        let placed =
            place_order(&db, &ctx_for(&distributor), manufacturer.id, line(batch.id, 20)).await?;
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.total_amount, 20.0 * batch.price_per_unit);
        assert_eq!(placed.items[0].unit_price, batch.price_per_unit);

        let approved = approve_order(&db, &ctx_for(&manufacturer), placed.order.id).await?;
        assert_eq!(approved.status, OrderStatus::Approved);

        let shipped = ship_order(&db, &ctx_for(&manufacturer), placed.order.id, None).await?;
        assert_eq!(shipped.shipment.order_id, Some(placed.order.id));
        assert_eq!(
            require_order(&db, placed.order.id).await?.status,
            OrderStatus::Shipped
        );

        let receipt =
            shipment::receive_shipment(&db, &ctx_for(&distributor), shipped.shipment.id).await?;
        assert_eq!(receipt.shipment.status, ShipmentStatus::Delivered);
        let issued = receipt.invoice.unwrap();
        assert_eq!(issued.order_id, placed.order.id);
        assert_eq!(issued.amount, placed.order.total_amount);
        assert!(issued.invoice_number.starts_with("INV-"));
        assert!(issued.invoice_number.ends_with(&format!("{:06}", placed.order.id)));

        assert_eq!(
            require_order(&db, placed.order.id).await?.status,
            OrderStatus::Delivered
        );
        assert_eq!(
            inventory::get_inventory(&db, distributor.id, batch.id)
                .await?
                .unwrap()
                .current_stock,
            20
        );
        let details = get_order(&db, placed.order.id).await?;
        assert_eq!(details.order.status, OrderStatus::Delivered);
        assert_eq!(details.items, placed.items);

        let found =
            invoice::require_invoice_by_number(&db, &format!(" {} ", issued.invoice_number))
                .await?;
        assert_eq!(found, issued);
        assert_eq!(
            invoice::list_invoices_for_party(&db, manufacturer.id).await?,
            vec![issued]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_only_seller_moves_the_order() -> Result<()> {
        let (db, manufacturer, distributor, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-SELLER", 5).await?;
        let placed =
            place_order(&db, &ctx_for(&distributor), manufacturer.id, line(batch.id, 1)).await?;

        let result = approve_order(&db, &ctx_for(&distributor), placed.order.id).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized { .. }));
        let result = ship_order(&db, &ctx_for(&distributor), placed.order.id, None).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_transitions_rejected() -> Result<()> {
        let (db, manufacturer, distributor, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-FSM", 5).await?;
        let seller = ctx_for(&manufacturer);
        let placed =
            place_order(&db, &ctx_for(&distributor), manufacturer.id, line(batch.id, 1)).await?;

        // Cannot ship before approval
        let result = ship_order(&db, &seller, placed.order.id, None).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidTransition { .. }));
        assert_eq!(batch_core::require_batch(&db, batch.id).await?.current_stock, 5);

        reject_order(&db, &seller, placed.order.id).await?;
        let result = approve_order(&db, &seller, placed.order.id).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidTransition { .. }));

        let second =
            place_order(&db, &ctx_for(&distributor), manufacturer.id, line(batch.id, 1)).await?;
        approve_order(&db, &seller, second.order.id).await?;
        ship_order(&db, &seller, second.order.id, None).await?;
        let result = reject_order(&db, &seller, second.order.id).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidTransition { .. }));

        assert_eq!(list_orders_for_buyer(&db, distributor.id).await?.len(), 2);
        assert_eq!(list_orders_for_seller(&db, manufacturer.id).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_validation() -> Result<()> {
        let (db, manufacturer, distributor, retailer) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-PLACE", 5).await?;

        let result = place_order(&db, &ctx_for(&distributor), manufacturer.id, vec![]).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        // Orders go upstream: a distributor cannot order from a retailer
        let result =
            place_order(&db, &ctx_for(&distributor), retailer.id, line(batch.id, 1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = place_order(&db, &ctx_for(&distributor), manufacturer.id, line(999, 1)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound { entity: "Batch", .. }
        ));

        recall_test_batch(&db, &manufacturer, batch.id).await?;
        let result =
            place_order(&db, &ctx_for(&distributor), manufacturer.id, line(batch.id, 1)).await;
        assert!(matches!(result.unwrap_err(), Error::BatchRecalled { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_ship_order_needs_seller_stock() -> Result<()> {
        let (db, manufacturer, distributor, retailer) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-EMPTY", 5).await?;
        ship_and_receive(&db, &manufacturer, &distributor, batch.id, 2).await?;

        let placed =
            place_order(&db, &ctx_for(&retailer), distributor.id, line(batch.id, 3)).await?;
        approve_order(&db, &ctx_for(&distributor), placed.order.id).await?;

        let result = ship_order(&db, &ctx_for(&distributor), placed.order.id, None).await;
        assert!(matches!(result.unwrap_err(), Error::InsufficientStock { .. }));
        assert_eq!(
            require_order(&db, placed.order.id).await?.status,
            OrderStatus::Approved
        );

        Ok(())
    }
}
