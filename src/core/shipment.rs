//! Shipment business logic - Moving stock between holders.
//!
//! Dispatch takes stock away from the sender at once: inventory is withdrawn,
//! units go `IN_TRANSIT` addressed to the receiver and a movement is recorded.
//! The receiver's inventory only grows when the receiver confirms delivery.

use crate::{
    context::RequestContext,
    core::{batch as batch_core, inventory, invoice, movement, order, party, unit},
    entities::{
        Shipment, ShipmentItem, invoice as invoice_entity,
        movement::MovementRole,
        party as party_entity,
        shipment::{self, ShipmentStatus},
        shipment_item,
        unit::UnitStatus,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// One batch and quantity in an order or shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Batch the line draws from
    pub batch_id: i64,
    /// Strips on the line
    pub quantity: i64,
}

/// A shipment with its items.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentDetails {
    /// The shipment row
    pub shipment: shipment::Model,
    /// Its items in insertion order
    pub items: Vec<shipment_item::Model>,
}

/// Result of confirming a delivery.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptOutcome {
    /// The delivered shipment
    pub shipment: shipment::Model,
    /// Issued when the shipment fulfilled an order
    pub invoice: Option<invoice_entity::Model>,
}

/// Checks that a list of lines is non-empty and every quantity is positive.
pub(crate) fn validate_lines(lines: &[LineItem]) -> Result<()> {
    if lines.is_empty() {
        return Err(Error::validation("At least one item is required"));
    }
    if let Some(line) = lines.iter().find(|line| line.quantity <= 0) {
        return Err(Error::validation(format!(
            "Quantity for batch {} must be positive, got {}",
            line.batch_id, line.quantity
        )));
    }
    Ok(())
}

/// Fails unless stock may flow from `sender` to `receiver`.
pub(crate) fn ensure_downstream(
    sender: &party_entity::Model,
    receiver: &party_entity::Model,
) -> Result<()> {
    if sender.role.supplies(receiver.role) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "{} ({}) cannot supply {} ({})",
            sender.name, sender.role, receiver.name, receiver.role
        )))
    }
}

/// Creates an `IN_TRANSIT` shipment and withdraws every line from the sender.
///
/// Runs inside the caller's transaction; any failing line aborts the whole
/// dispatch when the caller drops the transaction.
pub(crate) async fn dispatch_lines<C>(
    db: &C,
    sender: &party_entity::Model,
    receiver: &party_entity::Model,
    order_id: Option<i64>,
    lines: &[LineItem],
    location: Option<String>,
) -> Result<ShipmentDetails>
where
    C: ConnectionTrait,
{
    validate_lines(lines)?;
    ensure_downstream(sender, receiver)?;

    let location = location.or_else(|| sender.location.clone());

    let shipment = shipment::ActiveModel {
        order_id: Set(order_id),
        sender_id: Set(sender.id),
        receiver_id: Set(receiver.id),
        status: Set(ShipmentStatus::InTransit),
        location: Set(location.clone()),
        dispatched_at: Set(Utc::now()),
        delivered_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let batch = batch_core::require_batch(db, line.batch_id).await?;
        batch_core::ensure_not_recalled(&batch)?;

        inventory::withdraw_stock(db, sender.id, &batch, line.quantity).await?;

        let item = shipment_item::ActiveModel {
            shipment_id: Set(shipment.id),
            batch_id: Set(batch.id),
            quantity: Set(line.quantity),
            ..Default::default()
        }
        .insert(db)
        .await?;

        unit::move_units(
            db,
            unit::UnitMove {
                batch_id: batch.id,
                from_holder_id: sender.id,
                from_statuses: &UnitStatus::ON_HAND,
                from_shipment_id: None,
                to_holder_id: Some(receiver.id),
                to_status: UnitStatus::InTransit,
                shipment_id: Some(shipment.id),
                quantity: line.quantity,
            },
        )
        .await?;

        movement::record_movement(
            db,
            movement::NewMovement {
                batch_id: batch.id,
                sender_id: Some(sender.id),
                sender_name: Some(sender.name.clone()),
                receiver_id: Some(receiver.id),
                receiver_name: Some(receiver.name.clone()),
                role: MovementRole::from(receiver.role),
                quantity: line.quantity,
                status: movement::STATUS_IN_TRANSIT.to_string(),
                location: location.clone(),
            },
        )
        .await?;

        items.push(item);
    }

    info!(
        "Shipment {} dispatched from {} to {} with {} item(s)",
        shipment.id,
        sender.name,
        receiver.name,
        items.len()
    );
    Ok(ShipmentDetails { shipment, items })
}

/// Dispatches stock from the caller directly to `receiver_id`, without an order.
///
/// # Errors
/// * `Validation` - empty lines, non-positive quantity or upstream receiver
/// * `BatchRecalled` - a line's batch is under recall
/// * `InsufficientStock` - the caller holds less than a line asks for
#[instrument(skip(db))]
pub async fn dispatch_shipment(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    receiver_id: i64,
    lines: Vec<LineItem>,
    location: Option<String>,
) -> Result<ShipmentDetails> {
    validate_lines(&lines)?;

    let txn = db.begin().await?;

    let sender = party::require_party(&txn, ctx.party_id).await?;
    ctx.require_role(sender.role)?;
    let receiver = party::require_party(&txn, receiver_id).await?;

    let details = dispatch_lines(&txn, &sender, &receiver, None, &lines, location).await?;

    txn.commit().await?;
    Ok(details)
}

/// Confirms delivery of an in-transit shipment. Only the receiver may do this.
///
/// Stock is credited to the receiver, its units land on the receiver's shelf
/// and, for order shipments, the order is delivered and invoiced.
#[instrument(skip(db))]
pub async fn receive_shipment(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    shipment_id: i64,
) -> Result<ReceiptOutcome> {
    let txn = db.begin().await?;

    let shipment = require_shipment(&txn, shipment_id).await?;
    ctx.require_party(shipment.receiver_id, "receiver of this shipment")?;
    if shipment.status != ShipmentStatus::InTransit {
        return Err(Error::InvalidTransition {
            entity: "Shipment",
            from: shipment.status.to_string(),
            to: ShipmentStatus::Delivered.to_string(),
        });
    }

    let receiver = party::require_party(&txn, shipment.receiver_id).await?;
    let shelf_status = unit::status_for_holder(receiver.role);

    for item in shipment_items(&txn, shipment.id).await? {
        inventory::increment(&txn, receiver.id, item.batch_id, item.quantity).await?;
        unit::move_units(
            &txn,
            unit::UnitMove {
                batch_id: item.batch_id,
                from_holder_id: receiver.id,
                from_statuses: &[UnitStatus::InTransit],
                from_shipment_id: Some(shipment.id),
                to_holder_id: Some(receiver.id),
                to_status: shelf_status,
                shipment_id: None,
                quantity: item.quantity,
            },
        )
        .await?;
    }

    let order_id = shipment.order_id;
    let mut active: shipment::ActiveModel = shipment.into();
    active.status = Set(ShipmentStatus::Delivered);
    active.delivered_at = Set(Some(Utc::now()));
    let shipment = active.update(&txn).await?;

    let invoice = match order_id {
        Some(order_id) => {
            let delivered = order::mark_delivered(&txn, order_id).await?;
            Some(invoice::issue_invoice(&txn, &delivered).await?)
        }
        None => None,
    };

    txn.commit().await?;

    info!("Shipment {} delivered to {}", shipment.id, receiver.name);
    Ok(ReceiptOutcome { shipment, invoice })
}

/// Finds a shipment by id, failing with `NotFound` if it does not exist.
pub async fn require_shipment<C>(db: &C, shipment_id: i64) -> Result<shipment::Model>
where
    C: ConnectionTrait,
{
    Shipment::find_by_id(shipment_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Shipment", shipment_id))
}

/// A shipment together with its items.
pub async fn get_shipment<C>(db: &C, shipment_id: i64) -> Result<ShipmentDetails>
where
    C: ConnectionTrait,
{
    let shipment = require_shipment(db, shipment_id).await?;
    let items = shipment_items(db, shipment.id).await?;
    Ok(ShipmentDetails { shipment, items })
}

/// Items of a shipment in insertion order.
pub async fn shipment_items<C>(db: &C, shipment_id: i64) -> Result<Vec<shipment_item::Model>>
where
    C: ConnectionTrait,
{
    ShipmentItem::find()
        .filter(shipment_item::Column::ShipmentId.eq(shipment_id))
        .order_by_asc(shipment_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Shipments addressed to a receiver, newest first, optionally by status.
pub async fn list_incoming_shipments<C>(
    db: &C,
    receiver_id: i64,
    status: Option<ShipmentStatus>,
) -> Result<Vec<shipment::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Shipment::find().filter(shipment::Column::ReceiverId.eq(receiver_id));
    if let Some(status) = status {
        query = query.filter(shipment::Column::Status.eq(status));
    }
    query
        .order_by_desc(shipment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Shipments a sender dispatched, newest first.
pub async fn list_outgoing_shipments<C>(db: &C, sender_id: i64) -> Result<Vec<shipment::Model>>
where
    C: ConnectionTrait,
{
    Shipment::find()
        .filter(shipment::Column::SenderId.eq(sender_id))
        .order_by_desc(shipment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::recall;
    use crate::core::unit::{count_units_with_status, units_for_batch, unit_history};
    use crate::entities::{Movement, party::PartyRole};
    use crate::test_utils::*;

    fn line(batch_id: i64, quantity: i64) -> Vec<LineItem> {
        vec![LineItem { batch_id, quantity }]
    }

    #[test]
    fn test_validate_lines() {
        assert!(validate_lines(&[]).is_err());
        assert!(validate_lines(&line(1, 0)).is_err());
        assert!(validate_lines(&line(1, -3)).is_err());
        assert!(validate_lines(&line(1, 3)).is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_moves_stock_into_transit() -> Result<()> {
        let (db, manufacturer, distributor, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-SHIP", 100).await?;

        let details = dispatch_shipment(
            &db,
            &ctx_for(&manufacturer),
            distributor.id,
            line(batch.id, 40),
            Some("Dock 4".to_string()),
        )
        .await?;
        assert_eq!(details.shipment.status, ShipmentStatus::InTransit);
        assert_eq!(details.shipment.location.as_deref(), Some("Dock 4"));
        assert_eq!(details.items.len(), 1);

        let batch = batch_core::require_batch(&db, batch.id).await?;
        assert_eq!(batch.current_stock, 60);
        assert!(
            inventory::get_inventory(&db, distributor.id, batch.id)
                .await?
                .is_none()
        );
        assert_eq!(
            count_units_with_status(&db, batch.id, UnitStatus::InTransit).await?,
            40
        );

        let movements = movement::movements_for_batch(&db, batch.id).await?;
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[1].status, movement::STATUS_IN_TRANSIT);
        assert_eq!(movements[1].role, MovementRole::Distributor);
        assert_eq!(movements[1].parent_id, Some(movements[0].id));

        assert_eq!(
            list_incoming_shipments(&db, distributor.id, Some(ShipmentStatus::InTransit))
                .await?
                .len(),
            1
        );
        assert_eq!(list_outgoing_shipments(&db, manufacturer.id).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_receive_credits_receiver() -> Result<()> {
        let (db, manufacturer, distributor, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-RECV", 10).await?;
        let details = dispatch_shipment(
            &db,
            &ctx_for(&manufacturer),
            distributor.id,
            line(batch.id, 6),
            None,
        )
        .await?;

        let outcome = receive_shipment(&db, &ctx_for(&distributor), details.shipment.id).await?;
        assert_eq!(outcome.shipment.status, ShipmentStatus::Delivered);
        assert!(outcome.shipment.delivered_at.is_some());
        assert!(outcome.invoice.is_none());

        let row = inventory::get_inventory(&db, distributor.id, batch.id)
            .await?
            .unwrap();
        assert_eq!(row.current_stock, 6);
        assert_eq!(
            count_units_with_status(&db, batch.id, UnitStatus::AtDistributor).await?,
            6
        );

        // One transfer per unit, written at dispatch
        let first = units_for_batch(&db, batch.id).await?.remove(0);
        assert_eq!(unit_history(&db, first.id).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_only_receiver_can_receive_once() -> Result<()> {
        let (db, manufacturer, distributor, retailer) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-ONCE", 10).await?;
        let details = dispatch_shipment(
            &db,
            &ctx_for(&manufacturer),
            distributor.id,
            line(batch.id, 2),
            None,
        )
        .await?;

        let result = receive_shipment(&db, &ctx_for(&retailer), details.shipment.id).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized { .. }));

        receive_shipment(&db, &ctx_for(&distributor), details.shipment.id).await?;
        let result = receive_shipment(&db, &ctx_for(&distributor), details.shipment.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition {
                entity: "Shipment",
                ..
            }
        ));

        let row = inventory::get_inventory(&db, distributor.id, batch.id)
            .await?
            .unwrap();
        assert_eq!(row.current_stock, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_must_flow_downstream() -> Result<()> {
        let (db, manufacturer, distributor, retailer) = setup_supply_chain().await?;
        let other = create_test_party(&db, "Second Distributor", PartyRole::Distributor).await?;
        let batch = create_test_batch(&db, &manufacturer, "B-FLOW", 10).await?;
        ship_and_receive(&db, &manufacturer, &distributor, batch.id, 5).await?;

        for receiver in [&manufacturer, &other] {
            let result = dispatch_shipment(
                &db,
                &ctx_for(&distributor),
                receiver.id,
                line(batch.id, 1),
                None,
            )
            .await;
            assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        }

        // Skipping the distributor is allowed
        dispatch_shipment(
            &db,
            &ctx_for(&manufacturer),
            retailer.id,
            line(batch.id, 1),
            None,
        )
        .await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_dispatch_leaves_nothing_behind() -> Result<()> {
        let (db, manufacturer, distributor, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-ROLL", 5).await?;
        let other = create_test_batch(&db, &manufacturer, "B-ROLL-2", 5).await?;

        let lines = vec![
            LineItem {
                batch_id: batch.id,
                quantity: 3,
            },
            LineItem {
                batch_id: other.id,
                quantity: 6,
            },
        ];
        let result =
            dispatch_shipment(&db, &ctx_for(&manufacturer), distributor.id, lines, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));

        assert_eq!(batch_core::require_batch(&db, batch.id).await?.current_stock, 5);
        assert!(Shipment::find().all(&db).await?.is_empty());
        assert_eq!(Movement::find().all(&db).await?.len(), 2);
        assert_eq!(
            count_units_with_status(&db, batch.id, UnitStatus::AtManufacturer).await?,
            5
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_recalled_batch_cannot_ship() -> Result<()> {
        let (db, manufacturer, distributor, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-HOLD", 5).await?;
        recall_test_batch(&db, &manufacturer, batch.id).await?;

        let result = dispatch_shipment(
            &db,
            &ctx_for(&manufacturer),
            distributor.id,
            line(batch.id, 1),
            None,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::BatchRecalled { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_overlapping_shipments_deliver_their_own_units() -> Result<()> {
        let (db, manufacturer, distributor, retailer) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-TWIN", 10).await?;
        ship_and_receive(&db, &manufacturer, &distributor, batch.id, 5).await?;

        // Both shipments of the batch are in flight to the retailer at once
        let via_distributor = dispatch_shipment(
            &db,
            &ctx_for(&distributor),
            retailer.id,
            line(batch.id, 5),
            None,
        )
        .await?;
        let direct = dispatch_shipment(
            &db,
            &ctx_for(&manufacturer),
            retailer.id,
            line(batch.id, 5),
            None,
        )
        .await?;

        receive_shipment(&db, &ctx_for(&retailer), direct.shipment.id).await?;

        let units = units_for_batch(&db, batch.id).await?;
        let (first_half, second_half) = units.split_at(5);
        for unit in first_half {
            assert_eq!(unit.status, UnitStatus::InTransit);
            assert_eq!(unit.current_holder_id, Some(retailer.id));
            assert_eq!(unit.shipment_id, Some(via_distributor.shipment.id));
        }
        for unit in second_half {
            assert_eq!(unit.status, UnitStatus::AtRetailer);
            assert_eq!(unit.current_holder_id, Some(retailer.id));
            assert_eq!(unit.shipment_id, None);
            let history = unit_history(&db, unit.id).await?;
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].from_holder_id, Some(manufacturer.id));
            assert_eq!(history[0].shipment_id, Some(direct.shipment.id));
        }

        receive_shipment(&db, &ctx_for(&retailer), via_distributor.shipment.id).await?;

        assert_eq!(
            count_units_with_status(&db, batch.id, UnitStatus::AtRetailer).await?,
            10
        );
        let history = unit_history(&db, units[0].id).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].from_holder_id, Some(distributor.id));
        assert_eq!(history[1].shipment_id, Some(via_distributor.shipment.id));
        assert_eq!(
            inventory::get_inventory(&db, retailer.id, batch.id)
                .await?
                .unwrap()
                .current_stock,
            10
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_recall_during_transit_still_delivers_stock() -> Result<()> {
        let (db, manufacturer, distributor, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-MIDWAY", 10).await?;
        let details = dispatch_shipment(
            &db,
            &ctx_for(&manufacturer),
            distributor.id,
            line(batch.id, 4),
            None,
        )
        .await?;
        let issued = recall_test_batch(&db, &manufacturer, batch.id).await?;

        let outcome = receive_shipment(&db, &ctx_for(&distributor), details.shipment.id).await?;
        assert_eq!(outcome.shipment.status, ShipmentStatus::Delivered);

        // Stock is credited but the units keep their recalled status
        let row = inventory::get_inventory(&db, distributor.id, batch.id)
            .await?
            .unwrap();
        assert_eq!(row.current_stock, 4);
        assert_eq!(
            count_units_with_status(&db, batch.id, UnitStatus::Recalled).await?,
            10
        );
        assert_eq!(
            count_units_with_status(&db, batch.id, UnitStatus::AtDistributor).await?,
            0
        );

        // The delivered stock can then be returned under the recall
        recall::dispose_recalled_stock(&db, &ctx_for(&distributor), issued.id, 4).await?;
        let back_home = units_for_batch(&db, batch.id)
            .await?
            .into_iter()
            .filter(|u| u.current_holder_id == Some(manufacturer.id))
            .count();
        assert_eq!(back_home, 10);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_shipment_missing() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_shipment(&db, 7).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "Shipment",
                ..
            }
        ));
        Ok(())
    }
}
