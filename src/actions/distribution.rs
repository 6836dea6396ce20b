//! Order and shipment actions.

use super::ActionResult;
use crate::{
    context::RequestContext,
    core::{
        order::{self, OrderDetails},
        shipment::{self, LineItem, ReceiptOutcome, ShipmentDetails},
    },
    entities::OrderModel,
};
use sea_orm::DatabaseConnection;

/// Places an order with an upstream seller.
pub async fn place_order(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    seller_id: i64,
    items: Vec<LineItem>,
) -> ActionResult<OrderDetails> {
    ActionResult::from_result(order::place_order(db, ctx, seller_id, items).await, |d| {
        format!("Order {} placed for {:.2}", d.order.id, d.order.total_amount)
    })
}

/// Approves a pending order addressed to the caller.
pub async fn approve_order(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    order_id: i64,
) -> ActionResult<OrderModel> {
    ActionResult::from_result(order::approve_order(db, ctx, order_id).await, |o| {
        format!("Order {} approved", o.id)
    })
}

/// Rejects an order addressed to the caller.
pub async fn reject_order(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    order_id: i64,
) -> ActionResult<OrderModel> {
    ActionResult::from_result(order::reject_order(db, ctx, order_id).await, |o| {
        format!("Order {} rejected", o.id)
    })
}

/// Ships an approved order to its buyer.
pub async fn ship_order(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    order_id: i64,
    location: Option<String>,
) -> ActionResult<ShipmentDetails> {
    ActionResult::from_result(order::ship_order(db, ctx, order_id, location).await, |d| {
        format!("Order {order_id} shipped as shipment {}", d.shipment.id)
    })
}

/// Sends stock straight to another holder without an order.
pub async fn dispatch_shipment(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    receiver_id: i64,
    items: Vec<LineItem>,
    location: Option<String>,
) -> ActionResult<ShipmentDetails> {
    ActionResult::from_result(
        shipment::dispatch_shipment(db, ctx, receiver_id, items, location).await,
        |d| format!("Shipment {} dispatched", d.shipment.id),
    )
}

/// Confirms delivery of a shipment addressed to the caller.
pub async fn receive_shipment(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    shipment_id: i64,
) -> ActionResult<ReceiptOutcome> {
    ActionResult::from_result(
        shipment::receive_shipment(db, ctx, shipment_id).await,
        |outcome| match &outcome.invoice {
            Some(invoice) => format!(
                "Shipment {shipment_id} received, invoice {} issued",
                invoice.invoice_number
            ),
            None => format!("Shipment {shipment_id} received"),
        },
    )
}
