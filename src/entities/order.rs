//! Order entity - A buyer's request for stock from a seller.
//!
//! Status moves `PENDING → APPROVED → SHIPPED → DELIVERED`, or to `REJECTED`
//! from `PENDING` or `APPROVED`. The rules live in `core::order`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, waiting for the seller
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Accepted by the seller
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Dispatched as a shipment
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
    /// Shipment received by the buyer
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    /// Declined by the seller
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Party placing the order
    pub buyer_id: i64,
    /// Party asked to supply it
    pub seller_id: i64,
    /// Current status
    pub status: OrderStatus,
    /// Sum of item quantity × unit price
    pub total_amount: f64,
    /// When the order was placed
    pub created_at: DateTimeUtc,
    /// When the status last changed
    pub updated_at: DateTimeUtc,
}

/// Relationships of an order
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many items
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
