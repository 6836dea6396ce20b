//! Shipment entity - A confirmed dispatch from one party to another.
//!
//! Incoming shipments are always looked up through `receiver_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shipment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// Dispatched, not yet received
    #[sea_orm(string_value = "IN_TRANSIT")]
    InTransit,
    /// Received by the receiver
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

/// Shipment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    /// Unique identifier for the shipment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order this shipment fulfils, None for direct dispatches
    pub order_id: Option<i64>,
    /// Party that dispatched the shipment
    pub sender_id: i64,
    /// Party the shipment is addressed to
    pub receiver_id: i64,
    /// Current status
    pub status: ShipmentStatus,
    /// Dispatch location recorded on the movements
    pub location: Option<String>,
    /// When the shipment left the sender
    pub dispatched_at: DateTimeUtc,
    /// When the receiver confirmed delivery
    pub delivered_at: Option<DateTimeUtc>,
}

/// Relationships of a shipment
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One shipment has many items
    #[sea_orm(has_many = "super::shipment_item::Entity")]
    Items,
}

impl Related<super::shipment_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
