//! Unit entity - One traceable strip belonging to a batch.
//!
//! The `code` is what gets printed as a QR code on the pack. While a unit is
//! `IN_TRANSIT`, `current_holder_id` names the party it is travelling to and
//! `shipment_id` the shipment carrying it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitStatus {
    /// On the manufacturer's shelf
    #[sea_orm(string_value = "AT_MANUFACTURER")]
    AtManufacturer,
    /// Inside a shipment
    #[sea_orm(string_value = "IN_TRANSIT")]
    InTransit,
    /// On a distributor's shelf
    #[sea_orm(string_value = "AT_DISTRIBUTOR")]
    AtDistributor,
    /// On a retailer's shelf
    #[sea_orm(string_value = "AT_RETAILER")]
    AtRetailer,
    /// Sold to a consumer
    #[sea_orm(string_value = "SOLD")]
    Sold,
    /// Batch under recall
    #[sea_orm(string_value = "RECALLED")]
    Recalled,
}

impl UnitStatus {
    /// Statuses in which a unit is sitting on a holder's shelf
    pub const ON_HAND: [Self; 3] = [Self::AtManufacturer, Self::AtDistributor, Self::AtRetailer];
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

/// Unit database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "units")]
pub struct Model {
    /// Unique identifier for the unit
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Scannable code
    #[sea_orm(unique)]
    pub code: String,
    /// Batch the unit belongs to
    pub batch_id: i64,
    /// Current status
    pub status: UnitStatus,
    /// Party holding (or receiving) the unit, None once sold or destroyed
    pub current_holder_id: Option<i64>,
    /// Shipment carrying the unit, set from dispatch until receipt
    pub shipment_id: Option<i64>,
    /// When the unit was created
    pub created_at: DateTimeUtc,
    /// When the status or holder last changed
    pub updated_at: DateTimeUtc,
}

/// Relationships of a unit
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each unit belongs to one batch
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id"
    )]
    Batch,
    /// One unit has many ownership transfers
    #[sea_orm(has_many = "super::unit_transfer::Entity")]
    Transfers,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl Related<super::unit_transfer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transfers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
