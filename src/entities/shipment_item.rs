//! Shipment item entity - One batch line inside a shipment.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shipment item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipment_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Shipment the item travels in
    pub shipment_id: i64,
    /// Batch shipped
    pub batch_id: i64,
    /// Strips shipped
    pub quantity: i64,
}

/// Relationships of a shipment item
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shipment::Entity",
        from = "Column::ShipmentId",
        to = "super::shipment::Column::Id"
    )]
    /// Each item belongs to one shipment
    Shipment,
}

impl Related<super::shipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shipment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
