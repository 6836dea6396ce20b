//! Batch entity - One manufactured lot of a medicine.
//!
//! `current_stock` counts the strips still held by the manufacturer; downstream
//! holders are tracked in the inventory table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Batch database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    /// Unique identifier for the batch
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable lot number printed on the pack
    #[sea_orm(unique)]
    pub batch_number: String,
    /// Medicine this batch is made of
    pub medicine_id: i64,
    /// Owning manufacturer
    pub manufacturer_id: i64,
    /// Manufacture date
    pub manufacture_date: Date,
    /// Expiry date
    pub expiry_date: Date,
    /// Wholesale price per strip
    pub price_per_unit: f64,
    /// Maximum retail price per strip
    pub mrp: f64,
    /// Strips produced
    pub total_strips: i64,
    /// Strips still at the manufacturer
    pub current_stock: i64,
    /// Set once a recall has been issued
    pub recalled: bool,
    /// When the batch was created
    pub created_at: DateTimeUtc,
}

/// Relationships of a batch
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each batch is made of one medicine
    #[sea_orm(
        belongs_to = "super::medicine::Entity",
        from = "Column::MedicineId",
        to = "super::medicine::Column::Id"
    )]
    Medicine,
    /// Each batch is owned by one manufacturer
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::ManufacturerId",
        to = "super::party::Column::Id"
    )]
    Manufacturer,
    /// One batch has many units
    #[sea_orm(has_many = "super::unit::Entity")]
    Units,
}

impl Related<super::medicine::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Medicine.def()
    }
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Units.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
