//! Medicine entity - The product a batch is manufactured from.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Medicine database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "medicines")]
pub struct Model {
    /// Unique identifier for the medicine
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Brand name
    pub name: String,
    /// Generic (INN) name
    pub generic_name: Option<String>,
    /// Party that makes this medicine
    pub manufacturer_id: i64,
    /// Optional description shown on verification
    pub description: Option<String>,
    /// When the medicine was registered
    pub created_at: DateTimeUtc,
}

/// Relationships of a medicine
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each medicine belongs to one manufacturer
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::ManufacturerId",
        to = "super::party::Column::Id"
    )]
    Manufacturer,
    /// One medicine has many batches
    #[sea_orm(has_many = "super::batch::Entity")]
    Batches,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
