//! Inventory entity - Stock of one batch held by one downstream party.
//!
//! At most one row exists per `(holder_id, batch_id)`; the unique index is
//! created alongside the table in `config::database::create_tables`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    /// Unique identifier for the inventory row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Party holding the stock
    pub holder_id: i64,
    /// Batch the stock belongs to
    pub batch_id: i64,
    /// Strips on hand, never negative
    pub current_stock: i64,
    /// Last receipt, dispatch or sale
    pub updated_at: DateTimeUtc,
}

/// Relationships of an inventory row
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row belongs to one batch
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id"
    )]
    Batch,
    /// Each row belongs to one holder
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::HolderId",
        to = "super::party::Column::Id"
    )]
    Holder,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
