//! Unit transfer entity - The ownership history of a unit, one row per hop.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unit transfer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "unit_transfers")]
pub struct Model {
    /// Unique identifier for the transfer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unit that moved
    pub unit_id: i64,
    /// Previous holder, None for the initial assignment
    pub from_holder_id: Option<i64>,
    /// New holder, None when sold to a consumer or destroyed
    pub to_holder_id: Option<i64>,
    /// Shipment the unit travelled in, None for sales and disposals
    pub shipment_id: Option<i64>,
    /// When the holder changed
    pub transferred_at: DateTimeUtc,
}

/// Relationships of a unit transfer
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id"
    )]
    /// Each transfer belongs to one unit
    Unit,
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
