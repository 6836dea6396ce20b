//! Movement entity - One edge in a batch's distribution tree.
//!
//! Rows are append-only. `parent_id` points at the movement that delivered the
//! stock to this movement's sender, so following it always ends at the root
//! created together with the batch.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the receiving side at a hop
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementRole {
    /// Stock made or returned to its maker
    #[sea_orm(string_value = "MANUFACTURER")]
    Manufacturer,
    /// Stock sent to a distributor
    #[sea_orm(string_value = "DISTRIBUTOR")]
    Distributor,
    /// Stock sent to a retailer
    #[sea_orm(string_value = "RETAILER")]
    Retailer,
    /// Stock sold over the counter
    #[sea_orm(string_value = "CONSUMER")]
    Consumer,
}

impl From<super::party::PartyRole> for MovementRole {
    fn from(role: super::party::PartyRole) -> Self {
        match role {
            super::party::PartyRole::Manufacturer => Self::Manufacturer,
            super::party::PartyRole::Distributor => Self::Distributor,
            super::party::PartyRole::Retailer => Self::Retailer,
        }
    }
}

impl fmt::Display for MovementRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

/// Movement database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    /// Unique identifier, increasing in insertion order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Batch that moved
    pub batch_id: i64,
    /// Sending party, None for the root movement
    pub sender_id: Option<i64>,
    /// Receiving party, None for consumer sales and destruction
    pub receiver_id: Option<i64>,
    /// Sender's name when the movement was recorded
    pub sender_name: Option<String>,
    /// Receiver's name, or the consumer's
    pub receiver_name: Option<String>,
    /// Role of the receiving side
    pub role: MovementRole,
    /// Strips moved
    pub quantity: i64,
    /// Label such as `MANUFACTURED`, `IN_TRANSIT` or `SOLD`
    pub status: String,
    /// Where the movement happened
    pub location: Option<String>,
    /// When the movement was recorded
    pub created_at: DateTimeUtc,
    /// Movement that delivered the stock to `sender_id`
    pub parent_id: Option<i64>,
}

/// Relationships of a movement
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each movement belongs to one batch
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id"
    )]
    Batch,
    /// Each movement may hang off an earlier one
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
