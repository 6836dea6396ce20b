//! Sales record entity - One point-of-sale transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Who bought the stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuyerType {
    /// Walk-in consumer
    #[sea_orm(string_value = "CONSUMER")]
    Consumer,
}

/// Sales record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_records")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Retailer that made the sale
    pub seller_id: i64,
    /// Batch sold from
    pub batch_id: i64,
    /// Strips sold
    pub quantity: i64,
    /// MRP × quantity
    pub total_price: f64,
    /// Kind of buyer
    pub buyer_type: BuyerType,
    /// Buyer's name, if given
    pub buyer_name: Option<String>,
    /// When the sale was made
    pub created_at: DateTimeUtc,
}

/// Relationships of a sales record
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id"
    )]
    /// Each sale draws from one batch
    Batch,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
