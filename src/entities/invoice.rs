//! Invoice entity - Issued once when an order is delivered.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier for the invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// e.g. `INV-20261018-000042`
    #[sea_orm(unique)]
    pub invoice_number: String,
    /// Order the invoice bills
    #[sea_orm(unique)]
    pub order_id: i64,
    /// Party billed
    pub buyer_id: i64,
    /// Party issuing the invoice
    pub seller_id: i64,
    /// Order total at the time of delivery
    pub amount: f64,
    /// When the invoice was issued
    pub issued_at: DateTimeUtc,
}

/// Relationships of an invoice
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    /// Each invoice bills one order
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
