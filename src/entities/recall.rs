//! Recall entity - A manufacturer-issued safety action against a batch.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious the defect is
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecallSeverity {
    /// Unlikely to cause harm
    #[sea_orm(string_value = "LOW")]
    Low,
    /// May cause temporary harm
    #[sea_orm(string_value = "MEDIUM")]
    Medium,
    /// May cause serious harm
    #[sea_orm(string_value = "HIGH")]
    High,
    /// Life-threatening
    #[sea_orm(string_value = "CRITICAL")]
    Critical,
}

/// Whether the recall is still in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecallStatus {
    /// Holders must act on their stock
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Closed by the issuer
    #[sea_orm(string_value = "RESOLVED")]
    Resolved,
}

impl fmt::Display for RecallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

/// What holders must do with recalled stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecallAction {
    /// Send the stock back to the manufacturer
    #[sea_orm(string_value = "RETURN")]
    Return,
    /// Destroy the stock on site
    #[sea_orm(string_value = "DESTROY")]
    Destroy,
}

/// Recall database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recalls")]
pub struct Model {
    /// Unique identifier for the recall
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recalled batch
    pub batch_id: i64,
    /// Why the batch was recalled
    pub reason: String,
    /// How serious the defect is
    pub severity: RecallSeverity,
    /// Active until the issuer resolves it
    pub status: RecallStatus,
    /// What holders must do with their stock
    pub action_type: RecallAction,
    /// Manufacturer party that issued the recall
    pub issued_by: i64,
    /// When the recall was issued
    pub created_at: DateTimeUtc,
    /// When the recall was resolved
    pub resolved_at: Option<DateTimeUtc>,
}

/// Relationships of a recall
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each recall targets one batch
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id"
    )]
    Batch,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
