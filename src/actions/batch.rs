//! Manufacturer actions: medicines and batches.

use super::ActionResult;
use crate::{
    context::RequestContext,
    core::{batch, medicine},
    entities::{BatchModel, MedicineModel, party::PartyRole},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Registers a medicine under the calling manufacturer.
pub async fn register_medicine(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    name: &str,
    generic_name: Option<String>,
    description: Option<String>,
) -> ActionResult<MedicineModel> {
    let result = match ctx.require_role(PartyRole::Manufacturer) {
        Ok(()) => {
            medicine::create_medicine(db, ctx.party_id, name, generic_name, description).await
        }
        Err(err) => Err(err),
    };
    ActionResult::from_result(result, |m| format!("Medicine {} registered", m.name))
}

/// Creates a batch and its traceable units for the calling manufacturer.
pub async fn create_batch(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    new_batch: batch::NewBatch,
) -> ActionResult<BatchModel> {
    ActionResult::from_result(batch::create_batch(db, ctx, new_batch).await, |b| {
        format!(
            "Batch {} created with {} traceable units",
            b.batch_number, b.total_strips
        )
    })
}

/// Corrects the expiry date of one of the caller's batches.
pub async fn update_batch_expiry(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    batch_id: i64,
    expiry_date: NaiveDate,
) -> ActionResult<BatchModel> {
    ActionResult::from_result(
        batch::update_batch_expiry(db, ctx, batch_id, expiry_date).await,
        |b| format!("Batch {} now expires {}", b.batch_number, b.expiry_date),
    )
}
