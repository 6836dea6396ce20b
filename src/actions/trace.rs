//! Read-only tracing actions: scans, provenance and stock reports.
//!
//! Verification and provenance are public; anyone holding a pack can scan it.

use super::ActionResult;
use crate::{
    context::RequestContext,
    core::{
        movement::{self, MovementNode},
        report::{self, StockLine},
        unit::{self, UnitVerification},
    },
    entities::MovementModel,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Resolves a scanned unit code.
pub async fn verify_unit(db: &DatabaseConnection, code: &str) -> ActionResult<UnitVerification> {
    ActionResult::from_result(unit::verify_unit(db, code).await, |v| {
        if v.is_genuine_and_safe() {
            format!("Genuine unit of batch {}", v.batch.batch_number)
        } else {
            format!(
                "Unit of batch {} is under recall, do not use",
                v.batch.batch_number
            )
        }
    })
}

/// Walks a movement back to the batch's manufacture.
pub async fn trace_provenance(
    db: &DatabaseConnection,
    movement_id: i64,
) -> ActionResult<Vec<MovementModel>> {
    ActionResult::from_result(movement::trace_provenance(db, movement_id).await, |chain| {
        format!("{} hop(s) back to manufacture", chain.len().saturating_sub(1))
    })
}

/// Every movement of a batch, as a tree rooted at manufacture.
pub async fn distribution_tree(
    db: &DatabaseConnection,
    batch_id: i64,
) -> ActionResult<Vec<MovementNode>> {
    ActionResult::from_result(movement::distribution_tree(db, batch_id).await, |_| {
        format!("Distribution tree of batch {batch_id}")
    })
}

/// The caller's stock, flagged for expiry within `window_days` of `today`.
pub async fn my_stock_report(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    today: NaiveDate,
    window_days: u64,
) -> ActionResult<Vec<StockLine>> {
    ActionResult::from_result(
        report::holder_stock_report(db, ctx.party_id, today, window_days).await,
        |lines| format!("{} batch(es) in stock", lines.len()),
    )
}
