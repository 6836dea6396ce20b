//! Recall actions.

use super::ActionResult;
use crate::{
    context::RequestContext,
    core::recall::{self, NewRecall, RecallAlert, RecallOutcome},
    entities::{MovementModel, RecallModel},
};
use sea_orm::DatabaseConnection;

/// Recalls one of the caller's batches.
pub async fn issue_recall(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    new_recall: NewRecall,
) -> ActionResult<RecallOutcome> {
    ActionResult::from_result(recall::issue_recall(db, ctx, new_recall).await, |outcome| {
        format!(
            "Recall {} issued, {} units recalled",
            outcome.recall.id, outcome.units_recalled
        )
    })
}

/// Closes a recall the caller issued.
pub async fn resolve_recall(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    recall_id: i64,
) -> ActionResult<RecallModel> {
    ActionResult::from_result(recall::resolve_recall(db, ctx, recall_id).await, |r| {
        format!("Recall {} resolved", r.id)
    })
}

/// Returns or destroys recalled stock held by the caller.
pub async fn dispose_recalled_stock(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    recall_id: i64,
    quantity: i64,
) -> ActionResult<MovementModel> {
    ActionResult::from_result(
        recall::dispose_recalled_stock(db, ctx, recall_id, quantity).await,
        |m| format!("{} strips {}", m.quantity, m.status.to_lowercase()),
    )
}

/// Active recalls that concern the caller.
pub async fn my_recall_alerts(
    db: &DatabaseConnection,
    ctx: &RequestContext,
) -> ActionResult<Vec<RecallAlert>> {
    ActionResult::from_result(
        recall::recall_alerts_for_holder(db, ctx.party_id).await,
        |alerts| format!("{} active recall(s)", alerts.len()),
    )
}
