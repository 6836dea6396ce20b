//! Retail sale action.

use super::ActionResult;
use crate::{
    context::RequestContext,
    core::sales::{self, NewSale, SaleOutcome},
};
use sea_orm::DatabaseConnection;

/// Sells strips from the caller's shelf to a consumer.
pub async fn record_sale(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    sale: NewSale,
) -> ActionResult<SaleOutcome> {
    ActionResult::from_result(sales::record_sale(db, ctx, sale).await, |outcome| {
        format!(
            "Sold {} strips for {:.2}",
            outcome.record.quantity, outcome.record.total_price
        )
    })
}
