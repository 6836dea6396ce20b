//! Report generation business logic.
//!
//! Builds per-holder stock summaries with expiry and recall flags. Functions
//! return structured data; formatting helpers turn a line into display text
//! for logs and the provisioning binary.

use crate::{
    core::{batch as batch_core, inventory, medicine, party},
    entities::{batch, party::PartyRole},
    errors::Result,
};
use chrono::{Days, NaiveDate};
use sea_orm::ConnectionTrait;
use serde::Serialize;

/// Days before expiry at which stock counts as expiring soon
pub const DEFAULT_EXPIRY_WINDOW_DAYS: u64 = 90;

/// Where a batch stands relative to its expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpiryState {
    /// Outside the expiry window
    Fresh,
    /// Within the expiry window
    ExpiringSoon,
    /// On or past the expiry date
    Expired,
}

/// One batch a holder has on hand.
#[derive(Debug, Clone, Serialize)]
pub struct StockLine {
    /// Batch id
    pub batch_id: i64,
    /// Lot number
    pub batch_number: String,
    /// Name of the medicine
    pub medicine_name: String,
    /// Strips on hand
    pub stock: i64,
    /// Expiry date of the batch
    pub expiry_date: NaiveDate,
    /// Expires within the report window
    pub expiring_soon: bool,
    /// Already expired
    pub expired: bool,
    /// Batch is under recall
    pub recalled: bool,
}

/// Classifies an expiry date as of `today`.
///
/// A batch is expired on its expiry date and expiring soon when the expiry
/// date falls within the next `window_days` days.
#[must_use]
pub fn classify_expiry(expiry_date: NaiveDate, today: NaiveDate, window_days: u64) -> ExpiryState {
    if expiry_date <= today {
        return ExpiryState::Expired;
    }
    match today.checked_add_days(Days::new(window_days)) {
        Some(horizon) if expiry_date <= horizon => ExpiryState::ExpiringSoon,
        _ => ExpiryState::Fresh,
    }
}

/// Every batch the holder has stock of, ordered by expiry date.
///
/// For a manufacturer this is the unshipped stock of its own batches; for
/// everyone else, the non-empty rows of the inventory ledger.
pub async fn holder_stock_report<C>(
    db: &C,
    holder_id: i64,
    today: NaiveDate,
    window_days: u64,
) -> Result<Vec<StockLine>>
where
    C: ConnectionTrait,
{
    let holder = party::require_party(db, holder_id).await?;

    let mut holdings: Vec<(batch::Model, i64)> = Vec::new();
    if holder.role == PartyRole::Manufacturer {
        for batch in batch_core::list_batches_for_manufacturer(db, holder.id).await? {
            let stock = batch.current_stock;
            holdings.push((batch, stock));
        }
    } else {
        for row in inventory::list_inventory_for_holder(db, holder.id).await? {
            let batch = batch_core::require_batch(db, row.batch_id).await?;
            holdings.push((batch, row.current_stock));
        }
    }

    let mut lines = Vec::new();
    for (batch, stock) in holdings.into_iter().filter(|(_, stock)| *stock > 0) {
        let medicine = medicine::require_medicine(db, batch.medicine_id).await?;
        let state = classify_expiry(batch.expiry_date, today, window_days);
        lines.push(StockLine {
            batch_id: batch.id,
            batch_number: batch.batch_number,
            medicine_name: medicine.name,
            stock,
            expiry_date: batch.expiry_date,
            expiring_soon: state == ExpiryState::ExpiringSoon,
            expired: state == ExpiryState::Expired,
            recalled: batch.recalled,
        });
    }

    lines.sort_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then_with(|| a.batch_number.cmp(&b.batch_number))
    });
    Ok(lines)
}

/// Formats a stock line, e.g. `B-100 | Calpol | 40 strips | expires 2027-01-31 [RECALLED]`.
#[must_use]
pub fn format_stock_line(line: &StockLine) -> String {
    let mut text = format!(
        "{} | {} | {} strips | expires {}",
        line.batch_number, line.medicine_name, line.stock, line.expiry_date
    );
    if line.expired {
        text.push_str(" [EXPIRED]");
    } else if line.expiring_soon {
        text.push_str(" [EXPIRING SOON]");
    }
    if line.recalled {
        text.push_str(" [RECALLED]");
    }
    text
}
