//! Invoice business logic - One invoice per delivered order.

use crate::{
    entities::{Invoice, invoice, order},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use tracing::info;

/// Formats the invoice number of an order issued on `issued_on`,
/// e.g. `INV-20260314-000042`.
#[must_use]
pub fn invoice_number(issued_on: NaiveDate, order_id: i64) -> String {
    format!("INV-{}-{order_id:06}", issued_on.format("%Y%m%d"))
}

/// Issues the invoice for a delivered order. Issuing again returns the
/// existing invoice.
pub async fn issue_invoice<C>(db: &C, order: &order::Model) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = get_invoice_for_order(db, order.id).await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let invoice = invoice::ActiveModel {
        invoice_number: Set(invoice_number(now.date_naive(), order.id)),
        order_id: Set(order.id),
        buyer_id: Set(order.buyer_id),
        seller_id: Set(order.seller_id),
        amount: Set(order.total_amount),
        issued_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Issued invoice {} for order {} ({:.2})",
        invoice.invoice_number, order.id, invoice.amount
    );
    Ok(invoice)
}

/// The invoice of an order, if one has been issued.
pub async fn get_invoice_for_order<C>(db: &C, order_id: i64) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::OrderId.eq(order_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an invoice by its number, failing with `NotFound` if it does not exist.
pub async fn require_invoice_by_number<C>(db: &C, number: &str) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::InvoiceNumber.eq(number.trim()))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", number.trim()))
}

/// Invoices a party was billed or billed someone with, newest first.
pub async fn list_invoices_for_party<C>(db: &C, party_id: i64) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(
            Condition::any()
                .add(invoice::Column::BuyerId.eq(party_id))
                .add(invoice::Column::SellerId.eq(party_id)),
        )
        .order_by_desc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{date, setup_test_db};

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(invoice_number(date(2026, 3, 14), 42), "INV-20260314-000042");
        assert_eq!(
            invoice_number(date(2026, 12, 1), 1_234_567),
            "INV-20261201-1234567"
        );
    }

    #[tokio::test]
    async fn test_unknown_invoice_number() -> Result<()> {
        let db = setup_test_db().await?;
        let result = require_invoice_by_number(&db, "INV-20260101-000001").await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "Invoice",
                ..
            })
        ));
        Ok(())
    }
}
