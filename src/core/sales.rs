//! Sales business logic - Retail sales to consumers.

use crate::{
    context::RequestContext,
    core::{batch as batch_core, inventory, movement, party, unit},
    entities::{
        SalesRecord,
        movement::{self as movement_entity, MovementRole},
        party::PartyRole,
        sales_record::{self, BuyerType},
        unit::UnitStatus,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Receiver name recorded when the buyer stays anonymous
const ANONYMOUS_BUYER: &str = "Consumer";

/// Input for a retail sale.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSale {
    /// Batch to sell from
    pub batch_id: i64,
    /// Strips sold
    pub quantity: i64,
    /// Consumer's name, if they gave one
    #[serde(default)]
    pub buyer_name: Option<String>,
}

/// Result of a sale.
#[derive(Debug, Clone, Serialize)]
pub struct SaleOutcome {
    /// Stored sales record
    pub record: sales_record::Model,
    /// Terminal movement closing this branch of the distribution tree
    pub movement: movement_entity::Model,
}

/// Sells strips from the calling retailer's stock to a consumer at MRP.
///
/// # Errors
/// * `Unauthorized` - caller is not a retailer
/// * `Validation` - non-positive quantity
/// * `BatchRecalled` - the batch is under recall
/// * `InsufficientStock` - the retailer holds less than requested; nothing is written
#[allow(clippy::cast_precision_loss)]
#[instrument(skip(db))]
pub async fn record_sale(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    sale: NewSale,
) -> Result<SaleOutcome> {
    ctx.require_role(PartyRole::Retailer)?;
    if sale.quantity <= 0 {
        return Err(Error::validation(format!(
            "Quantity must be positive, got {}",
            sale.quantity
        )));
    }
    let buyer_name = sale
        .buyer_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let txn = db.begin().await?;

    let retailer = party::require_party(&txn, ctx.party_id).await?;
    let batch = batch_core::require_batch(&txn, sale.batch_id).await?;
    batch_core::ensure_not_recalled(&batch)?;

    inventory::decrement(&txn, retailer.id, batch.id, sale.quantity).await?;

    let record = sales_record::ActiveModel {
        seller_id: Set(retailer.id),
        batch_id: Set(batch.id),
        quantity: Set(sale.quantity),
        total_price: Set(batch.mrp * sale.quantity as f64),
        buyer_type: Set(BuyerType::Consumer),
        buyer_name: Set(buyer_name.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let movement = movement::record_movement(
        &txn,
        movement::NewMovement {
            batch_id: batch.id,
            sender_id: Some(retailer.id),
            sender_name: Some(retailer.name.clone()),
            receiver_id: None,
            receiver_name: Some(buyer_name.unwrap_or_else(|| ANONYMOUS_BUYER.to_string())),
            role: MovementRole::Consumer,
            quantity: sale.quantity,
            status: movement::STATUS_SOLD.to_string(),
            location: retailer.location.clone(),
        },
    )
    .await?;

    unit::move_units(
        &txn,
        unit::UnitMove {
            batch_id: batch.id,
            from_holder_id: retailer.id,
            from_statuses: &UnitStatus::ON_HAND,
            from_shipment_id: None,
            to_holder_id: None,
            to_status: UnitStatus::Sold,
            shipment_id: None,
            quantity: sale.quantity,
        },
    )
    .await?;

    txn.commit().await?;

    info!(
        "{} sold {} strips of batch {} for {:.2}",
        retailer.name, record.quantity, batch.batch_number, record.total_price
    );
    Ok(SaleOutcome { record, movement })
}

/// A retailer's sales, newest first.
pub async fn list_sales_for_seller<C>(db: &C, seller_id: i64) -> Result<Vec<sales_record::Model>>
where
    C: ConnectionTrait,
{
    SalesRecord::find()
        .filter(sales_record::Column::SellerId.eq(seller_id))
        .order_by_desc(sales_record::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
