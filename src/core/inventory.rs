//! Inventory ledger - Per-holder stock of each batch.
//!
//! Downstream holders (distributors and retailers) keep one inventory row per
//! batch. A manufacturer's own stock of a batch lives on `Batch.current_stock`;
//! [`withdraw_stock`] hides that difference from dispatch and disposal code.
//!
//! Decrements are check-then-act: the row is read, the request is rejected with
//! `InsufficientStock` if it would go below zero, and only then is the row
//! updated. The UPDATE carries the same bound, so a concurrent writer can never
//! drive the stock negative either. All functions take the caller's open
//! transaction so the ledger changes together with the record that caused it.

use crate::{
    entities::{Batch, Inventory, batch, inventory},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::{debug, instrument};

/// Applies `delta` to the `(holder, batch)` row.
///
/// Positive deltas are receipts and create the row on first use; negative
/// deltas are dispatches or sales and fail with `InsufficientStock` if the row
/// is missing or holds less than requested.
#[instrument(skip(db))]
pub async fn adjust_inventory<C>(
    db: &C,
    holder_id: i64,
    batch_id: i64,
    delta: i64,
) -> Result<inventory::Model>
where
    C: ConnectionTrait,
{
    match delta {
        0 => Err(Error::validation("Inventory adjustment cannot be zero")),
        d if d > 0 => increment(db, holder_id, batch_id, d).await,
        d => decrement(db, holder_id, batch_id, -d).await,
    }
}

/// Adds received stock, creating the row if this is the holder's first receipt
/// of the batch.
pub(crate) async fn increment<C>(
    db: &C,
    holder_id: i64,
    batch_id: i64,
    quantity: i64,
) -> Result<inventory::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();

    let Some(existing) = get_inventory(db, holder_id, batch_id).await? else {
        let created = inventory::ActiveModel {
            holder_id: Set(holder_id),
            batch_id: Set(batch_id),
            current_stock: Set(quantity),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        debug!(
            "Opened inventory for holder {} batch {} at {}",
            holder_id, batch_id, quantity
        );
        return Ok(created);
    };

    Inventory::update_many()
        .col_expr(
            inventory::Column::CurrentStock,
            Expr::col(inventory::Column::CurrentStock).add(quantity),
        )
        .col_expr(inventory::Column::UpdatedAt, Expr::value(now))
        .filter(inventory::Column::Id.eq(existing.id))
        .exec(db)
        .await?;

    reload(db, existing.id).await
}

/// Removes stock, failing without any change if the holder has too little.
pub(crate) async fn decrement<C>(
    db: &C,
    holder_id: i64,
    batch_id: i64,
    quantity: i64,
) -> Result<inventory::Model>
where
    C: ConnectionTrait,
{
    let insufficient = |available| Error::InsufficientStock {
        batch_id,
        holder_id,
        available,
        requested: quantity,
    };

    let row = get_inventory(db, holder_id, batch_id)
        .await?
        .ok_or_else(|| insufficient(0))?;
    if row.current_stock < quantity {
        return Err(insufficient(row.current_stock));
    }

    let result = Inventory::update_many()
        .col_expr(
            inventory::Column::CurrentStock,
            Expr::col(inventory::Column::CurrentStock).sub(quantity),
        )
        .col_expr(inventory::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(inventory::Column::Id.eq(row.id))
        .filter(inventory::Column::CurrentStock.gte(quantity))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(insufficient(row.current_stock));
    }

    reload(db, row.id).await
}

/// Takes `quantity` strips of `batch` away from `holder_id`, wherever that
/// holder's stock is kept. Returns the stock left afterwards.
#[instrument(skip(db, batch), fields(batch = %batch.batch_number))]
pub async fn withdraw_stock<C>(
    db: &C,
    holder_id: i64,
    batch: &batch::Model,
    quantity: i64,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    if quantity <= 0 {
        return Err(Error::validation(format!(
            "Quantity must be positive, got {quantity}"
        )));
    }

    if holder_id != batch.manufacturer_id {
        let row = decrement(db, holder_id, batch.id, quantity).await?;
        return Ok(row.current_stock);
    }

    let current = Batch::find_by_id(batch.id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Batch", batch.id))?;
    let insufficient = Error::InsufficientStock {
        batch_id: batch.id,
        holder_id,
        available: current.current_stock,
        requested: quantity,
    };
    if current.current_stock < quantity {
        return Err(insufficient);
    }

    let result = Batch::update_many()
        .col_expr(
            batch::Column::CurrentStock,
            Expr::col(batch::Column::CurrentStock).sub(quantity),
        )
        .filter(batch::Column::Id.eq(batch.id))
        .filter(batch::Column::CurrentStock.gte(quantity))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(insufficient);
    }

    Ok(current.current_stock - quantity)
}

/// Stock of `batch` held by `holder_id`, zero if the holder has none.
pub async fn stock_for_holder<C>(db: &C, holder_id: i64, batch: &batch::Model) -> Result<i64>
where
    C: ConnectionTrait,
{
    if holder_id == batch.manufacturer_id {
        let current = Batch::find_by_id(batch.id)
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("Batch", batch.id))?;
        return Ok(current.current_stock);
    }

    Ok(get_inventory(db, holder_id, batch.id)
        .await?
        .map_or(0, |row| row.current_stock))
}

/// Finds the `(holder, batch)` row.
pub async fn get_inventory<C>(
    db: &C,
    holder_id: i64,
    batch_id: i64,
) -> Result<Option<inventory::Model>>
where
    C: ConnectionTrait,
{
    Inventory::find()
        .filter(inventory::Column::HolderId.eq(holder_id))
        .filter(inventory::Column::BatchId.eq(batch_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all of a holder's inventory rows, including empty ones.
pub async fn list_inventory_for_holder<C>(db: &C, holder_id: i64) -> Result<Vec<inventory::Model>>
where
    C: ConnectionTrait,
{
    Inventory::find()
        .filter(inventory::Column::HolderId.eq(holder_id))
        .order_by_asc(inventory::Column::BatchId)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn reload<C>(db: &C, inventory_id: i64) -> Result<inventory::Model>
where
    C: ConnectionTrait,
{
    Inventory::find_by_id(inventory_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Inventory", inventory_id))
}
