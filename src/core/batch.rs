//! Batch business logic - Creating a lot together with its traceable units.
//!
//! Creating a batch writes the batch row, one unit per strip and the root
//! movement of the batch's distribution tree inside a single database
//! transaction. If any step fails nothing is persisted.

use crate::{
    context::RequestContext,
    core::{medicine, movement, party, unit},
    entities::{Batch, batch, movement::MovementRole, party::PartyRole},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for creating a batch.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBatch {
    /// Lot number printed on the pack, unique across the system
    pub batch_number: String,
    /// Medicine the batch is made of
    pub medicine_id: i64,
    /// Date the batch was produced
    pub manufacture_date: NaiveDate,
    /// Date the batch expires, after the manufacture date
    pub expiry_date: NaiveDate,
    /// Wholesale price per strip
    pub price_per_unit: f64,
    /// Maximum retail price per strip
    pub mrp: f64,
    /// Number of strips produced; one unit is created per strip
    pub total_strips: i64,
}

impl NewBatch {
    fn validate(&self) -> Result<()> {
        if self.batch_number.trim().is_empty() {
            return Err(Error::validation("Batch number cannot be empty"));
        }
        if self.total_strips <= 0 {
            return Err(Error::validation(format!(
                "Total strips must be positive, got {}",
                self.total_strips
            )));
        }
        if self.expiry_date <= self.manufacture_date {
            return Err(Error::validation(
                "Expiry date must be after the manufacture date",
            ));
        }
        if !self.price_per_unit.is_finite() || self.price_per_unit < 0.0 {
            return Err(Error::validation(format!(
                "Invalid price per unit: {}",
                self.price_per_unit
            )));
        }
        if !self.mrp.is_finite() || self.mrp < self.price_per_unit {
            return Err(Error::validation(format!(
                "MRP {} must be a number no lower than the price per unit {}",
                self.mrp, self.price_per_unit
            )));
        }
        Ok(())
    }
}

/// Creates a batch, its units and the root movement for the calling manufacturer.
///
/// # Errors
/// * `Validation` - bad input or duplicate batch number
/// * `Unauthorized` - caller is not a manufacturer or does not make the medicine
/// * `NotFound` - the manufacturer or medicine does not exist
#[instrument(skip(db))]
pub async fn create_batch(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    new_batch: NewBatch,
) -> Result<batch::Model> {
    new_batch.validate()?;
    ctx.require_role(PartyRole::Manufacturer)?;

    let txn = db.begin().await?;

    let manufacturer = party::require_party(&txn, ctx.party_id).await?;
    let medicine = medicine::require_medicine(&txn, new_batch.medicine_id).await?;
    if medicine.manufacturer_id != manufacturer.id {
        return Err(Error::unauthorized(format!(
            "{} does not manufacture {}",
            manufacturer.name, medicine.name
        )));
    }

    let batch_number = new_batch.batch_number.trim().to_string();
    if get_batch_by_number(&txn, &batch_number).await?.is_some() {
        return Err(Error::validation(format!(
            "Batch number {batch_number} already exists"
        )));
    }

    let batch = batch::ActiveModel {
        batch_number: Set(batch_number),
        medicine_id: Set(medicine.id),
        manufacturer_id: Set(manufacturer.id),
        manufacture_date: Set(new_batch.manufacture_date),
        expiry_date: Set(new_batch.expiry_date),
        price_per_unit: Set(new_batch.price_per_unit),
        mrp: Set(new_batch.mrp),
        total_strips: Set(new_batch.total_strips),
        current_stock: Set(new_batch.total_strips),
        recalled: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let units = unit::create_units(&txn, &batch).await?;

    movement::record_movement(
        &txn,
        movement::NewMovement {
            batch_id: batch.id,
            sender_id: None,
            sender_name: None,
            receiver_id: Some(manufacturer.id),
            receiver_name: Some(manufacturer.name.clone()),
            role: MovementRole::Manufacturer,
            quantity: batch.total_strips,
            status: movement::STATUS_MANUFACTURED.to_string(),
            location: manufacturer.location.clone(),
        },
    )
    .await?;

    txn.commit().await?;

    info!(
        "Created batch {} of {} with {} units",
        batch.batch_number, medicine.name, units
    );
    Ok(batch)
}

/// Moves a batch's expiry date. Only the owning manufacturer may do this.
#[instrument(skip(db))]
pub async fn update_batch_expiry(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    batch_id: i64,
    expiry_date: NaiveDate,
) -> Result<batch::Model> {
    let batch = require_batch(db, batch_id).await?;
    ctx.require_party(batch.manufacturer_id, "manufacturer of this batch")?;

    if expiry_date <= batch.manufacture_date {
        return Err(Error::validation(
            "Expiry date must be after the manufacture date",
        ));
    }

    let mut active: batch::ActiveModel = batch.into();
    active.expiry_date = Set(expiry_date);
    let updated = active.update(db).await?;

    info!("Batch {} now expires {}", updated.batch_number, expiry_date);
    Ok(updated)
}

/// Finds a batch by id, returning None if it does not exist.
pub async fn get_batch<C>(db: &C, batch_id: i64) -> Result<Option<batch::Model>>
where
    C: ConnectionTrait,
{
    Batch::find_by_id(batch_id).one(db).await.map_err(Into::into)
}

/// Finds a batch by id, failing with `NotFound` if it does not exist.
pub async fn require_batch<C>(db: &C, batch_id: i64) -> Result<batch::Model>
where
    C: ConnectionTrait,
{
    get_batch(db, batch_id)
        .await?
        .ok_or_else(|| Error::not_found("Batch", batch_id))
}

/// Finds a batch by its printed batch number.
pub async fn get_batch_by_number<C>(db: &C, batch_number: &str) -> Result<Option<batch::Model>>
where
    C: ConnectionTrait,
{
    Batch::find()
        .filter(batch::Column::BatchNumber.eq(batch_number))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists a manufacturer's batches, newest first.
pub async fn list_batches_for_manufacturer<C>(
    db: &C,
    manufacturer_id: i64,
) -> Result<Vec<batch::Model>>
where
    C: ConnectionTrait,
{
    Batch::find()
        .filter(batch::Column::ManufacturerId.eq(manufacturer_id))
        .order_by_desc(batch::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Fails with `BatchRecalled` if the batch has been recalled.
pub fn ensure_not_recalled(batch: &batch::Model) -> Result<()> {
    if batch.recalled {
        Err(Error::BatchRecalled {
            batch_number: batch.batch_number.clone(),
        })
    } else {
        Ok(())
    }
}
