//! Recall business logic - Issuing, resolving and acting on batch recalls.
//!
//! Issuing a recall flags the batch and marks every one of its units as
//! recalled. Stock already downstream is left where it is; holders see the
//! recall through [`recall_alerts_for_holder`] and clear their shelves with
//! [`dispose_recalled_stock`].

use crate::{
    context::RequestContext,
    core::{batch as batch_core, inventory, movement, party, unit},
    entities::{
        Batch, Inventory, Recall, batch, inventory as inventory_entity,
        movement::{self as movement_entity, MovementRole},
        party::PartyRole,
        recall::{self, RecallAction, RecallSeverity, RecallStatus},
        unit::UnitStatus,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

/// Input for issuing a recall.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecall {
    /// Batch to recall
    pub batch_id: i64,
    /// Why the batch is recalled, must not be blank
    pub reason: String,
    /// How serious the defect is
    pub severity: RecallSeverity,
    /// What holders must do with their stock
    pub action_type: RecallAction,
}

/// Result of issuing a recall.
#[derive(Debug, Clone, Serialize)]
pub struct RecallOutcome {
    /// The recall as stored
    pub recall: recall::Model,
    /// Units switched to `RECALLED`
    pub units_recalled: u64,
}

/// An active recall touching a holder's stock or history.
#[derive(Debug, Clone, Serialize)]
pub struct RecallAlert {
    /// Active recall
    pub recall: recall::Model,
    /// Recalled batch
    pub batch: batch::Model,
    /// What the holder still has of the batch
    pub stock_on_hand: i64,
}

/// Issues a recall against a batch owned by the calling manufacturer.
///
/// A batch can have only one active recall at a time; issuing another while
/// one is active fails with `RecallAlreadyActive`.
#[instrument(skip(db))]
pub async fn issue_recall(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    new_recall: NewRecall,
) -> Result<RecallOutcome> {
    let reason = new_recall.reason.trim();
    if reason.is_empty() {
        return Err(Error::validation("Recall reason cannot be empty"));
    }
    ctx.require_role(PartyRole::Manufacturer)?;

    let txn = db.begin().await?;

    let batch = batch_core::require_batch(&txn, new_recall.batch_id).await?;
    ctx.require_party(batch.manufacturer_id, "manufacturer of this batch")?;

    if get_active_recall(&txn, batch.id).await?.is_some() {
        return Err(Error::RecallAlreadyActive { batch_id: batch.id });
    }

    let recall = recall::ActiveModel {
        batch_id: Set(batch.id),
        reason: Set(reason.to_string()),
        severity: Set(new_recall.severity),
        status: Set(RecallStatus::Active),
        action_type: Set(new_recall.action_type),
        issued_by: Set(ctx.party_id),
        created_at: Set(Utc::now()),
        resolved_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let batch_number = batch.batch_number.clone();
    let mut active_batch: batch::ActiveModel = batch.into();
    active_batch.recalled = Set(true);
    active_batch.update(&txn).await?;

    let units_recalled = unit::recall_units(&txn, recall.batch_id).await?;

    txn.commit().await?;

    warn!(
        "Recall {} issued for batch {}: {} units recalled",
        recall.id, batch_number, units_recalled
    );
    Ok(RecallOutcome {
        recall,
        units_recalled,
    })
}

/// Marks an active recall as resolved. Only the issuing manufacturer may do this.
///
/// The batch stays flagged as recalled and its units keep their status.
#[instrument(skip(db))]
pub async fn resolve_recall(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    recall_id: i64,
) -> Result<recall::Model> {
    let recall = require_recall(db, recall_id).await?;
    ctx.require_party(recall.issued_by, "issuer of this recall")?;

    if recall.status != RecallStatus::Active {
        return Err(Error::InvalidTransition {
            entity: "Recall",
            from: recall.status.to_string(),
            to: RecallStatus::Resolved.to_string(),
        });
    }

    let mut active: recall::ActiveModel = recall.into();
    active.status = Set(RecallStatus::Resolved);
    active.resolved_at = Set(Some(Utc::now()));
    let resolved = active.update(db).await?;

    info!("Recall {} resolved", resolved.id);
    Ok(resolved)
}

/// Removes recalled stock from the caller's shelves as the recall instructs.
///
/// For `RETURN` recalls the stock is sent back to the manufacturer; for
/// `DESTROY` recalls it leaves the chain. Either way a movement is recorded and
/// the holder's units follow. Returned stock is not added back to the
/// manufacturer's sellable stock.
#[instrument(skip(db))]
pub async fn dispose_recalled_stock(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    recall_id: i64,
    quantity: i64,
) -> Result<movement_entity::Model> {
    if quantity <= 0 {
        return Err(Error::validation(format!(
            "Quantity must be positive, got {quantity}"
        )));
    }

    let txn = db.begin().await?;

    let recall = require_recall(&txn, recall_id).await?;
    if recall.status != RecallStatus::Active {
        return Err(Error::validation(format!(
            "Recall {recall_id} is {}, nothing to dispose",
            recall.status
        )));
    }

    let batch = batch_core::require_batch(&txn, recall.batch_id).await?;
    let holder = party::require_party(&txn, ctx.party_id).await?;
    ctx.require_role(holder.role)?;
    let manufacturer = party::require_party(&txn, batch.manufacturer_id).await?;

    if recall.action_type == RecallAction::Return && holder.id == manufacturer.id {
        return Err(Error::validation(
            "The manufacturer cannot return stock to itself",
        ));
    }

    inventory::withdraw_stock(&txn, holder.id, &batch, quantity).await?;

    let (receiver, status) = match recall.action_type {
        RecallAction::Return => (Some(&manufacturer), movement::STATUS_RETURNED),
        RecallAction::Destroy => (None, movement::STATUS_DESTROYED),
    };

    let recorded = movement::record_movement(
        &txn,
        movement::NewMovement {
            batch_id: batch.id,
            sender_id: Some(holder.id),
            sender_name: Some(holder.name.clone()),
            receiver_id: receiver.map(|p| p.id),
            receiver_name: receiver.map(|p| p.name.clone()),
            role: MovementRole::Manufacturer,
            quantity,
            status: status.to_string(),
            location: holder.location.clone(),
        },
    )
    .await?;

    unit::move_units(
        &txn,
        unit::UnitMove {
            batch_id: batch.id,
            from_holder_id: holder.id,
            from_statuses: &[UnitStatus::Recalled],
            from_shipment_id: None,
            to_holder_id: receiver.map(|p| p.id),
            to_status: UnitStatus::Recalled,
            shipment_id: None,
            quantity,
        },
    )
    .await?;

    txn.commit().await?;

    info!(
        "{} {} {} strips of recalled batch {}",
        holder.name,
        status.to_lowercase(),
        quantity,
        batch.batch_number
    );
    Ok(recorded)
}

/// Finds a recall by id, failing with `NotFound` if it does not exist.
pub async fn require_recall<C>(db: &C, recall_id: i64) -> Result<recall::Model>
where
    C: ConnectionTrait,
{
    Recall::find_by_id(recall_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Recall", recall_id))
}

/// The active recall of a batch, if any.
pub async fn get_active_recall<C>(db: &C, batch_id: i64) -> Result<Option<recall::Model>>
where
    C: ConnectionTrait,
{
    Recall::find()
        .filter(recall::Column::BatchId.eq(batch_id))
        .filter(recall::Column::Status.eq(RecallStatus::Active))
        .order_by_desc(recall::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All recalls ever issued for a batch, newest first.
pub async fn list_recalls_for_batch<C>(db: &C, batch_id: i64) -> Result<Vec<recall::Model>>
where
    C: ConnectionTrait,
{
    Recall::find()
        .filter(recall::Column::BatchId.eq(batch_id))
        .order_by_desc(recall::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active recalls of every batch the holder manufactured, stocks, or appears
/// in the movement history of.
pub async fn recall_alerts_for_holder<C>(db: &C, holder_id: i64) -> Result<Vec<RecallAlert>>
where
    C: ConnectionTrait,
{
    let mut batch_ids: BTreeSet<i64> = Inventory::find()
        .select_only()
        .column(inventory_entity::Column::BatchId)
        .filter(inventory_entity::Column::HolderId.eq(holder_id))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    batch_ids.extend(
        movement::movements_for_party(db, holder_id)
            .await?
            .into_iter()
            .map(|m| m.batch_id),
    );

    batch_ids.extend(
        Batch::find()
            .select_only()
            .column(batch::Column::Id)
            .filter(batch::Column::ManufacturerId.eq(holder_id))
            .into_tuple::<i64>()
            .all(db)
            .await?,
    );

    if batch_ids.is_empty() {
        return Ok(Vec::new());
    }

    let recalls = Recall::find()
        .filter(recall::Column::Status.eq(RecallStatus::Active))
        .filter(recall::Column::BatchId.is_in(batch_ids))
        .order_by_desc(recall::Column::Id)
        .all(db)
        .await?;

    let mut alerts = Vec::with_capacity(recalls.len());
    for recall in recalls {
        let batch = batch_core::require_batch(db, recall.batch_id).await?;
        let stock_on_hand = inventory::stock_for_holder(db, holder_id, &batch).await?;
        alerts.push(RecallAlert {
            recall,
            batch,
            stock_on_hand,
        });
    }
    Ok(alerts)
}
