//! Unit business logic - Per-strip tracking and scan verification.
//!
//! Units follow the stock: whenever strips are dispatched, received, sold or
//! disposed, the same number of the holder's units change status and holder.
//! Every change of holder appends a row to the unit's transfer history.

use crate::{
    core::{batch as batch_core, medicine, recall},
    entities::{
        Unit, UnitTransfer, batch, medicine as medicine_entity, party::PartyRole,
        recall as recall_entity, unit, unit::UnitStatus, unit_transfer,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*};
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Rows per multi-row INSERT or `IN (...)` list
const UNIT_WRITE_CHUNK: usize = 500;

/// Describes a bulk move of a holder's units.
#[derive(Debug, Clone)]
pub struct UnitMove<'a> {
    /// Batch whose units move
    pub batch_id: i64,
    /// Holder the units are taken from
    pub from_holder_id: i64,
    /// Only units currently in one of these statuses are eligible
    pub from_statuses: &'a [UnitStatus],
    /// When set, only units carried by this shipment are eligible
    pub from_shipment_id: Option<i64>,
    /// New holder, None when the units leave the chain
    pub to_holder_id: Option<i64>,
    /// Status the units end up in
    pub to_status: UnitStatus,
    /// Shipment carrying the units after the move, None once they are shelved
    pub shipment_id: Option<i64>,
    /// Number of units to move
    pub quantity: i64,
}

/// Everything a scan of a unit code reveals.
#[derive(Debug, Clone, Serialize)]
pub struct UnitVerification {
    /// The scanned unit
    pub unit: unit::Model,
    /// Its batch
    pub batch: batch::Model,
    /// The batch's medicine
    pub medicine: medicine_entity::Model,
    /// Ownership history, oldest first
    pub history: Vec<unit_transfer::Model>,
    /// Set when the unit's batch is under an active recall
    pub active_recall: Option<recall_entity::Model>,
}

impl UnitVerification {
    /// True when the unit is safe to sell or consume.
    #[must_use]
    pub fn is_genuine_and_safe(&self) -> bool {
        self.active_recall.is_none() && self.unit.status != UnitStatus::Recalled
    }
}

/// The on-shelf status for units held by a party with `role`.
#[must_use]
pub const fn status_for_holder(role: PartyRole) -> UnitStatus {
    match role {
        PartyRole::Manufacturer => UnitStatus::AtManufacturer,
        PartyRole::Distributor => UnitStatus::AtDistributor,
        PartyRole::Retailer => UnitStatus::AtRetailer,
    }
}

/// Creates one unit per strip of a freshly inserted batch, all held by its
/// manufacturer. Returns the number of units created.
pub(crate) async fn create_units<C>(db: &C, batch: &batch::Model) -> Result<u64>
where
    C: ConnectionTrait,
{
    let total = u64::try_from(batch.total_strips)
        .map_err(|_| Error::validation("Total strips must be positive"))?;
    let now = Utc::now();

    let mut remaining = total;
    while remaining > 0 {
        let size = remaining.min(UNIT_WRITE_CHUNK as u64);
        let units = (0..size).map(|_| unit::ActiveModel {
            code: Set(Uuid::new_v4().to_string()),
            batch_id: Set(batch.id),
            status: Set(UnitStatus::AtManufacturer),
            current_holder_id: Set(Some(batch.manufacturer_id)),
            shipment_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
        Unit::insert_many(units).exec(db).await?;
        remaining -= size;
    }

    debug!("Created {} units for batch {}", total, batch.batch_number);
    Ok(total)
}

/// Moves up to `quantity` eligible units, oldest first, and logs a transfer for
/// each unit whose holder changes. Returns how many units were moved.
///
/// The inventory ledger is the authority on quantities; a shortfall here only
/// means fewer units were still trackable (for example after a recall).
#[instrument(skip(db))]
pub(crate) async fn move_units<C>(db: &C, unit_move: UnitMove<'_>) -> Result<u64>
where
    C: ConnectionTrait,
{
    let limit = u64::try_from(unit_move.quantity)
        .map_err(|_| Error::validation("Quantity must be positive"))?;

    let mut query = Unit::find()
        .select_only()
        .column(unit::Column::Id)
        .filter(unit::Column::BatchId.eq(unit_move.batch_id))
        .filter(unit::Column::CurrentHolderId.eq(unit_move.from_holder_id))
        .filter(unit::Column::Status.is_in(unit_move.from_statuses.iter().copied()));
    if let Some(shipment_id) = unit_move.from_shipment_id {
        query = query.filter(unit::Column::ShipmentId.eq(shipment_id));
    }
    let ids: Vec<i64> = query
        .order_by_asc(unit::Column::Id)
        .limit(limit)
        .into_tuple()
        .all(db)
        .await?;

    if (ids.len() as u64) < limit {
        debug!(
            "Only {} of {} units of batch {} were eligible to move",
            ids.len(),
            limit,
            unit_move.batch_id
        );
    }

    let now = Utc::now();
    let holder_changes = unit_move.to_holder_id != Some(unit_move.from_holder_id);

    for chunk in ids.chunks(UNIT_WRITE_CHUNK) {
        Unit::update_many()
            .set(unit::ActiveModel {
                status: Set(unit_move.to_status),
                current_holder_id: Set(unit_move.to_holder_id),
                shipment_id: Set(unit_move.shipment_id),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(unit::Column::Id.is_in(chunk.iter().copied()))
            .exec(db)
            .await?;

        if holder_changes {
            let transfers = chunk.iter().map(|&unit_id| unit_transfer::ActiveModel {
                unit_id: Set(unit_id),
                from_holder_id: Set(Some(unit_move.from_holder_id)),
                to_holder_id: Set(unit_move.to_holder_id),
                shipment_id: Set(unit_move.shipment_id),
                transferred_at: Set(now),
                ..Default::default()
            });
            UnitTransfer::insert_many(transfers).exec(db).await?;
        }
    }

    Ok(ids.len() as u64)
}

/// Marks every unit of a batch as recalled, wherever it is.
pub(crate) async fn recall_units<C>(db: &C, batch_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Unit::update_many()
        .set(unit::ActiveModel {
            status: Set(UnitStatus::Recalled),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(unit::Column::BatchId.eq(batch_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Finds a unit by its scanned code.
pub async fn get_unit_by_code<C>(db: &C, code: &str) -> Result<Option<unit::Model>>
where
    C: ConnectionTrait,
{
    Unit::find()
        .filter(unit::Column::Code.eq(code.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the units of a batch in creation order.
pub async fn units_for_batch<C>(db: &C, batch_id: i64) -> Result<Vec<unit::Model>>
where
    C: ConnectionTrait,
{
    Unit::find()
        .filter(unit::Column::BatchId.eq(batch_id))
        .order_by_asc(unit::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts a batch's units in `status`.
pub async fn count_units_with_status<C>(db: &C, batch_id: i64, status: UnitStatus) -> Result<u64>
where
    C: ConnectionTrait,
{
    Unit::find()
        .filter(unit::Column::BatchId.eq(batch_id))
        .filter(unit::Column::Status.eq(status))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Returns a unit's ownership history, oldest first.
pub async fn unit_history<C>(db: &C, unit_id: i64) -> Result<Vec<unit_transfer::Model>>
where
    C: ConnectionTrait,
{
    UnitTransfer::find()
        .filter(unit_transfer::Column::UnitId.eq(unit_id))
        .order_by_asc(unit_transfer::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves a scanned code to the unit, its batch, medicine, history and any
/// active recall.
pub async fn verify_unit<C>(db: &C, code: &str) -> Result<UnitVerification>
where
    C: ConnectionTrait,
{
    let unit = get_unit_by_code(db, code)
        .await?
        .ok_or_else(|| Error::not_found("Unit", code.trim()))?;
    let batch = batch_core::require_batch(db, unit.batch_id).await?;
    let medicine = medicine::require_medicine(db, batch.medicine_id).await?;
    let history = unit_history(db, unit.id).await?;
    let active_recall = recall::get_active_recall(db, batch.id).await?;

    Ok(UnitVerification {
        unit,
        batch,
        medicine,
        history,
        active_recall,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_status_for_holder() {
        assert_eq!(
            status_for_holder(PartyRole::Manufacturer),
            UnitStatus::AtManufacturer
        );
        assert_eq!(
            status_for_holder(PartyRole::Distributor),
            UnitStatus::AtDistributor
        );
        assert_eq!(status_for_holder(PartyRole::Retailer), UnitStatus::AtRetailer);
    }

    #[tokio::test]
    async fn test_create_units_spans_several_chunks() -> Result<()> {
        let (db, manufacturer, _, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-BIG", 1_201).await?;

        let units = units_for_batch(&db, batch.id).await?;
        assert_eq!(units.len(), 1_201);
        assert_eq!(
            count_units_with_status(&db, batch.id, UnitStatus::AtManufacturer).await?,
            1_201
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_move_units_logs_transfers_only_on_holder_change() -> Result<()> {
        let (db, manufacturer, distributor, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-MOVE", 10).await?;

        let moved = move_units(
            &db,
            UnitMove {
                batch_id: batch.id,
                from_holder_id: manufacturer.id,
                from_statuses: &UnitStatus::ON_HAND,
                from_shipment_id: None,
                to_holder_id: Some(distributor.id),
                to_status: UnitStatus::InTransit,
                shipment_id: None,
                quantity: 4,
            },
        )
        .await?;
        assert_eq!(moved, 4);

        let moved = move_units(
            &db,
            UnitMove {
                batch_id: batch.id,
                from_holder_id: distributor.id,
                from_statuses: &[UnitStatus::InTransit],
                from_shipment_id: None,
                to_holder_id: Some(distributor.id),
                to_status: UnitStatus::AtDistributor,
                shipment_id: None,
                quantity: 4,
            },
        )
        .await?;
        assert_eq!(moved, 4);

        let units = units_for_batch(&db, batch.id).await?;
        let first = &units[0];
        assert_eq!(first.status, UnitStatus::AtDistributor);
        assert_eq!(first.current_holder_id, Some(distributor.id));

        let history = unit_history(&db, first.id).await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from_holder_id, Some(manufacturer.id));
        assert_eq!(history[0].to_holder_id, Some(distributor.id));

        assert_eq!(units[9].status, UnitStatus::AtManufacturer);
        assert!(unit_history(&db, units[9].id).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_move_units_shortfall_moves_what_is_available() -> Result<()> {
        let (db, manufacturer, distributor, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-SHORT", 3).await?;

        let moved = move_units(
            &db,
            UnitMove {
                batch_id: batch.id,
                from_holder_id: manufacturer.id,
                from_statuses: &UnitStatus::ON_HAND,
                from_shipment_id: None,
                to_holder_id: Some(distributor.id),
                to_status: UnitStatus::InTransit,
                shipment_id: None,
                quantity: 5,
            },
        )
        .await?;
        assert_eq!(moved, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_verify_unit() -> Result<()> {
        let (db, manufacturer, _, _) = setup_supply_chain().await?;
        let batch = create_test_batch(&db, &manufacturer, "B-SCAN", 2).await?;
        let code = units_for_batch(&db, batch.id).await?[0].code.clone();

        let verification = verify_unit(&db, &format!(" {code} ")).await?;
        assert_eq!(verification.batch.id, batch.id);
        assert_eq!(verification.unit.code, code);
        assert!(verification.history.is_empty());
        assert!(verification.is_genuine_and_safe());

        let missing = verify_unit(&db, "not-a-real-code").await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { entity: "Unit", .. }));

        Ok(())
    }
}
