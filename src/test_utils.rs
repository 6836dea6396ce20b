//! Shared test utilities for medtrace.
//!
//! This module provides helpers for setting up in-memory test databases and
//! building a small supply chain with sensible defaults.

use crate::{
    context::RequestContext,
    core::{
        batch::{self, NewBatch},
        medicine, party,
        recall::{self, NewRecall},
        shipment::{self, LineItem},
    },
    entities::{
        self,
        party::PartyRole,
        recall::{RecallAction, RecallSeverity},
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Medicine used by [`create_test_batch`]
pub const TEST_MEDICINE: &str = "Paracetamol 500";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("medtrace=debug")
        .with_test_writer()
        .try_init();
}

/// Builds a calendar date, panicking on an invalid one.
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Request context acting as `party` with its own role.
pub const fn ctx_for(party: &entities::party::Model) -> RequestContext {
    RequestContext::new(party.id, party.role)
}

/// Creates a party with no email or location.
pub async fn create_test_party(
    db: &DatabaseConnection,
    name: &str,
    role: PartyRole,
) -> Result<entities::party::Model> {
    party::create_party(
        db,
        party::NewParty {
            name: name.to_string(),
            role,
            email: None,
            location: None,
        },
    )
    .await
}

/// Sets up a database with one party per role.
/// Returns (db, manufacturer, distributor, retailer).
pub async fn setup_supply_chain() -> Result<(
    DatabaseConnection,
    entities::party::Model,
    entities::party::Model,
    entities::party::Model,
)> {
    init_test_tracing();
    let db = setup_test_db().await?;
    let manufacturer = create_test_party(&db, "Acme Pharma", PartyRole::Manufacturer).await?;
    let distributor = create_test_party(&db, "Metro Distribution", PartyRole::Distributor).await?;
    let retailer = create_test_party(&db, "Corner Chemist", PartyRole::Retailer).await?;
    Ok((db, manufacturer, distributor, retailer))
}

/// Registers a medicine for `manufacturer`.
pub async fn create_test_medicine(
    db: &DatabaseConnection,
    manufacturer: &entities::party::Model,
    name: &str,
) -> Result<entities::medicine::Model> {
    medicine::create_medicine(db, manufacturer.id, name, None, None).await
}

/// Creates a batch of [`TEST_MEDICINE`] as `manufacturer`.
///
/// # Defaults
/// * manufactured 2026-01-01, expires 2028-01-01
/// * `price_per_unit`: 12.5
/// * `mrp`: 20.0
pub async fn create_test_batch(
    db: &DatabaseConnection,
    manufacturer: &entities::party::Model,
    batch_number: &str,
    total_strips: i64,
) -> Result<entities::batch::Model> {
    let medicine = match medicine::get_medicine_by_name(db, manufacturer.id, TEST_MEDICINE).await? {
        Some(existing) => existing,
        None => create_test_medicine(db, manufacturer, TEST_MEDICINE).await?,
    };

    batch::create_batch(
        db,
        &ctx_for(manufacturer),
        NewBatch {
            batch_number: batch_number.to_string(),
            medicine_id: medicine.id,
            manufacture_date: date(2026, 1, 1),
            expiry_date: date(2028, 1, 1),
            price_per_unit: 12.5,
            mrp: 20.0,
            total_strips,
        },
    )
    .await
}

/// Dispatches `quantity` strips of a batch from `sender` to `receiver` and
/// confirms delivery.
pub async fn ship_and_receive(
    db: &DatabaseConnection,
    sender: &entities::party::Model,
    receiver: &entities::party::Model,
    batch_id: i64,
    quantity: i64,
) -> Result<entities::shipment::Model> {
    let details = shipment::dispatch_shipment(
        db,
        &ctx_for(sender),
        receiver.id,
        vec![LineItem { batch_id, quantity }],
        None,
    )
    .await?;
    let receipt = shipment::receive_shipment(db, &ctx_for(receiver), details.shipment.id).await?;
    Ok(receipt.shipment)
}

/// Issues a `HIGH` severity return recall against a batch.
pub async fn recall_test_batch(
    db: &DatabaseConnection,
    manufacturer: &entities::party::Model,
    batch_id: i64,
) -> Result<entities::recall::Model> {
    let outcome = recall::issue_recall(
        db,
        &ctx_for(manufacturer),
        NewRecall {
            batch_id,
            reason: "Failed dissolution test".to_string(),
            severity: RecallSeverity::High,
            action_type: RecallAction::Return,
        },
    )
    .await?;
    Ok(outcome.recall)
}
