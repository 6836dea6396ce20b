//! Database configuration module for medtrace.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Constraints that span several columns (the one-row-per-holder-and-batch
//! rule of the inventory ledger) are added here as indexes.

use crate::entities::{
    Batch, Inventory, Invoice, Medicine, Movement, Order, OrderItem, Party, Recall, SalesRecord,
    Shipment, ShipmentItem, Unit, UnitTransfer, inventory, movement,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/medtrace.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, or the
/// default local `SQLite` file if it is not set.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// For file-backed `SQLite` URLs the parent directory is created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    ensure_sqlite_dir(&database_url)?;
    info!("Connecting to {}", database_url);

    Database::connect(&database_url).await.map_err(Into::into)
}

fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    debug!("Ensured table {}", entity.table_name());
    Ok(())
}

/// Creates all tables and indexes if they do not exist yet.
///
/// Parent tables are created before the tables that reference them.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Party).await?;
    create_table(db, &schema, Medicine).await?;
    create_table(db, &schema, Batch).await?;
    create_table(db, &schema, Unit).await?;
    create_table(db, &schema, UnitTransfer).await?;
    create_table(db, &schema, Inventory).await?;
    create_table(db, &schema, Movement).await?;
    create_table(db, &schema, Recall).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderItem).await?;
    create_table(db, &schema, Shipment).await?;
    create_table(db, &schema, ShipmentItem).await?;
    create_table(db, &schema, SalesRecord).await?;
    create_table(db, &schema, Invoice).await?;

    let inventory_holder_batch = Index::create()
        .name("idx_inventory_holder_batch")
        .table(Inventory)
        .col(inventory::Column::HolderId)
        .col(inventory::Column::BatchId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&inventory_holder_batch)).await?;

    let movement_parent_lookup = Index::create()
        .name("idx_movements_batch_receiver")
        .table(Movement)
        .col(movement::Column::BatchId)
        .col(movement::Column::ReceiverId)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&movement_parent_lookup)).await?;

    Ok(())
}
