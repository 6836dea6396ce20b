use chrono::Utc;
use dotenvy::dotenv;
use medtrace::{
    config::{database, seed},
    core::{party, report},
    entities::party::PartyRole,
    errors::Result,
};
use sea_orm::Iterable;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema is ready"))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed parties and medicines
    let seed_path = seed::get_seed_path();
    if Path::new(&seed_path).exists() {
        let config = seed::load_seed_config(&seed_path)
            .inspect_err(|e| error!("Invalid seed file {}: {}", seed_path, e))?;
        seed::seed_from_config(&db, &config).await?;
    } else {
        warn!("Seed file {} not found, skipping seeding", seed_path);
    }

    // 5. Summarize what every holder has on hand
    let today = Utc::now().date_naive();
    for role in PartyRole::iter() {
        for holder in party::list_parties_by_role(&db, role).await? {
            let lines = report::holder_stock_report(
                &db,
                holder.id,
                today,
                report::DEFAULT_EXPIRY_WINDOW_DAYS,
            )
            .await?;
            info!("{} ({}): {} batch(es) in stock", holder.name, role, lines.len());
            for line in &lines {
                info!("  {}", report::format_stock_line(line));
            }
        }
    }

    Ok(())
}
