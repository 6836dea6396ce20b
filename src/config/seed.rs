//! Seed configuration loading from config.toml
//!
//! The seed file lists the parties and medicines a fresh database starts with.
//! Seeding is idempotent: entries that already exist (matched by name) are
//! skipped, so the binary can run it on every start.

use crate::{
    core::{medicine, party},
    entities::party::PartyRole,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_SEED_PATH: &str = "config.toml";

/// Configuration structure representing the entire seed file
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// Parties to create
    #[serde(default)]
    pub parties: Vec<party::NewParty>,
    /// Medicines to register, each under an existing or seeded manufacturer
    #[serde(default)]
    pub medicines: Vec<MedicineSeed>,
}

/// Configuration for a single medicine
#[derive(Debug, Deserialize, Clone)]
pub struct MedicineSeed {
    /// Medicine name, unique per manufacturer
    pub name: String,
    /// Name of the manufacturing party
    pub manufacturer: String,
    /// Generic (salt) name
    #[serde(default)]
    pub generic_name: Option<String>,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
}

/// What a seeding run created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Parties inserted in this run
    pub parties_created: usize,
    /// Medicines inserted in this run
    pub medicines_created: usize,
}

/// Path of the seed file, from `SEED_CONFIG` or `./config.toml`.
#[must_use]
pub fn get_seed_path() -> String {
    std::env::var("SEED_CONFIG").unwrap_or_else(|_| DEFAULT_SEED_PATH.to_string())
}

/// Parses seed configuration from TOML text.
pub fn parse_seed_config(contents: &str) -> Result<SeedConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed config: {e}"),
    })
}

/// Loads seed configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid seed TOML.
pub fn load_seed_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let path = path.as_ref();
    debug!("Loading seed configuration from {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read seed config {}: {e}", path.display()),
    })?;
    parse_seed_config(&contents)
}

/// Creates the configured parties and medicines that do not exist yet.
pub async fn seed_from_config(db: &DatabaseConnection, config: &SeedConfig) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for new_party in &config.parties {
        if party::get_party_by_name(db, new_party.name.trim())
            .await?
            .is_some()
        {
            debug!("Party '{}' already exists, skipping", new_party.name);
            continue;
        }
        party::create_party(db, new_party.clone()).await?;
        summary.parties_created += 1;
    }

    for seed in &config.medicines {
        let manufacturer = party::get_party_by_name(db, seed.manufacturer.trim())
            .await?
            .ok_or_else(|| Error::Config {
                message: format!(
                    "Medicine '{}' names unknown manufacturer '{}'",
                    seed.name, seed.manufacturer
                ),
            })?;
        if manufacturer.role != PartyRole::Manufacturer {
            return Err(Error::Config {
                message: format!(
                    "Medicine '{}' names '{}', which is a {}",
                    seed.name, manufacturer.name, manufacturer.role
                ),
            });
        }
        if medicine::get_medicine_by_name(db, manufacturer.id, seed.name.trim())
            .await?
            .is_some()
        {
            continue;
        }
        medicine::create_medicine(
            db,
            manufacturer.id,
            &seed.name,
            seed.generic_name.clone(),
            seed.description.clone(),
        )
        .await?;
        summary.medicines_created += 1;
    }

    info!(
        "Seeding created {} parties and {} medicines",
        summary.parties_created, summary.medicines_created
    );
    Ok(summary)
}
