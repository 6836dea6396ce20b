//! Party business logic - Registration and lookup of supply-chain holders.

use crate::{
    entities::{Party, party, party::PartyRole},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for registering a party.
#[derive(Debug, Clone, Deserialize)]
pub struct NewParty {
    /// Display name
    pub name: String,
    /// Role in the chain
    pub role: PartyRole,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Address or city
    #[serde(default)]
    pub location: Option<String>,
}

/// Registers a new party after checking that its name is not blank.
#[instrument(skip(db))]
pub async fn create_party<C>(db: &C, new_party: NewParty) -> Result<party::Model>
where
    C: ConnectionTrait,
{
    let name = new_party.name.trim();
    if name.is_empty() {
        return Err(Error::validation("Party name cannot be empty"));
    }

    let party = party::ActiveModel {
        name: Set(name.to_string()),
        role: Set(new_party.role),
        email: Set(new_party.email),
        location: Set(new_party.location),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Registered {} '{}' (id {})", party.role, party.name, party.id);
    Ok(party)
}

/// Finds a party by id, returning None if it does not exist.
pub async fn get_party<C>(db: &C, party_id: i64) -> Result<Option<party::Model>>
where
    C: ConnectionTrait,
{
    Party::find_by_id(party_id).one(db).await.map_err(Into::into)
}

/// Finds a party by id, failing with `NotFound` if it does not exist.
pub async fn require_party<C>(db: &C, party_id: i64) -> Result<party::Model>
where
    C: ConnectionTrait,
{
    get_party(db, party_id)
        .await?
        .ok_or_else(|| Error::not_found("Party", party_id))
}

/// Finds a party by its exact name.
pub async fn get_party_by_name<C>(db: &C, name: &str) -> Result<Option<party::Model>>
where
    C: ConnectionTrait,
{
    Party::find()
        .filter(party::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all parties with the given role, ordered by name.
pub async fn list_parties_by_role<C>(db: &C, role: PartyRole) -> Result<Vec<party::Model>>
where
    C: ConnectionTrait,
{
    Party::find()
        .filter(party::Column::Role.eq(role))
        .order_by_asc(party::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}
