//! Party entity - Represents a holder in the supply chain.
//!
//! A party is a manufacturer, distributor or retailer. Consumers are not
//! parties; they only appear as the terminal leaf of a sale.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a party plays in the distribution chain
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyRole {
    /// Produces batches
    #[sea_orm(string_value = "MANUFACTURER")]
    Manufacturer,
    /// Buys from manufacturers and supplies retailers
    #[sea_orm(string_value = "DISTRIBUTOR")]
    Distributor,
    /// Sells to consumers
    #[sea_orm(string_value = "RETAILER")]
    Retailer,
}

impl PartyRole {
    /// Position in the chain; stock only flows to a higher rank.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Manufacturer => 0,
            Self::Distributor => 1,
            Self::Retailer => 2,
        }
    }

    /// True when stock may flow from a `self` party to a `receiver` party.
    #[must_use]
    pub const fn supplies(self, receiver: Self) -> bool {
        receiver.rank() > self.rank()
    }
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

/// Party database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parties")]
pub struct Model {
    /// Unique identifier for the party
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, e.g. "Acme Pharma Ltd"
    pub name: String,
    /// Role in the chain
    pub role: PartyRole,
    /// Contact email
    pub email: Option<String>,
    /// Free-form address or city
    pub location: Option<String>,
    /// When the party was registered
    pub created_at: DateTimeUtc,
}

/// Parties are referenced by other tables but reference nothing
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
