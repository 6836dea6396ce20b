//! Request-scoped identity passed into every action.
//!
//! The session layer resolves the caller once per request and hands a
//! [`RequestContext`] down; nothing in the crate reads identity from ambient state.

use crate::{
    entities::party::PartyRole,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Party the caller acts as
    pub party_id: i64,
    /// Role the session layer authenticated the caller with
    pub role: PartyRole,
}

impl RequestContext {
    /// Creates a context for the given party and role.
    #[must_use]
    pub const fn new(party_id: i64, role: PartyRole) -> Self {
        Self { party_id, role }
    }

    /// Fails with `Unauthorized` unless the caller has `role`.
    pub fn require_role(&self, role: PartyRole) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(Error::unauthorized(format!(
                "this action requires role {role}, caller is {}",
                self.role
            )))
        }
    }

    /// Fails with `Unauthorized` unless the caller is `party_id`.
    pub fn require_party(&self, party_id: i64, what: &str) -> Result<()> {
        if self.party_id == party_id {
            Ok(())
        } else {
            Err(Error::unauthorized(format!(
                "party {} is not the {what}",
                self.party_id
            )))
        }
    }
}
