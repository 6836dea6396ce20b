//! Movement business logic - The append-only lineage of every batch.
//!
//! Each movement records one transfer. Its parent is the most recent earlier
//! movement of the same batch that delivered stock to the new movement's sender,
//! which makes the movements of a batch a forest rooted at the `MANUFACTURED`
//! record written when the batch was created.

use crate::{
    entities::{Movement, movement, movement::MovementRole},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Root movement written when a batch is created
pub const STATUS_MANUFACTURED: &str = "MANUFACTURED";
/// Stock dispatched to another holder
pub const STATUS_IN_TRANSIT: &str = "IN_TRANSIT";
/// Stock sold to a consumer
pub const STATUS_SOLD: &str = "SOLD";
/// Recalled stock sent back to the manufacturer
pub const STATUS_RETURNED: &str = "RETURNED";
/// Recalled stock destroyed
pub const STATUS_DESTROYED: &str = "DESTROYED";

/// A movement about to be recorded. The parent is resolved on insert.
#[derive(Debug, Clone)]
pub struct NewMovement {
    /// Batch that moved
    pub batch_id: i64,
    /// Sending party, None for the root movement
    pub sender_id: Option<i64>,
    /// Sender's name at the time of the movement
    pub sender_name: Option<String>,
    /// Receiving party, None when stock leaves the chain
    pub receiver_id: Option<i64>,
    /// Receiver's name, or the consumer's
    pub receiver_name: Option<String>,
    /// Role the receiver plays in this hop
    pub role: MovementRole,
    /// Strips moved
    pub quantity: i64,
    /// One of the `STATUS_*` constants
    pub status: String,
    /// Where the movement happened
    pub location: Option<String>,
}

/// One movement with the movements that continued from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementNode {
    /// The movement itself
    pub movement: movement::Model,
    /// Movements whose parent is this one
    pub children: Vec<MovementNode>,
}

/// Appends a movement, linking it to the movement that delivered the stock to
/// its sender.
///
/// The parent lookup is a plain read inside the caller's transaction; it takes
/// no lock, so two transactions moving the same batch out of the same holder
/// can resolve the same parent.
#[instrument(skip(db))]
pub async fn record_movement<C>(db: &C, new_movement: NewMovement) -> Result<movement::Model>
where
    C: ConnectionTrait,
{
    if new_movement.quantity <= 0 {
        return Err(Error::validation(format!(
            "Movement quantity must be positive, got {}",
            new_movement.quantity
        )));
    }

    let parent_id = resolve_parent(db, new_movement.batch_id, new_movement.sender_id).await?;

    let movement = movement::ActiveModel {
        batch_id: Set(new_movement.batch_id),
        sender_id: Set(new_movement.sender_id),
        receiver_id: Set(new_movement.receiver_id),
        sender_name: Set(new_movement.sender_name),
        receiver_name: Set(new_movement.receiver_name),
        role: Set(new_movement.role),
        quantity: Set(new_movement.quantity),
        status: Set(new_movement.status),
        location: Set(new_movement.location),
        created_at: Set(Utc::now()),
        parent_id: Set(parent_id),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!(
        "Recorded movement {} ({}) for batch {} with parent {:?}",
        movement.id, movement.status, movement.batch_id, movement.parent_id
    );
    Ok(movement)
}

/// The most recent movement of `batch_id` received by `sender_id`.
async fn resolve_parent<C>(db: &C, batch_id: i64, sender_id: Option<i64>) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let Some(sender_id) = sender_id else {
        return Ok(None);
    };

    let parent = Movement::find()
        .filter(movement::Column::BatchId.eq(batch_id))
        .filter(movement::Column::ReceiverId.eq(sender_id))
        .order_by_desc(movement::Column::Id)
        .one(db)
        .await?;
    Ok(parent.map(|m| m.id))
}

/// Finds a movement by id, failing with `NotFound` if it does not exist.
pub async fn require_movement<C>(db: &C, movement_id: i64) -> Result<movement::Model>
where
    C: ConnectionTrait,
{
    Movement::find_by_id(movement_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Movement", movement_id))
}

/// Follows parent links from `movement_id` to the root and returns the chain
/// root first.
///
/// A parent link that points back into the chain is reported as a validation
/// error rather than followed.
pub async fn trace_provenance<C>(db: &C, movement_id: i64) -> Result<Vec<movement::Model>>
where
    C: ConnectionTrait,
{
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut next = Some(movement_id);

    while let Some(id) = next {
        if !seen.insert(id) {
            return Err(Error::validation(format!(
                "Movement {id} appears twice in the provenance of movement {movement_id}"
            )));
        }
        let movement = require_movement(db, id).await?;
        next = movement.parent_id;
        chain.push(movement);
    }

    chain.reverse();
    Ok(chain)
}

/// All movements of a batch in the order they were recorded.
pub async fn movements_for_batch<C>(db: &C, batch_id: i64) -> Result<Vec<movement::Model>>
where
    C: ConnectionTrait,
{
    Movement::find()
        .filter(movement::Column::BatchId.eq(batch_id))
        .order_by_asc(movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Movements a party took part in, as sender or receiver, newest first.
pub async fn movements_for_party<C>(db: &C, party_id: i64) -> Result<Vec<movement::Model>>
where
    C: ConnectionTrait,
{
    Movement::find()
        .filter(
            Condition::any()
                .add(movement::Column::SenderId.eq(party_id))
                .add(movement::Column::ReceiverId.eq(party_id)),
        )
        .order_by_desc(movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The distribution tree of a batch.
pub async fn distribution_tree<C>(db: &C, batch_id: i64) -> Result<Vec<MovementNode>>
where
    C: ConnectionTrait,
{
    Ok(build_tree(movements_for_batch(db, batch_id).await?))
}

/// Nests movements under their parents. Movements without a parent in the
/// input become roots; siblings keep their input order.
#[must_use]
pub fn build_tree(movements: Vec<movement::Model>) -> Vec<MovementNode> {
    let ids: HashSet<i64> = movements.iter().map(|m| m.id).collect();
    let mut children: HashMap<i64, Vec<movement::Model>> = HashMap::new();
    let mut roots = Vec::new();

    for movement in movements {
        match movement.parent_id {
            Some(parent_id) if ids.contains(&parent_id) && parent_id != movement.id => {
                children.entry(parent_id).or_default().push(movement);
            }
            _ => roots.push(movement),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_children(root, &mut children))
        .collect()
}

fn attach_children(
    movement: movement::Model,
    children: &mut HashMap<i64, Vec<movement::Model>>,
) -> MovementNode {
    let kids = children.remove(&movement.id).unwrap_or_default();
    MovementNode {
        movement,
        children: kids
            .into_iter()
            .map(|child| attach_children(child, children))
            .collect(),
    }
}
