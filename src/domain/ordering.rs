//! Stable ordering of checkpoints and updates for deterministic reconciliation.

use crate::domain::checkpoint::{Checkpoint, CheckpointKind};
use crate::domain::primitives::Version;
use crate::domain::update::UpdateEvent;

/// Stable ordering key for checkpoints.
///
/// Ordering: version -> block_number -> close before open, so a close and a re-open
/// recorded at the same version replay in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CheckpointOrderingKey {
    pub version: Version,
    pub block_number: u64,
    pub kind_rank: u8,
}

impl CheckpointOrderingKey {
    pub fn from_checkpoint(checkpoint: &Checkpoint) -> Self {
        CheckpointOrderingKey {
            version: checkpoint.version,
            block_number: checkpoint.block_number,
            kind_rank: match checkpoint.kind {
                CheckpointKind::Close => 0,
                CheckpointKind::Open => 1,
            },
        }
    }
}

/// Sort checkpoints ascending.
pub fn sort_checkpoints(checkpoints: &mut [Checkpoint]) {
    checkpoints.sort_by_key(CheckpointOrderingKey::from_checkpoint);
}

/// Sort updates ascending by version.
///
/// The indexer pages updates newest first; updates sharing a version keep their
/// relative log order.
pub fn sort_updates_ascending(updates: &mut [UpdateEvent]) {
    updates.reverse();
    updates.sort_by_key(|u| u.version);
}

/// Valid updates strictly after `after`, oldest first.
pub fn pending_tail(updates: &[UpdateEvent], after: Version) -> Vec<UpdateEvent> {
    let mut tail: Vec<UpdateEvent> = updates
        .iter()
        .filter(|u| u.valid && u.version > after)
        .cloned()
        .collect();
    sort_updates_ascending(&mut tail);
    tail
}
