//! Identifier generation.

use uuid::Uuid;

/// Source of globally unique identifiers for new entities.
///
/// Aggregates never predict or reuse identifiers; they ask a generator.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Random (v4) UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
