//! Core traits for persistence
//!
//! The engine never talks to a concrete database. Everything it persists goes
//! through [`Store`], so the on-disk engine of the host application (or the
//! [`InMemoryStore`](crate::core::InMemoryStore) used by the CLI and tests)
//! can be swapped freely.

use crate::core::store::ChangeSet;
use crate::types::{Entity, EntityKind, StoreError};

/// Ordering requested from [`Store::fetch_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Commit order
    Insertion,
    /// Movement or price date, ties kept in commit order
    Date,
    /// Catalog symbol, case-insensitive
    Symbol,
}

/// Transactional object store
///
/// Implementations must apply a [`ChangeSet`] atomically: either every staged
/// insert and delete becomes visible, or none does. Readers only ever see
/// committed state.
pub trait Store: Send + Sync {
    /// Fetch every committed entity of `kind`
    fn fetch_all(&self, kind: EntityKind, sort: Option<SortBy>) -> Result<Vec<Entity>, StoreError>;

    /// Apply all staged changes as one unit
    ///
    /// Returns the number of changes applied.
    fn commit(&self, changes: ChangeSet) -> Result<usize, StoreError>;
}
