//! Staged changes, the in-memory store and store-level operations
//!
//! This module provides:
//! - [`ChangeSet`]: the staging list of pending inserts and deletes
//! - [`InMemoryStore`]: a thread-safe [`Store`] backed by `DashMap`
//! - catalog bootstrap and snapshot loading
//! - the bulk wipe and the price-feed update hook
//!
//! # Atomicity
//!
//! A commit is validated in full before anything is applied. Inserting an id
//! that already exists, or deleting one that does not, rejects the whole
//! change set and leaves the store untouched.

use crate::core::traits::{SortBy, Store};
use crate::types::{
    Asset, AssetId, Catalog, CatalogError, Entity, EntityKind, FiatCurrency, HistoricalPrice,
    StoreError, Wallet,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// A single staged change
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert(Entity),
    Delete { kind: EntityKind, id: Uuid },
}

/// Staging list of pending changes, applied by [`Store::commit`]
///
/// Dropping a change set without committing it discards every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) {
        self.changes.push(Change::Insert(entity));
    }

    pub fn delete(&mut self, entity: &Entity) {
        self.delete_by_id(entity.kind(), entity.id());
    }

    pub fn delete_by_id(&mut self, kind: EntityKind, id: Uuid) {
        self.changes.push(Change::Delete { kind, id });
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }
}

/// Thread-safe in-memory store
///
/// Committed entities live in one `Vec` per kind, kept in commit order.
/// Commits are serialized; reads run concurrently with them and may observe
/// one kind updated before another.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: DashMap<EntityKind, Vec<Entity>>,
    commit_lock: Mutex<()>,
    fail_next_commit: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with [`StoreError::CommitFailed`]
    ///
    /// Lets callers exercise the "commit failed, nothing imported" path.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of committed entities of `kind`
    pub fn count(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map(|table| table.len()).unwrap_or(0)
    }

    /// Check every change against committed state plus earlier changes
    fn validate(&self, changes: &ChangeSet) -> Result<(), StoreError> {
        let mut live: HashMap<EntityKind, HashSet<Uuid>> = HashMap::new();

        for change in changes.changes() {
            let kind = match change {
                Change::Insert(entity) => entity.kind(),
                Change::Delete { kind, .. } => *kind,
            };
            let ids = live.entry(kind).or_insert_with(|| {
                self.tables
                    .get(&kind)
                    .map(|table| table.iter().map(Entity::id).collect())
                    .unwrap_or_default()
            });

            match change {
                Change::Insert(entity) => {
                    if !ids.insert(entity.id()) {
                        return Err(StoreError::DuplicateId {
                            kind,
                            id: entity.id(),
                        });
                    }
                }
                Change::Delete { id, .. } => {
                    if !ids.remove(id) {
                        return Err(StoreError::NotFound { kind, id: *id });
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply validated changes in order, coalescing runs of deletes
    fn apply(&self, changes: ChangeSet) {
        let mut pending_deletes: Option<(EntityKind, HashSet<Uuid>)> = None;

        for change in changes.changes {
            match change {
                Change::Delete { kind, id } => match pending_deletes.as_mut() {
                    Some((pending_kind, ids)) if *pending_kind == kind => {
                        ids.insert(id);
                    }
                    _ => {
                        self.flush_deletes(pending_deletes.take());
                        pending_deletes = Some((kind, HashSet::from([id])));
                    }
                },
                Change::Insert(entity) => {
                    self.flush_deletes(pending_deletes.take());
                    self.tables.entry(entity.kind()).or_default().push(entity);
                }
            }
        }

        self.flush_deletes(pending_deletes);
    }

    fn flush_deletes(&self, pending: Option<(EntityKind, HashSet<Uuid>)>) {
        if let Some((kind, ids)) = pending {
            if let Some(mut table) = self.tables.get_mut(&kind) {
                table.retain(|entity| !ids.contains(&entity.id()));
            }
        }
    }
}

impl Store for InMemoryStore {
    fn fetch_all(&self, kind: EntityKind, sort: Option<SortBy>) -> Result<Vec<Entity>, StoreError> {
        let mut entities = self
            .tables
            .get(&kind)
            .map(|table| table.value().clone())
            .unwrap_or_default();

        match sort {
            None | Some(SortBy::Insertion) => {}
            Some(SortBy::Date) => entities.sort_by_key(Entity::date),
            Some(SortBy::Symbol) => {
                entities.sort_by_key(|entity| entity.symbol().map(str::to_uppercase))
            }
        }

        Ok(entities)
    }

    fn commit(&self, changes: ChangeSet) -> Result<usize, StoreError> {
        let _guard = self
            .commit_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::commit_failed("simulated storage failure"));
        }

        self.validate(&changes)?;
        let applied = changes.len();
        self.apply(changes);
        debug!(applied, "store commit applied");
        Ok(applied)
    }
}

/// Build a catalog snapshot from the store's committed catalog entities
///
/// Entries are ordered by symbol, so price updates do not reorder reports.
pub fn load_catalog(store: &dyn Store) -> Result<Catalog, CatalogError> {
    let assets = store
        .fetch_all(EntityKind::Asset, Some(SortBy::Symbol))?
        .into_iter()
        .filter_map(Entity::into_asset)
        .collect();
    let fiats = store
        .fetch_all(EntityKind::Fiat, Some(SortBy::Symbol))?
        .into_iter()
        .filter_map(Entity::into_fiat)
        .collect();
    let wallets = store
        .fetch_all(EntityKind::Wallet, Some(SortBy::Symbol))?
        .into_iter()
        .filter_map(Entity::into_wallet)
        .collect();

    Catalog::new(assets, fiats, wallets)
}

/// Commit new catalog entries and return the resulting snapshot
///
/// The new entries are validated together with the ones already stored, so a
/// symbol that clashes with an existing entry rejects the whole bootstrap.
pub fn bootstrap_catalog(
    store: &dyn Store,
    assets: Vec<Asset>,
    fiats: Vec<FiatCurrency>,
    wallets: Vec<Wallet>,
) -> Result<Catalog, CatalogError> {
    let current = load_catalog(store)?;

    let mut changes = ChangeSet::new();
    changes_for(&mut changes, &assets, |a| Entity::Asset(a.clone()));
    changes_for(&mut changes, &fiats, |f| Entity::Fiat(f.clone()));
    changes_for(&mut changes, &wallets, |w| Entity::Wallet(w.clone()));

    Catalog::new(
        current.assets().iter().cloned().chain(assets).collect(),
        current.fiats().iter().cloned().chain(fiats).collect(),
        current.wallets().iter().cloned().chain(wallets).collect(),
    )?;

    store.commit(changes)?;
    load_catalog(store)
}

fn changes_for<T>(changes: &mut ChangeSet, items: &[T], wrap: impl Fn(&T) -> Entity) {
    for item in items {
        changes.insert(wrap(item));
    }
}

/// Delete every entity, dependents first, as one committed unit
///
/// Order: deposits, withdrawals, transfers, swaps, historical prices, price
/// sync configs, wallets, assets, fiat currencies.
pub fn wipe_all(store: &dyn Store) -> Result<usize, StoreError> {
    let mut changes = ChangeSet::new();
    for kind in EntityKind::WIPE_ORDER {
        for entity in store.fetch_all(kind, None)? {
            changes.delete(&entity);
        }
    }
    store.commit(changes)
}

/// Record a new price for an asset
///
/// Replaces the stored asset with one carrying `price_usd` and `at`, and
/// appends a [`HistoricalPrice`], in a single commit. This is the hook the
/// external price feed calls.
pub fn apply_price_update(
    store: &dyn Store,
    asset_id: AssetId,
    price_usd: Decimal,
    at: DateTime<Utc>,
) -> Result<Asset, StoreError> {
    let current = store
        .fetch_all(EntityKind::Asset, None)?
        .into_iter()
        .filter_map(Entity::into_asset)
        .find(|asset| asset.id == asset_id)
        .ok_or(StoreError::NotFound {
            kind: EntityKind::Asset,
            id: asset_id,
        })?;

    let updated = Asset {
        current_price_usd: price_usd,
        last_updated: at,
        ..current.clone()
    };

    let mut changes = ChangeSet::new();
    changes.delete(&Entity::Asset(current));
    changes.insert(Entity::Asset(updated.clone()));
    changes.insert(Entity::HistoricalPrice(HistoricalPrice {
        id: Uuid::new_v4(),
        asset_id,
        date: at.date_naive(),
        price_usd,
    }));
    store.commit(changes)?;

    Ok(updated)
}
