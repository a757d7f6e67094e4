// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Drink Storage Module
//!
//! The menu is kept behind the [`DrinkStore`] trait so handlers never know
//! which backend they talk to.
//!
//! ## Backends
//!
//! - [`MemoryDrinkStore`]: process-local, lost on restart (default)
//! - [`RedbDrinkStore`]: embedded ACID database under `DATA_DIR`
//!
//! Both backends enforce unique titles and hand out increasing ids that are
//! never reused after a delete.

pub mod database;
pub mod memory;

pub use database::RedbDrinkStore;
pub use memory::MemoryDrinkStore;

use crate::models::{Drink, DrinkId, NewDrink};

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("drink {0} not found")]
    NotFound(DrinkId),

    #[error("a drink titled {0:?} already exists")]
    Conflict(String),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Store Trait
// =============================================================================

/// Persistence for the drinks menu.
pub trait DrinkStore: Send + Sync {
    /// Every drink, ordered by id.
    fn list_all(&self) -> StorageResult<Vec<Drink>>;

    fn get_by_id(&self, id: DrinkId) -> StorageResult<Option<Drink>>;

    /// Store a new drink and return it with its assigned id.
    ///
    /// Fails with [`StorageError::Conflict`] if the title is taken.
    fn insert(&self, drink: NewDrink) -> StorageResult<Drink>;

    /// Replace the stored drink with the same id.
    ///
    /// Fails with [`StorageError::NotFound`] for an unknown id and with
    /// [`StorageError::Conflict`] if another drink has the title.
    fn update(&self, drink: Drink) -> StorageResult<Drink>;

    /// Remove a drink, returning it.
    fn delete(&self, id: DrinkId) -> StorageResult<Drink>;
}

/// Add the sample drink when the menu is empty.
///
/// Returns whether a drink was added.
pub fn seed_sample_drink(store: &dyn DrinkStore) -> StorageResult<bool> {
    if !store.list_all()?.is_empty() {
        return Ok(false);
    }
    let drink = store.insert(NewDrink::sample())?;
    tracing::info!(id = drink.id, title = %drink.title, "Seeded sample drink");
    Ok(true)
}
