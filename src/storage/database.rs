// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded drink database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `drinks`: id → serialized Drink
//! - `drink_titles`: title → id (uniqueness index)
//! - `menu_meta`: key → value (id counter)

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{DrinkStore, StorageError, StorageResult};
use crate::models::{Drink, DrinkId, NewDrink};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: id → serialized Drink (JSON bytes).
const DRINKS: TableDefinition<u64, &[u8]> = TableDefinition::new("drinks");

/// Index: title → id.
const DRINK_TITLES: TableDefinition<&str, u64> = TableDefinition::new("drink_titles");

const MENU_META: TableDefinition<&str, u64> = TableDefinition::new("menu_meta");

const LAST_ID_KEY: &str = "last_id";

// =============================================================================
// RedbDrinkStore
// =============================================================================

pub struct RedbDrinkStore {
    db: Database,
}

impl RedbDrinkStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "Could not create data directory");
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DRINKS)?;
            let _ = write_txn.open_table(DRINK_TITLES)?;
            let _ = write_txn.open_table(MENU_META)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Opened drink database");
        Ok(Self { db })
    }
}

impl DrinkStore for RedbDrinkStore {
    fn list_all(&self) -> StorageResult<Vec<Drink>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;

        let mut drinks = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            drinks.push(serde_json::from_slice(value.value())?);
        }
        Ok(drinks)
    }

    fn get_by_id(&self, id: DrinkId) -> StorageResult<Option<Drink>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn insert(&self, drink: NewDrink) -> StorageResult<Drink> {
        let write_txn = self.db.begin_write()?;
        let stored = {
            let mut titles = write_txn.open_table(DRINK_TITLES)?;
            if titles.get(drink.title.as_str())?.is_some() {
                return Err(StorageError::Conflict(drink.title));
            }

            let mut meta = write_txn.open_table(MENU_META)?;
            let last_id = meta.get(LAST_ID_KEY)?.map(|v| v.value()).unwrap_or(0);
            let stored = Drink {
                id: last_id + 1,
                title: drink.title,
                recipe: drink.recipe,
            };
            meta.insert(LAST_ID_KEY, stored.id)?;
            titles.insert(stored.title.as_str(), stored.id)?;

            let json = serde_json::to_vec(&stored)?;
            let mut drinks = write_txn.open_table(DRINKS)?;
            drinks.insert(stored.id, json.as_slice())?;
            stored
        };
        write_txn.commit()?;
        Ok(stored)
    }

    fn update(&self, drink: Drink) -> StorageResult<Drink> {
        let write_txn = self.db.begin_write()?;
        {
            let mut drinks = write_txn.open_table(DRINKS)?;
            let previous: Drink = match drinks.get(drink.id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StorageError::NotFound(drink.id)),
            };

            if previous.title != drink.title {
                let mut titles = write_txn.open_table(DRINK_TITLES)?;
                if titles.get(drink.title.as_str())?.is_some() {
                    return Err(StorageError::Conflict(drink.title));
                }
                titles.remove(previous.title.as_str())?;
                titles.insert(drink.title.as_str(), drink.id)?;
            }

            let json = serde_json::to_vec(&drink)?;
            drinks.insert(drink.id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(drink)
    }

    fn delete(&self, id: DrinkId) -> StorageResult<Drink> {
        let write_txn = self.db.begin_write()?;
        let removed: Drink = {
            let mut drinks = write_txn.open_table(DRINKS)?;
            let removed: Drink = match drinks.remove(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StorageError::NotFound(id)),
            };
            let mut titles = write_txn.open_table(DRINK_TITLES)?;
            titles.remove(removed.title.as_str())?;
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

// =============================================================================
// Tests
// =============================================================================
