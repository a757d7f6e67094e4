// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory drink store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{DrinkStore, StorageError, StorageResult};
use crate::models::{Drink, DrinkId, NewDrink};

#[derive(Default)]
struct Menu {
    drinks: BTreeMap<DrinkId, Drink>,
    last_id: DrinkId,
}

impl Menu {
    fn title_taken(&self, title: &str, except: Option<DrinkId>) -> bool {
        self.drinks
            .values()
            .any(|drink| drink.title == title && Some(drink.id) != except)
    }
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryDrinkStore {
    menu: RwLock<Menu>,
}

impl MemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrinkStore for MemoryDrinkStore {
    fn list_all(&self) -> StorageResult<Vec<Drink>> {
        let menu = self.menu.read().map_err(|_| StorageError::Poisoned)?;
        Ok(menu.drinks.values().cloned().collect())
    }

    fn get_by_id(&self, id: DrinkId) -> StorageResult<Option<Drink>> {
        let menu = self.menu.read().map_err(|_| StorageError::Poisoned)?;
        Ok(menu.drinks.get(&id).cloned())
    }

    fn insert(&self, drink: NewDrink) -> StorageResult<Drink> {
        let mut menu = self.menu.write().map_err(|_| StorageError::Poisoned)?;
        if menu.title_taken(&drink.title, None) {
            return Err(StorageError::Conflict(drink.title));
        }

        menu.last_id += 1;
        let stored = Drink {
            id: menu.last_id,
            title: drink.title,
            recipe: drink.recipe,
        };
        menu.drinks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update(&self, drink: Drink) -> StorageResult<Drink> {
        let mut menu = self.menu.write().map_err(|_| StorageError::Poisoned)?;
        if !menu.drinks.contains_key(&drink.id) {
            return Err(StorageError::NotFound(drink.id));
        }
        if menu.title_taken(&drink.title, Some(drink.id)) {
            return Err(StorageError::Conflict(drink.title));
        }
        menu.drinks.insert(drink.id, drink.clone());
        Ok(drink)
    }

    fn delete(&self, id: DrinkId) -> StorageResult<Drink> {
        let mut menu = self.menu.write().map_err(|_| StorageError::Poisoned)?;
        menu.drinks.remove(&id).ok_or(StorageError::NotFound(id))
    }
}
