//! Player loadout state: chosen core, socket selections and part stock.
//!
//! The [`Session`] is an ordinary owned value (and a Bevy [`Resource`]) that
//! the UI and the assembler both borrow. Nothing reaches it through a
//! global, so tests can run as many independent sessions as they like.
//!
//! Selections are keyed by socket key (see [`Socket::key`]) and outlive the
//! assembly they were made against: swapping a torso keeps the arm entries
//! around, they simply stop matching until a torso with those sockets
//! returns.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::error::SelectionError;
use crate::part::{Part, PartCatalog, PartCategory, PartId, Tier};
use crate::socket::Socket;

/// Socket key → selected part.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    entries: HashMap<String, Arc<Part>>,
}

impl Selection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Part selected for the socket `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Arc<Part>> {
        self.entries.get(key)
    }

    /// Selects `part` for the socket `key`, returning the previous part.
    pub fn insert(&mut self, key: impl Into<String>, part: Arc<Part>) -> Option<Arc<Part>> {
        self.entries.insert(key.into(), part)
    }

    /// Clears the socket `key`, returning what was there.
    pub fn remove(&mut self, key: &str) -> Option<Arc<Part>> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Part>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// How many of each part the player owns and has not equipped.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    counts: HashMap<PartId, u32>,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stock of one part.
    pub fn with_stock(mut self, id: impl Into<PartId>, count: u32) -> Self {
        self.set(id, count);
        self
    }

    /// Units of `id` in stock. Unknown parts count as zero.
    pub fn count(&self, id: &PartId) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn set(&mut self, id: impl Into<PartId>, count: u32) {
        self.counts.insert(id.into(), count);
    }

    /// Puts one unit back.
    pub fn increment(&mut self, id: &PartId) {
        *self.counts.entry(id.clone()).or_insert(0) += 1;
    }

    /// Takes one unit. Returns `false` (and changes nothing) when out of
    /// stock.
    pub fn decrement(&mut self, id: &PartId) -> bool {
        match self.counts.get_mut(id) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Outcome of [`Session::equip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Equipped {
        part: PartId,
        replaced: Option<PartId>,
    },
    /// The part was already on the socket and has been taken off.
    Unequipped { part: PartId },
}

/// The player's loadout: catalog, stock, socket choices and core.
#[derive(Resource, Debug, Clone, Default)]
pub struct Session {
    catalog: PartCatalog,
    inventory: Inventory,
    selection: Selection,
    core: Option<Arc<Part>>,
}

impl Session {
    /// Creates a session over `catalog` with an empty inventory.
    pub fn new(catalog: PartCatalog) -> Self {
        Self {
            catalog,
            ..default()
        }
    }

    /// Replaces the starting inventory.
    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn catalog(&self) -> &PartCatalog {
        &self.catalog
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The chosen core part.
    pub fn core(&self) -> Option<&Arc<Part>> {
        self.core.as_ref()
    }

    /// Chooses the core. Only [`PartCategory::Core`] parts are accepted.
    /// Socket selections are kept.
    pub fn select_core(&mut self, part: Arc<Part>) -> Result<(), SelectionError> {
        if part.category != PartCategory::Core {
            return Err(SelectionError::NotACore(part.id.clone()));
        }
        debug!("selected core {}", part.id);
        self.core = Some(part);
        Ok(())
    }

    /// Parts the player may pick for `category`. Without a core only cores
    /// are offered; afterwards the core's tier allowance caps the list.
    pub fn available_parts(&self, category: PartCategory) -> Vec<Arc<Part>> {
        match &self.core {
            None => self.catalog.parts_by_category(PartCategory::Core, Tier::T3),
            Some(core) => self
                .catalog
                .parts_by_category(category, core.max_allowed_tier),
        }
    }

    /// Player-facing equip: validates against the live socket, toggles off
    /// when the same part is picked again, and keeps the inventory in step.
    pub fn equip(
        &mut self,
        socket: &Socket,
        part: Arc<Part>,
    ) -> Result<SelectionChange, SelectionError> {
        socket.accepts(&part)?;
        let key = socket.key();

        let already_equipped = self
            .selection
            .get(&key)
            .is_some_and(|current| current.id == part.id);
        if already_equipped {
            self.selection.remove(&key);
            self.inventory.increment(&part.id);
            debug!("unequipped {} from socket {}", part.id, key);
            return Ok(SelectionChange::Unequipped {
                part: part.id.clone(),
            });
        }

        if !self.inventory.decrement(&part.id) {
            return Err(SelectionError::OutOfStock(part.id.clone()));
        }

        let replaced = self.selection.insert(key.clone(), part.clone()).map(|old| {
            self.inventory.increment(&old.id);
            old.id.clone()
        });
        debug!("equipped {} on socket {}", part.id, key);

        Ok(SelectionChange::Equipped {
            part: part.id.clone(),
            replaced,
        })
    }

    /// Raw mapping write, bypassing validation and inventory. Used when
    /// restoring a saved loadout.
    pub fn select_part_for_socket(
        &mut self,
        key: impl Into<String>,
        part: Arc<Part>,
    ) -> Option<Arc<Part>> {
        self.selection.insert(key, part)
    }

    /// Removes the entry for `key` and refunds it.
    pub fn unselect(&mut self, key: &str) -> Result<Arc<Part>, SelectionError> {
        let part = self
            .selection
            .remove(key)
            .ok_or_else(|| SelectionError::NothingEquipped(key.to_string()))?;
        self.inventory.increment(&part.id);
        Ok(part)
    }

    /// A core and at least one torso are selected.
    pub fn is_complete(&self) -> bool {
        self.core.is_some()
            && self
                .selection
                .iter()
                .any(|(_, part)| part.category == PartCategory::Torso)
    }
}
