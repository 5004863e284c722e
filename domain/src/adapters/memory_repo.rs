use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::validate::check_item_name;
use crate::{CoreError, Item, ItemRepository, ItemSearch, ItemUpdate};

/// In-memory item store. A single mutex guards the map and the id sequence.
///
/// Items are keyed by id in a `BTreeMap`; ids only grow, so iteration order
/// is insertion order.
pub struct InMemoryItemRepo {
    inner: Mutex<MemoryStore>,
}

struct MemoryStore {
    items: BTreeMap<i64, Item>,
    last_id: i64,
}

impl InMemoryItemRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryStore {
                items: BTreeMap::new(),
                last_id: 0,
            }),
        }
    }

    /// Drop every stored item. Ids handed out later still never repeat.
    pub fn clear_store(&self) -> Result<(), CoreError> {
        self.lock()?.items.clear();
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryStore>, CoreError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }
}

impl Default for InMemoryItemRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemRepository for InMemoryItemRepo {
    fn save(&self, item: Item) -> Result<Item, CoreError> {
        if item.id.is_some() {
            return Err(CoreError::InvalidItem("id must be unset on save".into()));
        }
        check_item_name(&item.name)?;
        let mut store = self.lock()?;
        store.last_id += 1;
        let id = store.last_id;
        let saved = item.with_id(id);
        store.items.insert(id, saved.clone());
        Ok(saved)
    }

    fn update(&self, id: i64, update: &ItemUpdate) -> Result<(), CoreError> {
        let mut store = self.lock()?;
        // A missing id wins over a bad name, matching the SQL store.
        let Some(item) = store.items.get_mut(&id) else {
            return Err(CoreError::NotFound);
        };
        check_item_name(&update.name)?;
        item.apply(update);
        Ok(())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Item>, CoreError> {
        let store = self.lock()?;
        Ok(store.items.get(&id).cloned())
    }

    fn find_all(&self, search: &ItemSearch) -> Result<Vec<Item>, CoreError> {
        let predicates = search.predicates();
        let store = self.lock()?;
        Ok(store
            .items
            .values()
            .filter(|item| predicates.iter().all(|p| p.matches(item)))
            .cloned()
            .collect())
    }
}
