use crate::{CoreError, Item, ItemRepository, ItemSearch, ItemUpdate};

/// Application service over an item repository.
///
/// Delegates every call unchanged. Callers depend on this type instead of a
/// concrete storage technology; which repository backs it is decided once,
/// where the service is constructed.
pub struct ItemService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> ItemService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persist a new item and return it with its generated id.
    pub fn save(&self, item: Item) -> Result<Item, CoreError> {
        self.repo.save(item)
    }

    /// Replace name, price and quantity of an existing item.
    pub fn update(&self, id: i64, update: &ItemUpdate) -> Result<(), CoreError> {
        self.repo.update(id, update)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Item>, CoreError> {
        self.repo.find_by_id(id)
    }

    /// Items matching the search, in insertion order.
    pub fn find_items(&self, search: &ItemSearch) -> Result<Vec<Item>, CoreError> {
        self.repo.find_all(search)
    }
}
