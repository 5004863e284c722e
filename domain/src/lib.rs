//! Domain library for the Item store.
//!
//! This crate holds the item types, the repository port (trait), the query
//! builder shared by every backend, and error definitions. It only depends on
//! `serde`; keep adapters and IO concerns out of this crate.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Maximum length (in chars) of an item name, as declared by the `item` table.
pub const ITEM_NAME_MAX_CHARS: usize = 10;

/// Stored item.
///
/// `id` is `None` until the item has been saved; the store assigns it once
/// and it never changes afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<i64>,
    pub name: String,
    pub price: i32,
    pub quantity: i32,
}

impl Item {
    /// Create an unsaved item (no id yet).
    pub fn new<S: Into<String>>(name: S, price: i32, quantity: i32) -> Self {
        Self {
            id: None,
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Same item carrying the id assigned by a store.
    pub fn with_id(self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// Overwrite every mutable field. The id is untouched.
    pub fn apply(&mut self, update: &ItemUpdate) {
        self.name = update.name.clone();
        self.price = update.price;
        self.quantity = update.quantity;
    }
}

/// Replacement values for an existing item. The id is passed separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: String,
    pub price: i32,
    pub quantity: i32,
}

impl ItemUpdate {
    pub fn new<S: Into<String>>(name: S, price: i32, quantity: i32) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
        }
    }
}

/// Optional filters for `find_all`. A missing (or blank) field places no
/// constraint on the result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSearch {
    #[serde(default, rename = "name")]
    pub name_pattern: Option<String>,
    #[serde(default)]
    pub max_price: Option<i32>,
}

impl ItemSearch {
    pub fn new(name_pattern: Option<&str>, max_price: Option<i32>) -> Self {
        Self {
            name_pattern: name_pattern.map(str::to_string),
            max_price,
        }
    }

    /// Filter matching every item.
    pub fn all() -> Self {
        Self::default()
    }
}

/// Repository port for persisting and loading items.
///
/// Every backend must produce identical observable results for the same
/// sequence of calls, including `find_all` ordering (insertion order).
pub trait ItemRepository: Send + Sync {
    /// Persist a new item and return it with its generated id.
    /// Fails with `InvalidItem` when the item already has an id.
    fn save(&self, item: Item) -> Result<Item, CoreError>;
    /// Replace name, price and quantity of an existing item.
    /// Fails with `NotFound` when no item has this id.
    fn update(&self, id: i64, update: &ItemUpdate) -> Result<(), CoreError>;
    /// Look up a single item; a missing id is `Ok(None)`.
    fn find_by_id(&self, id: i64) -> Result<Option<Item>, CoreError>;
    /// All items matching the search, in insertion order.
    fn find_all(&self, search: &ItemSearch) -> Result<Vec<Item>, CoreError>;
}

/// Core domain errors (no external error crates to keep deps minimal).
#[derive(Debug)]
pub enum CoreError {
    InvalidItem(String),
    NotFound,
    Repository(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidItem(msg) => write!(f, "invalid item: {}", msg),
            CoreError::NotFound => write!(f, "not found"),
            CoreError::Repository(msg) => write!(f, "repository error: {}", msg),
        }
    }
}

impl Error for CoreError {}

/// Return a short about/version line for the binary to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{} - item store domain library", pkg, ver)
}

pub mod adapters;
pub mod query;
pub mod service;
pub mod validate;
