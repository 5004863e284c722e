//! Query construction shared by every `ItemRepository` backend.
//!
//! An `ItemSearch` is reduced to an ordered list of `Predicate`s. The memory
//! store evaluates them directly; SQL stores render the same list into a
//! parameterized `WHERE` clause through `SelectQuery`. Both paths read from
//! `ItemSearch::predicates`, so they cannot disagree on which terms apply.

use crate::validate::has_text;
use crate::{Item, ItemSearch};

/// Relational table backing items.
pub const ITEM_TABLE: &str = "item";

/// Field of `Item` a column maps onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemField {
    Id,
    Name,
    Price,
    Quantity,
}

/// One entry of the static column mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub field: ItemField,
}

/// Column/field correspondence for the `item` table, in SELECT order.
pub const ITEM_COLUMNS: [Column; 4] = [
    Column { name: "id", field: ItemField::Id },
    Column { name: "item_name", field: ItemField::Name },
    Column { name: "price", field: ItemField::Price },
    Column { name: "quantity", field: ItemField::Quantity },
];

/// Column name for a field.
pub fn column_for(field: ItemField) -> &'static str {
    // ITEM_COLUMNS lists every field exactly once
    match field {
        ItemField::Id => ITEM_COLUMNS[0].name,
        ItemField::Name => ITEM_COLUMNS[1].name,
        ItemField::Price => ITEM_COLUMNS[2].name,
        ItemField::Quantity => ITEM_COLUMNS[3].name,
    }
}

/// Comma separated column list, e.g. `id, item_name, price, quantity`.
pub fn select_list() -> String {
    ITEM_COLUMNS
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single filter term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// Case-sensitive substring containment on the name.
    NameContains(String),
    /// Inclusive upper bound on the price.
    PriceAtMost(i32),
}

impl Predicate {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Predicate::NameContains(pattern) => item.name.contains(pattern.as_str()),
            Predicate::PriceAtMost(max) => item.price <= *max,
        }
    }
}

impl ItemSearch {
    /// Ordered filter terms: name first, then price. A blank name pattern
    /// yields no term.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut out = Vec::with_capacity(2);
        if let Some(pattern) = self.name_pattern.as_deref().filter(|p| has_text(p)) {
            out.push(Predicate::NameContains(pattern.to_string()));
        }
        if let Some(max) = self.max_price {
            out.push(Predicate::PriceAtMost(max));
        }
        out
    }

    /// True when the item satisfies every term (vacuously true for none).
    pub fn matches(&self, item: &Item) -> bool {
        self.predicates().iter().all(|p| p.matches(item))
    }
}

/// Bound value for a rendered statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
}

/// A rendered SELECT over the item table with positional `?N` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SelectQuery {
    /// Build the filtered SELECT for a search.
    ///
    /// Name containment renders as `instr(item_name, ?N) > 0` rather than
    /// `LIKE`: SQLite's `LIKE` folds ASCII case and treats `%`/`_` in the
    /// pattern as wildcards, which would diverge from `str::contains`.
    /// Rows come back in id order, which is insertion order.
    pub fn for_search(search: &ItemSearch) -> Self {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        for predicate in search.predicates() {
            let idx = params.len() + 1;
            match predicate {
                Predicate::NameContains(pattern) => {
                    conditions.push(format!(
                        "instr({}, ?{}) > 0",
                        column_for(ItemField::Name),
                        idx
                    ));
                    params.push(SqlParam::Text(pattern));
                }
                Predicate::PriceAtMost(max) => {
                    conditions.push(format!("{} <= ?{}", column_for(ItemField::Price), idx));
                    params.push(SqlParam::Integer(i64::from(max)));
                }
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {} ASC",
            select_list(),
            ITEM_TABLE,
            where_clause,
            column_for(ItemField::Id)
        );
        Self { sql, params }
    }

    /// SELECT of a single row by primary key, bound as `?1`.
    pub fn by_id(id: i64) -> Self {
        Self {
            sql: format!(
                "SELECT {} FROM {} WHERE {} = ?1",
                select_list(),
                ITEM_TABLE,
                column_for(ItemField::Id)
            ),
            params: vec![SqlParam::Integer(id)],
        }
    }
}
