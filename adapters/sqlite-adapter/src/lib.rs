//! sqlite-adapter — SQLite implementation of the ItemRepository port.
//!
//! Purpose
//! - Provide a file-based relational store so the item service can run
//!   against a real SQL engine instead of the in-memory map.
//! - Implements the `ItemRepository` trait from the `domain` crate, building
//!   its filtered SELECTs with `domain::query::SelectQuery` so results match
//!   the in-memory store exactly.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Every operation runs in its own transaction; a transaction dropped on an
//!   error path rolls back.
//! - Generated keys come from `last_insert_rowid()` read inside the insert's
//!   transaction.

use std::path::Path;
use std::sync::Mutex;

use domain::query::{column_for, ItemField, SelectQuery, SqlParam, ITEM_TABLE};
use domain::validate::check_item_name;
use domain::{CoreError, Item, ItemRepository, ItemSearch, ItemUpdate, ITEM_NAME_MAX_CHARS};
use rusqlite::{params, Connection, Transaction};
use tracing::debug;

/// SQLite-backed item repository.
pub struct SqliteItemRepo {
    conn: Mutex<Connection>,
}

impl SqliteItemRepo {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a database file, creating its parent directory if missing.
    pub fn open_creating_dirs<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        if let Some(dir) = path.as_ref().parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| CoreError::Repository(format!("create db dir: {e}")))?;
            }
        }
        Self::new(path)
    }

    /// Run `f` inside a transaction and commit when it succeeds.
    fn with_tx<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        let tx = conn.unchecked_transaction().map_err(map_sqerr)?;
        let out = f(&tx)?;
        tx.commit().map_err(map_sqerr)?;
        Ok(out)
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_name TEXT NOT NULL CHECK (length(item_name) <= {max_name}),
            price INTEGER,
            quantity INTEGER
        );
        "#,
        table = ITEM_TABLE,
        max_name = ITEM_NAME_MAX_CHARS,
    ))
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::Repository(format!("sqlite error: {e}"))
}

fn to_sql(p: &SqlParam) -> &dyn rusqlite::ToSql {
    match p {
        SqlParam::Text(s) => s,
        SqlParam::Integer(i) => i,
    }
}

/// Decode a row by column name through the domain's static column table.
fn row_to_item(row: &rusqlite::Row) -> Result<Item, CoreError> {
    let id: i64 = row.get(column_for(ItemField::Id)).map_err(map_sqerr)?;
    let name: String = row.get(column_for(ItemField::Name)).map_err(map_sqerr)?;
    let price: i32 = row.get(column_for(ItemField::Price)).map_err(map_sqerr)?;
    let quantity: i32 = row.get(column_for(ItemField::Quantity)).map_err(map_sqerr)?;
    Ok(Item {
        id: Some(id),
        name,
        price,
        quantity,
    })
}

fn query_items(tx: &Transaction<'_>, query: &SelectQuery) -> Result<Vec<Item>, CoreError> {
    let mut stmt = tx.prepare(&query.sql).map_err(map_sqerr)?;
    let params_refs: Vec<&dyn rusqlite::ToSql> = query.params.iter().map(to_sql).collect();
    let mut rows = stmt.query(params_refs.as_slice()).map_err(map_sqerr)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(map_sqerr)? {
        out.push(row_to_item(row)?);
    }
    Ok(out)
}

impl ItemRepository for SqliteItemRepo {
    fn save(&self, item: Item) -> Result<Item, CoreError> {
        if item.id.is_some() {
            return Err(CoreError::InvalidItem("id must be unset on save".into()));
        }
        check_item_name(&item.name)?;
        self.with_tx(|tx| {
            tx.execute(
                &format!(
                    "INSERT INTO {}({}, {}, {}) VALUES (?1, ?2, ?3)",
                    ITEM_TABLE,
                    column_for(ItemField::Name),
                    column_for(ItemField::Price),
                    column_for(ItemField::Quantity),
                ),
                params![item.name, item.price, item.quantity],
            )
            .map_err(map_sqerr)?;
            let id = tx.last_insert_rowid();
            Ok(item.with_id(id))
        })
    }

    fn update(&self, id: i64, update: &ItemUpdate) -> Result<(), CoreError> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                &format!(
                    "UPDATE {} SET {} = ?1, {} = ?2, {} = ?3 WHERE {} = ?4",
                    ITEM_TABLE,
                    column_for(ItemField::Name),
                    column_for(ItemField::Price),
                    column_for(ItemField::Quantity),
                    column_for(ItemField::Id),
                ),
                params![update.name, update.price, update.quantity, id],
            )
            .map_err(map_sqerr)?;
            if changed == 0 {
                return Err(CoreError::NotFound);
            }
            // Checked after the row is known to exist; an error here rolls back.
            check_item_name(&update.name)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Item>, CoreError> {
        let query = SelectQuery::by_id(id);
        let mut items = self.with_tx(|tx| query_items(tx, &query))?;
        Ok(items.pop())
    }

    fn find_all(&self, search: &ItemSearch) -> Result<Vec<Item>, CoreError> {
        let query = SelectQuery::for_search(search);
        debug!(sql = %query.sql, params = query.params.len(), "find_all");
        self.with_tx(|tx| query_items(tx, &query))
    }
}
