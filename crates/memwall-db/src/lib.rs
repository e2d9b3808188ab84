//! # memwall-db
//!
//! In-memory table store for the memory wall. Every table is a list of JSON
//! object rows behind its own lock; callers query with equality filters and
//! an optional ordering column, and get owned copies back.

pub mod filter;
pub mod queries;
pub mod seed;
pub mod tables;

mod error;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};
use tracing::info;

pub use error::{Result, StoreError};
pub use filter::{Filter, OrderBy};
pub use queries::Toggled;

/// A stored record: column name to value.
pub type Row = Map<String, Value>;

/// Rows of a single table plus its id counter.
#[derive(Debug)]
pub(crate) struct Table {
    pub(crate) rows: Vec<Row>,
    /// Next candidate for an auto-assigned id. Only ever grows.
    pub(crate) next_id: u64,
    /// Timestamp columns filled in on insert when the caller leaves them out.
    pub(crate) stamped: &'static [&'static str],
}

impl Table {
    fn new(stamped: &'static [&'static str]) -> Self {
        Self { rows: Vec::new(), next_id: 1, stamped }
    }
}

/// Owns every table. Each operation takes exactly one table lock and releases
/// it before returning; nothing is held across calls.
pub struct Store {
    tables: HashMap<String, Mutex<Table>>,
}

impl Store {
    /// Empty store with the standard memory-wall tables registered.
    pub fn new() -> Self {
        let tables = tables::SCHEMA
            .iter()
            .map(|&(name, stamped)| (name.to_string(), Mutex::new(Table::new(stamped))))
            .collect::<HashMap<_, _>>();
        info!("Store created with {} tables", tables.len());
        Self { tables }
    }

    #[cfg(test)]
    /// Empty store with an ad-hoc set of tables that only stamp `created_at`.
    pub fn with_tables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = names
            .into_iter()
            .map(|name| (name.into(), Mutex::new(Table::new(tables::CREATED_ONLY))))
            .collect();
        Self { tables }
    }

    #[cfg(test)]
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn with_table<F, T>(&self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<T>,
    {
        let table = self
            .tables
            .get(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))?;
        let mut guard: MutexGuard<'_, Table> = table
            .lock()
            .map_err(|e| StoreError::LockPoisoned(format!("{}: {}", name, e)))?;
        f(&mut guard)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
