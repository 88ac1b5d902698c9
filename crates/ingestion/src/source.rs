//! Data source trait definition and an in-memory implementation.

use predchart_core::{Error, RawTable, Result};

/// A queryable collection of named tables.
pub trait TableSource {
    /// Names of all tables, in a deterministic order.
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Load every row of a table in source order.
    ///
    /// Fails with [`Error::TableNotFound`] when the table does not exist.
    fn read_table(&self, name: &str) -> Result<RawTable>;

    /// Whether a table of this name exists.
    fn has_table(&self, name: &str) -> Result<bool> {
        Ok(self.list_tables()?.iter().any(|t| t == name))
    }

    /// Whether a table is backend bookkeeping rather than user data.
    fn is_internal(&self, _name: &str) -> bool {
        false
    }
}

/// Tables held in memory, listed in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: Vec<RawTable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any existing table of the same name in place.
    pub fn insert(&mut self, table: RawTable) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_table(mut self, table: RawTable) -> Self {
        self.insert(table);
        self
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableSource for MemorySource {
    fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    fn read_table(&self, name: &str) -> Result<RawTable> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| Error::table_not_found(name))
    }

    fn has_table(&self, name: &str) -> Result<bool> {
        Ok(self.tables.iter().any(|t| t.name == name))
    }
}
