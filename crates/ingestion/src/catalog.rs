//! Table catalog resolution.
//!
//! Enumerates the actual tables of a source and pairs each one with the name
//! of its predicted table. Pairs are emitted whether or not the predicted
//! table exists; existence is checked by the pipeline.

use crate::source::TableSource;
use predchart_core::config::CatalogConfig;
use predchart_core::{Result, TablePair};
use std::collections::HashSet;
use std::fmt;

/// Maps an actual table name to its predicted table name.
pub type PairingFn = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Resolves comparable table pairs from a data source.
pub struct CatalogResolver {
    excluded: HashSet<String>,
    exclude_internal: bool,
    pairing: PairingFn,
}

impl CatalogResolver {
    /// Create a resolver using the `T` + suffix naming convention.
    pub fn new(config: &CatalogConfig) -> Self {
        let suffix = config.predicted_suffix.clone();
        Self {
            excluded: config.excluded_tables.iter().cloned().collect(),
            exclude_internal: config.exclude_internal,
            pairing: Box::new(move |actual| format!("{actual}{suffix}")),
        }
    }

    /// Replace the naming convention with an explicit pairing function.
    pub fn with_pairing<F>(mut self, pairing: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.pairing = Box::new(pairing);
        self
    }

    /// Predicted table name for an actual table.
    pub fn predicted_name_for(&self, actual: &str) -> String {
        (self.pairing)(actual)
    }

    /// Whether a table is bookkeeping rather than an actual series.
    pub fn is_excluded(&self, source: &dyn TableSource, name: &str) -> bool {
        self.excluded.contains(name) || (self.exclude_internal && source.is_internal(name))
    }

    /// Enumerate table pairs in the source's listing order.
    ///
    /// A table that is itself the predicted counterpart of another listed table
    /// is not treated as an actual table, so one source may hold both sides.
    pub fn resolve(&self, source: &dyn TableSource) -> Result<Vec<TablePair>> {
        let names = source.list_tables()?;
        let candidates: Vec<&String> = names
            .iter()
            .filter(|n| !self.is_excluded(source, n))
            .collect();

        let predicted: HashSet<String> = candidates
            .iter()
            .filter_map(|n| {
                let p = self.predicted_name_for(n);
                (p != **n).then_some(p)
            })
            .collect();

        let pairs: Vec<TablePair> = candidates
            .into_iter()
            .filter(|n| !predicted.contains(n.as_str()))
            .map(|n| TablePair::new(n.clone(), self.predicted_name_for(n)))
            .collect();

        tracing::debug!(tables = names.len(), pairs = pairs.len(), "resolved table pairs");
        Ok(pairs)
    }
}

impl Default for CatalogResolver {
    fn default() -> Self {
        Self::new(&CatalogConfig::default())
    }
}

impl fmt::Debug for CatalogResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogResolver")
            .field("excluded", &self.excluded)
            .field("exclude_internal", &self.exclude_internal)
            .finish_non_exhaustive()
    }
}
