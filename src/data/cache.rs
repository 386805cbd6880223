use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use super::loader::load_tables;
use super::model::Tables;
use crate::config::DataPaths;

// ---------------------------------------------------------------------------
// TableCache – load-once snapshots keyed by the path tuple
// ---------------------------------------------------------------------------

/// Memoizes [`load_tables`] per [`DataPaths`].
///
/// Entries are immutable once inserted and are never evicted; a failed load
/// leaves no entry behind, so the same paths can be retried later.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<DataPaths, Arc<Tables>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the tables for `paths`, reading storage only on the first call.
    pub fn get_or_load(&mut self, paths: &DataPaths) -> Result<Arc<Tables>> {
        self.get_or_load_with(paths, load_tables)
    }

    /// Like [`get_or_load`](Self::get_or_load) with an explicit loader.
    pub fn get_or_load_with<F>(&mut self, paths: &DataPaths, load: F) -> Result<Arc<Tables>>
    where
        F: FnOnce(&DataPaths) -> Result<Tables>,
    {
        if let Some(tables) = self.entries.get(paths) {
            log::debug!("Table cache hit for {}", paths.msc.display());
            return Ok(Arc::clone(tables));
        }
        let tables = Arc::new(load(paths)?);
        self.entries.insert(paths.clone(), Arc::clone(&tables));
        Ok(tables)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
