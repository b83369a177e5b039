use log::trace;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Per-year cache of immutable data.
///
/// Entries are loaded on first access and never replaced or evicted. Two
/// concurrent first accesses may both load; the first insert wins.
pub struct YearCache<T> {
    entries: RwLock<HashMap<u32, Arc<T>>>,
}

impl<T> Default for YearCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> YearCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, year: u32) -> Option<Arc<T>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&year)
            .cloned()
    }

    pub fn insert(&self, year: u32, value: T) -> Arc<T> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.entry(year) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => entry.insert(Arc::new(value)).clone(),
        }
    }

    pub async fn get_or_load<F, Fut, E>(&self, year: u32, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(year) {
            return Ok(value);
        }
        trace!("Cache miss for {year}");
        let value = load().await?;
        Ok(self.insert(year, value))
    }
}
