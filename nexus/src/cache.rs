//! Buffered storage writes
//!
//! [`StorageCache`] reads through to the wrapped store and keeps every write
//! in memory. The buffered writes only reach the store through
//! [`CachedWrites::commit`], so dropping the cache discards them.

use std::collections::BTreeMap;
use std::ops::Bound;

use cosmwasm_std::{Order, Record, Storage};

/// Pending writes; `None` marks a removal
type Writes = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

pub struct StorageCache<'a> {
    inner: &'a dyn Storage,
    writes: Writes,
}

impl<'a> StorageCache<'a> {
    pub fn new(inner: &'a dyn Storage) -> Self {
        Self {
            inner,
            writes: BTreeMap::new(),
        }
    }

    /// Release the wrapped store, keeping the writes for a later commit
    pub fn into_writes(self) -> CachedWrites {
        CachedWrites(self.writes)
    }
}

impl Storage for StorageCache<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(value) => value.clone(),
            None => self.inner.get(key),
        }
    }

    fn range<'b>(
        &'b self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'b> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Box::new(std::iter::empty());
            }
        }

        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.inner.range(start, end, Order::Ascending).collect();

        let lower = start.map_or(Bound::Unbounded, |s| Bound::Included(s.to_vec()));
        let upper = end.map_or(Bound::Unbounded, |e| Bound::Excluded(e.to_vec()));
        for (key, value) in self.writes.range((lower, upper)) {
            match value {
                Some(value) => merged.insert(key.clone(), value.clone()),
                None => merged.remove(key),
            };
        }

        match order {
            Order::Ascending => Box::new(merged.into_iter()),
            Order::Descending => Box::new(merged.into_iter().rev()),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn remove(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }
}

#[must_use]
pub struct CachedWrites(Writes);

impl CachedWrites {
    pub fn commit(self, storage: &mut dyn Storage) {
        for (key, value) in self.0 {
            match value {
                Some(value) => storage.set(&key, &value),
                None => storage.remove(&key),
            }
        }
    }
}
