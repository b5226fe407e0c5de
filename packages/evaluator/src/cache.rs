//! Fragment cache
//!
//! Memoizes clause resolution per paragraph. Resolution is fully determined by
//! the key, so an entry is either reused as-is or recomputed; nothing is ever
//! patched in place.

use std::collections::HashMap;

use crate::resolver::{Fragment, ResolveContext};

/// Default number of entries kept before the cache is flushed.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Composite key: every input that can change a paragraph's fragments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentKey {
    pub node_id: String,
    /// `id:state` pairs of every option the paragraph reads
    pub state_signature: String,
    /// Metadata of those options, which marker and footer text read
    pub descriptor_signature: String,
    pub raw_text: String,
    pub reset_version: u64,
    pub context: ResolveContext,
    pub request_marker: bool,
}

/// Cached resolution. `None` means the text holds no clause.
pub type CachedFragments = Option<Vec<Fragment>>;

#[derive(Debug, Clone)]
pub struct FragmentCache {
    entries: HashMap<FragmentKey, CachedFragments>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl FragmentCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached fragments for `key`, resolving them with `resolve` on a miss.
    pub fn get_or_insert_with(
        &mut self,
        key: FragmentKey,
        resolve: impl FnOnce() -> CachedFragments,
    ) -> CachedFragments {
        if let Some(cached) = self.entries.get(&key) {
            self.hits += 1;
            return cached.clone();
        }

        self.misses += 1;
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        let fragments = resolve();
        self.entries.insert(key, fragments.clone());
        fragments
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for FragmentCache {
    fn default() -> Self {
        Self::new()
    }
}
