pub mod catalog;
pub mod engine;
pub mod memory;

pub use catalog::Catalog;
pub use engine::StoreBackend;
pub use memory::MemoryStore;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(pub u64);

impl StoreId {
    pub fn new() -> Self {
        StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store_{}", self.0)
    }
}

/// Identity of a list collection inside its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(pub u64);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "list_{}", self.0)
    }
}
