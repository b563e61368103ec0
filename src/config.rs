/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Store name, used in log events
    pub name: String,

    /// Whether filtered and sorted views track later changes.
    /// Snapshots are always static.
    pub live_views: bool,
}

impl StoreConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            live_views: true,
        }
    }

    /// Set the store name
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the default liveness of filtered and sorted views
    pub fn live_views(mut self, live: bool) -> Self {
        self.live_views = live;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("memolist")
    }
}
