//! Catalog and session configuration.

/// Default field name used to infer a primary key when none is declared.
pub const DEFAULT_PRIMARY_KEY_NAME: &str = "id";

/// Default capacity of the session object cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Field name that marks an implicit primary key.
    pub primary_key_name: String,
    /// Whether the implicit primary key name is matched case-sensitively.
    pub primary_key_case_sensitive: bool,
}

impl CatalogConfig {
    /// Create a configuration with the default inference rules.
    pub fn new() -> Self {
        Self {
            primary_key_name: DEFAULT_PRIMARY_KEY_NAME.to_string(),
            primary_key_case_sensitive: false,
        }
    }

    /// Set the implicit primary key field name.
    pub fn with_primary_key_name(mut self, name: impl Into<String>) -> Self {
        self.primary_key_name = name.into();
        self
    }

    /// Match the implicit primary key name case-sensitively.
    pub fn case_sensitive(mut self) -> Self {
        self.primary_key_case_sensitive = true;
        self
    }

    /// Check whether a field name matches the implicit primary key name.
    pub fn is_implicit_primary_key(&self, field_name: &str) -> bool {
        if self.primary_key_case_sensitive {
            field_name == self.primary_key_name
        } else {
            field_name.eq_ignore_ascii_case(&self.primary_key_name)
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What the session object cache does when an insertion finds it full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullCachePolicy {
    /// Evict the least recently used entry to make room.
    #[default]
    EvictLeastRecent,
    /// Refuse the insertion and keep existing entries.
    Refuse,
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of cached instances.
    pub cache_capacity: usize,
    /// Behavior at capacity.
    pub full_cache_policy: FullCachePolicy,
}

impl SessionConfig {
    /// Create a session configuration with default cache settings.
    pub fn new() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            full_cache_policy: FullCachePolicy::default(),
        }
    }

    /// Set the cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the full-cache policy.
    pub fn with_full_cache_policy(mut self, policy: FullCachePolicy) -> Self {
        self.full_cache_policy = policy;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
