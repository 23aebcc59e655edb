use moka::sync::Cache;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Default entry lifetime.
const TTL_SECS: u64 = 60;
const MAX_ENTRIES: u64 = 256;

pub const MENU_KEY: &str = "categories:menu";
pub const NAVIGATION_KEY: &str = "navigation:public";

/// Small TTL cache for the hot public responses (menu, navigation).
/// Writers invalidate; the inspection endpoint reports what is resident.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub entry_count: u64,
    pub keys: Vec<String>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .time_to_live(Duration::from_secs(TTL_SECS))
                .max_capacity(MAX_ENTRIES)
                .build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.inner.insert(key.to_string(), value);
    }

    pub fn invalidate(&self, key: &str) {
        self.inner.invalidate(key);
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        let mut keys: Vec<String> = self.inner.iter().map(|(k, _)| (*k).clone()).collect();
        keys.sort();
        CacheStats {
            entry_count: self.inner.entry_count(),
            keys,
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_get_invalidate() {
        let cache = ResponseCache::new();
        assert!(cache.get(MENU_KEY).is_none());

        cache.insert(MENU_KEY, json!([{"slug": "news"}]));
        assert_eq!(cache.get(MENU_KEY).unwrap()[0]["slug"], "news");

        cache.invalidate(MENU_KEY);
        assert!(cache.get(MENU_KEY).is_none());
    }

    #[test]
    fn test_stats_lists_keys() {
        let cache = ResponseCache::new();
        cache.insert(MENU_KEY, json!([]));
        cache.insert(NAVIGATION_KEY, json!([]));

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 2);
        assert_eq!(
            stats.keys,
            vec![MENU_KEY.to_string(), NAVIGATION_KEY.to_string()]
        );
    }
}
