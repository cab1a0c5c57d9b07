//! Snapshot storage for gallery collections.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use metrics::counter;
use tokio::time::Instant;

use crate::domain::entities::Artifact;

use super::config::CacheConfig;
use super::keys::CollectionKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "galleria_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "galleria_cache_miss_total";
pub(crate) const METRIC_CACHE_INVALIDATE: &str = "galleria_cache_invalidate_total";

/// A collection as fetched from one tier, stamped with the fetch time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    artifacts: Arc<Vec<Artifact>>,
    fetched_at: Instant,
}

impl CacheEntry {
    pub fn new(artifacts: Vec<Artifact>) -> Self {
        Self {
            artifacts: Arc::new(artifacts),
            fetched_at: Instant::now(),
        }
    }

    pub fn artifacts(&self) -> &Arc<Vec<Artifact>> {
        &self.artifacts
    }

    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.fetched_at)
    }

    /// `now - fetched_at < max_age`.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.age() < max_age
    }
}

/// Process-local collection cache.
///
/// Writes are last-writer-wins: a slow read that started before an
/// invalidation may store its (older) snapshot afterwards. The staleness
/// window bounds how long such an entry survives.
pub struct CacheStore {
    config: CacheConfig,
    entries: RwLock<HashMap<CollectionKey, CacheEntry>>,
}

impl CacheStore {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn get(&self, key: &CollectionKey) -> Option<CacheEntry> {
        if !self.config.enabled {
            return None;
        }
        rw_read(&self.entries, SOURCE, "get").get(key).cloned()
    }

    /// Replace the snapshot for `key`, stamping it with the current time.
    pub fn put(&self, key: CollectionKey, artifacts: Vec<Artifact>) -> CacheEntry {
        let entry = CacheEntry::new(artifacts);
        if self.config.enabled {
            rw_write(&self.entries, SOURCE, "put").insert(key, entry.clone());
        }
        entry
    }

    pub fn invalidate(&self, key: &CollectionKey) {
        if rw_write(&self.entries, SOURCE, "invalidate")
            .remove(key)
            .is_some()
        {
            counter!(METRIC_CACHE_INVALIDATE, "collection" => key.kind()).increment(1);
        }
    }

    /// Drop every snapshot.
    pub fn invalidate_all(&self) {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_all");
        for key in entries.keys() {
            counter!(METRIC_CACHE_INVALIDATE, "collection" => key.kind()).increment(1);
        }
        entries.clear();
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.is_fresh(self.config.stale_after)
    }

    /// Snapshot for `key` if present and within the staleness window.
    pub fn fresh(&self, key: &CollectionKey) -> Option<CacheEntry> {
        match self.get(key).filter(|entry| self.is_fresh(entry)) {
            Some(entry) => {
                counter!(METRIC_CACHE_HIT, "collection" => key.kind()).increment(1);
                Some(entry)
            }
            None => {
                counter!(METRIC_CACHE_MISS, "collection" => key.kind()).increment(1);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use time::OffsetDateTime;

    use super::*;
    use crate::domain::types::Visibility;

    fn sample_artifact(id: &str) -> Artifact {
        Artifact {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            image_url: format!("https://img.example/{id}.png"),
            prompt: "a quiet lake".to_string(),
            style: String::new(),
            aspect_ratio: "1:1".to_string(),
            category: Some("nature".to_string()),
            visibility: Visibility::Shared,
            like_count: 0,
            liked_by: BTreeSet::new(),
            comments: Vec::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            source_artifact_id: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn put_then_get_returns_snapshot() {
        let store = CacheStore::new(CacheConfig::default());
        assert!(store.get(&CollectionKey::PublicGallery).is_none());

        store.put(CollectionKey::PublicGallery, vec![sample_artifact("a")]);

        let entry = store
            .fresh(&CollectionKey::PublicGallery)
            .expect("fresh snapshot");
        assert_eq!(entry.artifacts().len(), 1);
        assert_eq!(entry.artifacts()[0].id, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_staleness_window() {
        let store = CacheStore::new(CacheConfig::default());
        store.put(CollectionKey::PublicGallery, vec![sample_artifact("a")]);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(store.fresh(&CollectionKey::PublicGallery).is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.fresh(&CollectionKey::PublicGallery).is_none());
        // Stale entries stay readable until replaced or invalidated.
        assert!(store.get(&CollectionKey::PublicGallery).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn put_replaces_wholesale() {
        let store = CacheStore::new(CacheConfig::default());
        store.put(
            CollectionKey::PublicGallery,
            vec![sample_artifact("a"), sample_artifact("b")],
        );
        store.put(CollectionKey::PublicGallery, vec![sample_artifact("c")]);

        let entry = store.get(&CollectionKey::PublicGallery).expect("entry");
        let ids: Vec<&str> = entry.artifacts().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_clears_only_that_key() {
        let store = CacheStore::new(CacheConfig::default());
        store.put(CollectionKey::PublicGallery, vec![sample_artifact("a")]);
        store.put(CollectionKey::owner("owner"), vec![sample_artifact("a")]);

        store.invalidate(&CollectionKey::PublicGallery);

        assert!(store.get(&CollectionKey::PublicGallery).is_none());
        assert!(store.get(&CollectionKey::owner("owner")).is_some());

        store.invalidate_all();
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_cache_never_serves() {
        let store = CacheStore::new(CacheConfig {
            enabled: false,
            ..Default::default()
        });
        let entry = store.put(CollectionKey::PublicGallery, vec![sample_artifact("a")]);
        assert_eq!(entry.artifacts().len(), 1);
        assert!(store.get(&CollectionKey::PublicGallery).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let _guard = runtime.enter();
        let store = CacheStore::new(CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store
                .entries
                .write()
                .expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        store.put(CollectionKey::PublicGallery, vec![sample_artifact("a")]);
        assert!(store.get(&CollectionKey::PublicGallery).is_some());
    }
}
