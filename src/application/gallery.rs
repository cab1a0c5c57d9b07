//! Gallery read service.
//!
//! Composes the snapshot cache, the tiered reader and the category scorer.
//! Reads never fail because a store is down: when every tier fails the
//! caller receives an empty collection.

use std::sync::Arc;

use metrics::histogram;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::application::repos::StoreError;
use crate::application::tiered::{Tier, TieredReader};
use crate::cache::{CacheStore, CollectionKey};
use crate::domain::artifacts;
use crate::domain::classify::{CategoryScorer, ScoringPath};
use crate::domain::entities::Artifact;
use crate::domain::error::DomainError;
use crate::domain::types::Category;

pub(crate) const METRIC_GALLERY_FETCH_MS: &str = "galleria_gallery_fetch_ms";

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("artifact not found")]
    NotFound,
    #[error("`{action}` is not permitted for this user")]
    Forbidden { action: &'static str },
    #[error("`{op}` failed on every writable tier")]
    Unavailable {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

impl GalleryError {
    pub(crate) fn from_store(op: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound => GalleryError::NotFound,
            StoreError::Forbidden { action } => GalleryError::Forbidden { action },
            other => GalleryError::Unavailable { op, source: other },
        }
    }
}

/// Where a collection was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedFrom {
    Cache,
    Primary,
    Secondary,
    Tertiary,
    /// Every tier failed.
    Nothing,
}

impl From<Option<Tier>> for ServedFrom {
    fn from(tier: Option<Tier>) -> Self {
        match tier {
            Some(Tier::Primary) => ServedFrom::Primary,
            Some(Tier::Secondary) => ServedFrom::Secondary,
            Some(Tier::Tertiary) => ServedFrom::Tertiary,
            None => ServedFrom::Nothing,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GalleryQuery {
    /// Bypass the snapshot regardless of its age.
    pub force_refresh: bool,
    pub category: Option<Category>,
}

#[derive(Debug, Clone)]
pub struct GalleryListing {
    pub artifacts: Vec<Artifact>,
    pub served_from: ServedFrom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

struct Collection {
    artifacts: Arc<Vec<Artifact>>,
    served_from: ServedFrom,
}

pub struct GalleryService {
    reader: TieredReader,
    cache: Arc<CacheStore>,
    scorer: CategoryScorer,
}

impl GalleryService {
    pub fn new(reader: TieredReader, cache: Arc<CacheStore>, scorer: CategoryScorer) -> Self {
        Self {
            reader,
            cache,
            scorer,
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn reader(&self) -> &TieredReader {
        &self.reader
    }

    /// Shared artifacts, newest first, optionally narrowed to one category.
    pub async fn list_public(&self, query: &GalleryQuery) -> GalleryListing {
        let collection = self
            .load(&CollectionKey::PublicGallery, query.force_refresh)
            .await;

        let artifacts = match query.category {
            Some(category) => collection
                .artifacts
                .iter()
                .filter(|artifact| category_of(artifact) == category)
                .cloned()
                .collect(),
            None => collection.artifacts.as_ref().clone(),
        };

        GalleryListing {
            artifacts,
            served_from: collection.served_from,
        }
    }

    /// Every artifact of `owner_id`, private ones included.
    pub async fn list_owner(
        &self,
        owner_id: &str,
        force_refresh: bool,
    ) -> Result<GalleryListing, GalleryError> {
        let owner_id = artifacts::identifier("user_id", owner_id)?;
        let collection = self
            .load(&CollectionKey::Owner(owner_id), force_refresh)
            .await;
        Ok(GalleryListing {
            artifacts: collection.artifacts.as_ref().clone(),
            served_from: collection.served_from,
        })
    }

    /// Number of shared artifacts per category in table order, `other` last.
    /// Categories without artifacts are reported with a zero count.
    pub async fn category_counts(&self, force_refresh: bool) -> Vec<CategoryCount> {
        let collection = self
            .load(&CollectionKey::PublicGallery, force_refresh)
            .await;

        Category::ALL
            .into_iter()
            .map(|category| CategoryCount {
                category,
                count: collection
                    .artifacts
                    .iter()
                    .filter(|artifact| category_of(artifact) == category)
                    .count(),
            })
            .collect()
    }

    /// One shared artifact, looked up in the public snapshot.
    pub async fn find_shared(&self, artifact_id: &str) -> Result<Artifact, GalleryError> {
        let artifact_id = artifacts::identifier("artifact_id", artifact_id)?;
        let collection = self.load(&CollectionKey::PublicGallery, false).await;
        collection
            .artifacts
            .iter()
            .find(|artifact| artifact.id == artifact_id)
            .cloned()
            .ok_or(GalleryError::NotFound)
    }

    /// Category for a freshly generated image.
    pub fn classify(&self, description: &str, style: &str) -> Category {
        self.scorer
            .classify_for(ScoringPath::Generation, description, style)
    }

    async fn load(&self, key: &CollectionKey, force_refresh: bool) -> Collection {
        let started = Instant::now();

        if force_refresh {
            self.cache.invalidate(key);
        } else if let Some(entry) = self.cache.fresh(key) {
            debug!(
                collection = key.kind(),
                age_ms = entry.age().as_millis() as u64,
                "Serving collection from cache"
            );
            return Collection {
                artifacts: Arc::clone(entry.artifacts()),
                served_from: ServedFrom::Cache,
            };
        }

        let fetch = self.reader.fetch_collection(key).await;
        let artifacts = match fetch.tier {
            Some(_) => Arc::clone(self.cache.put(key.clone(), fetch.artifacts).artifacts()),
            // A total failure is not cached so the next read retries the tiers.
            None => Arc::new(fetch.artifacts),
        };

        histogram!(METRIC_GALLERY_FETCH_MS, "collection" => key.kind())
            .record(started.elapsed().as_secs_f64() * 1000.0);

        Collection {
            artifacts,
            served_from: ServedFrom::from(fetch.tier),
        }
    }
}

/// Category used for filtering and counting. Stored values that are not a
/// known tag count as `other`.
fn category_of(artifact: &Artifact) -> Category {
    artifact
        .stored_category()
        .and_then(|value| value.parse().ok())
        .unwrap_or(Category::Other)
}
