//! Read-through across the persistence tiers.
//!
//! Tiers are tried in order (Primary, Secondary, Tertiary) and the first
//! acceptable answer is returned as is. Results are never merged across
//! tiers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::application::repos::{ArtifactReader, StoreError};
use crate::cache::CollectionKey;
use crate::domain::classify::{CategoryScorer, ScoringPath};
use crate::domain::entities::Artifact;

pub(crate) const METRIC_TIER_FAILURE: &str = "galleria_tier_failure_total";
pub(crate) const METRIC_TIER_SERVED: &str = "galleria_tier_served_total";

const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Primary,
    Secondary,
    Tertiary,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
            Tier::Tertiary => "tertiary",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TierConfig {
    /// Upper bound for a single Primary or Secondary call.
    pub store_timeout: Duration,
    /// Treat an empty Primary or Secondary answer like a miss.
    pub fall_through_on_empty: bool,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            fall_through_on_empty: true,
        }
    }
}

impl From<&crate::config::TierSettings> for TierConfig {
    fn from(settings: &crate::config::TierSettings) -> Self {
        Self {
            store_timeout: settings.store_timeout,
            fall_through_on_empty: settings.fall_through_on_empty,
        }
    }
}

/// Await `call`, turning expiry of `limit` into [`StoreError::Timeout`].
pub(crate) async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

/// A collection together with the tier that produced it. `tier` is `None`
/// when every tier failed.
#[derive(Debug, Clone)]
pub struct TieredFetch {
    pub tier: Option<Tier>,
    pub artifacts: Vec<Artifact>,
}

#[derive(Clone)]
pub struct TieredReader {
    primary: Option<Arc<dyn ArtifactReader>>,
    secondary: Option<Arc<dyn ArtifactReader>>,
    tertiary: Arc<dyn ArtifactReader>,
    scorer: CategoryScorer,
    config: TierConfig,
}

impl TieredReader {
    pub fn new(tertiary: Arc<dyn ArtifactReader>, scorer: CategoryScorer) -> Self {
        Self {
            primary: None,
            secondary: None,
            tertiary,
            scorer,
            config: TierConfig::default(),
        }
    }

    pub fn with_primary(mut self, primary: Arc<dyn ArtifactReader>) -> Self {
        self.primary = Some(primary);
        self
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn ArtifactReader>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_config(mut self, config: TierConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TierConfig {
        &self.config
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Fetch `key` from the first tier that answers, with every artifact
    /// carrying a category.
    pub async fn fetch_collection(&self, key: &CollectionKey) -> TieredFetch {
        let scope = key.scope();
        let bounded = [
            (Tier::Primary, self.primary.as_ref()),
            (Tier::Secondary, self.secondary.as_ref()),
        ];

        for (tier, reader) in bounded {
            let Some(reader) = reader else {
                continue;
            };

            let started = Instant::now();
            match with_timeout(self.config.store_timeout, reader.list_artifacts(&scope)).await {
                Ok(artifacts) if artifacts.is_empty() && self.config.fall_through_on_empty => {
                    debug!(
                        tier = tier.as_str(),
                        collection = key.kind(),
                        "Tier returned an empty collection; trying next tier"
                    );
                }
                Ok(artifacts) => return self.served(tier, key, artifacts),
                Err(err) => self.record_failure(tier, key, &err, started),
            }
        }

        let started = Instant::now();
        match self.tertiary.list_artifacts(&scope).await {
            Ok(artifacts) => self.served(Tier::Tertiary, key, artifacts),
            Err(err) => {
                self.record_failure(Tier::Tertiary, key, &err, started);
                warn!(
                    collection = key.kind(),
                    "Every tier failed; serving an empty collection"
                );
                TieredFetch {
                    tier: None,
                    artifacts: Vec::new(),
                }
            }
        }
    }

    fn served(&self, tier: Tier, key: &CollectionKey, mut artifacts: Vec<Artifact>) -> TieredFetch {
        let mut classified = 0usize;
        for artifact in &mut artifacts {
            if self.scorer.ensure_category(artifact, ScoringPath::Gallery) {
                classified += 1;
            }
        }

        counter!(METRIC_TIER_SERVED, "tier" => tier.as_str()).increment(1);
        debug!(
            tier = tier.as_str(),
            collection = key.kind(),
            artifacts = artifacts.len(),
            classified,
            "Collection served"
        );

        TieredFetch {
            tier: Some(tier),
            artifacts,
        }
    }

    fn record_failure(&self, tier: Tier, key: &CollectionKey, err: &StoreError, started: Instant) {
        counter!(METRIC_TIER_FAILURE, "tier" => tier.as_str()).increment(1);
        warn!(
            tier = tier.as_str(),
            collection = key.kind(),
            error = %err,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tier read failed"
        );
    }
}
