//! Write path for artifacts, likes and comments.
//!
//! Each mutation is validated before any store is touched, attempted on the
//! primary store, and replayed on the fallback store when the primary fails
//! in a recoverable way. Affected cache keys are cleared after a successful
//! write at any tier.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::gallery::GalleryError;
use crate::application::repos::{
    ArtifactWriter, NewCommentParams, ShareArtifactParams, StoreError,
};
use crate::application::tiered::{TierConfig, with_timeout};
use crate::cache::{CacheStore, CollectionKey};
use crate::domain::artifacts::{
    self, MAX_COMMENT_CHARS, MAX_LABEL_CHARS, MAX_PROMPT_CHARS,
};
use crate::domain::classify::{CategoryScorer, ScoringPath};
use crate::domain::entities::{Artifact, Comment, LikeState};
use crate::domain::error::DomainError;
use crate::domain::types::{Category, Visibility};

pub(crate) const METRIC_MUTATION_FALLBACK: &str = "galleria_mutation_fallback_total";

const DEFAULT_ASPECT_RATIO: &str = "1:1";

#[derive(Debug, Clone, Default)]
pub struct CreateArtifactRequest {
    pub owner_id: String,
    pub image_url: String,
    pub prompt: String,
    pub style: Option<String>,
    pub aspect_ratio: Option<String>,
    /// Explicit category; inferred from prompt and style when absent.
    pub category: Option<String>,
    pub shared: bool,
    pub source_artifact_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AddCommentRequest {
    pub artifact_id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
}

pub struct MutationPipeline {
    primary: Option<Arc<dyn ArtifactWriter>>,
    fallback: Arc<dyn ArtifactWriter>,
    cache: Arc<CacheStore>,
    scorer: CategoryScorer,
    timeout: Duration,
}

impl MutationPipeline {
    pub fn new(
        fallback: Arc<dyn ArtifactWriter>,
        cache: Arc<CacheStore>,
        scorer: CategoryScorer,
    ) -> Self {
        Self {
            primary: None,
            fallback,
            cache,
            scorer,
            timeout: TierConfig::default().store_timeout,
        }
    }

    pub fn with_primary(mut self, primary: Arc<dyn ArtifactWriter>) -> Self {
        self.primary = Some(primary);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn create_artifact(
        &self,
        request: CreateArtifactRequest,
    ) -> Result<Artifact, GalleryError> {
        let artifact = self.prepare_artifact(request)?;
        let candidate = &artifact;

        let created = self
            .run("create_artifact", |writer| async move {
                writer.create_artifact(candidate).await
            })
            .await?;

        self.invalidate_owner(&created.owner_id);
        info!(
            artifact_id = %created.id,
            category = created.category.as_deref().unwrap_or_default(),
            shared = created.is_shared(),
            "Artifact created"
        );
        Ok(created)
    }

    /// Publish an artifact to the gallery. Only the owner may share, and
    /// sharing an already shared artifact succeeds without changes.
    pub async fn share_artifact(
        &self,
        artifact_id: &str,
        requester: &str,
    ) -> Result<Artifact, GalleryError> {
        let artifact_id = artifacts::identifier("artifact_id", artifact_id)?;
        let requester = artifacts::identifier("user_id", requester)?;
        let params = ShareArtifactParams {
            artifact_id: &artifact_id,
            requester: &requester,
            scorer: self.scorer,
        };

        let shared = self
            .run("share_artifact", |writer| async move {
                writer.share_artifact(params).await
            })
            .await?;

        self.invalidate_owner(&shared.owner_id);
        Ok(shared)
    }

    pub async fn toggle_like(
        &self,
        artifact_id: &str,
        user_id: &str,
    ) -> Result<LikeState, GalleryError> {
        let artifact_id = artifacts::identifier("artifact_id", artifact_id)?;
        let user_id = artifacts::identifier("user_id", user_id)?;
        let (artifact_id, user_id) = (artifact_id.as_str(), user_id.as_str());

        let state = self
            .run("toggle_like", |writer| async move {
                writer.toggle_like(artifact_id, user_id).await
            })
            .await?;

        self.cache.invalidate_all();
        Ok(state)
    }

    pub async fn add_comment(&self, request: AddCommentRequest) -> Result<Comment, GalleryError> {
        let params = NewCommentParams {
            id: Uuid::new_v4().to_string(),
            artifact_id: artifacts::identifier("artifact_id", &request.artifact_id)?,
            author_id: artifacts::identifier("author_id", &request.author_id)?,
            author_name: artifacts::required_text(
                "author_name",
                &request.author_name,
                MAX_LABEL_CHARS,
            )?,
            body: artifacts::required_text("body", &request.body, MAX_COMMENT_CHARS)?,
            created_at: OffsetDateTime::now_utc(),
        };
        let params = &params;

        let comment = self
            .run("add_comment", |writer| async move {
                writer.add_comment(params).await
            })
            .await?;

        self.cache.invalidate_all();
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        artifact_id: &str,
        comment_id: &str,
        requester: &str,
    ) -> Result<(), GalleryError> {
        let artifact_id = artifacts::identifier("artifact_id", artifact_id)?;
        let comment_id = artifacts::identifier("comment_id", comment_id)?;
        let requester = artifacts::identifier("user_id", requester)?;
        let (artifact_id, comment_id, requester) =
            (artifact_id.as_str(), comment_id.as_str(), requester.as_str());

        self.run("delete_comment", |writer| async move {
            writer
                .delete_comment(artifact_id, comment_id, requester)
                .await
        })
        .await?;

        self.cache.invalidate_all();
        Ok(())
    }

    /// Remove an artifact from every writable tier. The delete succeeds when
    /// at least one tier held the artifact.
    pub async fn delete_artifact(
        &self,
        artifact_id: &str,
        requester: &str,
    ) -> Result<(), GalleryError> {
        const OP: &str = "delete_artifact";

        let artifact_id = artifacts::identifier("artifact_id", artifact_id)?;
        let requester = artifacts::identifier("user_id", requester)?;

        let primary = match &self.primary {
            Some(primary) => Some(
                with_timeout(
                    self.timeout,
                    primary.delete_artifact(&artifact_id, &requester),
                )
                .await,
            ),
            None => None,
        };

        match &primary {
            Some(Err(StoreError::Forbidden { action })) => {
                return Err(GalleryError::Forbidden { action: *action });
            }
            Some(Err(StoreError::NotFound)) | Some(Ok(())) | None => {}
            Some(Err(err)) => self.record_fallback(OP, err),
        }

        let fallback = self
            .fallback
            .delete_artifact(&artifact_id, &requester)
            .await;

        match (primary, fallback) {
            (Some(Ok(())), Ok(()) | Err(StoreError::NotFound)) | (_, Ok(())) => {}
            (Some(Ok(())), Err(err)) => {
                // Primary removal stands; a stale fallback copy is only
                // visible while the primary tier is down.
                warn!(
                    op = OP,
                    artifact_id = %artifact_id,
                    error = %err,
                    "Fallback delete failed after primary delete succeeded"
                );
            }
            (_, Err(err)) => return Err(GalleryError::from_store(OP, err)),
        }

        self.cache.invalidate_all();
        info!(artifact_id = %artifact_id, "Artifact deleted");
        Ok(())
    }

    fn prepare_artifact(&self, request: CreateArtifactRequest) -> Result<Artifact, DomainError> {
        let owner_id = artifacts::identifier("owner_id", &request.owner_id)?;
        let image_url = artifacts::image_reference(&request.image_url)?;
        let prompt = artifacts::required_text("prompt", &request.prompt, MAX_PROMPT_CHARS)?;
        let style =
            artifacts::optional_text("style", request.style.as_deref(), MAX_LABEL_CHARS)?;
        let aspect_ratio = artifacts::optional_text(
            "aspect_ratio",
            request.aspect_ratio.as_deref(),
            MAX_LABEL_CHARS,
        )?;
        let source_artifact_id = request
            .source_artifact_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| artifacts::identifier("source_artifact_id", value))
            .transpose()?;

        let category = match request
            .category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(raw) => raw
                .parse::<Category>()
                .map_err(|err| DomainError::validation("category", err.to_string()))?,
            None => self
                .scorer
                .classify_for(ScoringPath::Generation, &prompt, &style),
        };

        Ok(Artifact {
            id: Uuid::new_v4().to_string(),
            owner_id,
            image_url,
            prompt,
            style,
            aspect_ratio: if aspect_ratio.is_empty() {
                DEFAULT_ASPECT_RATIO.to_string()
            } else {
                aspect_ratio
            },
            category: Some(category.as_str().to_string()),
            visibility: Visibility::from_public_flag(request.shared),
            like_count: 0,
            liked_by: BTreeSet::new(),
            comments: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
            source_artifact_id,
        })
    }

    /// Primary first, fallback on a recoverable primary failure.
    async fn run<T, F, Fut>(&self, op: &'static str, call: F) -> Result<T, GalleryError>
    where
        F: Fn(Arc<dyn ArtifactWriter>) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        if let Some(primary) = &self.primary {
            match with_timeout(self.timeout, call(Arc::clone(primary))).await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_recoverable() => {
                    return Err(GalleryError::from_store(op, err));
                }
                Err(err) => self.record_fallback(op, &err),
            }
        }

        call(Arc::clone(&self.fallback))
            .await
            .map_err(|err| GalleryError::from_store(op, err))
    }

    fn record_fallback(&self, op: &'static str, err: &StoreError) {
        counter!(METRIC_MUTATION_FALLBACK, "op" => op).increment(1);
        warn!(
            op,
            tier = "primary",
            error = %err,
            "Primary write failed; retrying on fallback store"
        );
    }

    fn invalidate_owner(&self, owner_id: &str) {
        for key in CollectionKey::affected_by(owner_id) {
            self.cache.invalidate(&key);
        }
    }
}
