//! Store traits describing the persistence tiers.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::classify::CategoryScorer;
use crate::domain::entities::{Artifact, Comment, LikeState};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("record not found")]
    NotFound,
    #[error("`{action}` is not permitted for this user")]
    Forbidden { action: &'static str },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl StoreError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Whether the next tier should be tried. A permission refusal is an
    /// answer about the data, not about the store, so it never falls through.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, StoreError::Forbidden { .. })
    }
}

/// Filter applied by a store when listing artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactScope {
    /// Shared artifacts from every owner.
    Public,
    /// Every artifact of one owner, private or shared.
    Owner(String),
}

impl ArtifactScope {
    pub fn admits(&self, artifact: &Artifact) -> bool {
        match self {
            ArtifactScope::Public => artifact.is_shared(),
            ArtifactScope::Owner(owner_id) => artifact.owner_id == *owner_id,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShareArtifactParams<'a> {
    pub artifact_id: &'a str,
    pub requester: &'a str,
    /// Assigns a category when the stored artifact has none.
    pub scorer: CategoryScorer,
}

#[derive(Debug, Clone)]
pub struct NewCommentParams {
    pub id: String,
    pub artifact_id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub created_at: OffsetDateTime,
}

impl NewCommentParams {
    pub fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            artifact_id: self.artifact_id,
            author_id: self.author_id,
            author_name: self.author_name,
            body: self.body,
            created_at: self.created_at,
        }
    }
}

/// Listing side of a tier. Results are ordered newest first, with comments
/// oldest first.
#[async_trait]
pub trait ArtifactReader: Send + Sync {
    async fn list_artifacts(&self, scope: &ArtifactScope) -> Result<Vec<Artifact>, StoreError>;
}

/// Mutation side of a writable tier.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    async fn create_artifact(&self, artifact: &Artifact) -> Result<Artifact, StoreError>;

    async fn share_artifact(&self, params: ShareArtifactParams<'_>)
    -> Result<Artifact, StoreError>;

    async fn toggle_like(&self, artifact_id: &str, user_id: &str)
    -> Result<LikeState, StoreError>;

    async fn add_comment(&self, params: &NewCommentParams) -> Result<Comment, StoreError>;

    async fn delete_comment(
        &self,
        artifact_id: &str,
        comment_id: &str,
        requester: &str,
    ) -> Result<(), StoreError>;

    /// Removes the artifact with its likes and comments. Only the owner may
    /// delete.
    async fn delete_artifact(&self, artifact_id: &str, requester: &str)
    -> Result<(), StoreError>;
}
