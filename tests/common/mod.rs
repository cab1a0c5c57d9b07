#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime, macros::datetime};

use galleria::application::repos::{
    ArtifactReader, ArtifactScope, ArtifactWriter, NewCommentParams, ShareArtifactParams,
    StoreError,
};
use galleria::domain::entities::{Artifact, Comment, LikeState};
use galleria::domain::types::Visibility;

const EPOCH: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

/// Artifact created `minutes` after a fixed epoch, without a category.
pub fn artifact(id: &str, owner: &str, prompt: &str, shared: bool, minutes: i64) -> Artifact {
    Artifact {
        id: id.to_string(),
        owner_id: owner.to_string(),
        image_url: format!("https://images.example.test/{id}.png"),
        prompt: prompt.to_string(),
        style: String::new(),
        aspect_ratio: "1:1".to_string(),
        category: None,
        visibility: Visibility::from_public_flag(shared),
        like_count: 0,
        liked_by: BTreeSet::new(),
        comments: Vec::new(),
        created_at: EPOCH + Duration::minutes(minutes),
        source_artifact_id: None,
    }
}

pub fn ids(artifacts: &[Artifact]) -> Vec<&str> {
    artifacts.iter().map(|artifact| artifact.id.as_str()).collect()
}

#[derive(Debug, Clone)]
pub enum Reply {
    Artifacts(Vec<Artifact>),
    Fail,
    /// Never answers.
    Hang,
}

/// Reader with a scripted answer that counts its calls.
pub struct ScriptedReader {
    reply: Mutex<Reply>,
    calls: AtomicUsize,
}

impl ScriptedReader {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn serving(artifacts: Vec<Artifact>) -> Self {
        Self::new(Reply::Artifacts(artifacts))
    }

    pub fn failing() -> Self {
        Self::new(Reply::Fail)
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().expect("reply lock") = reply;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactReader for ScriptedReader {
    async fn list_artifacts(&self, scope: &ArtifactScope) -> Result<Vec<Artifact>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply.lock().expect("reply lock").clone();
        match reply {
            Reply::Artifacts(artifacts) => Ok(artifacts
                .into_iter()
                .filter(|artifact| scope.admits(artifact))
                .collect()),
            Reply::Fail => Err(StoreError::Unavailable("connection refused".to_string())),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// A store whose every call fails as if the server were down.
#[derive(Default)]
pub struct DownStore {
    calls: AtomicUsize,
}

impl DownStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn refuse<T>(&self) -> Result<T, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl ArtifactReader for DownStore {
    async fn list_artifacts(&self, _scope: &ArtifactScope) -> Result<Vec<Artifact>, StoreError> {
        self.refuse()
    }
}

#[async_trait]
impl ArtifactWriter for DownStore {
    async fn create_artifact(&self, _artifact: &Artifact) -> Result<Artifact, StoreError> {
        self.refuse()
    }

    async fn share_artifact(
        &self,
        _params: ShareArtifactParams<'_>,
    ) -> Result<Artifact, StoreError> {
        self.refuse()
    }

    async fn toggle_like(
        &self,
        _artifact_id: &str,
        _user_id: &str,
    ) -> Result<LikeState, StoreError> {
        self.refuse()
    }

    async fn add_comment(&self, _params: &NewCommentParams) -> Result<Comment, StoreError> {
        self.refuse()
    }

    async fn delete_comment(
        &self,
        _artifact_id: &str,
        _comment_id: &str,
        _requester: &str,
    ) -> Result<(), StoreError> {
        self.refuse()
    }

    async fn delete_artifact(
        &self,
        _artifact_id: &str,
        _requester: &str,
    ) -> Result<(), StoreError> {
        self.refuse()
    }
}

/// Wraps a reader and counts how often the tiers were queried through it.
pub struct CountingReader {
    inner: Arc<dyn ArtifactReader>,
    calls: AtomicUsize,
}

impl CountingReader {
    pub fn new(inner: Arc<dyn ArtifactReader>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactReader for CountingReader {
    async fn list_artifacts(&self, scope: &ArtifactScope) -> Result<Vec<Artifact>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_artifacts(scope).await
    }
}
