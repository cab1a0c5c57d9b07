//! Tertiary store: the whole gallery as one JSON array on disk.
//!
//! Every mutation is a read-modify-write of the full file, serialised by an
//! async mutex and published with a rename so readers never observe a
//! partial file. A missing file is created empty on first access.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};
use tracing::info;

use crate::application::repos::{
    ArtifactReader, ArtifactScope, ArtifactWriter, NewCommentParams, ShareArtifactParams,
    StoreError,
};
use crate::domain::classify::ScoringPath;
use crate::domain::entities::{Artifact, Comment, LikeState};
use crate::domain::types::Visibility;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Callers must hold `self.lock`.
    async fn read_all(&self) -> Result<Vec<Artifact>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                StoreError::from_persistence(format!(
                    "failed to parse `{}`: {err}",
                    self.path.display()
                ))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.write_all(&[]).await?;
                info!(path = %self.path.display(), "Created empty fallback gallery file");
                Ok(Vec::new())
            }
            Err(err) => Err(io_error(&self.path, "read", err)),
        }
    }

    /// Callers must hold `self.lock`.
    async fn write_all(&self, artifacts: &[Artifact]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| io_error(parent, "create directory", err))?;
        }

        let payload = serde_json::to_vec_pretty(artifacts)
            .map_err(|err| StoreError::from_persistence(format!("failed to encode: {err}")))?;

        let staging = self.staging_path();
        fs::write(&staging, payload)
            .await
            .map_err(|err| io_error(&staging, "write", err))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|err| io_error(&self.path, "replace", err))
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Apply `change` to the stored list under the lock. The file is
    /// rewritten only when `change` reports a modification.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<Artifact>) -> Result<(T, bool), StoreError> + Send,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let mut artifacts = self.read_all().await?;
        let (value, modified) = change(&mut artifacts)?;
        if modified {
            self.write_all(&artifacts).await?;
        }
        Ok(value)
    }
}

fn io_error(path: &Path, action: &str, err: std::io::Error) -> StoreError {
    StoreError::from_persistence(format!("failed to {action} `{}`: {err}", path.display()))
}

fn find_mut<'a>(
    artifacts: &'a mut [Artifact],
    artifact_id: &str,
) -> Result<&'a mut Artifact, StoreError> {
    artifacts
        .iter_mut()
        .find(|artifact| artifact.id == artifact_id)
        .ok_or(StoreError::NotFound)
}

#[async_trait]
impl ArtifactReader for JsonFileStore {
    async fn list_artifacts(&self, scope: &ArtifactScope) -> Result<Vec<Artifact>, StoreError> {
        let stored = {
            let _guard = self.lock.lock().await;
            self.read_all().await?
        };

        let mut artifacts: Vec<Artifact> = stored
            .into_iter()
            .filter(|artifact| scope.admits(artifact))
            .collect();
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for artifact in &mut artifacts {
            artifact.comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }
        Ok(artifacts)
    }
}

#[async_trait]
impl ArtifactWriter for JsonFileStore {
    async fn create_artifact(&self, artifact: &Artifact) -> Result<Artifact, StoreError> {
        let created = artifact.clone();
        self.mutate(move |artifacts| {
            if artifacts.iter().any(|existing| existing.id == created.id) {
                return Err(StoreError::Duplicate {
                    constraint: "artifact_id".to_string(),
                });
            }
            artifacts.push(created.clone());
            Ok((created, true))
        })
        .await
    }

    async fn share_artifact(
        &self,
        params: ShareArtifactParams<'_>,
    ) -> Result<Artifact, StoreError> {
        self.mutate(|artifacts| {
            let artifact = find_mut(artifacts, params.artifact_id)?;
            if artifact.owner_id != params.requester {
                return Err(StoreError::Forbidden {
                    action: "share_artifact",
                });
            }
            if artifact.is_shared() {
                return Ok((artifact.clone(), false));
            }

            params
                .scorer
                .ensure_category(artifact, ScoringPath::Gallery);
            artifact.visibility = Visibility::Shared;
            Ok((artifact.clone(), true))
        })
        .await
    }

    async fn toggle_like(&self, artifact_id: &str, user_id: &str) -> Result<LikeState, StoreError> {
        self.mutate(|artifacts| {
            let artifact = find_mut(artifacts, artifact_id)?;
            let liked = artifact.toggle_like(user_id);
            let state = LikeState {
                liked,
                like_count: artifact.like_count,
            };
            Ok((state, true))
        })
        .await
    }

    async fn add_comment(&self, params: &NewCommentParams) -> Result<Comment, StoreError> {
        let comment = params.clone().into_comment();
        self.mutate(move |artifacts| {
            let artifact = find_mut(artifacts, &comment.artifact_id)?;
            artifact.comments.push(comment.clone());
            Ok((comment, true))
        })
        .await
    }

    async fn delete_comment(
        &self,
        artifact_id: &str,
        comment_id: &str,
        requester: &str,
    ) -> Result<(), StoreError> {
        self.mutate(|artifacts| {
            let artifact = find_mut(artifacts, artifact_id)?;
            let index = artifact
                .comments
                .iter()
                .position(|comment| comment.id == comment_id)
                .ok_or(StoreError::NotFound)?;
            if !artifact.can_delete_comment(&artifact.comments[index], requester) {
                return Err(StoreError::Forbidden {
                    action: "delete_comment",
                });
            }
            artifact.comments.remove(index);
            Ok(((), true))
        })
        .await
    }

    async fn delete_artifact(&self, artifact_id: &str, requester: &str) -> Result<(), StoreError> {
        self.mutate(|artifacts| {
            let index = artifacts
                .iter()
                .position(|artifact| artifact.id == artifact_id)
                .ok_or(StoreError::NotFound)?;
            if artifacts[index].owner_id != requester {
                return Err(StoreError::Forbidden {
                    action: "delete_artifact",
                });
            }
            artifacts.remove(index);
            Ok(((), true))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::domain::classify::CategoryScorer;

    fn artifact(id: &str, owner: &str, visibility: Visibility, minutes: i64) -> Artifact {
        Artifact {
            id: id.to_string(),
            owner_id: owner.to_string(),
            image_url: format!("https://img.example/{id}.png"),
            prompt: "a red fox in the snow".to_string(),
            style: String::new(),
            aspect_ratio: "1:1".to_string(),
            category: None,
            visibility,
            like_count: 0,
            liked_by: BTreeSet::new(),
            comments: Vec::new(),
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::minutes(minutes),
            source_artifact_id: None,
        }
    }

    fn comment(id: &str, artifact_id: &str, author: &str) -> NewCommentParams {
        NewCommentParams {
            id: id.to_string(),
            artifact_id: artifact_id.to_string(),
            author_id: author.to_string(),
            author_name: author.to_uppercase(),
            body: "lovely".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("gallery.json");
        let store = JsonFileStore::new(&path);

        let artifacts = store
            .list_artifacts(&ArtifactScope::Public)
            .await
            .expect("list");

        assert!(artifacts.is_empty());
        let contents = std::fs::read_to_string(&path).expect("file created");
        assert_eq!(contents.trim(), "[]");
    }

    #[tokio::test]
    async fn lists_filter_by_scope_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("gallery.json"));

        for item in [
            artifact("a", "u1", Visibility::Shared, 1),
            artifact("b", "u1", Visibility::Generated, 2),
            artifact("c", "u2", Visibility::Shared, 3),
        ] {
            store.create_artifact(&item).await.expect("create");
        }

        let public = store
            .list_artifacts(&ArtifactScope::Public)
            .await
            .expect("public");
        let ids: Vec<&str> = public.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);

        let owned = store
            .list_artifacts(&ArtifactScope::Owner("u1".to_string()))
            .await
            .expect("owner");
        let ids: Vec<&str> = owned.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("gallery.json"));
        let item = artifact("a", "u1", Visibility::Shared, 1);

        store.create_artifact(&item).await.expect("first create");
        let err = store
            .create_artifact(&item)
            .await
            .expect_err("second create");
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn like_toggle_persists_and_reverts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gallery.json");
        let store = JsonFileStore::new(&path);
        store
            .create_artifact(&artifact("a", "u1", Visibility::Shared, 1))
            .await
            .expect("create");

        let first = store.toggle_like("a", "u2").await.expect("like");
        assert_eq!(
            first,
            LikeState {
                liked: true,
                like_count: 1
            }
        );

        let reopened = JsonFileStore::new(&path);
        let second = reopened.toggle_like("a", "u2").await.expect("unlike");
        assert_eq!(
            second,
            LikeState {
                liked: false,
                like_count: 0
            }
        );
    }

    #[tokio::test]
    async fn like_toggle_preserves_count_only_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gallery.json");
        std::fs::write(
            &path,
            r#"[{"id":"a1","owner_id":"u1","image_url":"images/a1.png","prompt":"a red fox",
                "visibility":"shared","like_count":5,"created_at":"2024-01-01T00:00:00Z"}]"#,
        )
        .expect("seed file");
        let store = JsonFileStore::new(&path);

        let first = store.toggle_like("a1", "bob").await.expect("like");
        assert_eq!(
            first,
            LikeState {
                liked: true,
                like_count: 6
            }
        );
        let second = store.toggle_like("a1", "bob").await.expect("unlike");
        assert_eq!(
            second,
            LikeState {
                liked: false,
                like_count: 5
            }
        );
    }

    #[tokio::test]
    async fn share_assigns_category_and_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("gallery.json"));
        store
            .create_artifact(&artifact("a", "u1", Visibility::Generated, 1))
            .await
            .expect("create");

        let params = ShareArtifactParams {
            artifact_id: "a",
            requester: "u1",
            scorer: CategoryScorer::default(),
        };
        let shared = store.share_artifact(params).await.expect("share");
        assert!(shared.is_shared());
        assert_eq!(shared.category.as_deref(), Some("animals"));

        let again = store.share_artifact(params).await.expect("share again");
        assert_eq!(again, shared);

        let stranger = ShareArtifactParams {
            requester: "u2",
            ..params
        };
        assert!(matches!(
            store.share_artifact(stranger).await,
            Err(StoreError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn comment_deletion_respects_ownership() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("gallery.json"));
        store
            .create_artifact(&artifact("a", "owner", Visibility::Shared, 1))
            .await
            .expect("create");
        store
            .add_comment(&comment("c1", "a", "guest"))
            .await
            .expect("comment");
        store
            .add_comment(&comment("c2", "a", "guest"))
            .await
            .expect("comment");

        assert!(matches!(
            store.delete_comment("a", "c1", "stranger").await,
            Err(StoreError::Forbidden { .. })
        ));
        store
            .delete_comment("a", "c1", "guest")
            .await
            .expect("author deletes");
        store
            .delete_comment("a", "c2", "owner")
            .await
            .expect("owner deletes");
        assert!(matches!(
            store.delete_comment("a", "c2", "owner").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn comments_on_unknown_artifacts_are_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("gallery.json"));
        assert!(matches!(
            store.add_comment(&comment("c1", "missing", "guest")).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_artifact_requires_owner() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("gallery.json"));
        store
            .create_artifact(&artifact("a", "owner", Visibility::Shared, 1))
            .await
            .expect("create");

        assert!(matches!(
            store.delete_artifact("a", "guest").await,
            Err(StoreError::Forbidden { .. })
        ));
        store.delete_artifact("a", "owner").await.expect("delete");
        assert!(
            store
                .list_artifacts(&ArtifactScope::Public)
                .await
                .expect("list")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gallery.json");
        std::fs::write(&path, "{ not json").expect("write");
        let store = JsonFileStore::new(&path);

        assert!(matches!(
            store.list_artifacts(&ArtifactScope::Public).await,
            Err(StoreError::Persistence(_))
        ));
    }
}
