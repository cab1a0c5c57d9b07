use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{
        ArtifactReader, ArtifactScope, ArtifactWriter, NewCommentParams, ShareArtifactParams,
        StoreError,
    },
    domain::{
        classify::ScoringPath,
        entities::{Artifact, Comment, LikeState, comment_deletable_by},
        types::Visibility,
    },
};

use super::{PostgresStore, util::map_sqlx_error};

const ARTIFACT_COLUMNS: &str = "id, owner_id, image_url, prompt, style, aspect_ratio, category, \
     is_public, like_count, source_artifact_id, created_at";

#[derive(sqlx::FromRow)]
struct ArtifactRow {
    id: String,
    owner_id: String,
    image_url: String,
    prompt: String,
    style: String,
    aspect_ratio: String,
    category: Option<String>,
    is_public: bool,
    like_count: i64,
    source_artifact_id: Option<String>,
    created_at: OffsetDateTime,
}

impl From<ArtifactRow> for Artifact {
    fn from(row: ArtifactRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            image_url: row.image_url,
            prompt: row.prompt,
            style: row.style,
            aspect_ratio: row.aspect_ratio,
            category: row.category,
            visibility: Visibility::from_public_flag(row.is_public),
            like_count: u64::try_from(row.like_count).unwrap_or(0),
            liked_by: BTreeSet::new(),
            comments: Vec::new(),
            created_at: row.created_at,
            source_artifact_id: row.source_artifact_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: String,
    artifact_id: String,
    author_id: String,
    author_name: String,
    body: String,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            artifact_id: row.artifact_id,
            author_id: row.author_id,
            author_name: row.author_name,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LikeRow {
    artifact_id: String,
    user_id: String,
}

#[derive(sqlx::FromRow)]
struct CommentOwnershipRow {
    author_id: String,
    owner_id: String,
}

impl PostgresStore {
    /// Attach comments (oldest first) and likers to `rows`, keeping row order.
    async fn hydrate(&self, rows: Vec<ArtifactRow>) -> Result<Vec<Artifact>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();

        let comment_rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, artifact_id, author_id, author_name, body, created_at
            FROM artifact_comments
            WHERE artifact_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let like_rows = sqlx::query_as::<_, LikeRow>(
            r#"
            SELECT artifact_id, user_id
            FROM artifact_likes
            WHERE artifact_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut comments: HashMap<String, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            comments
                .entry(row.artifact_id.clone())
                .or_default()
                .push(Comment::from(row));
        }

        let mut likers: HashMap<String, BTreeSet<String>> = HashMap::new();
        for row in like_rows {
            likers.entry(row.artifact_id).or_default().insert(row.user_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut artifact = Artifact::from(row);
                if let Some(list) = comments.remove(&artifact.id) {
                    artifact.comments = list;
                }
                if let Some(set) = likers.remove(&artifact.id) {
                    artifact.liked_by = set;
                }
                artifact
            })
            .collect())
    }

    async fn hydrate_one(&self, row: ArtifactRow) -> Result<Artifact, StoreError> {
        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl ArtifactReader for PostgresStore {
    async fn list_artifacts(&self, scope: &ArtifactScope) -> Result<Vec<Artifact>, StoreError> {
        let rows = match scope {
            ArtifactScope::Public => {
                sqlx::query_as::<_, ArtifactRow>(&format!(
                    "SELECT {ARTIFACT_COLUMNS} FROM artifacts \
                     WHERE is_public \
                     ORDER BY created_at DESC, id DESC"
                ))
                .fetch_all(self.pool())
                .await
            }
            ArtifactScope::Owner(owner_id) => {
                sqlx::query_as::<_, ArtifactRow>(&format!(
                    "SELECT {ARTIFACT_COLUMNS} FROM artifacts \
                     WHERE owner_id = $1 \
                     ORDER BY created_at DESC, id DESC"
                ))
                .bind(owner_id)
                .fetch_all(self.pool())
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        self.hydrate(rows).await
    }
}

#[async_trait]
impl ArtifactWriter for PostgresStore {
    async fn create_artifact(&self, artifact: &Artifact) -> Result<Artifact, StoreError> {
        let row = sqlx::query_as::<_, ArtifactRow>(&format!(
            "INSERT INTO artifacts \
                (id, owner_id, image_url, prompt, style, aspect_ratio, category, is_public, \
                 like_count, source_artifact_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10) \
             RETURNING {ARTIFACT_COLUMNS}"
        ))
        .bind(&artifact.id)
        .bind(&artifact.owner_id)
        .bind(&artifact.image_url)
        .bind(&artifact.prompt)
        .bind(&artifact.style)
        .bind(&artifact.aspect_ratio)
        .bind(artifact.category.as_deref())
        .bind(artifact.is_shared())
        .bind(artifact.source_artifact_id.as_deref())
        .bind(artifact.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(Artifact::from(row))
    }

    async fn share_artifact(
        &self,
        params: ShareArtifactParams<'_>,
    ) -> Result<Artifact, StoreError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, ArtifactRow>(&format!(
            "SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE id = $1 FOR UPDATE"
        ))
        .bind(params.artifact_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(StoreError::NotFound)?;

        if row.owner_id != params.requester {
            return Err(StoreError::Forbidden {
                action: "share_artifact",
            });
        }

        if row.is_public {
            tx.commit().await.map_err(map_sqlx_error)?;
            return self.hydrate_one(row).await;
        }

        let mut artifact = Artifact::from(row);
        params
            .scorer
            .ensure_category(&mut artifact, ScoringPath::Gallery);

        let row = sqlx::query_as::<_, ArtifactRow>(&format!(
            "UPDATE artifacts SET is_public = TRUE, category = $2 \
             WHERE id = $1 \
             RETURNING {ARTIFACT_COLUMNS}"
        ))
        .bind(&artifact.id)
        .bind(artifact.category.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        self.hydrate_one(row).await
    }

    async fn toggle_like(&self, artifact_id: &str, user_id: &str) -> Result<LikeState, StoreError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        sqlx::query_scalar::<_, String>("SELECT id FROM artifacts WHERE id = $1 FOR UPDATE")
            .bind(artifact_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StoreError::NotFound)?;

        let removed = sqlx::query(
            "DELETE FROM artifact_likes WHERE artifact_id = $1 AND user_id = $2",
        )
        .bind(artifact_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        if removed == 0 {
            sqlx::query("INSERT INTO artifact_likes (artifact_id, user_id) VALUES ($1, $2)")
                .bind(artifact_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        let delta: i64 = if removed == 0 { 1 } else { -1 };
        let like_count = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE artifacts
            SET like_count = GREATEST(like_count + $2, 0)
            WHERE id = $1
            RETURNING like_count
            "#,
        )
        .bind(artifact_id)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(LikeState {
            liked: removed == 0,
            like_count: u64::try_from(like_count).unwrap_or(0),
        })
    }

    async fn add_comment(&self, params: &NewCommentParams) -> Result<Comment, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO artifact_comments (id, artifact_id, author_id, author_name, body, created_at)
            SELECT $1, a.id, $3, $4, $5, $6
            FROM artifacts a
            WHERE a.id = $2
            RETURNING id, artifact_id, author_id, author_name, body, created_at
            "#,
        )
        .bind(&params.id)
        .bind(&params.artifact_id)
        .bind(&params.author_id)
        .bind(&params.author_name)
        .bind(&params.body)
        .bind(params.created_at)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(StoreError::NotFound)?;

        Ok(Comment::from(row))
    }

    async fn delete_comment(
        &self,
        artifact_id: &str,
        comment_id: &str,
        requester: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let ownership = sqlx::query_as::<_, CommentOwnershipRow>(
            r#"
            SELECT c.author_id, a.owner_id
            FROM artifact_comments c
            INNER JOIN artifacts a ON a.id = c.artifact_id
            WHERE c.id = $1 AND c.artifact_id = $2
            FOR UPDATE OF c
            "#,
        )
        .bind(comment_id)
        .bind(artifact_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(StoreError::NotFound)?;

        if !comment_deletable_by(&ownership.owner_id, &ownership.author_id, requester) {
            return Err(StoreError::Forbidden {
                action: "delete_comment",
            });
        }

        sqlx::query("DELETE FROM artifact_comments WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn delete_artifact(&self, artifact_id: &str, requester: &str) -> Result<(), StoreError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let owner_id = sqlx::query_scalar::<_, String>(
            "SELECT owner_id FROM artifacts WHERE id = $1 FOR UPDATE",
        )
        .bind(artifact_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(StoreError::NotFound)?;

        if owner_id != requester {
            return Err(StoreError::Forbidden {
                action: "delete_artifact",
            });
        }

        // Comments and likes go with the artifact via ON DELETE CASCADE.
        sqlx::query("DELETE FROM artifacts WHERE id = $1")
            .bind(artifact_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)
    }
}
