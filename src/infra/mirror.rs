//! Secondary store: a read-only SQLite mirror of the shared gallery.
//!
//! The mirror uses its own column names (`prompt_text`, `style_name`,
//! `image_path`, `likes`, `user_id`, `is_shared`) and keeps timestamps as
//! RFC 3339 text. Rows are mapped onto [`Artifact`] here.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{info, warn};

use crate::application::repos::{ArtifactReader, ArtifactScope, StoreError};
use crate::domain::entities::{Artifact, Comment};
use crate::domain::types::Visibility;

use super::db::map_sqlx_error;

const MAX_CONNECTIONS: u32 = 4;
/// Ids bound per comment lookup; stays under SQLite's host parameter limit.
const COMMENT_LOOKUP_CHUNK: usize = 500;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS shared_images (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        image_path TEXT NOT NULL,
        prompt_text TEXT NOT NULL DEFAULT '',
        style_name TEXT NOT NULL DEFAULT '',
        aspect TEXT NOT NULL DEFAULT '1:1',
        category TEXT,
        likes INTEGER NOT NULL DEFAULT 0,
        is_shared INTEGER NOT NULL DEFAULT 0,
        origin_id TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS shared_image_comments (
        id TEXT PRIMARY KEY,
        image_id TEXT NOT NULL REFERENCES shared_images (id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        user_name TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS shared_images_shared_created_idx
        ON shared_images (is_shared, created_at DESC)
    "#,
];

#[derive(sqlx::FromRow)]
struct SharedImageRow {
    id: String,
    user_id: String,
    image_path: String,
    prompt_text: String,
    style_name: String,
    aspect: String,
    category: Option<String>,
    likes: i64,
    is_shared: i64,
    origin_id: Option<String>,
    created_at: String,
}

#[derive(sqlx::FromRow)]
struct MirrorCommentRow {
    id: String,
    image_id: String,
    user_id: String,
    user_name: String,
    content: String,
    created_at: String,
}

fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).ok()
}

impl SharedImageRow {
    fn into_artifact(self) -> Option<Artifact> {
        let Some(created_at) = parse_timestamp(&self.created_at) else {
            warn!(
                artifact_id = %self.id,
                created_at = %self.created_at,
                "Skipping mirror row with unreadable timestamp"
            );
            return None;
        };

        Some(Artifact {
            id: self.id,
            owner_id: self.user_id,
            image_url: self.image_path,
            prompt: self.prompt_text,
            style: self.style_name,
            aspect_ratio: self.aspect,
            category: self.category,
            visibility: Visibility::from_public_flag(self.is_shared != 0),
            like_count: u64::try_from(self.likes).unwrap_or(0),
            liked_by: BTreeSet::new(),
            comments: Vec::new(),
            created_at,
            source_artifact_id: self.origin_id,
        })
    }
}

impl MirrorCommentRow {
    fn into_comment(self) -> Option<Comment> {
        let created_at = parse_timestamp(&self.created_at)?;
        Some(Comment {
            id: self.id,
            artifact_id: self.image_id,
            author_id: self.user_id,
            author_name: self.user_name,
            body: self.content,
            created_at,
        })
    }
}

#[derive(Clone)]
pub struct SqliteMirror {
    pool: Pool<Sqlite>,
}

impl SqliteMirror {
    /// Open (creating if needed) the mirror database at `path`.
    pub async fn connect(path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let mirror = Self::from_pool(pool);
        mirror.ensure_schema().await?;
        info!(path = %path.display(), "Connected to SQLite mirror");
        Ok(mirror)
    }

    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create the mirror tables when they are missing. Safe to call repeatedly.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn comments_for(
        &self,
        artifacts: &[Artifact],
    ) -> Result<HashMap<String, Vec<Comment>>, StoreError> {
        let mut grouped: HashMap<String, Vec<Comment>> = HashMap::new();
        if artifacts.is_empty() {
            return Ok(grouped);
        }

        for chunk in artifacts.chunks(COMMENT_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT id, image_id, user_id, user_name, content, created_at \
                 FROM shared_image_comments \
                 WHERE image_id IN ({placeholders})"
            );
            let mut query = sqlx::query_as::<_, MirrorCommentRow>(&sql);
            for artifact in chunk {
                query = query.bind(&artifact.id);
            }

            let rows = query.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
            for comment in rows.into_iter().filter_map(MirrorCommentRow::into_comment) {
                grouped
                    .entry(comment.artifact_id.clone())
                    .or_default()
                    .push(comment);
            }
        }
        for comments in grouped.values_mut() {
            comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }
        Ok(grouped)
    }
}

#[async_trait]
impl ArtifactReader for SqliteMirror {
    async fn list_artifacts(&self, scope: &ArtifactScope) -> Result<Vec<Artifact>, StoreError> {
        const COLUMNS: &str = "id, user_id, image_path, prompt_text, style_name, aspect, \
             category, likes, is_shared, origin_id, created_at";

        let rows = match scope {
            ArtifactScope::Public => {
                sqlx::query_as::<_, SharedImageRow>(&format!(
                    "SELECT {COLUMNS} FROM shared_images WHERE is_shared = 1"
                ))
                .fetch_all(&self.pool)
                .await
            }
            ArtifactScope::Owner(owner_id) => {
                sqlx::query_as::<_, SharedImageRow>(&format!(
                    "SELECT {COLUMNS} FROM shared_images WHERE user_id = ?"
                ))
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        let mut artifacts: Vec<Artifact> = rows
            .into_iter()
            .filter_map(SharedImageRow::into_artifact)
            .collect();
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut comments = self.comments_for(&artifacts).await?;
        for artifact in &mut artifacts {
            if let Some(list) = comments.remove(&artifact.id) {
                artifact.comments = list;
            }
        }

        Ok(artifacts)
    }
}
