use serde::{Deserialize, Serialize};

use crate::application::gallery::{CategoryCount, ServedFrom};
use crate::application::mutations::{AddCommentRequest, CreateArtifactRequest};
use crate::domain::entities::Artifact;
use crate::domain::types::Category;

/// `?refresh` as a bare marker, or a boolish value.
pub fn refresh_requested(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None => false,
        Some("") => true,
        Some(value) => matches!(
            value.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GalleryParams {
    pub refresh: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshParams {
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub served_from: ServedFrom,
    pub count: usize,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Serialize)]
pub struct CategoryCountsResponse {
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ArtifactCreateRequest {
    pub image_url: String,
    pub prompt: String,
    pub style: Option<String>,
    pub aspect_ratio: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub shared: bool,
    pub source_artifact_id: Option<String>,
}

impl ArtifactCreateRequest {
    pub fn into_request(self, owner_id: String) -> CreateArtifactRequest {
        CreateArtifactRequest {
            owner_id,
            image_url: self.image_url,
            prompt: self.prompt,
            style: self.style,
            aspect_ratio: self.aspect_ratio,
            category: self.category,
            shared: self.shared,
            source_artifact_id: self.source_artifact_id,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentCreateRequest {
    pub author_name: String,
    pub body: String,
}

impl CommentCreateRequest {
    pub fn into_request(self, artifact_id: String, author_id: String) -> AddCommentRequest {
        AddCommentRequest {
            artifact_id,
            author_id,
            author_name: self.author_name,
            body: self.body,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ClassifyRequest {
    pub description: String,
    #[serde(default)]
    pub style: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tiers: TierHealth,
    pub cache: CacheHealth,
}

#[derive(Debug, Serialize)]
pub struct TierHealth {
    pub primary: bool,
    pub secondary: bool,
    pub tertiary: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheHealth {
    pub enabled: bool,
    pub entries: usize,
}
