//! Cache key definitions.

use crate::application::repos::ArtifactScope;

/// Identifies one coarse-grained cached collection. Each key holds at most
/// one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    /// All shared artifacts, newest first.
    PublicGallery,
    /// Every artifact owned by a user, private ones included.
    Owner(String),
}

impl CollectionKey {
    pub fn owner(user_id: impl Into<String>) -> Self {
        Self::Owner(user_id.into())
    }

    /// Store filter that produces this collection.
    pub fn scope(&self) -> ArtifactScope {
        match self {
            CollectionKey::PublicGallery => ArtifactScope::Public,
            CollectionKey::Owner(user_id) => ArtifactScope::Owner(user_id.clone()),
        }
    }

    /// Low-cardinality label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CollectionKey::PublicGallery => "public",
            CollectionKey::Owner(_) => "owner",
        }
    }

    /// Collections that can contain an artifact owned by `owner_id`.
    pub fn affected_by(owner_id: &str) -> [CollectionKey; 2] {
        [
            CollectionKey::PublicGallery,
            CollectionKey::Owner(owner_id.to_string()),
        ]
    }
}
