//! Domain entities mirrored from persistent storage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::Visibility;

/// A generated image and its social metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub owner_id: String,
    pub image_url: String,
    pub prompt: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub aspect_ratio: String,
    #[serde(default)]
    pub category: Option<String>,
    pub visibility: Visibility,
    #[serde(default)]
    pub like_count: u64,
    /// Users who liked the artifact, where the backing tier keeps them.
    #[serde(default)]
    pub liked_by: BTreeSet<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub source_artifact_id: Option<String>,
}

impl Artifact {
    /// Returns the stored category when it is present and not blank.
    pub fn stored_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn is_shared(&self) -> bool {
        self.visibility.is_public()
    }

    /// Flip the like state of `user_id`, returning whether the user now likes
    /// the artifact. The stored count moves by one in either direction, so
    /// records that carry a count without a liker set keep their tally.
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        if self.liked_by.remove(user_id) {
            self.like_count = self.like_count.saturating_sub(1);
            false
        } else {
            self.liked_by.insert(user_id.to_string());
            self.like_count = self.like_count.saturating_add(1);
            true
        }
    }

    pub fn can_delete_comment(&self, comment: &Comment, requester: &str) -> bool {
        comment_deletable_by(&self.owner_id, &comment.author_id, requester)
    }
}

/// Comments may be removed by their author or by the artifact owner.
pub fn comment_deletable_by(artifact_owner: &str, comment_author: &str, requester: &str) -> bool {
    comment_author == requester || artifact_owner == requester
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub artifact_id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Artifact {
        Artifact {
            id: "a-1".to_string(),
            owner_id: "owner".to_string(),
            image_url: "https://img.example/a-1.png".to_string(),
            prompt: "a red fox".to_string(),
            style: String::new(),
            aspect_ratio: "1:1".to_string(),
            category: Some("   ".to_string()),
            visibility: Visibility::Shared,
            like_count: 0,
            liked_by: BTreeSet::new(),
            comments: Vec::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            source_artifact_id: None,
        }
    }

    #[test]
    fn blank_category_is_not_stored() {
        assert_eq!(sample().stored_category(), None);
    }

    #[test]
    fn toggle_like_is_idempotent_per_user() {
        let mut artifact = sample();
        assert!(artifact.toggle_like("u1"));
        assert!(artifact.toggle_like("u2"));
        assert_eq!(artifact.like_count, 2);
        assert!(!artifact.toggle_like("u1"));
        assert_eq!(artifact.like_count, 1);
        assert!(artifact.toggle_like("u1"));
        assert!(!artifact.toggle_like("u1"));
        assert_eq!(artifact.like_count, 1);
    }

    #[test]
    fn toggle_like_keeps_count_without_liker_set() {
        let mut artifact = sample();
        artifact.like_count = 5;
        assert!(artifact.toggle_like("bob"));
        assert_eq!(artifact.like_count, 6);
        assert!(!artifact.toggle_like("bob"));
        assert_eq!(artifact.like_count, 5);
    }

    #[test]
    fn comment_deletion_rights() {
        let artifact = sample();
        let comment = Comment {
            id: "c-1".to_string(),
            artifact_id: artifact.id.clone(),
            author_id: "guest".to_string(),
            author_name: "Guest".to_string(),
            body: "nice".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        assert!(artifact.can_delete_comment(&comment, "guest"));
        assert!(artifact.can_delete_comment(&comment, "owner"));
        assert!(!artifact.can_delete_comment(&comment, "stranger"));
    }
}
