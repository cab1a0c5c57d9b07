//! Shared domain enumerations aligned with persisted values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sharing lifecycle of an artifact. `Deleted` is not represented: deleted
/// artifacts are removed from every writable tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Private to its owner; not part of the public gallery.
    Generated,
    /// Public, category assigned.
    Shared,
}

impl Visibility {
    pub fn from_public_flag(is_public: bool) -> Self {
        if is_public {
            Visibility::Shared
        } else {
            Visibility::Generated
        }
    }

    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Shared)
    }
}

/// Topical category tag attached to gallery artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Vintage,
    Anime,
    Animals,
    SciFi,
    Fantasy,
    Fashion,
    Architecture,
    Food,
    Nature,
    Abstract,
    Portrait,
    Other,
}

impl Category {
    /// Every category in classification table order, `Other` last.
    pub const ALL: [Category; 12] = [
        Category::Vintage,
        Category::Anime,
        Category::Animals,
        Category::SciFi,
        Category::Fantasy,
        Category::Fashion,
        Category::Architecture,
        Category::Food,
        Category::Nature,
        Category::Abstract,
        Category::Portrait,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Vintage => "vintage",
            Category::Anime => "anime",
            Category::Animals => "animals",
            Category::SciFi => "sci-fi",
            Category::Fantasy => "fantasy",
            Category::Fashion => "fashion",
            Category::Architecture => "architecture",
            Category::Food => "food",
            Category::Nature => "nature",
            Category::Abstract => "abstract",
            Category::Portrait => "portrait",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category `{}`", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let alias = match normalized.as_str() {
            "scifi" | "sci_fi" | "science-fiction" => "sci-fi",
            "animal" => "animals",
            other => other,
        };
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == alias)
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}
