//! Category inference for gallery artifacts.
//!
//! Scores a free-text description against the weighted keyword table, applies
//! curated phrase bonuses, and falls back to the style label when nothing in
//! the description matched. Classification never fails: unknown or empty
//! input degrades to a default category.

mod table;

pub use table::{CategoryRule, CategoryWeightTable, DEFAULT_TABLE};

use crate::domain::entities::Artifact;
use crate::domain::types::Category;

/// Points for a keyword occurrence bounded by non-alphanumerics on both sides.
pub const EXACT_MATCH_POINTS: f64 = 2.0;
/// Points for a keyword occurrence embedded in a longer word.
pub const SUBSTRING_MATCH_POINTS: f64 = 1.0;
/// One-off bonus when any curated phrase of a category is present.
pub const PHRASE_BONUS: f64 = 5.0;

/// Category returned when both description and style are empty.
pub const DEFAULT_CATEGORY: Category = Category::Portrait;

/// Call site on whose behalf classification runs. Only the terminal default
/// differs between paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringPath {
    /// Gallery listings: unmatched input is filed under `other`.
    Gallery,
    /// Generation flow: unmatched input is assumed to be a portrait.
    Generation,
}

impl ScoringPath {
    pub fn terminal_default(self) -> Category {
        match self {
            ScoringPath::Gallery => Category::Other,
            ScoringPath::Generation => Category::Portrait,
        }
    }
}

/// Weighted score for one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryScore {
    pub category: Category,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryScorer {
    table: &'static CategoryWeightTable,
}

impl Default for CategoryScorer {
    fn default() -> Self {
        Self::new(&DEFAULT_TABLE)
    }
}

impl CategoryScorer {
    pub fn new(table: &'static CategoryWeightTable) -> Self {
        Self { table }
    }

    /// Classify on the gallery path.
    pub fn classify(&self, description: &str, style: &str) -> Category {
        self.classify_for(ScoringPath::Gallery, description, style)
    }

    pub fn classify_for(&self, path: ScoringPath, description: &str, style: &str) -> Category {
        let description = description.trim();
        let style = style.trim();
        if description.is_empty() && style.is_empty() {
            return DEFAULT_CATEGORY;
        }

        let mut best: Option<CategoryScore> = None;
        for candidate in self.scores(description) {
            // Strict comparison keeps the earliest rule on ties.
            if best.is_none_or(|current| candidate.score > current.score) {
                best = Some(candidate);
            }
        }

        match best {
            Some(winner) if winner.score > 0.0 => winner.category,
            _ => self
                .classify_style(style)
                .unwrap_or_else(|| path.terminal_default()),
        }
    }

    /// Per-category scores in table order.
    pub fn scores(&self, description: &str) -> Vec<CategoryScore> {
        let lowered = description.to_lowercase();
        self.table
            .rules
            .iter()
            .map(|rule| CategoryScore {
                category: rule.category,
                score: score_rule(rule, &lowered),
            })
            .collect()
    }

    /// Exact case-insensitive style match first, then the first table entry
    /// contained in the label.
    pub fn classify_style(&self, style: &str) -> Option<Category> {
        let style = style.trim().to_lowercase();
        if style.is_empty() {
            return None;
        }

        self.table
            .styles
            .iter()
            .find(|(label, _)| *label == style)
            .or_else(|| {
                self.table
                    .styles
                    .iter()
                    .find(|(label, _)| style.contains(label))
            })
            .map(|(_, category)| *category)
    }

    /// Fill in the category of `artifact` when it has none. Returns `true`
    /// when a category was assigned.
    pub fn ensure_category(&self, artifact: &mut Artifact, path: ScoringPath) -> bool {
        if artifact.stored_category().is_some() {
            return false;
        }
        let category = self.classify_for(path, &artifact.prompt, &artifact.style);
        artifact.category = Some(category.as_str().to_string());
        true
    }
}

fn score_rule(rule: &CategoryRule, lowered: &str) -> f64 {
    let keyword_points: f64 = rule
        .keywords
        .iter()
        .map(|(keyword, weight)| keyword_points(lowered, keyword) * weight)
        .sum();

    let mut score = keyword_points * rule.priority;
    if rule.phrases.iter().any(|phrase| lowered.contains(phrase)) {
        score += PHRASE_BONUS;
    }
    score
}

fn keyword_points(haystack: &str, keyword: &str) -> f64 {
    if keyword.is_empty() {
        return 0.0;
    }

    haystack
        .match_indices(keyword)
        .map(|(start, matched)| {
            let before = haystack[..start].chars().next_back();
            let after = haystack[start + matched.len()..].chars().next();
            if is_boundary(before) && is_boundary(after) {
                EXACT_MATCH_POINTS
            } else {
                SUBSTRING_MATCH_POINTS
            }
        })
        .sum()
}

fn is_boundary(neighbour: Option<char>) -> bool {
    neighbour.is_none_or(|ch| !ch.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use time::OffsetDateTime;

    use super::*;
    use crate::domain::types::Visibility;

    fn scorer() -> CategoryScorer {
        CategoryScorer::default()
    }

    #[test]
    fn empty_inputs_yield_default_category() {
        assert_eq!(scorer().classify("", ""), Category::Portrait);
        assert_eq!(scorer().classify("   ", "\t"), Category::Portrait);
        assert_eq!(
            scorer().classify_for(ScoringPath::Gallery, "", ""),
            DEFAULT_CATEGORY
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let description = "a knight riding a dragon over a neon city";
        let first = scorer().classify(description, "digital art");
        for _ in 0..50 {
            assert_eq!(scorer().classify(description, "digital art"), first);
        }
    }

    #[test]
    fn cyberpunk_station_is_sci_fi() {
        assert_eq!(
            scorer().classify("cyberpunk space station with neon lights", ""),
            Category::SciFi
        );
    }

    #[test]
    fn bounded_match_scores_more_than_substring() {
        assert_eq!(keyword_points("a cat sleeping", "cat"), EXACT_MATCH_POINTS);
        assert_eq!(keyword_points("two cats", "cat"), SUBSTRING_MATCH_POINTS);
        assert_eq!(keyword_points("cat, cat.", "cat"), 2.0 * EXACT_MATCH_POINTS);
        assert_eq!(keyword_points("(cat)", "cat"), EXACT_MATCH_POINTS);
    }

    #[test]
    fn phrase_bonus_applies_once() {
        let rule = DEFAULT_TABLE.rule(Category::Vintage).expect("vintage rule");
        let once = score_rule(rule, "vintage photograph");
        let twice = score_rule(rule, "vintage photograph, vintage photograph");
        let keyword_only = 2.0 * EXACT_MATCH_POINTS * rule.priority;
        assert_eq!(once, EXACT_MATCH_POINTS * rule.priority + PHRASE_BONUS);
        assert_eq!(twice, keyword_only + PHRASE_BONUS);
    }

    #[test]
    fn phrase_override_beats_generic_keyword() {
        let description = "a classic car in a vintage photograph with old style lighting";
        assert_eq!(scorer().classify(description, ""), Category::Vintage);

        let mixed = "vintage photograph of a woman's portrait";
        let scores = scorer().scores(mixed);
        let vintage = scores
            .iter()
            .find(|s| s.category == Category::Vintage)
            .expect("vintage score");
        let portrait = scores
            .iter()
            .find(|s| s.category == Category::Portrait)
            .expect("portrait score");
        assert!(vintage.score > portrait.score);
        assert_eq!(scorer().classify(mixed, ""), Category::Vintage);
    }

    #[test]
    fn priority_weight_breaks_generic_ties() {
        // One bounded hit each; anime's priority wins over portrait's.
        assert_eq!(scorer().classify("anime portrait", ""), Category::Anime);
        assert_eq!(scorer().classify("a dog portrait", ""), Category::Animals);
    }

    #[test]
    fn equal_scores_resolve_to_table_order() {
        // Fashion and architecture share priority 1.0 and keyword weight 1.0.
        assert_eq!(
            scorer().classify("runway skyscraper", ""),
            Category::Fashion
        );
        assert_eq!(
            scorer().classify("skyscraper runway", ""),
            Category::Fashion
        );
    }

    #[test]
    fn unmatched_description_falls_back_to_style() {
        assert_eq!(
            scorer().classify("something indescribable", "Anime"),
            Category::Anime
        );
        assert_eq!(
            scorer().classify("something indescribable", "Dark Fantasy Illustration"),
            Category::Fantasy
        );
        assert_eq!(
            scorer().classify("", "PHOTOREALISTIC"),
            Category::Portrait
        );
    }

    #[test]
    fn exact_style_match_precedes_substring_match() {
        // "retro pop art" has no exact entry, and "retro" precedes "pop art".
        assert_eq!(scorer().classify_style("Pop Art"), Some(Category::Abstract));
        assert_eq!(
            scorer().classify_style("retro pop art"),
            Some(Category::Vintage)
        );
        assert_eq!(scorer().classify_style("unknown"), None);
    }

    #[test]
    fn terminal_default_depends_on_path() {
        assert_eq!(
            scorer().classify_for(ScoringPath::Gallery, "qwerty", "plain"),
            Category::Other
        );
        assert_eq!(
            scorer().classify_for(ScoringPath::Generation, "qwerty", "plain"),
            Category::Portrait
        );
    }

    #[test]
    fn ensure_category_only_fills_missing_values() {
        let mut artifact = Artifact {
            id: "a".to_string(),
            owner_id: "o".to_string(),
            image_url: "https://img.example/a.png".to_string(),
            prompt: "a red fox in the snow".to_string(),
            style: String::new(),
            aspect_ratio: "1:1".to_string(),
            category: None,
            visibility: Visibility::Shared,
            like_count: 0,
            liked_by: BTreeSet::new(),
            comments: Vec::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            source_artifact_id: None,
        };

        assert!(scorer().ensure_category(&mut artifact, ScoringPath::Gallery));
        assert_eq!(artifact.category.as_deref(), Some("animals"));

        artifact.category = Some("food".to_string());
        assert!(!scorer().ensure_category(&mut artifact, ScoringPath::Gallery));
        assert_eq!(artifact.category.as_deref(), Some("food"));
    }
}
