//! Static category weight table.
//!
//! Order is significant: ties are resolved in favour of the rule that
//! appears first, and style labels are matched top to bottom.

use crate::domain::types::Category;

/// Scoring rule for a single category.
#[derive(Debug)]
pub struct CategoryRule {
    pub category: Category,
    /// Multiplier applied to the accumulated keyword score.
    pub priority: f64,
    /// `(keyword, weight)` pairs; keywords are lower-case.
    pub keywords: &'static [(&'static str, f64)],
    /// Curated phrases granting a one-off bonus.
    pub phrases: &'static [&'static str],
}

/// Immutable classification configuration.
#[derive(Debug)]
pub struct CategoryWeightTable {
    pub rules: &'static [CategoryRule],
    /// Style label to category fallback, lower-case keys.
    pub styles: &'static [(&'static str, Category)],
}

impl CategoryWeightTable {
    pub fn rule(&self, category: Category) -> Option<&CategoryRule> {
        self.rules.iter().find(|rule| rule.category == category)
    }
}

pub static DEFAULT_TABLE: CategoryWeightTable = CategoryWeightTable {
    rules: &[
        CategoryRule {
            category: Category::Vintage,
            priority: 1.5,
            keywords: &[
                ("vintage", 1.0),
                ("retro", 1.0),
                ("antique", 1.0),
                ("sepia", 1.0),
                ("victorian", 1.0),
                ("daguerreotype", 1.0),
                ("old style", 1.0),
                ("old-fashioned", 1.0),
                ("1920s", 1.0),
                ("1950s", 1.0),
                ("classic", 0.8),
                ("film grain", 0.8),
            ],
            phrases: &[
                "vintage photograph",
                "vintage photo",
                "old photograph",
                "retro style",
                "sepia tone",
            ],
        },
        CategoryRule {
            category: Category::Anime,
            priority: 1.6,
            keywords: &[
                ("anime", 1.0),
                ("manga", 1.0),
                ("chibi", 1.0),
                ("kawaii", 1.0),
                ("ghibli", 1.0),
                ("shonen", 1.0),
                ("waifu", 1.0),
                ("cel shaded", 0.8),
            ],
            phrases: &["anime style", "manga style", "anime girl", "anime character"],
        },
        CategoryRule {
            category: Category::Animals,
            priority: 1.4,
            keywords: &[
                ("animal", 1.0),
                ("wildlife", 1.0),
                ("cat", 1.0),
                ("kitten", 1.0),
                ("dog", 1.0),
                ("puppy", 1.0),
                ("wolf", 1.0),
                ("fox", 1.0),
                ("lion", 1.0),
                ("tiger", 1.0),
                ("bear", 1.0),
                ("owl", 1.0),
                ("rabbit", 1.0),
                ("horse", 1.0),
                ("elephant", 1.0),
                ("bird", 0.8),
            ],
            phrases: &["wildlife photography", "animal portrait", "cute animal"],
        },
        CategoryRule {
            category: Category::SciFi,
            priority: 1.2,
            keywords: &[
                ("sci-fi", 1.0),
                ("science fiction", 1.0),
                ("cyberpunk", 1.0),
                ("futuristic", 1.0),
                ("spaceship", 1.0),
                ("space station", 1.0),
                ("space", 1.0),
                ("robot", 1.0),
                ("cyborg", 1.0),
                ("android", 1.0),
                ("alien", 1.0),
                ("galaxy", 1.0),
                ("dystopian", 1.0),
                ("neon", 1.0),
                ("planet", 0.8),
            ],
            phrases: &[
                "space station",
                "cyberpunk city",
                "science fiction",
                "futuristic city",
            ],
        },
        CategoryRule {
            category: Category::Fantasy,
            priority: 1.1,
            keywords: &[
                ("fantasy", 1.0),
                ("dragon", 1.0),
                ("wizard", 1.0),
                ("sorcerer", 1.0),
                ("elf", 1.0),
                ("fairy", 1.0),
                ("unicorn", 1.0),
                ("mythical", 1.0),
                ("enchanted", 1.0),
                ("castle", 1.0),
                ("knight", 1.0),
                ("magic", 0.8),
            ],
            phrases: &["fantasy art", "magical forest", "dungeons and dragons"],
        },
        CategoryRule {
            category: Category::Fashion,
            priority: 1.0,
            keywords: &[
                ("fashion", 1.0),
                ("runway", 1.0),
                ("couture", 1.0),
                ("outfit", 1.0),
                ("streetwear", 1.0),
                ("vogue", 1.0),
                ("dress", 0.8),
                ("model", 0.8),
                ("editorial", 0.8),
            ],
            phrases: &[
                "fashion photography",
                "fashion shoot",
                "runway show",
                "haute couture",
            ],
        },
        CategoryRule {
            category: Category::Architecture,
            priority: 1.0,
            keywords: &[
                ("architecture", 1.0),
                ("building", 1.0),
                ("skyscraper", 1.0),
                ("cathedral", 1.0),
                ("skyline", 1.0),
                ("facade", 1.0),
                ("interior", 1.0),
                ("bridge", 0.8),
                ("house", 0.8),
                ("tower", 0.8),
            ],
            phrases: &[
                "architectural photography",
                "interior design",
                "modern architecture",
            ],
        },
        CategoryRule {
            category: Category::Food,
            priority: 1.0,
            keywords: &[
                ("food", 1.0),
                ("dish", 1.0),
                ("meal", 1.0),
                ("dessert", 1.0),
                ("cake", 1.0),
                ("pizza", 1.0),
                ("sushi", 1.0),
                ("burger", 1.0),
                ("cuisine", 1.0),
                ("coffee", 0.8),
                ("fruit", 0.8),
            ],
            phrases: &["food photography", "still life of food"],
        },
        CategoryRule {
            category: Category::Nature,
            priority: 0.95,
            keywords: &[
                ("landscape", 1.0),
                ("mountain", 1.0),
                ("forest", 1.0),
                ("ocean", 1.0),
                ("river", 1.0),
                ("lake", 1.0),
                ("waterfall", 1.0),
                ("sunset", 1.0),
                ("sunrise", 1.0),
                ("beach", 1.0),
                ("desert", 1.0),
                ("flower", 0.8),
                ("garden", 0.8),
                ("tree", 0.8),
            ],
            phrases: &[
                "landscape photography",
                "nature photography",
                "golden hour landscape",
            ],
        },
        CategoryRule {
            category: Category::Abstract,
            priority: 0.9,
            keywords: &[
                ("abstract", 1.0),
                ("geometric", 1.0),
                ("fractal", 1.0),
                ("surreal", 1.0),
                ("psychedelic", 1.0),
                ("kaleidoscope", 1.0),
                ("minimalist", 0.8),
                ("pattern", 0.8),
            ],
            phrases: &["abstract art", "abstract painting", "generative art"],
        },
        CategoryRule {
            category: Category::Portrait,
            priority: 0.85,
            keywords: &[
                ("portrait", 1.0),
                ("headshot", 1.0),
                ("selfie", 1.0),
                ("face", 1.0),
                ("close-up", 1.0),
                ("woman", 1.0),
                ("man", 1.0),
                ("girl", 1.0),
                ("boy", 1.0),
                ("person", 1.0),
                ("people", 0.8),
            ],
            phrases: &[
                "portrait photography",
                "studio portrait",
                "close-up portrait",
            ],
        },
    ],
    styles: &[
        ("anime", Category::Anime),
        ("manga", Category::Anime),
        ("ghibli", Category::Anime),
        ("cyberpunk", Category::SciFi),
        ("sci-fi", Category::SciFi),
        ("futuristic", Category::SciFi),
        ("3d render", Category::SciFi),
        ("fantasy", Category::Fantasy),
        ("vintage", Category::Vintage),
        ("retro", Category::Vintage),
        ("film noir", Category::Vintage),
        ("fashion", Category::Fashion),
        ("architectural", Category::Architecture),
        ("food", Category::Food),
        ("wildlife", Category::Animals),
        ("watercolor", Category::Nature),
        ("landscape", Category::Nature),
        ("abstract", Category::Abstract),
        ("pop art", Category::Abstract),
        ("surreal", Category::Abstract),
        ("pixel art", Category::Abstract),
        ("photorealistic", Category::Portrait),
        ("realistic", Category::Portrait),
        ("portrait", Category::Portrait),
    ],
};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn priorities_stay_within_expected_band() {
        for rule in DEFAULT_TABLE.rules {
            assert!(
                (0.85..=2.0).contains(&rule.priority),
                "{} has priority {}",
                rule.category,
                rule.priority
            );
        }
    }

    #[test]
    fn specific_categories_outrank_portrait() {
        let portrait = DEFAULT_TABLE
            .rule(Category::Portrait)
            .expect("portrait rule")
            .priority;
        for category in [Category::Vintage, Category::Anime, Category::Animals] {
            let rule = DEFAULT_TABLE.rule(category).expect("rule present");
            assert!(rule.priority > 1.0);
            assert!(rule.priority > portrait);
        }
    }

    #[test]
    fn rules_follow_category_order_without_duplicates() {
        let mut seen = HashSet::new();
        let order: Vec<Category> = DEFAULT_TABLE.rules.iter().map(|rule| rule.category).collect();
        for category in &order {
            assert!(seen.insert(*category), "duplicate rule for {category}");
        }
        assert_eq!(order, Category::ALL[..Category::ALL.len() - 1].to_vec());
        assert!(!seen.contains(&Category::Other));
    }

    #[test]
    fn keywords_and_styles_are_lower_case() {
        for rule in DEFAULT_TABLE.rules {
            for (keyword, weight) in rule.keywords {
                assert_eq!(*keyword, keyword.to_lowercase());
                assert!(*weight > 0.0);
            }
            for phrase in rule.phrases {
                assert_eq!(*phrase, phrase.to_lowercase());
                assert!(phrase.contains(' '), "phrase `{phrase}` should be multi-word");
            }
        }
        for (label, _) in DEFAULT_TABLE.styles {
            assert_eq!(*label, label.to_lowercase());
        }
    }
}
