//! Disposal categories and class-name resolution.
//!
//! Detector class names arrive as free-form strings (`"recyclable"`,
//! `"banana_peel"`, `"plastic bottle"`). This module owns the fixed category
//! vocabulary and the keyword tables that route a class name into exactly one
//! category. Resolution is two-pass: whole-name match first, then a token
//! match for compound names. Categories are checked in a fixed priority
//! order, and anything unresolved routes to landfill.

/// Names that match a category outright.
const RECYCLABLE_NAMES: &[&str] = &["recyclable", "recycle", "recycling", "recyclables"];
const ORGANIC_NAMES: &[&str] = &["organic", "organics", "compost", "food-waste", "bio"];
const REUSABLE_NAMES: &[&str] = &["reuse", "reusable", "reusables"];
const HAZARDOUS_NAMES: &[&str] = &["hazardous", "toxic", "dangerous", "chemical"];

/// Item tokens that imply a category when they appear in a compound class
/// name (`banana_peel`, `plastic bottle`, `glass-jar`).
const RECYCLABLE_TOKENS: &[&str] = &[
    "bottle", "can", "glass", "jar", "vase", "cup", "paper", "cardboard", "carton", "newspaper",
    "book", "tin", "metal", "plastic", "polythene",
];
const ORGANIC_TOKENS: &[&str] = &[
    "banana", "apple", "fruit", "vegetable", "peel", "food", "coffee", "egg", "pizza", "leaf",
    "garden",
];
const REUSABLE_TOKENS: &[&str] = &["container", "bag", "clothing", "clothes", "furniture", "toy"];
const HAZARDOUS_TOKENS: &[&str] = &[
    "battery", "phone", "laptop", "electronic", "electronics", "paint", "bulb", "medicine",
];

/// Subjects that must never be reported as waste items.
const EXCLUDED_SUBJECTS: &[&str] = &["person", "face", "hand", "man", "woman"];

const TOKEN_SEPARATORS: [char; 3] = [' ', '_', '-'];

/// Disposal routing for a detected item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisposalCategory {
    Recyclable,
    Organic,
    Reusable,
    Hazardous,
    Landfill,
}

impl DisposalCategory {
    /// External bin label used on the wire.
    ///
    /// Reusable items share the recycling stream, so both report `Recycle`.
    pub fn bin_label(self) -> &'static str {
        match self {
            DisposalCategory::Recyclable | DisposalCategory::Reusable => "Recycle",
            DisposalCategory::Organic => "Organic",
            DisposalCategory::Hazardous => "Hazardous",
            DisposalCategory::Landfill => "Landfill",
        }
    }

    /// Lowercase label used by the query advisor.
    pub fn advice_label(self) -> &'static str {
        match self {
            DisposalCategory::Recyclable => "recyclable",
            DisposalCategory::Organic => "organic",
            DisposalCategory::Reusable => "reuse",
            DisposalCategory::Hazardous => "hazardous",
            DisposalCategory::Landfill => "landfill",
        }
    }
}

/// Keyword tables mapping detector class names to disposal categories.
///
/// Built once at startup and shared read-only. The priority order is part of
/// the contract: a name matching two categories resolves to the earlier one.
pub struct CategoryMap {
    rules: Vec<CategoryRule>,
}

struct CategoryRule {
    category: DisposalCategory,
    names: &'static [&'static str],
    tokens: &'static [&'static str],
}

impl CategoryMap {
    pub fn new() -> Self {
        Self {
            rules: vec![
                CategoryRule {
                    category: DisposalCategory::Recyclable,
                    names: RECYCLABLE_NAMES,
                    tokens: RECYCLABLE_TOKENS,
                },
                CategoryRule {
                    category: DisposalCategory::Organic,
                    names: ORGANIC_NAMES,
                    tokens: ORGANIC_TOKENS,
                },
                CategoryRule {
                    category: DisposalCategory::Reusable,
                    names: REUSABLE_NAMES,
                    tokens: REUSABLE_TOKENS,
                },
                CategoryRule {
                    category: DisposalCategory::Hazardous,
                    names: HAZARDOUS_NAMES,
                    tokens: HAZARDOUS_TOKENS,
                },
            ],
        }
    }

    /// Resolve a detector class name to a disposal category.
    ///
    /// Whole-name matches win over token matches so that a name like
    /// `food-waste` resolves on its own entry rather than its fragments.
    /// Unresolved names fall back to `Landfill` and are logged, since they
    /// usually mean the wrong label table is paired with the model.
    pub fn resolve(&self, class_name: &str) -> DisposalCategory {
        let name = class_name.trim().to_lowercase();

        for rule in &self.rules {
            if rule.names.iter().any(|n| *n == name) {
                return rule.category;
            }
        }

        for rule in &self.rules {
            let matched = name
                .split(TOKEN_SEPARATORS)
                .any(|token| rule.names.iter().chain(rule.tokens).any(|n| *n == token));
            if matched {
                return rule.category;
            }
        }

        log::warn!("class '{}' has no disposal mapping, routing to landfill", class_name);
        DisposalCategory::Landfill
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true for person-like classes that must be dropped before mapping.
pub fn is_excluded_subject(class_name: &str) -> bool {
    let name = class_name.trim().to_lowercase();
    EXCLUDED_SUBJECTS.iter().any(|s| *s == name)
}

/// Presentation form of a class name: first letter upcased, rest lowered.
pub fn display_item_type(class_name: &str) -> String {
    let name = class_name.trim().to_lowercase();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => name,
    }
}
