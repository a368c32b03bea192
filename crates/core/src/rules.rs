use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The default bucket. Always present, never holds keywords.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Comparison form for both keywords and transaction descriptions.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Category '{0}' already exists")]
    DuplicateCategory(String),
    #[error("Category '{0}' does not exist")]
    UnknownCategory(String),
    #[error("Keyword '{keyword}' already exists in category '{category}'")]
    DuplicateKeyword { category: String, keyword: String },
    #[error("Category name must not be blank")]
    EmptyCategoryName,
    #[error("Keyword must not be blank")]
    EmptyKeyword,
    #[error("Category '{0}' cannot hold keywords")]
    ReservedCategory(String),
}

impl RuleError {
    /// Duplicates leave the rule set exactly as the caller wanted it.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            RuleError::DuplicateCategory(_) | RuleError::DuplicateKeyword { .. }
        )
    }
}

/// Something `RuleSet::repair` had to change in externally supplied rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    InsertedUncategorized,
    ClearedUncategorized { dropped: usize },
    DroppedBlankCategory,
    TrimmedCategoryName { name: String },
    DroppedBlankKeyword { category: String },
    DroppedDuplicateKeyword { category: String, keyword: String },
}

/// Category name → keywords, in insertion order. The order decides which
/// category wins when a description is a keyword of more than one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    categories: IndexMap<String, Vec<String>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        let mut categories = IndexMap::new();
        categories.insert(UNCATEGORIZED.to_string(), Vec::new());
        RuleSet { categories }
    }
}

impl RuleSet {
    /// Builds a valid rule set from raw persisted data, reporting every
    /// change made to get there. Valid input comes back untouched.
    pub fn repair(raw: IndexMap<String, Vec<String>>) -> (RuleSet, Vec<Repair>) {
        let mut repairs = Vec::new();
        let mut categories: IndexMap<String, Vec<String>> = IndexMap::with_capacity(raw.len() + 1);

        if !raw.keys().any(|name| name.trim() == UNCATEGORIZED) {
            categories.insert(UNCATEGORIZED.to_string(), Vec::new());
            repairs.push(Repair::InsertedUncategorized);
        }

        for (raw_name, keywords) in raw {
            let name = raw_name.trim();
            if name.is_empty() {
                repairs.push(Repair::DroppedBlankCategory);
                continue;
            }
            if name != raw_name {
                repairs.push(Repair::TrimmedCategoryName {
                    name: name.to_string(),
                });
            }
            // Names that only differ by whitespace share one entry.
            let kept = categories.entry(name.to_string()).or_default();
            if name == UNCATEGORIZED {
                if !keywords.is_empty() {
                    repairs.push(Repair::ClearedUncategorized {
                        dropped: keywords.len(),
                    });
                }
                continue;
            }

            for keyword in keywords {
                let norm = normalize(&keyword);
                if norm.is_empty() {
                    repairs.push(Repair::DroppedBlankKeyword {
                        category: name.to_string(),
                    });
                } else if kept.iter().any(|k| normalize(k) == norm) {
                    repairs.push(Repair::DroppedDuplicateKeyword {
                        category: name.to_string(),
                        keyword,
                    });
                } else {
                    kept.push(keyword);
                }
            }
        }

        (RuleSet { categories }, repairs)
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn keywords(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// Categories in match order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, keywords)| (name.as_str(), keywords.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn add_category(&mut self, name: &str) -> Result<(), RuleError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RuleError::EmptyCategoryName);
        }
        if self.categories.contains_key(name) {
            return Err(RuleError::DuplicateCategory(name.to_string()));
        }
        self.categories.insert(name.to_string(), Vec::new());
        Ok(())
    }

    /// Stores the trimmed keyword. Duplicates are detected case-insensitively.
    pub fn add_keyword(&mut self, category: &str, keyword: &str) -> Result<(), RuleError> {
        let category = category.trim();
        let keywords = self
            .categories
            .get_mut(category)
            .ok_or_else(|| RuleError::UnknownCategory(category.to_string()))?;
        if category == UNCATEGORIZED {
            return Err(RuleError::ReservedCategory(category.to_string()));
        }

        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(RuleError::EmptyKeyword);
        }
        let norm = normalize(keyword);
        if keywords.iter().any(|k| normalize(k) == norm) {
            return Err(RuleError::DuplicateKeyword {
                category: category.to_string(),
                keyword: keyword.to_string(),
            });
        }

        keywords.push(keyword.to_string());
        Ok(())
    }
}
