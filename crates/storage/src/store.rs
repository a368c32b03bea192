use std::path::PathBuf;
use tally_core::{Repair, RuleError, RuleSet};
use thiserror::Error;

use crate::backend::RuleBackend;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error("Failed to read rules from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Rules file {} is not a valid category map: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode rules: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to persist rules to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn is_warning(&self) -> bool {
        matches!(self, StoreError::Rule(e) if e.is_warning())
    }
}

/// The in-memory rule set plus the backend it is mirrored to. Every
/// successful mutation is persisted before it becomes visible; a failed
/// persist leaves the store as it was.
pub struct RuleStore<B: RuleBackend> {
    rules: RuleSet,
    backend: B,
}

impl<B: RuleBackend> RuleStore<B> {
    /// Loads persisted rules, or starts from just "Uncategorized" when
    /// nothing has been saved yet. Nothing is written by loading.
    pub fn load(backend: B) -> Result<Self, StoreError> {
        let rules = match backend.read()? {
            Some(raw) => {
                let (rules, repairs) = RuleSet::repair(raw);
                for repair in &repairs {
                    log_repair(repair);
                }
                rules
            }
            None => {
                tracing::info!("no persisted rules found, starting with defaults");
                RuleSet::default()
            }
        };
        tracing::info!(categories = rules.len(), "rule store loaded");
        Ok(Self { rules, backend })
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.backend.write(&self.rules)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn categories(&self) -> Vec<String> {
        self.rules.category_names().map(str::to_string).collect()
    }

    pub fn add_category(&mut self, name: &str) -> Result<(), StoreError> {
        self.mutate(|rules| rules.add_category(name))?;
        tracing::info!(category = name.trim(), "category added");
        Ok(())
    }

    pub fn add_keyword(&mut self, category: &str, keyword: &str) -> Result<(), StoreError> {
        match self.mutate(|rules| rules.add_keyword(category, keyword)) {
            Ok(()) => {
                tracing::info!(category, keyword = keyword.trim(), "keyword added");
                Ok(())
            }
            Err(e) => {
                if e.is_warning() {
                    tracing::warn!("{e}");
                }
                Err(e)
            }
        }
    }

    /// Applies `change` to a copy, persists the copy, and only then swaps
    /// it in.
    fn mutate<F>(&mut self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut RuleSet) -> Result<(), RuleError>,
    {
        let mut next = self.rules.clone();
        change(&mut next)?;
        self.backend.write(&next)?;
        self.rules = next;
        Ok(())
    }
}

fn log_repair(repair: &Repair) {
    match repair {
        Repair::InsertedUncategorized => {
            tracing::warn!("persisted rules had no 'Uncategorized' category, added it")
        }
        Repair::ClearedUncategorized { dropped } => {
            tracing::warn!(dropped, "dropped keywords stored under 'Uncategorized'")
        }
        Repair::DroppedBlankCategory => tracing::warn!("dropped category with a blank name"),
        Repair::TrimmedCategoryName { name } => {
            tracing::warn!(category = name.as_str(), "trimmed whitespace from category name")
        }
        Repair::DroppedBlankKeyword { category } => {
            tracing::warn!(category = category.as_str(), "dropped blank keyword")
        }
        Repair::DroppedDuplicateKeyword { category, keyword } => tracing::warn!(
            category = category.as_str(),
            keyword = keyword.as_str(),
            "dropped duplicate keyword"
        ),
    }
}
