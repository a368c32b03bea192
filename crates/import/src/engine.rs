use std::collections::HashSet;
use tally_core::{normalize, RuleSet, Transaction, UNCATEGORIZED};

/// A category with its keywords precomputed into comparison form.
struct CompiledCategory {
    name: String,
    keywords: HashSet<String>,
}

/// Assigns categories by exact, case-insensitive match of a transaction's
/// description against each category's keywords. Categories are tried in
/// rule-set order and the first hit wins.
pub struct CategoryEngine {
    categories: Vec<CompiledCategory>,
}

impl CategoryEngine {
    pub fn new(rules: &RuleSet) -> Self {
        let categories = rules
            .iter()
            .filter(|(name, _)| *name != UNCATEGORIZED)
            .map(|(name, keywords)| CompiledCategory {
                name: name.to_string(),
                keywords: keywords
                    .iter()
                    .map(|k| normalize(k))
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .filter(|c| !c.keywords.is_empty())
            .collect();
        Self { categories }
    }

    pub fn find_category(&self, description: &str) -> Option<&str> {
        let text = normalize(description);
        if text.is_empty() {
            return None;
        }
        self.categories
            .iter()
            .find(|c| c.keywords.contains(&text))
            .map(|c| c.name.as_str())
    }

    /// Returns a freshly categorized copy of `transactions`. The incoming
    /// category field is ignored, so running this twice changes nothing.
    pub fn classify(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        let out: Vec<Transaction> = transactions
            .iter()
            .map(|tx| {
                let category = self.find_category(&tx.description).unwrap_or(UNCATEGORIZED);
                tx.clone().with_category(category)
            })
            .collect();

        tracing::debug!(
            total = out.len(),
            uncategorized = out.iter().filter(|tx| tx.is_uncategorized()).count(),
            "classified transactions"
        );
        out
    }
}

pub fn classify(transactions: &[Transaction], rules: &RuleSet) -> Vec<Transaction> {
    CategoryEngine::new(rules).classify(transactions)
}
