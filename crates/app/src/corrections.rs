use tally_core::{RuleError, Transaction, UNCATEGORIZED};
use tally_storage::{RuleBackend, RuleStore, StoreError};
use thiserror::Error;

/// What a single correction did to the rule store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionOutcome {
    /// The category was not actually changed.
    Unchanged,
    /// The description became a new keyword of the target category.
    RuleAdded,
    /// The target category already had this keyword.
    AlreadyKnown,
    /// Moved to "Uncategorized", which never holds keywords.
    NotRecorded,
}

#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("Edited view has {edited} rows but {presented} were presented")]
    LengthMismatch { presented: usize, edited: usize },
}

/// Result of correcting one row of an edited view.
#[derive(Debug)]
pub struct RowCorrection {
    /// Zero-based row index in the view.
    pub row: usize,
    pub category: String,
    pub result: Result<CorrectionOutcome, StoreError>,
}

/// Turns user corrections into keyword rules.
pub struct CorrectionSink;

impl CorrectionSink {
    /// Records `tx.description` as a keyword of `new_category`. An unknown
    /// category is returned as an error and nothing is stored.
    pub fn apply<B: RuleBackend>(
        store: &mut RuleStore<B>,
        tx: &Transaction,
        new_category: &str,
    ) -> Result<CorrectionOutcome, StoreError> {
        if new_category == tx.category {
            return Ok(CorrectionOutcome::Unchanged);
        }
        if new_category == UNCATEGORIZED {
            tracing::info!(
                description = tx.description.as_str(),
                "moved to Uncategorized, no rule recorded"
            );
            return Ok(CorrectionOutcome::NotRecorded);
        }

        match store.add_keyword(new_category, &tx.description) {
            Ok(()) => {
                tracing::info!(
                    category = new_category,
                    description = tx.description.as_str(),
                    "correction recorded as rule"
                );
                Ok(CorrectionOutcome::RuleAdded)
            }
            Err(StoreError::Rule(RuleError::DuplicateKeyword { .. })) => {
                Ok(CorrectionOutcome::AlreadyKnown)
            }
            Err(e) => Err(e),
        }
    }

    /// Compares the rows as presented with the rows after editing and
    /// applies one correction per changed category, in row order. Each row
    /// persists on its own; a failing row does not stop the ones after it.
    pub fn apply_edits<B: RuleBackend>(
        store: &mut RuleStore<B>,
        presented: &[Transaction],
        edited: &[Transaction],
    ) -> Result<Vec<RowCorrection>, CorrectionError> {
        if presented.len() != edited.len() {
            return Err(CorrectionError::LengthMismatch {
                presented: presented.len(),
                edited: edited.len(),
            });
        }

        let mut corrections = Vec::new();
        for (row, (before, after)) in presented.iter().zip(edited).enumerate() {
            if before.category == after.category {
                continue;
            }
            let result = Self::apply(store, before, &after.category);
            if let Err(e) = &result {
                tracing::warn!(row, category = after.category.as_str(), "correction failed: {e}");
            }
            corrections.push(RowCorrection {
                row,
                category: after.category.clone(),
                result,
            });
        }
        Ok(corrections)
    }
}
