use tally_core::{CategoryTotal, Flow, RuleSet, SummaryError, Transaction};
use tally_import::{CategoryEngine, LoadError, StatementLoader};
use tally_storage::{JsonFileBackend, RuleBackend, RuleStore, StoreError};

use crate::config::AppConfig;
use crate::corrections::{CorrectionError, CorrectionOutcome, CorrectionSink, RowCorrection};

/// Everything a front end needs: statement loading, classification, rule
/// editing and summaries, all against one rule store.
pub struct Session<B: RuleBackend = JsonFileBackend> {
    store: RuleStore<B>,
}

impl Session<JsonFileBackend> {
    pub fn open(config: &AppConfig) -> Result<Self, StoreError> {
        tracing::debug!(path = %config.rules_path.display(), "opening rule store");
        Self::with_backend(JsonFileBackend::new(&config.rules_path))
    }
}

impl<B: RuleBackend> Session<B> {
    pub fn with_backend(backend: B) -> Result<Self, StoreError> {
        Ok(Self {
            store: RuleStore::load(backend)?,
        })
    }

    pub fn rules(&self) -> &RuleSet {
        self.store.rules()
    }

    pub fn load_statement(&self, bytes: &[u8]) -> Result<Vec<Transaction>, LoadError> {
        StatementLoader::parse(bytes)
    }

    pub fn classify(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        CategoryEngine::new(self.store.rules()).classify(transactions)
    }

    /// Categories in match order, "Uncategorized" included.
    pub fn list_categories(&self) -> Vec<String> {
        self.store.categories()
    }

    pub fn add_category(&mut self, name: &str) -> Result<(), StoreError> {
        self.store.add_category(name)
    }

    pub fn add_keyword(&mut self, category: &str, keyword: &str) -> Result<(), StoreError> {
        self.store.add_keyword(category, keyword)
    }

    pub fn correct_category(
        &mut self,
        tx: &Transaction,
        new_category: &str,
    ) -> Result<CorrectionOutcome, StoreError> {
        CorrectionSink::apply(&mut self.store, tx, new_category)
    }

    pub fn apply_edits(
        &mut self,
        presented: &[Transaction],
        edited: &[Transaction],
    ) -> Result<Vec<RowCorrection>, CorrectionError> {
        CorrectionSink::apply_edits(&mut self.store, presented, edited)
    }

    pub fn summarize(
        &self,
        transactions: &[Transaction],
    ) -> Result<Vec<CategoryTotal>, SummaryError> {
        tally_core::summarize(transactions)
    }

    pub fn summarize_flow(
        &self,
        transactions: &[Transaction],
        flow: Flow,
    ) -> Result<Vec<CategoryTotal>, SummaryError> {
        tally_core::summarize_flow(transactions, flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{Money, UNCATEGORIZED};
    use tally_storage::MemoryBackend;

    const STATEMENT: &[u8] = b"Date,Details,Amount,Debit/Credit\n\
05 Jan 2024,Whole Foods,10.00,Debit\n\
06 Jan 2024,Whole Foods,5.50,Debit\n\
07 Jan 2024,Uber,3.25,Debit\n\
08 Jan 2024,Salary,\"12,000.00\",Credit\n";

    #[test]
    fn end_to_end_feedback_loop() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            rules_path: dir.path().join("categories.json"),
            ..AppConfig::default()
        };

        let mut session = Session::open(&config).unwrap();
        session.add_category("Food").unwrap();
        session.add_category("Transport").unwrap();
        session.add_keyword("Transport", "uber").unwrap();

        let txs = session.classify(&session.load_statement(STATEMENT).unwrap());
        assert_eq!(txs[0].category, UNCATEGORIZED);
        assert_eq!(txs[2].category, "Transport");

        session.correct_category(&txs[0], "Food").unwrap();

        // A fresh session over the same file sees the learned rule.
        let session = Session::open(&config).unwrap();
        let txs = session.classify(&session.load_statement(STATEMENT).unwrap());
        let categories: Vec<_> = txs.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(categories, ["Food", "Food", "Transport", UNCATEGORIZED]);

        let summary = session.summarize_flow(&txs, Flow::Debit).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].category, "Food");
        assert_eq!(summary[0].total, Money::from_cents(1550));
        assert_eq!(summary[1].category, "Transport");
        assert_eq!(summary[1].total, Money::from_cents(325));
    }

    #[test]
    fn list_categories_in_insertion_order() {
        let mut session = Session::with_backend(MemoryBackend::new()).unwrap();
        session.add_category("Zoo").unwrap();
        session.add_category("Alpha").unwrap();
        assert_eq!(session.list_categories(), [UNCATEGORIZED, "Zoo", "Alpha"]);
    }

    #[test]
    fn duplicate_keyword_does_not_grow_store() {
        let mut session = Session::with_backend(MemoryBackend::new()).unwrap();
        session.add_category("Food").unwrap();
        session.add_keyword("Food", "Lidl").unwrap();
        assert!(session.add_keyword("Food", "Lidl").unwrap_err().is_warning());
        assert_eq!(session.list_categories().len(), 2);
        assert_eq!(session.rules().keywords("Food").unwrap().len(), 1);
    }

    #[test]
    fn failed_load_returns_no_rows() {
        let session = Session::with_backend(MemoryBackend::new()).unwrap();
        let bad = b"Date,Details,Amount,Debit/Credit\n05 Jan 2024,Uber,abc,Debit\n";
        assert!(matches!(
            session.load_statement(bad),
            Err(LoadError::Format { row: 1, .. })
        ));
    }

    #[test]
    fn summary_includes_credits_when_unfiltered() {
        let session = Session::with_backend(MemoryBackend::new()).unwrap();
        let txs = session.classify(&session.load_statement(STATEMENT).unwrap());
        let summary = session.summarize(&txs).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].category, UNCATEGORIZED);
        assert_eq!(summary[0].total, Money::from_cents(1_201_875));
    }

    #[test]
    fn huge_amount_is_rejected_at_load() {
        let session = Session::with_backend(MemoryBackend::new()).unwrap();
        let bad = b"Date,Details,Amount,Debit/Credit\n\
05 Jan 2024,Wire,79228162514264337593543950335,Credit\n\
06 Jan 2024,Wire,79228162514264337593543950335,Credit\n";
        assert!(matches!(
            session.load_statement(bad),
            Err(LoadError::Format { row: 1, .. })
        ));
    }
}
