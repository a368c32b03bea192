pub mod config;
pub mod corrections;
pub mod session;

pub use config::{AppConfig, ConfigError};
pub use corrections::{CorrectionError, CorrectionOutcome, CorrectionSink, RowCorrection};
pub use session::Session;

pub use tally_core::{
    partition_by_flow, CategoryTotal, Flow, Money, SummaryError, Transaction, UNCATEGORIZED,
};
pub use tally_import::LoadError;
pub use tally_storage::StoreError;
