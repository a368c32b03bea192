pub mod money;
pub mod rules;
pub mod summary;
pub mod transaction;

pub use money::Money;
pub use rules::{normalize, Repair, RuleError, RuleSet, UNCATEGORIZED};
pub use summary::{summarize, summarize_flow, CategoryTotal, SummaryError};
pub use transaction::{partition_by_flow, Flow, Transaction};
