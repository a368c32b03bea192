pub mod backend;
pub mod store;

pub use backend::{JsonFileBackend, MemoryBackend, RawRules, RuleBackend};
pub use store::{RuleStore, StoreError};
