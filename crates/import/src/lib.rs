pub mod engine;
pub mod statement;

pub use engine::{classify, CategoryEngine};
pub use statement::{load_statement, LoadError, StatementLoader};
