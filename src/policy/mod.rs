pub mod defaults;
pub mod engine;
pub mod linter;
pub mod store;
pub mod types;
pub mod validate;

pub use engine::evaluate_approval_rules;
pub use store::ConfigStore;
pub use types::*;
