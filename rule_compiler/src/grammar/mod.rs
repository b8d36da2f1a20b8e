//! Grammar definitions: rule IR, token rules and the validated registry

pub mod error;
pub mod ir;
pub mod registry;
pub mod token_rule;

pub use error::{GrammarError, GrammarResult};
pub use ir::{
    choice, field, fold, labeled, literal, optional, repeat, repeat1, rule, seq, token, RuleNode,
};
pub use registry::{GrammarBuilder, GrammarRegistry, Rule};
pub use token_rule::{TokenPattern, TokenRule};
