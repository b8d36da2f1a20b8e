// Logging macros are used by every other module
#[macro_use]
pub mod logging;

pub mod config;
pub mod engine;
pub mod fixtures;
pub mod grammar;
pub mod lexical;
pub mod pipeline;
pub mod precedence;
pub mod resolver;
pub mod tokens;
pub mod tree;
pub mod utils;

// Re-export key types for library consumers
pub use engine::{Engine, ParseError, ParseStatistics};
pub use grammar::{GrammarBuilder, GrammarError, GrammarRegistry, RuleNode, TokenRule};
pub use pipeline::{CompiledGrammar, PipelineError, PipelineOutput, PipelineResult};
pub use precedence::{Associativity, PrecedenceTable};
pub use resolver::{resolve, ResolvedGrammar};
pub use tokens::{Token, TokenStream};
pub use tree::{FieldValue, ParseNode};
