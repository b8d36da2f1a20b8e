//! Lexical analysis for arithmetic source text
//!
//! The parse engine consumes tokens from any source. This module is the
//! token source the calculator grammar and the command line use.

pub mod analyzer;

pub use analyzer::{operator_kind, ArithmeticLexer, LexerError, LexicalMetrics};

use crate::tokens::Token;

/// Tokenize `source` with a fresh lexer
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
    ArithmeticLexer::new().tokenize(source)
}
