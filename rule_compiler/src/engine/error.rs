//! Parse-time errors
//!
//! A parse error is fatal to the parse that raised it and to nothing else;
//! the resolved grammar stays usable.

use crate::logging::{codes, Code};
use crate::tokens::TokenStreamError;
use crate::utils::Span;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at position {position}: expected one of [{}], found {found}", expected.join(", "))]
    SyntaxError {
        /// Source position of the offending token
        position: usize,
        /// Index of the offending token in the stream
        token_index: usize,
        /// Terminals attempted there: token rule names and literal texts
        expected: Vec<String>,
        found: String,
    },

    #[error("Unexpected trailing input at position {position}: {found}")]
    UnexpectedTrailingInput {
        position: usize,
        token_index: usize,
        found: String,
    },

    #[error("Start rule '{rule}' is not defined in the grammar")]
    UnknownStartRule { rule: String },

    #[error("Maximum parse depth {depth} exceeded in rule '{rule}' at position {position}")]
    MaxRecursionDepth {
        depth: usize,
        rule: String,
        position: usize,
    },

    #[error("Invalid token stream: {0}")]
    InvalidTokenStream(#[from] TokenStreamError),
}

impl ParseError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::SyntaxError { .. } => codes::parse::SYNTAX_ERROR,
            Self::UnexpectedTrailingInput { .. } => codes::parse::UNEXPECTED_TRAILING_INPUT,
            Self::UnknownStartRule { .. } => codes::parse::UNKNOWN_START_RULE,
            Self::MaxRecursionDepth { .. } => codes::parse::MAX_RECURSION_DEPTH,
            Self::InvalidTokenStream(_) => codes::parse::INVALID_TOKEN_STREAM,
        }
    }

    /// Offending token as a one-token span, if any
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::SyntaxError { token_index, .. }
            | Self::UnexpectedTrailingInput { token_index, .. } => Some(Span::single(*token_index)),
            Self::InvalidTokenStream(error) => error.span(),
            Self::UnknownStartRule { .. } | Self::MaxRecursionDepth { .. } => None,
        }
    }

    pub fn expected(&self) -> &[String] {
        match self {
            Self::SyntaxError { expected, .. } => expected,
            _ => &[],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_message_and_span() {
        let error = ParseError::SyntaxError {
            position: 0,
            token_index: 0,
            expected: vec!["(".to_string(), "NUMBER".to_string()],
            found: "MUL '*'".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Syntax error at position 0: expected one of [(, NUMBER], found MUL '*'"
        );
        assert_eq!(error.span(), Some(Span::single(0)));
        assert_eq!(error.error_code(), codes::parse::SYNTAX_ERROR);
        assert_eq!(error.expected().len(), 2);
    }

    #[test]
    fn test_token_stream_errors_convert() {
        let error: ParseError = TokenStreamError::MissingEndOfInput { token_count: 2 }.into();
        assert_eq!(error.error_code(), codes::parse::INVALID_TOKEN_STREAM);
        assert!(error.span().is_none());
    }
}
