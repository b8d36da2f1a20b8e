//! Classified terminals consumed by the parse engine
//!
//! A token source (the reference lexer, or any external tokenizer) produces a
//! finite sequence of `Token`s with strictly increasing positions, terminated
//! by exactly one `EndOfInput` token.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of the sentinel token that terminates every stream
pub const END_OF_INPUT: &str = "EndOfInput";

/// A classified terminal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Token kind; equals a token rule name, or the literal text for anonymous terminals
    pub kind: String,
    /// Exact source text of the terminal
    pub literal: String,
    /// Byte offset of the terminal in the source
    pub position: usize,
}

impl Token {
    pub fn new(kind: impl Into<String>, literal: impl Into<String>, position: usize) -> Self {
        Self {
            kind: kind.into(),
            literal: literal.into(),
            position,
        }
    }

    /// Anonymous terminal whose kind is its own text, such as `(`
    pub fn anonymous(literal: impl Into<String>, position: usize) -> Self {
        let literal = literal.into();
        Self {
            kind: literal.clone(),
            literal,
            position,
        }
    }

    /// The stream terminator
    pub fn end_of_input(position: usize) -> Self {
        Self {
            kind: END_OF_INPUT.to_string(),
            literal: String::new(),
            position,
        }
    }

    pub fn is_end_of_input(&self) -> bool {
        self.kind == END_OF_INPUT
    }

    /// Human-readable description used in diagnostics
    pub fn describe(&self) -> String {
        if self.is_end_of_input() {
            END_OF_INPUT.to_string()
        } else if self.kind == self.literal {
            format!("'{}'", self.literal)
        } else {
            format!("{} '{}'", self.kind, self.literal)
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.describe(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_token_kind_is_literal() {
        let token = Token::anonymous("(", 3);
        assert_eq!(token.kind, "(");
        assert_eq!(token.describe(), "'('");
    }

    #[test]
    fn test_end_of_input() {
        let token = Token::end_of_input(7);
        assert!(token.is_end_of_input());
        assert_eq!(token.to_string(), "EndOfInput@7");
    }

    #[test]
    fn test_describe_named_token() {
        assert_eq!(Token::new("NUMBER", "42", 0).describe(), "NUMBER '42'");
    }
}
