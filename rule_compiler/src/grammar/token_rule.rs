//! Built-in token rules: operators, literal classes and skip trivia

use crate::tokens::Token;
use serde::{Deserialize, Serialize};

/// What a terminal's literal must look like to match a token rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum TokenPattern {
    /// Literal must equal this text exactly
    Literal(String),
    /// Any literal of the right kind (the token source decides)
    AnyOfKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenRule {
    pub name: String,
    pub pattern: TokenPattern,
    /// Trivia tokens are skipped before every match attempt and never captured
    pub is_skip_trivia: bool,
}

impl TokenRule {
    /// Operator-style token rule matching one exact text
    pub fn literal(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: TokenPattern::Literal(text.into()),
            is_skip_trivia: false,
        }
    }

    /// Literal-class token rule such as `NUMBER`
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: TokenPattern::AnyOfKind,
            is_skip_trivia: false,
        }
    }

    /// Skip trivia such as `WHITESPACE`
    pub fn skip(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: TokenPattern::AnyOfKind,
            is_skip_trivia: true,
        }
    }

    /// Check whether a terminal satisfies this rule
    pub fn matches(&self, token: &Token) -> bool {
        if token.kind != self.name {
            return false;
        }
        match &self.pattern {
            TokenPattern::Literal(text) => token.literal == *text,
            TokenPattern::AnyOfKind => true,
        }
    }

    /// Exact text for literal patterns
    pub fn literal_text(&self) -> Option<&str> {
        match &self.pattern {
            TokenPattern::Literal(text) => Some(text),
            TokenPattern::AnyOfKind => None,
        }
    }
}
