//! Validated token stream with trivia filtering
//!
//! The stream keeps every token so spans can use original indices, and keeps a
//! separate index of significant (non-trivia) tokens the engine walks with a
//! save/restore cursor. Trivia is therefore skipped before every match attempt
//! without ever being visible to the engine.

use crate::config::compile_time::tokens::{MAX_LITERAL_LENGTH, MAX_TOKEN_COUNT};
use crate::logging::codes::{self, Code};
use crate::tokens::token::Token;
use crate::utils::Span;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct TokenStream {
    /// All tokens including trivia, in source order
    all_tokens: Vec<Token>,
    /// Indices into all_tokens for significant tokens; the last one is EndOfInput
    significant_indices: Vec<usize>,
    /// Current position in significant_indices
    position: usize,
}

impl TokenStream {
    /// Validate a token sequence and index its significant tokens.
    ///
    /// Tokens whose kind is in `trivia_kinds` are skipped by the cursor.
    pub fn new(tokens: Vec<Token>, trivia_kinds: &BTreeSet<String>) -> Result<Self, TokenStreamError> {
        validate_tokens(&tokens)?;

        let significant_indices: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| token.is_end_of_input() || !trivia_kinds.contains(&token.kind))
            .map(|(index, _)| index)
            .collect();

        crate::log_debug!("Token stream indexed",
            "total_tokens" => tokens.len(),
            "significant_tokens" => significant_indices.len()
        );

        Ok(Self {
            all_tokens: tokens,
            significant_indices,
            position: 0,
        })
    }

    // === CORE NAVIGATION ===

    /// Current significant token; `EndOfInput` once everything is consumed
    pub fn current(&self) -> &Token {
        self.token_at(self.position)
    }

    /// Significant token at a cursor position, clamped to `EndOfInput`
    pub fn token_at(&self, position: usize) -> &Token {
        let index = self.original_index(position);
        &self.all_tokens[index]
    }

    /// Advance past the current significant token (never past `EndOfInput`)
    pub fn advance(&mut self) {
        if self.position < self.end_position() {
            self.position += 1;
        }
    }

    /// Check if only `EndOfInput` remains
    pub fn is_at_end(&self) -> bool {
        self.position >= self.end_position()
    }

    /// Cursor position of the `EndOfInput` token
    pub fn end_position(&self) -> usize {
        self.significant_indices.len() - 1
    }

    /// Number of significant tokens, `EndOfInput` included
    pub fn len(&self) -> usize {
        self.significant_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.significant_indices.len() <= 1
    }

    // === CHECKPOINTS ===

    pub fn save_position(&self) -> usize {
        self.position
    }

    pub fn restore_position(&mut self, saved_position: usize) {
        self.position = saved_position.min(self.end_position());
    }

    pub fn position(&self) -> usize {
        self.position
    }

    // === SPANS ===

    /// Original index of the significant token at a cursor position
    pub fn original_index(&self, position: usize) -> usize {
        let clamped = position.min(self.end_position());
        self.significant_indices[clamped]
    }

    /// Span over original indices covering the significant tokens `start..end`
    pub fn span_between(&self, start: usize, end: usize) -> Span {
        if end <= start {
            return Span::empty_at(self.original_index(start));
        }
        Span::new(self.original_index(start), self.original_index(end - 1) + 1)
    }

    // === DIAGNOSTICS ===

    /// All tokens, trivia included
    pub fn all_tokens(&self) -> &[Token] {
        &self.all_tokens
    }

    /// Significant tokens around a cursor position
    pub fn context_snippet(&self, position: usize, radius: usize) -> Vec<&Token> {
        let start = position.saturating_sub(radius);
        let end = (position + radius + 1).min(self.significant_indices.len());
        (start..end).map(|pos| self.token_at(pos)).collect()
    }

    pub fn diagnostic(&self) -> String {
        format!(
            "TokenStream(pos: {}/{}, current: {})",
            self.position,
            self.significant_indices.len(),
            self.current()
        )
    }
}

fn validate_tokens(tokens: &[Token]) -> Result<(), TokenStreamError> {
    if tokens.len() > MAX_TOKEN_COUNT {
        return Err(TokenStreamError::TooManyTokens {
            count: tokens.len(),
            max: MAX_TOKEN_COUNT,
        });
    }

    let Some(last) = tokens.last() else {
        return Err(TokenStreamError::MissingEndOfInput { token_count: 0 });
    };
    if !last.is_end_of_input() {
        return Err(TokenStreamError::MissingEndOfInput {
            token_count: tokens.len(),
        });
    }

    for (index, token) in tokens.iter().enumerate() {
        if token.is_end_of_input() && index + 1 != tokens.len() {
            return Err(TokenStreamError::MisplacedEndOfInput { index });
        }
        if token.literal.len() > MAX_LITERAL_LENGTH {
            return Err(TokenStreamError::LiteralTooLong {
                index,
                length: token.literal.len(),
                max: MAX_LITERAL_LENGTH,
            });
        }
    }

    for (index, window) in tokens.windows(2).enumerate() {
        if window[1].position <= window[0].position {
            return Err(TokenStreamError::NonIncreasingPosition {
                index: index + 1,
                previous: window[0].position,
                position: window[1].position,
            });
        }
    }

    Ok(())
}

/// Token stream contract violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenStreamError {
    #[error("Token stream of {token_count} tokens is not terminated by EndOfInput")]
    MissingEndOfInput { token_count: usize },

    #[error("EndOfInput at index {index} is not the last token")]
    MisplacedEndOfInput { index: usize },

    #[error("Token {index} at position {position} does not follow position {previous}")]
    NonIncreasingPosition {
        index: usize,
        previous: usize,
        position: usize,
    },

    #[error("Token stream has {count} tokens, maximum is {max}")]
    TooManyTokens { count: usize, max: usize },

    #[error("Token {index} literal is {length} bytes, maximum is {max}")]
    LiteralTooLong {
        index: usize,
        length: usize,
        max: usize,
    },
}

impl TokenStreamError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::MissingEndOfInput { .. } => codes::lexical::MISSING_END_OF_INPUT,
            Self::MisplacedEndOfInput { .. } => codes::lexical::MISPLACED_END_OF_INPUT,
            Self::NonIncreasingPosition { .. } => codes::lexical::NON_INCREASING_POSITION,
            Self::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
            Self::LiteralTooLong { .. } => codes::lexical::LITERAL_TOO_LONG,
        }
    }

    /// Offending token as a one-token span, when one exists
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::MisplacedEndOfInput { index }
            | Self::NonIncreasingPosition { index, .. }
            | Self::LiteralTooLong { index, .. } => Some(Span::single(*index)),
            _ => None,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::token::END_OF_INPUT;
    use assert_matches::assert_matches;

    fn trivia() -> BTreeSet<String> {
        BTreeSet::from(["WHITESPACE".to_string()])
    }

    fn tokens(parts: &[(&str, &str, usize)]) -> Vec<Token> {
        parts
            .iter()
            .map(|(kind, literal, pos)| Token::new(*kind, *literal, *pos))
            .collect()
    }

    #[test]
    fn test_trivia_is_skipped() {
        let stream = TokenStream::new(
            tokens(&[
                ("NUMBER", "2", 0),
                ("WHITESPACE", " ", 1),
                ("ADD", "+", 2),
                (END_OF_INPUT, "", 3),
            ]),
            &trivia(),
        )
        .unwrap();

        assert_eq!(stream.len(), 3);
        assert_eq!(stream.token_at(1).kind, "ADD");
        assert_eq!(stream.original_index(1), 2);
    }

    #[test]
    fn test_navigation_and_checkpoints() {
        let mut stream = TokenStream::new(
            tokens(&[("NUMBER", "2", 0), ("ADD", "+", 1), (END_OF_INPUT, "", 2)]),
            &trivia(),
        )
        .unwrap();

        let mark = stream.save_position();
        stream.advance();
        assert_eq!(stream.current().kind, "ADD");
        stream.advance();
        assert!(stream.is_at_end());
        stream.advance();
        assert!(stream.current().is_end_of_input());

        stream.restore_position(mark);
        assert_eq!(stream.current().kind, "NUMBER");
    }

    #[test]
    fn test_span_between_uses_original_indices() {
        let stream = TokenStream::new(
            tokens(&[
                ("NUMBER", "2", 0),
                ("WHITESPACE", " ", 1),
                ("ADD", "+", 2),
                ("WHITESPACE", " ", 3),
                ("NUMBER", "3", 4),
                (END_OF_INPUT, "", 5),
            ]),
            &trivia(),
        )
        .unwrap();

        assert_eq!(stream.span_between(0, 3), Span::new(0, 5));
        assert_eq!(stream.span_between(1, 2), Span::new(2, 3));
        assert!(stream.span_between(2, 2).is_empty());
    }

    #[test]
    fn test_missing_end_of_input() {
        let result = TokenStream::new(tokens(&[("NUMBER", "2", 0)]), &trivia());
        assert_matches!(result, Err(TokenStreamError::MissingEndOfInput { token_count: 1 }));

        let result = TokenStream::new(Vec::new(), &trivia());
        assert_matches!(result, Err(TokenStreamError::MissingEndOfInput { token_count: 0 }));
    }

    #[test]
    fn test_decreasing_positions_rejected() {
        let result = TokenStream::new(
            tokens(&[("NUMBER", "2", 4), ("ADD", "+", 2), (END_OF_INPUT, "", 5)]),
            &trivia(),
        );
        let err = result.unwrap_err();
        assert_matches!(
            err,
            TokenStreamError::NonIncreasingPosition {
                index: 1,
                previous: 4,
                position: 2
            }
        );
        assert_eq!(err.error_code(), codes::lexical::NON_INCREASING_POSITION);
        assert_eq!(err.span(), Some(Span::single(1)));
    }

    #[test]
    fn test_misplaced_end_of_input() {
        let result = TokenStream::new(
            tokens(&[(END_OF_INPUT, "", 0), ("NUMBER", "2", 1), (END_OF_INPUT, "", 2)]),
            &trivia(),
        );
        assert_matches!(result, Err(TokenStreamError::MisplacedEndOfInput { index: 0 }));
    }

    #[test]
    fn test_empty_input_is_only_sentinel() {
        let stream = TokenStream::new(vec![Token::end_of_input(0)], &trivia()).unwrap();
        assert!(stream.is_empty());
        assert!(stream.is_at_end());
    }

    #[test]
    fn test_context_snippet() {
        let stream = TokenStream::new(
            tokens(&[
                ("NUMBER", "1", 0),
                ("ADD", "+", 1),
                ("NUMBER", "2", 2),
                (END_OF_INPUT, "", 3),
            ]),
            &trivia(),
        )
        .unwrap();

        let snippet = stream.context_snippet(1, 1);
        assert_eq!(snippet.len(), 3);
        assert_eq!(snippet[0].literal, "1");
    }
}
