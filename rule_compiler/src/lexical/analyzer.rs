//! Reference token source for arithmetic expressions
//!
//! Produces the token kinds the calculator grammar declares: `NUMBER`,
//! `WHITESPACE`, the operator token rules, and anonymous `(` / `)` terminals
//! whose kind is their own text. The stream always ends with `EndOfInput`.

use crate::config::compile_time::tokens::MAX_TOKEN_COUNT;
use crate::logging::{codes, Code};
use crate::tokens::Token;
use crate::utils::Span;
use crate::{log_debug, log_error, log_success};
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("Invalid character: '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("Too many tokens: {count} (max {MAX_TOKEN_COUNT})")]
    TooManyTokens { count: usize },
}

impl LexerError {
    pub fn error_code(&self) -> Code {
        match self {
            LexerError::InvalidCharacter { .. } => codes::lexical::INVALID_CHARACTER,
            LexerError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
        }
    }

    /// Source position of the failure, when known
    pub fn position(&self) -> Option<usize> {
        match self {
            LexerError::InvalidCharacter { position, .. } => Some(*position),
            LexerError::TooManyTokens { .. } => None,
        }
    }
}

/// Counters for one tokenization
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub number_tokens: usize,
    pub operator_tokens: usize,
    pub punctuation_tokens: usize,
    pub whitespace_tokens: usize,
}

impl LexicalMetrics {
    fn record_token(&mut self, token: &Token) {
        self.total_tokens += 1;
        match token.kind.as_str() {
            "NUMBER" => self.number_tokens += 1,
            "WHITESPACE" => self.whitespace_tokens += 1,
            "(" | ")" => self.punctuation_tokens += 1,
            _ if !token.is_end_of_input() => self.operator_tokens += 1,
            _ => {}
        }
    }

    pub fn significant_tokens(&self) -> usize {
        self.total_tokens - self.whitespace_tokens
    }
}

/// Operator characters and the token rule each one belongs to
const OPERATORS: [(char, &str); 5] = [
    ('^', "POW"),
    ('*', "MUL"),
    ('/', "DIV"),
    ('+', "ADD"),
    ('-', "SUB"),
];

pub fn operator_kind(ch: char) -> Option<&'static str> {
    OPERATORS
        .iter()
        .find(|(op, _)| *op == ch)
        .map(|(_, kind)| *kind)
}

pub struct ArithmeticLexer {
    metrics: LexicalMetrics,
}

impl Default for ArithmeticLexer {
    fn default() -> Self {
        Self::new()
    }
}

impl ArithmeticLexer {
    pub fn new() -> Self {
        Self {
            metrics: LexicalMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    /// Classify `source` into tokens terminated by `EndOfInput`
    pub fn tokenize(&mut self, source: &str) -> Result<Vec<Token>, LexerError> {
        self.metrics = LexicalMetrics::default();

        log_debug!("Starting lexical analysis",
            "bytes" => source.len(),
            "max_tokens_allowed" => MAX_TOKEN_COUNT
        );

        let mut tokens = Vec::new();
        let mut chars = source.char_indices().peekable();

        while let Some(&(offset, ch)) = chars.peek() {
            // the sentinel needs a slot too
            if tokens.len() + 1 >= MAX_TOKEN_COUNT {
                let error = LexerError::TooManyTokens {
                    count: tokens.len() + 1,
                };
                log_error!(error.error_code(), "Token limit exceeded",
                    "limit" => MAX_TOKEN_COUNT
                );
                return Err(error);
            }

            let token = if ch.is_whitespace() {
                let text = take_while(&mut chars, source, char::is_whitespace);
                Token::new("WHITESPACE", text, offset)
            } else if ch.is_ascii_digit() {
                Token::new("NUMBER", self.scan_number(&mut chars, source), offset)
            } else if let Some(kind) = operator_kind(ch) {
                chars.next();
                Token::new(kind, ch.to_string(), offset)
            } else if ch == '(' || ch == ')' {
                chars.next();
                Token::anonymous(ch.to_string(), offset)
            } else {
                let error = LexerError::InvalidCharacter {
                    character: ch,
                    position: offset,
                };
                log_error!(error.error_code(), "Invalid character in expression",
                    span = Span::single(tokens.len()),
                    "character" => ch,
                    "position" => offset
                );
                return Err(error);
            };

            self.metrics.record_token(&token);
            tokens.push(token);
        }

        let end = Token::end_of_input(source.len());
        self.metrics.record_token(&end);
        tokens.push(end);

        log_success!(
            codes::success::TOKENIZATION_COMPLETE,
            "Tokenization completed",
            "tokens" => self.metrics.total_tokens,
            "significant_tokens" => self.metrics.significant_tokens()
        );
        Ok(tokens)
    }

    /// Integer or decimal literal; a `.` counts only when a digit follows it
    fn scan_number(&self, chars: &mut Peekable<CharIndices<'_>>, source: &str) -> String {
        let mut text = take_while(chars, source, |c| c.is_ascii_digit()).to_string();

        let mut lookahead = chars.clone();
        if let Some((_, '.')) = lookahead.next() {
            if lookahead.peek().is_some_and(|(_, c)| c.is_ascii_digit()) {
                chars.next();
                text.push('.');
                text.push_str(take_while(chars, source, |c| c.is_ascii_digit()));
            }
        }
        text
    }
}

fn take_while<'s>(
    chars: &mut Peekable<CharIndices<'_>>,
    source: &'s str,
    predicate: impl Fn(char) -> bool,
) -> &'s str {
    let start = chars.peek().map_or(source.len(), |(offset, _)| *offset);
    let mut end = start;
    while let Some(&(offset, ch)) = chars.peek() {
        if !predicate(ch) {
            break;
        }
        end = offset + ch.len_utf8();
        chars.next();
    }
    &source[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn kinds(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.kind.as_str()).collect()
    }

    #[test]
    fn test_operators_numbers_and_parentheses() {
        let mut lexer = ArithmeticLexer::new();
        let tokens = lexer.tokenize("(2+3.5)*4^2/1-0").unwrap();

        assert_eq!(
            kinds(&tokens),
            vec![
                "(", "NUMBER", "ADD", "NUMBER", ")", "MUL", "NUMBER", "POW", "NUMBER", "DIV",
                "NUMBER", "SUB", "NUMBER", "EndOfInput"
            ]
        );
        assert_eq!(tokens[3].literal, "3.5");
        assert_eq!(tokens[3].position, 3);
        assert_eq!(lexer.metrics().operator_tokens, 5);
        assert_eq!(lexer.metrics().punctuation_tokens, 2);
    }

    #[test]
    fn test_whitespace_runs_become_one_token() {
        let mut lexer = ArithmeticLexer::new();
        let tokens = lexer.tokenize("1 \t+\n 2").unwrap();

        assert_eq!(
            kinds(&tokens),
            vec!["NUMBER", "WHITESPACE", "ADD", "WHITESPACE", "NUMBER", "EndOfInput"]
        );
        assert_eq!(tokens[1].literal, " \t");
        assert_eq!(tokens[5].position, 7);
        assert_eq!(lexer.metrics().significant_tokens(), 4);
    }

    #[test]
    fn test_trailing_dot_is_not_part_of_number() {
        let mut lexer = ArithmeticLexer::new();
        assert_matches!(
            lexer.tokenize("3."),
            Err(LexerError::InvalidCharacter { character: '.', position: 1 })
        );
    }

    #[test]
    fn test_invalid_character() {
        let mut lexer = ArithmeticLexer::new();
        let error = lexer.tokenize("2 % 3").unwrap_err();
        assert_eq!(error, LexerError::InvalidCharacter { character: '%', position: 2 });
        assert_eq!(error.error_code(), codes::lexical::INVALID_CHARACTER);
        assert_eq!(error.position(), Some(2));
    }

    #[test]
    fn test_empty_source_is_just_the_sentinel() {
        let tokens = ArithmeticLexer::new().tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_end_of_input());
    }
}
