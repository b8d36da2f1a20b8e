//! Parse engine: drives a token stream through a resolved grammar
//!
//! An [`Engine`] borrows an immutable [`ResolvedGrammar`]; every parse owns
//! its own cursor, memo table and field frames, so one grammar serves any
//! number of parses, concurrently if the grammar is shared across threads.

mod error;
mod parser;
mod stats;

pub use error::{ParseError, ParseResult};
pub use stats::ParseStatistics;

use crate::config::runtime::EnginePreferences;
use crate::logging::{self, codes};
use crate::resolver::ResolvedGrammar;
use crate::tokens::{Token, TokenStream};
use crate::tree::ParseNode;
use crate::{log_debug, log_error, log_info, log_success};
use parser::ParseRun;

pub struct Engine<'g> {
    grammar: &'g ResolvedGrammar,
    preferences: EnginePreferences,
}

impl<'g> Engine<'g> {
    pub fn new(grammar: &'g ResolvedGrammar) -> Self {
        Self::with_preferences(grammar, EnginePreferences::default())
    }

    pub fn with_preferences(grammar: &'g ResolvedGrammar, preferences: EnginePreferences) -> Self {
        Self {
            grammar,
            preferences,
        }
    }

    pub fn grammar(&self) -> &'g ResolvedGrammar {
        self.grammar
    }

    pub fn preferences(&self) -> &EnginePreferences {
        &self.preferences
    }

    /// Parse a complete token sequence from `start`
    pub fn parse(&self, start: &str, tokens: Vec<Token>) -> ParseResult<ParseNode> {
        self.parse_with_stats(start, tokens).map(|(tree, _)| tree)
    }

    pub fn parse_with_stats(
        &self,
        start: &str,
        tokens: Vec<Token>,
    ) -> ParseResult<(ParseNode, ParseStatistics)> {
        logging::with_grammar_context(self.grammar.name(), "parse", || {
            let result = TokenStream::new(tokens, self.grammar.trivia_kinds())
                .map_err(ParseError::from)
                .and_then(|stream| self.run(start, stream));
            self.report(start, &result);
            result
        })
    }

    /// Parse an already validated stream; parsing starts at its first token
    pub fn parse_stream(
        &self,
        start: &str,
        mut stream: TokenStream,
    ) -> ParseResult<(ParseNode, ParseStatistics)> {
        stream.restore_position(0);
        logging::with_grammar_context(self.grammar.name(), "parse", || {
            let result = self.run(start, stream);
            self.report(start, &result);
            result
        })
    }

    fn run(&self, start: &str, stream: TokenStream) -> ParseResult<(ParseNode, ParseStatistics)> {
        log_debug!("Starting parse",
            "start" => start,
            "tokens" => stream.len(),
            "memoize" => self.preferences.memoize_rules
        );

        let mut run = ParseRun::new(self.grammar, stream, self.preferences.memoize_rules);
        let tree = run.run(start)?;

        let statistics = if self.preferences.collect_statistics {
            run.statistics()
        } else {
            ParseStatistics::default()
        };
        log_debug!("Parse finished", "stream" => run.stream().diagnostic());
        Ok((tree, statistics))
    }

    fn report(&self, start: &str, result: &ParseResult<(ParseNode, ParseStatistics)>) {
        match result {
            Ok((tree, statistics)) => {
                log_success!(
                    codes::success::PARSE_COMPLETE,
                    "Parse completed",
                    "start" => start,
                    "root" => tree.kind,
                    "tokens_consumed" => statistics.tokens_consumed
                );
                if self.preferences.log_parse_summary {
                    log_info!("Parse statistics", "summary" => statistics.summary());
                }
            }
            Err(error) => match error.span() {
                Some(span) => {
                    log_error!(error.error_code(), "Parse failed", span = span,
                        "error" => error
                    );
                }
                None => {
                    log_error!(error.error_code(), "Parse failed", "error" => error);
                }
            },
        }
    }
}

/// Parse with default engine preferences
pub fn parse(grammar: &ResolvedGrammar, start: &str, tokens: Vec<Token>) -> ParseResult<ParseNode> {
    Engine::new(grammar).parse(start, tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::runtime::ResolverPreferences;
    use crate::grammar::{
        choice, field, fold, literal, optional, repeat, repeat1, rule, seq, token,
        GrammarBuilder, TokenRule,
    };
    use crate::precedence::PrecedenceTable;
    use crate::resolver::{resolve, resolve_with_preferences};
    use crate::tokens::TokenStreamError;
    use assert_matches::assert_matches;

    /// Tokens at consecutive positions; `(` `)` `,` `!` become anonymous terminals
    fn lex(parts: &[&str]) -> Vec<Token> {
        let mut tokens: Vec<Token> = parts
            .iter()
            .enumerate()
            .map(|(position, part)| match *part {
                "(" | ")" | "," | "!" => Token::anonymous(*part, position),
                "-" => Token::new("SUB", "-", position),
                " " => Token::new("WHITESPACE", " ", position),
                number => Token::new("NUMBER", number, position),
            })
            .collect();
        tokens.push(Token::end_of_input(parts.len()));
        tokens
    }

    fn base(name: &str) -> GrammarBuilder {
        GrammarBuilder::new(name)
            .token(TokenRule::any("NUMBER"))
            .token(TokenRule::literal("SUB", "-"))
            .token(TokenRule::skip("WHITESPACE"))
    }

    fn no_precedence() -> PrecedenceTable {
        PrecedenceTable::new()
    }

    fn lists() -> ResolvedGrammar {
        let registry = base("engine-lists")
            .rule(
                "args",
                seq([
                    literal("("),
                    field("items", repeat(seq([token("NUMBER"), optional(literal(","))]))),
                    literal(")"),
                ]),
            )
            .build()
            .unwrap();
        resolve(&registry, &no_precedence()).unwrap()
    }

    #[test]
    fn test_list_field_collects_items() {
        let grammar = lists();
        let tree = parse(&grammar, "args", lex(&["(", "1", ",", " ", "2", ")"])).unwrap();

        assert_eq!(tree.kind, "args");
        let items: Vec<_> = tree
            .children("items")
            .iter()
            .map(|n| n.literal.as_deref().unwrap())
            .collect();
        assert_eq!(items, vec!["1", "2"]);
        assert_eq!(tree.span, crate::utils::Span::new(0, 6));
        // the skipped whitespace keeps its original index
        assert_eq!(tree.children("items")[1].span, crate::utils::Span::single(4));
    }

    #[test]
    fn test_empty_list_field_is_present() {
        let grammar = lists();
        let tree = parse(&grammar, "args", lex(&["(", ")"])).unwrap();
        assert_eq!(tree.field("items").and_then(|f| f.as_list()).map(<[_]>::len), Some(0));
        assert_eq!(tree.to_sexpr(), "(args items:[])");
    }

    fn engine(memoize_rules: bool) -> EnginePreferences {
        EnginePreferences {
            memoize_rules,
            collect_statistics: true,
            log_parse_summary: false,
        }
    }

    #[test]
    fn test_repeat1_requires_one_item() {
        let registry = base("engine-repeat1")
            .rule(
                "args",
                seq([literal("("), field("items", repeat1(token("NUMBER"))), literal(")")]),
            )
            .rule("bangs", seq([token("NUMBER"), repeat1(literal("!"))]))
            .build()
            .unwrap();
        let grammar = resolve(&registry, &no_precedence()).unwrap();

        let tree = parse(&grammar, "args", lex(&["(", "1", " ", "2", "3", ")"])).unwrap();
        let items: Vec<_> = tree
            .children("items")
            .iter()
            .map(|n| n.literal.as_deref().unwrap())
            .collect();
        assert_eq!(items, vec!["1", "2", "3"]);

        assert_matches!(
            parse(&grammar, "args", lex(&["(", ")"])),
            Err(ParseError::SyntaxError { position: 1, expected, .. }) if expected == vec!["NUMBER"]
        );

        let tree = parse(&grammar, "bangs", lex(&["7", "!", "!"])).unwrap();
        assert_eq!(tree.literal.as_deref(), Some("7"));
        assert_eq!(tree.span, crate::utils::Span::single(0));
        assert_matches!(
            parse(&grammar, "bangs", lex(&["7"])),
            Err(ParseError::SyntaxError { position: 1, expected, .. }) if expected == vec!["!"]
        );
    }

    #[test]
    fn test_trailing_input() {
        let grammar = lists();
        let result = parse(&grammar, "args", lex(&["(", ")", "7"]));
        assert_matches!(
            result,
            Err(ParseError::UnexpectedTrailingInput { position: 2, token_index: 2, .. })
        );
    }

    #[test]
    fn test_syntax_error_reports_farthest_failure() {
        let grammar = lists();
        let result = parse(&grammar, "args", lex(&["(", "1", "-"]));
        assert_matches!(
            result,
            Err(ParseError::SyntaxError { position: 2, expected, .. })
                if expected == vec![")", ",", "NUMBER"]
        );
    }

    #[test]
    fn test_unknown_start_rule_and_bad_stream() {
        let grammar = lists();
        assert_matches!(
            parse(&grammar, "program", lex(&["(", ")"])),
            Err(ParseError::UnknownStartRule { rule }) if rule == "program"
        );

        let mut tokens = lex(&["(", ")"]);
        tokens.pop();
        assert_matches!(
            parse(&grammar, "args", tokens),
            Err(ParseError::InvalidTokenStream(TokenStreamError::MissingEndOfInput { .. }))
        );
    }

    #[test]
    fn test_failed_fold_is_unwound() {
        let registry = base("engine-unfold")
            .rule(
                "s",
                seq([
                    token("NUMBER"),
                    choice([
                        seq([fold("Tagged", field("tag", token("SUB"))), literal("!")]),
                        token("SUB"),
                    ]),
                ]),
            )
            .build()
            .unwrap();
        let grammar = resolve(&registry, &no_precedence()).unwrap();

        let tree = parse(&grammar, "s", lex(&["1", "-"])).unwrap();
        assert_eq!(tree.kind, "NUMBER");
        assert_eq!(tree.literal.as_deref(), Some("1"));

        let tagged = parse(&grammar, "s", lex(&["1", "-", "!"])).unwrap();
        assert_eq!(tagged.to_sexpr(), r#"(Tagged left:(NUMBER "1") tag:(SUB "-"))"#);
        // the fold covers its left operand and what it consumed itself
        assert_eq!(tagged.span, crate::utils::Span::new(0, 2));
    }

    #[test]
    fn test_memoization_does_not_change_results() {
        let registry = base("engine-memo")
            .rule(
                "s",
                choice([seq([rule("atom"), literal("!")]), seq([rule("atom"), literal(",")])]),
            )
            .rule("atom", field("Atom", token("NUMBER")))
            .build()
            .unwrap();
        let grammar = resolve(&registry, &no_precedence()).unwrap();

        let memoized = Engine::with_preferences(&grammar, engine(true));
        let plain = Engine::with_preferences(&grammar, engine(false));

        let (tree_a, stats_a) = memoized.parse_with_stats("s", lex(&["4", ","])).unwrap();
        let (tree_b, stats_b) = plain.parse_with_stats("s", lex(&["4", ","])).unwrap();

        assert_eq!(tree_a, tree_b);
        assert_eq!(stats_a.memo_hits, 1);
        assert_eq!(stats_b.memo_hits, 0);
        assert_eq!(stats_b.rule_invocations, stats_a.rule_invocations + 1);
        assert_eq!(stats_a.tokens_consumed, 2);

        let error_a = memoized.parse("s", lex(&["4", "-"])).unwrap_err();
        let error_b = plain.parse("s", lex(&["4", "-"])).unwrap_err();
        assert_eq!(error_a, error_b);
    }

    #[test]
    fn test_memo_hit_on_right_chain() {
        let registry = base("engine-right-chain")
            .rule(
                "s",
                choice([
                    seq([field("body", rule("chain")), literal("!")]),
                    seq([field("body", rule("chain")), literal(",")]),
                ]),
            )
            .rule(
                "chain",
                seq([
                    token("NUMBER"),
                    optional(fold(
                        "Difference",
                        seq([field("operator", token("SUB")), field("right", rule("chain"))]),
                    )),
                ]),
            )
            .build()
            .unwrap();
        let grammar = resolve(&registry, &no_precedence()).unwrap();

        let operands = 100;
        let mut parts = vec!["1"];
        for _ in 1..operands {
            parts.extend(["-", "1"]);
        }
        parts.push(",");

        let memoized = Engine::with_preferences(&grammar, engine(true));
        let plain = Engine::with_preferences(&grammar, engine(false));
        let (tree_a, stats_a) = memoized.parse_with_stats("s", lex(&parts)).unwrap();
        let (tree_b, stats_b) = plain.parse_with_stats("s", lex(&parts)).unwrap();

        assert_eq!(tree_a, tree_b);
        assert_eq!(tree_a.child("body").unwrap().kind, "Difference");
        // the second alternative reuses the whole chain from the memo
        assert_eq!(stats_a.memo_hits, 1);
        assert_eq!(stats_a.rule_invocations, operands + 1);
        assert_eq!(stats_b.rule_invocations, 2 * operands + 1);
    }

    #[test]
    fn test_recursion_depth_is_bounded() {
        let registry = base("engine-depth")
            .rule("list", choice([seq([rule("list"), literal(",")]), token("NUMBER")]))
            .build()
            .unwrap();
        let lenient = ResolverPreferences {
            verify_left_recursion: false,
            ..ResolverPreferences::default()
        };
        let grammar = resolve_with_preferences(&registry, &no_precedence(), &lenient).unwrap();

        let result = parse(&grammar, "list", lex(&["1", ","]));
        assert_matches!(result, Err(ParseError::MaxRecursionDepth { rule, .. }) if rule == "list");
    }

    #[test]
    fn test_parse_stream_and_logging() {
        let memory = logging::test_capture();
        let grammar = lists();
        let stream = TokenStream::new(lex(&["(", "3", ")"]), grammar.trivia_kinds()).unwrap();

        let (tree, _) = Engine::new(&grammar).parse_stream("args", stream).unwrap();
        assert_eq!(tree.children("items").len(), 1);

        let events = memory.get_events_for_grammar("engine-lists");
        assert!(events.iter().any(|e| e.code == codes::success::PARSE_COMPLETE));
    }
}
