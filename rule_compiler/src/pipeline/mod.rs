//! End-to-end pipeline: registry and precedence table in, parse trees out
//!
//! `compile` resolves a grammar once into a [`CompiledGrammar`] that can be
//! cloned cheaply and shared across threads; `parse_source` lexes one source
//! text with the arithmetic lexer and parses it from the grammar's start rule.

mod error;
pub mod output;
mod result;

pub use error::PipelineError;
pub use output::PipelineOutput;
pub use result::PipelineResult;

use crate::config::runtime::{EnginePreferences, ResolverPreferences};
use crate::engine::Engine;
use crate::grammar::GrammarRegistry;
use crate::lexical::ArithmeticLexer;
use crate::logging;
use crate::precedence::PrecedenceTable;
use crate::resolver::{self, ResolvedGrammar};
use crate::tokens::TokenStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Resolved grammar ready for any number of parses
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    grammar: Arc<ResolvedGrammar>,
    compile_duration: Duration,
}

impl CompiledGrammar {
    pub fn grammar(&self) -> &ResolvedGrammar {
        &self.grammar
    }

    pub fn shared(&self) -> Arc<ResolvedGrammar> {
        Arc::clone(&self.grammar)
    }

    pub fn name(&self) -> &str {
        self.grammar.name()
    }

    pub fn start(&self) -> &str {
        self.grammar.start()
    }

    pub fn compile_duration(&self) -> Duration {
        self.compile_duration
    }
}

/// Resolve `registry` against `table` with default resolver preferences
pub fn compile(
    registry: &GrammarRegistry,
    table: &PrecedenceTable,
) -> Result<CompiledGrammar, PipelineError> {
    compile_with_preferences(registry, table, &ResolverPreferences::default())
}

pub fn compile_with_preferences(
    registry: &GrammarRegistry,
    table: &PrecedenceTable,
    preferences: &ResolverPreferences,
) -> Result<CompiledGrammar, PipelineError> {
    let start_time = Instant::now();
    let resolved = resolver::resolve_with_preferences(registry, table, preferences)?;

    Ok(CompiledGrammar {
        grammar: Arc::new(resolved),
        compile_duration: start_time.elapsed(),
    })
}

/// Lex and parse `source` from the grammar's start rule
pub fn parse_source(compiled: &CompiledGrammar, source: &str) -> Result<PipelineResult, PipelineError> {
    parse_source_with_preferences(compiled, source, EnginePreferences::default())
}

pub fn parse_source_with_preferences(
    compiled: &CompiledGrammar,
    source: &str,
    preferences: EnginePreferences,
) -> Result<PipelineResult, PipelineError> {
    let start_time = Instant::now();

    logging::with_grammar_context(compiled.name(), "pipeline", || {
        crate::log_debug!("Starting source pipeline",
            "grammar" => compiled.name(),
            "bytes" => source.len()
        );

        let mut lexer = ArithmeticLexer::new();
        let tokens = lexer.tokenize(source)?;
        let token_count = tokens.len();

        let stream = TokenStream::new(tokens, compiled.grammar().trivia_kinds())?;
        let engine = Engine::with_preferences(compiled.grammar(), preferences);
        let (tree, statistics) = engine.parse_stream(compiled.start(), stream)?;

        let result = PipelineResult::new(
            tree,
            statistics,
            lexer.metrics().clone(),
            token_count,
            start_time.elapsed(),
        );
        result.log_success(compiled.name());

        Ok(result)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ParseError;
    use crate::fixtures::calculator;
    use crate::lexical::LexerError;
    use crate::logging::codes;
    use assert_matches::assert_matches;

    fn compiled() -> CompiledGrammar {
        compile(&calculator::grammar().unwrap(), &calculator::precedence_table()).unwrap()
    }

    #[test]
    fn test_parse_source_end_to_end() {
        let compiled = compiled();
        let result = parse_source(&compiled, "1 + 2 * 3").unwrap();

        assert_eq!(result.tree.kind, "AdditionOrSubtraction");
        assert_eq!(calculator::evaluate(&result.tree).unwrap(), 7.0);
        assert_eq!(result.token_count, 10);
        assert_eq!(result.lexical_metrics.whitespace_tokens, 4);
        assert_eq!(result.statistics.tokens_consumed, 5);
    }

    #[test]
    fn test_stage_errors_are_wrapped() {
        let compiled = compiled();

        let lexical = parse_source(&compiled, "1 # 2").unwrap_err();
        assert_matches!(lexical, PipelineError::LexicalAnalysis(LexerError::InvalidCharacter { .. }));
        assert_eq!(lexical.error_code(), codes::lexical::INVALID_CHARACTER);
        assert_eq!(lexical.stage(), "lexical");

        let parse = parse_source(&compiled, "(1").unwrap_err();
        assert_matches!(parse, PipelineError::Parse(ParseError::SyntaxError { .. }));
        assert_eq!(parse.error_code(), codes::parse::SYNTAX_ERROR);
    }

    #[test]
    fn test_compile_rejects_incomplete_table() {
        let table = PrecedenceTable::new().left(1, ["ADD", "SUB"]);
        let error = compile(&calculator::grammar().unwrap(), &table).unwrap_err();
        assert_matches!(error, PipelineError::Grammar(_));
        assert_eq!(error.error_code(), codes::precedence::MISSING_PRECEDENCE);
    }

    #[test]
    fn test_compiled_grammar_is_shared_across_threads() {
        let compiled = compiled();
        let handles: Vec<_> = ["1+1", "2*3", "2^2^2", "(4-1)/3"]
            .into_iter()
            .map(|source| {
                let compiled = compiled.clone();
                std::thread::spawn(move || {
                    let result = parse_source(&compiled, source).unwrap();
                    calculator::evaluate(&result.tree).unwrap()
                })
            })
            .collect();

        let values: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(values, vec![2.0, 6.0, 16.0, 1.0]);
        assert_eq!(Arc::strong_count(&compiled.shared()), 2);
    }

    #[test]
    fn test_pipeline_logs_completion() {
        let memory = logging::test_capture();
        let compiled = compiled();
        parse_source(&compiled, "3*3").unwrap();

        let events = memory.get_events_for_grammar(calculator::GRAMMAR_NAME);
        assert!(events.iter().any(|e| e.code == codes::success::PIPELINE_COMPLETE));
        assert!(events.iter().any(|e| e.code == codes::success::PARSE_COMPLETE));
    }

    #[test]
    fn test_output_json() {
        let compiled = compiled();
        let result = parse_source(&compiled, "2*4").unwrap();
        let json = PipelineOutput::new(compiled.name(), compiled.start(), &result.tree, result.statistics)
            .with_value(8.0)
            .to_json()
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tree"]["kind"], "MultiplicationOrDivision");
        assert_eq!(value["value"], 8.0);
        assert_eq!(value["grammar"], "Calculator");
    }
}
