use crate::engine::ParseError;
use crate::fixtures::TreeShapeError;
use crate::grammar::GrammarError;
use crate::lexical::LexerError;
use crate::logging::{codes, Code};
use crate::precedence::PrecedenceLoadError;
use crate::tokens::TokenStreamError;

/// Errors from any pipeline stage
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Grammar construction failed: {0}")]
    Grammar(#[from] GrammarError),

    #[error("Precedence table could not be loaded: {0}")]
    PrecedenceLoad(#[from] PrecedenceLoadError),

    #[error("Lexical analysis failed: {0}")]
    LexicalAnalysis(#[from] LexerError),

    #[error("Token stream rejected: {0}")]
    TokenStream(#[from] TokenStreamError),

    #[error("Parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] TreeShapeError),

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },
}

impl PipelineError {
    pub fn pipeline_error(message: &str) -> Self {
        Self::Pipeline {
            message: message.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::Grammar(error) => error.error_code(),
            Self::PrecedenceLoad(error) => error.error_code(),
            Self::LexicalAnalysis(error) => error.error_code(),
            Self::TokenStream(error) => error.error_code(),
            Self::Parse(error) => error.error_code(),
            Self::Evaluation(error) => error.error_code(),
            Self::Pipeline { .. } => codes::system::INTERNAL_ERROR,
        }
    }

    /// Stage that failed, for short reports
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Grammar(_) => "grammar",
            Self::PrecedenceLoad(_) => "precedence",
            Self::LexicalAnalysis(_) => "lexical",
            Self::TokenStream(_) => "token stream",
            Self::Parse(_) => "parse",
            Self::Evaluation(_) => "evaluation",
            Self::Pipeline { .. } => "pipeline",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }
}
