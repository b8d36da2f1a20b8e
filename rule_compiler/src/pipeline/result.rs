use crate::engine::ParseStatistics;
use crate::lexical::LexicalMetrics;
use crate::logging::codes;
use crate::tree::ParseNode;
use std::time::Duration;

/// Outcome of lexing and parsing one source text
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub tree: ParseNode,
    pub statistics: ParseStatistics,
    pub lexical_metrics: LexicalMetrics,
    pub token_count: usize,
    pub processing_duration: Duration,
}

impl PipelineResult {
    pub fn new(
        tree: ParseNode,
        statistics: ParseStatistics,
        lexical_metrics: LexicalMetrics,
        token_count: usize,
        processing_duration: Duration,
    ) -> Self {
        Self {
            tree,
            statistics,
            lexical_metrics,
            token_count,
            processing_duration,
        }
    }

    pub fn log_success(&self, grammar: &str) {
        crate::log_success!(
            codes::success::PIPELINE_COMPLETE,
            "Source parsed",
            "grammar" => grammar,
            "root" => self.tree.kind,
            "tokens" => self.token_count,
            "duration_ms" => format!("{:.2}", self.processing_duration.as_secs_f64() * 1000.0)
        );
    }
}
