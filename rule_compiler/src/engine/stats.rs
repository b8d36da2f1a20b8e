//! Per-parse counters

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStatistics {
    /// Rule bodies actually evaluated (memo hits excluded)
    pub rule_invocations: usize,
    pub memo_hits: usize,
    /// Entries in the memo table when the parse finished
    pub memo_entries: usize,
    /// Significant tokens consumed by the start rule
    pub tokens_consumed: usize,
    /// Deepest combinator nesting reached
    pub max_depth: usize,
    /// Token and literal match attempts
    pub terminal_attempts: usize,
}

impl ParseStatistics {
    pub fn memo_hit_rate(&self) -> f64 {
        let lookups = self.rule_invocations + self.memo_hits;
        if lookups == 0 {
            0.0
        } else {
            self.memo_hits as f64 / lookups as f64
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rule invocations, {} memo hits ({:.1}%), {} tokens consumed, max depth {}",
            self.rule_invocations,
            self.memo_hits,
            self.memo_hit_rate() * 100.0,
            self.tokens_consumed,
            self.max_depth
        )
    }
}
