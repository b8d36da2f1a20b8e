//! Construction-time errors for grammars, precedence tables and resolution
//!
//! Every variant is raised before any parse runs.

use crate::logging::{codes, Code};

pub type GrammarResult<T> = Result<T, GrammarError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("Rule '{name}' is defined more than once")]
    DuplicateRule { name: String },

    #[error("Rule '{rule}' references undefined {target} '{reference}'")]
    DanglingRuleReference {
        rule: String,
        reference: String,
        /// "rule" or "token rule"
        target: &'static str,
    },

    #[error("Start rule '{name}' is not defined")]
    MissingStartRule { name: String },

    #[error("Node '{kind}' captures field '{label}' more than once")]
    DuplicateField { kind: String, label: String },

    #[error("Token rule '{name}' is invalid: {reason}")]
    InvalidTokenRule { name: String, reason: String },

    #[error("Operator '{operator}' used in rule '{rule}' has no precedence entry")]
    MissingPrecedence { operator: String, rule: String },

    #[error("Precedence level {level} is declared more than once")]
    DuplicateLevel { level: i32 },

    #[error("Operator '{operator}' appears in more than one precedence entry")]
    DuplicateOperator { operator: String },

    #[error("Alternative '{alternative}' of rule '{rule}' mixes operators of levels {levels:?}")]
    MixedOperatorLevels {
        rule: String,
        alternative: String,
        levels: Vec<i32>,
    },

    #[error("Synthesized rule name '{name}' for rule '{rule}' is already taken")]
    NameConflict { name: String, rule: String },

    #[error("Rule '{rule}' has only binary alternatives; nothing can start an operand")]
    NoPrimaryAlternative { rule: String },

    #[error("Left recursion remains: {}", cycle.join(" -> "))]
    LeftRecursion { cycle: Vec<String> },

    #[error("Invalid precedence table: {reason}")]
    InvalidPrecedenceTable { reason: String },

    #[error("Grammar limit exceeded: {limit} is {actual}, maximum is {max}")]
    LimitExceeded {
        limit: &'static str,
        actual: usize,
        max: usize,
    },
}

impl GrammarError {
    pub fn dangling_rule(rule: &str, reference: &str) -> Self {
        Self::DanglingRuleReference {
            rule: rule.to_string(),
            reference: reference.to_string(),
            target: "rule",
        }
    }

    pub fn dangling_token(rule: &str, reference: &str) -> Self {
        Self::DanglingRuleReference {
            rule: rule.to_string(),
            reference: reference.to_string(),
            target: "token rule",
        }
    }

    pub fn limit_exceeded(limit: &'static str, actual: usize, max: usize) -> Self {
        Self::LimitExceeded { limit, actual, max }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::DuplicateRule { .. } => codes::grammar::DUPLICATE_RULE,
            Self::DanglingRuleReference { .. } => codes::grammar::DANGLING_RULE_REFERENCE,
            Self::MissingStartRule { .. } => codes::grammar::MISSING_START_RULE,
            Self::DuplicateField { .. } => codes::grammar::DUPLICATE_FIELD,
            Self::InvalidTokenRule { .. } => codes::grammar::INVALID_TOKEN_RULE,
            Self::LimitExceeded { .. } => codes::grammar::LIMIT_EXCEEDED,
            Self::MissingPrecedence { .. } => codes::precedence::MISSING_PRECEDENCE,
            Self::DuplicateLevel { .. } => codes::precedence::DUPLICATE_LEVEL,
            Self::DuplicateOperator { .. } => codes::precedence::DUPLICATE_OPERATOR,
            Self::MixedOperatorLevels { .. } => codes::precedence::MIXED_OPERATOR_LEVELS,
            Self::InvalidPrecedenceTable { .. } => codes::precedence::INVALID_PRECEDENCE_TABLE,
            Self::NameConflict { .. } => codes::resolution::NAME_CONFLICT,
            Self::NoPrimaryAlternative { .. } => codes::resolution::NO_PRIMARY_ALTERNATIVE,
            Self::LeftRecursion { .. } => codes::resolution::LEFT_RECURSION,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.error_code().as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }
}
