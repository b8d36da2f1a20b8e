//! Consolidated diagnostic codes and classification system
//!
//! Single source of truth for every code the compiler logs or attaches to an
//! error, together with its behavioral metadata.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for error, warning and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_ERROR: Code = Code::new("ERR003");
}

/// Grammar registration error codes
pub mod grammar {
    use super::Code;

    pub const DUPLICATE_RULE: Code = Code::new("G001");
    pub const DANGLING_RULE_REFERENCE: Code = Code::new("G002");
    pub const MISSING_START_RULE: Code = Code::new("G003");
    pub const DUPLICATE_FIELD: Code = Code::new("G004");
    pub const LIMIT_EXCEEDED: Code = Code::new("G005");
    pub const INVALID_TOKEN_RULE: Code = Code::new("G006");
}

/// Precedence table error codes
pub mod precedence {
    use super::Code;

    pub const MISSING_PRECEDENCE: Code = Code::new("G020");
    pub const DUPLICATE_LEVEL: Code = Code::new("G021");
    pub const DUPLICATE_OPERATOR: Code = Code::new("G022");
    pub const MIXED_OPERATOR_LEVELS: Code = Code::new("G023");
    pub const INVALID_PRECEDENCE_TABLE: Code = Code::new("G024");
    pub const TABLE_LOAD_FAILURE: Code = Code::new("G025");
    pub const UNUSED_PRECEDENCE_ENTRY: Code = Code::new("G026");
}

/// Precedence resolution error codes
pub mod resolution {
    use super::Code;

    pub const NAME_CONFLICT: Code = Code::new("G040");
    pub const LEFT_RECURSION: Code = Code::new("G041");
    pub const NO_PRIMARY_ALTERNATIVE: Code = Code::new("G042");
}

/// Reference lexer and token stream error codes
pub mod lexical {
    use super::Code;

    pub const INVALID_CHARACTER: Code = Code::new("L001");
    pub const TOO_MANY_TOKENS: Code = Code::new("L002");
    pub const LITERAL_TOO_LONG: Code = Code::new("L003");
    pub const MISSING_END_OF_INPUT: Code = Code::new("L010");
    pub const NON_INCREASING_POSITION: Code = Code::new("L011");
    pub const MISPLACED_END_OF_INPUT: Code = Code::new("L012");
}

/// Parse engine error codes
pub mod parse {
    use super::Code;

    pub const SYNTAX_ERROR: Code = Code::new("P001");
    pub const UNEXPECTED_TRAILING_INPUT: Code = Code::new("P002");
    pub const UNKNOWN_START_RULE: Code = Code::new("P003");
    pub const MAX_RECURSION_DEPTH: Code = Code::new("P004");
    pub const INVALID_TOKEN_STREAM: Code = Code::new("P005");
    pub const UNEXPECTED_TREE_SHAPE: Code = Code::new("P010");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");

    pub const GRAMMAR_REGISTERED: Code = Code::new("I010");
    pub const PRECEDENCE_TABLE_LOADED: Code = Code::new("I011");

    pub const RESOLUTION_COMPLETE: Code = Code::new("I020");
    pub const LEVEL_RULE_SYNTHESIZED: Code = Code::new("I021");

    pub const TOKENIZATION_COMPLETE: Code = Code::new("I030");

    pub const PARSE_COMPLETE: Code = Code::new("I040");

    pub const PIPELINE_COMPLETE: Code = Code::new("I050");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            // System
            ErrorMetadata {
                code: "ERR001",
                category: "System",
                severity: Severity::Critical,
                recoverable: false,
                requires_halt: true,
                description: "Critical internal compiler error",
                recommended_action: "File a bug report with the grammar and input that triggered it",
            },
            ErrorMetadata {
                code: "ERR002",
                category: "System",
                severity: Severity::Critical,
                recoverable: false,
                requires_halt: true,
                description: "Logging or runtime initialization failure",
                recommended_action: "Check runtime preferences and environment variables",
            },
            ErrorMetadata {
                code: "ERR003",
                category: "System",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Invalid runtime configuration",
                recommended_action: "Fix the RULEC_* environment variables or configuration file",
            },
            // Grammar registration
            ErrorMetadata {
                code: "G001",
                category: "Grammar",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Two rules or token rules share one name",
                recommended_action: "Rename one of the rules",
            },
            ErrorMetadata {
                code: "G002",
                category: "Grammar",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "A rule references a rule or token rule that does not exist",
                recommended_action: "Define the referenced rule or fix the reference name",
            },
            ErrorMetadata {
                code: "G003",
                category: "Grammar",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "The designated start rule is not defined",
                recommended_action: "Define the start rule or choose an existing one",
            },
            ErrorMetadata {
                code: "G004",
                category: "Grammar",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "One node captures two fields with the same label",
                recommended_action: "Rename one of the field labels",
            },
            ErrorMetadata {
                code: "G005",
                category: "Grammar",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Grammar exceeds a compile-time implementation limit",
                recommended_action: "Reduce grammar size or rebuild with a larger profile",
            },
            ErrorMetadata {
                code: "G006",
                category: "Grammar",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Token rule definition is malformed",
                recommended_action: "Give literal token rules a non-empty pattern",
            },
            // Precedence
            ErrorMetadata {
                code: "G020",
                category: "Precedence",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "A binary operator has no entry in the precedence table",
                recommended_action: "Add the operator token rule to a precedence level",
            },
            ErrorMetadata {
                code: "G021",
                category: "Precedence",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Two precedence entries declare the same level",
                recommended_action: "Merge the entries or give them distinct levels",
            },
            ErrorMetadata {
                code: "G022",
                category: "Precedence",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "An operator is listed in more than one precedence entry",
                recommended_action: "Keep the operator in exactly one level",
            },
            ErrorMetadata {
                code: "G023",
                category: "Precedence",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "One binary alternative mixes operators of different levels",
                recommended_action: "Split the alternative or move its operators to one level",
            },
            ErrorMetadata {
                code: "G024",
                category: "Precedence",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Precedence table violates a structural constraint",
                recommended_action: "Check that every level lists at least one operator",
            },
            ErrorMetadata {
                code: "G025",
                category: "Precedence",
                severity: Severity::Medium,
                recoverable: false,
                requires_halt: true,
                description: "Precedence table file could not be read or parsed",
                recommended_action: "Check the file path and TOML syntax",
            },
            ErrorMetadata {
                code: "G026",
                category: "Precedence",
                severity: Severity::Low,
                recoverable: true,
                requires_halt: false,
                description: "Precedence entry names an operator no binary rule uses",
                recommended_action: "Remove the entry or check the operator name",
            },
            // Resolution
            ErrorMetadata {
                code: "G040",
                category: "Resolution",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "A synthesized level rule name is already taken",
                recommended_action: "Rename the user rule that collides with the generated name",
            },
            ErrorMetadata {
                code: "G041",
                category: "Resolution",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Left recursion remains after precedence resolution",
                recommended_action: "Rewrite the rule so recursion is not in leftmost position",
            },
            ErrorMetadata {
                code: "G042",
                category: "Resolution",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Operator rule has no non-binary alternative to start an operand",
                recommended_action: "Add a primary alternative such as a literal or parenthesized form",
            },
            // Lexical
            ErrorMetadata {
                code: "L001",
                category: "Lexical",
                severity: Severity::Medium,
                recoverable: false,
                requires_halt: true,
                description: "Input contains a character no token kind accepts",
                recommended_action: "Remove or replace the invalid character",
            },
            ErrorMetadata {
                code: "L002",
                category: "Lexical",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Input produces more tokens than the configured maximum",
                recommended_action: "Split the input or rebuild with a larger token limit",
            },
            ErrorMetadata {
                code: "L003",
                category: "Lexical",
                severity: Severity::Medium,
                recoverable: false,
                requires_halt: true,
                description: "A token literal exceeds the configured maximum length",
                recommended_action: "Shorten the literal",
            },
            ErrorMetadata {
                code: "L010",
                category: "TokenStream",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Token stream is not terminated by EndOfInput",
                recommended_action: "Append the EndOfInput sentinel to the token source",
            },
            ErrorMetadata {
                code: "L011",
                category: "TokenStream",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Token positions are not strictly increasing",
                recommended_action: "Fix the token source ordering",
            },
            ErrorMetadata {
                code: "L012",
                category: "TokenStream",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "EndOfInput appears before the final token",
                recommended_action: "Emit EndOfInput exactly once, last",
            },
            // Parse
            ErrorMetadata {
                code: "P001",
                category: "Parse",
                severity: Severity::Medium,
                recoverable: false,
                requires_halt: true,
                description: "No alternative matched the input",
                recommended_action: "Check the input near the reported position",
            },
            ErrorMetadata {
                code: "P002",
                category: "Parse",
                severity: Severity::Medium,
                recoverable: false,
                requires_halt: true,
                description: "Start rule matched but significant tokens remain",
                recommended_action: "Remove the trailing input or extend the grammar",
            },
            ErrorMetadata {
                code: "P003",
                category: "Parse",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Requested start rule does not exist in the resolved grammar",
                recommended_action: "Use a rule name the grammar defines",
            },
            ErrorMetadata {
                code: "P004",
                category: "Parse",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Rule nesting exceeded the maximum parse depth",
                recommended_action: "Reduce input nesting or rebuild with a larger depth limit",
            },
            ErrorMetadata {
                code: "P005",
                category: "Parse",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Token stream handed to the engine is malformed",
                recommended_action: "Validate the token source before parsing",
            },
            ErrorMetadata {
                code: "P010",
                category: "Parse",
                severity: Severity::Medium,
                recoverable: false,
                requires_halt: false,
                description: "Parse tree node does not match the expected typed shape",
                recommended_action: "Check that the tree came from the matching grammar",
            },
            // Success
            ErrorMetadata {
                code: "I001",
                category: "System",
                severity: Severity::Low,
                recoverable: true,
                requires_halt: false,
                description: "Logging system initialized",
                recommended_action: "System ready",
            },
            ErrorMetadata {
                code: "I010",
                category: "Grammar",
                severity: Severity::Low,
                recoverable: true,
                requires_halt: false,
                description: "Grammar registry built and validated",
                recommended_action: "Grammar ready for resolution",
            },
            ErrorMetadata {
                code: "I011",
                category: "Precedence",
                severity: Severity::Low,
                recoverable: true,
                requires_halt: false,
                description: "Precedence table loaded and validated",
                recommended_action: "Table ready for resolution",
            },
            ErrorMetadata {
                code: "I020",
                category: "Resolution",
                severity: Severity::Low,
                recoverable: true,
                requires_halt: false,
                description: "Precedence resolution completed",
                recommended_action: "Resolved grammar ready for parsing",
            },
            ErrorMetadata {
                code: "I021",
                category: "Resolution",
                severity: Severity::Low,
                recoverable: true,
                requires_halt: false,
                description: "Precedence level rule synthesized",
                recommended_action: "No action required",
            },
            ErrorMetadata {
                code: "I030",
                category: "Lexical",
                severity: Severity::Low,
                recoverable: true,
                requires_halt: false,
                description: "Tokenization completed",
                recommended_action: "Token stream ready for parsing",
            },
            ErrorMetadata {
                code: "I040",
                category: "Parse",
                severity: Severity::Low,
                recoverable: true,
                requires_halt: false,
                description: "Parse completed",
                recommended_action: "Parse tree ready",
            },
            ErrorMetadata {
                code: "I050",
                category: "Pipeline",
                severity: Severity::Low,
                recoverable: true,
                requires_halt: false,
                description: "Pipeline completed",
                recommended_action: "No action required",
            },
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get error severity from code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get category from code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
