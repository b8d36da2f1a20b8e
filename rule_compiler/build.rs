// build.rs - TOML-driven compile-time limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    grammar: GrammarLimits,
    syntax: SyntaxLimits,
    tokens: TokenLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct GrammarLimits {
    max_rules: usize,
    max_token_rules: usize,
    max_precedence_levels: usize,
    max_ir_depth: usize,
    max_cycle_path_length: usize,
}

#[derive(serde::Deserialize)]
struct SyntaxLimits {
    max_parse_depth: usize,
    max_expected_tokens: usize,
    max_error_context_tokens: usize,
}

#[derive(serde::Deserialize)]
struct TokenLimits {
    max_token_count: usize,
    max_literal_length: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
    max_log_events_per_grammar: usize,
    security_min_log_level: u8,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=RULEC_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=RULEC_CONFIG_DIR");

    let profile = env::var("RULEC_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("RULEC_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Find workspace root (parent of rule_compiler directory)
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    // nested combinator evaluations; each costs native stack
    const ABSOLUTE_MAX_PARSE_DEPTH: usize = 8_192;
    const ABSOLUTE_MAX_TOKENS: usize = 100_000_000;

    if config.syntax.max_parse_depth == 0 {
        panic!("LIMITS: max_parse_depth must be positive");
    }

    if config.syntax.max_parse_depth > ABSOLUTE_MAX_PARSE_DEPTH {
        panic!("LIMITS: max_parse_depth exceeds absolute maximum");
    }

    if config.tokens.max_token_count > ABSOLUTE_MAX_TOKENS {
        panic!("LIMITS: max_token_count exceeds absolute maximum");
    }

    if config.grammar.max_precedence_levels == 0 || config.grammar.max_rules == 0 {
        panic!("LIMITS: grammar limits must be positive");
    }

    if config.syntax.max_expected_tokens == 0 {
        panic!("LIMITS: max_expected_tokens must be positive");
    }

    if config.logging.security_min_log_level > 2 {
        panic!("LIMITS: security_min_log_level too high (max: 2)");
    }

    if config.logging.max_log_events_per_grammar > config.logging.log_buffer_size {
        panic!("LIMITS: max_log_events_per_grammar exceeds log_buffer_size");
    }

    if profile == "production" && config.syntax.max_parse_depth > 2_048 {
        panic!("PRODUCTION: max_parse_depth too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod grammar {{
        pub const MAX_RULES: usize = {};
        pub const MAX_TOKEN_RULES: usize = {};
        pub const MAX_PRECEDENCE_LEVELS: usize = {};
        pub const MAX_IR_DEPTH: usize = {};
        pub const MAX_CYCLE_PATH_LENGTH: usize = {};
    }}

    pub mod syntax {{
        pub const MAX_PARSE_DEPTH: usize = {};
        pub const MAX_EXPECTED_TOKENS: usize = {};
        pub const MAX_ERROR_CONTEXT_TOKENS: usize = {};
    }}

    pub mod tokens {{
        pub const MAX_TOKEN_COUNT: usize = {};
        pub const MAX_LITERAL_LENGTH: usize = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
        pub const MAX_LOG_EVENTS_PER_GRAMMAR: usize = {};
        pub const SECURITY_MIN_LOG_LEVEL: u8 = {};
    }}
}}
"#,
        profile,
        // Grammar
        config.grammar.max_rules,
        config.grammar.max_token_rules,
        config.grammar.max_precedence_levels,
        config.grammar.max_ir_depth,
        config.grammar.max_cycle_path_length,
        // Syntax
        config.syntax.max_parse_depth,
        config.syntax.max_expected_tokens,
        config.syntax.max_error_context_tokens,
        // Tokens
        config.tokens.max_token_count,
        config.tokens.max_literal_length,
        // Logging
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
        config.logging.max_log_events_per_grammar,
        config.logging.security_min_log_level,
    );

    fs::write(output_path, constants_code).unwrap();
}
