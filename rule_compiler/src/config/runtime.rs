// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverPreferences {
    /// Whether to run the left-recursion check on the rewritten grammar
    pub verify_left_recursion: bool,

    /// Whether to log every synthesized precedence level rule
    pub log_synthesized_rules: bool,

    /// Whether to warn about precedence entries no rule uses
    pub warn_unused_precedence: bool,
}

impl Default for ResolverPreferences {
    fn default() -> Self {
        Self {
            verify_left_recursion: env::var("RULEC_RESOLVER_VERIFY_LEFT_RECURSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_synthesized_rules: env::var("RULEC_RESOLVER_LOG_SYNTHESIZED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            warn_unused_precedence: env::var("RULEC_RESOLVER_WARN_UNUSED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnginePreferences {
    /// Memoize rule invocations per (rule, position)
    pub memoize_rules: bool,

    /// Whether to collect invocation statistics during a parse
    pub collect_statistics: bool,

    /// Whether to log a summary line after each parse
    pub log_parse_summary: bool,
}

impl Default for EnginePreferences {
    fn default() -> Self {
        Self {
            memoize_rules: env::var("RULEC_ENGINE_MEMOIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            collect_statistics: env::var("RULEC_ENGINE_COLLECT_STATISTICS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_parse_summary: env::var("RULEC_ENGINE_LOG_SUMMARY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging (user preference)
    pub use_structured_logging: bool,

    /// Whether to enable console output (user preference)
    pub enable_console_logging: bool,

    /// User preferred minimum log level
    pub min_log_level: LogLevel,

    /// Whether to include the grammar context in log messages
    pub include_grammar_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var("RULEC_LOGGING_USE_STRUCTURED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var("RULEC_LOGGING_ENABLE_CONSOLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var("RULEC_LOGGING_MIN_LEVEL")
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            include_grammar_context: env::var("RULEC_LOGGING_INCLUDE_GRAMMAR_CONTEXT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel for compatibility
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub resolver: ResolverPreferences,
    pub engine: EnginePreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Load preferences from a TOML document; absent sections keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        #[derive(Deserialize)]
        struct Partial {
            resolver: Option<ResolverPreferences>,
            engine: Option<EnginePreferences>,
            logging: Option<LoggingPreferences>,
        }

        let partial: Partial = toml::from_str(content)?;
        Ok(Self {
            resolver: partial.resolver.unwrap_or_default(),
            engine: partial.engine.unwrap_or_default(),
            logging: partial.logging.unwrap_or_default(),
        })
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Resolver
    pub const RESOLVER_VERIFY_LEFT_RECURSION: &str = "RULEC_RESOLVER_VERIFY_LEFT_RECURSION";
    pub const RESOLVER_LOG_SYNTHESIZED: &str = "RULEC_RESOLVER_LOG_SYNTHESIZED";
    pub const RESOLVER_WARN_UNUSED: &str = "RULEC_RESOLVER_WARN_UNUSED";

    // Engine
    pub const ENGINE_MEMOIZE: &str = "RULEC_ENGINE_MEMOIZE";
    pub const ENGINE_COLLECT_STATISTICS: &str = "RULEC_ENGINE_COLLECT_STATISTICS";
    pub const ENGINE_LOG_SUMMARY: &str = "RULEC_ENGINE_LOG_SUMMARY";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "RULEC_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "RULEC_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "RULEC_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_GRAMMAR_CONTEXT: &str = "RULEC_LOGGING_INCLUDE_GRAMMAR_CONTEXT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("1"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_runtime_config_from_toml() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [engine]
            memoize_rules = false
            collect_statistics = true
            log_parse_summary = false
            "#,
        )
        .unwrap();

        assert!(!config.engine.memoize_rules);
        assert!(config.engine.collect_statistics);
    }

    #[test]
    fn test_runtime_config_rejects_bad_types() {
        let result = RuntimeConfig::from_toml_str("[engine]\nmemoize_rules = \"sometimes\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_env_var_names_exist() {
        assert!(!env_vars::ENGINE_MEMOIZE.is_empty());
        assert!(!env_vars::LOGGING_MIN_LEVEL.is_empty());
        assert!(!env_vars::RESOLVER_VERIFY_LEFT_RECURSION.is_empty());
    }
}
