//! Configuration module for the rule compiler
//! Automatically uses generated constants from TOML configuration

// Include generated constants from build.rs
// This file is generated at compile time from config/<profile>.toml
include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

pub use runtime::{EnginePreferences, LoggingPreferences, ResolverPreferences, RuntimeConfig};

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("RULEC_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("RULEC_CONFIG_DIR").unwrap_or("config")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_limits_are_sane() {
        assert!(compile_time::syntax::MAX_PARSE_DEPTH > 0);
        assert!(compile_time::syntax::MAX_EXPECTED_TOKENS > 0);
        assert!(compile_time::grammar::MAX_PRECEDENCE_LEVELS > 0);
        assert!(compile_time::tokens::MAX_TOKEN_COUNT > 0);
    }

    #[test]
    fn test_source_info_mentions_profile() {
        assert!(build_info::source_info().contains(build_info::profile()));
    }
}
