//! Global logging module for the rule compiler
//!
//! Provides thread-safe global logging with a per-thread grammar context
//! and a small macro interface. All macros are no-ops until
//! `init_global_logging` (or `init_global_logging_with_service`) runs.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

/// Grammar being registered, resolved or parsed on the current thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarContext {
    pub grammar: String,
    pub stage: &'static str,
    events_logged: usize,
}

impl GrammarContext {
    pub fn new(grammar: &str, stage: &'static str) -> Self {
        Self {
            grammar: grammar.to_string(),
            stage,
            events_logged: 0,
        }
    }
}

thread_local! {
    static GRAMMAR_CONTEXT: RefCell<Option<GrammarContext>> = const { RefCell::new(None) };
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;

    let logging_service = Arc::new(service::create_configured_service());

    GLOBAL_LOGGER
        .set(logging_service.clone())
        .map_err(|_| "Global logger already initialized")?;

    logging_service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

/// Initialize with custom service (primarily for testing)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized")?;
    Ok(())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Safe access to global logger
pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

// ============================================================================
// GRAMMAR CONTEXT MANAGEMENT
// ============================================================================

pub fn set_grammar_context(grammar: &str, stage: &'static str) {
    GRAMMAR_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(GrammarContext::new(grammar, stage));
    });
}

pub fn clear_grammar_context() {
    GRAMMAR_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = None;
    });
}

/// Execute function with a grammar context, restoring the previous one afterwards
pub fn with_grammar_context<F, R>(grammar: &str, stage: &'static str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = get_current_grammar_context();
    set_grammar_context(grammar, stage);
    let result = f();
    GRAMMAR_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = previous;
    });
    result
}

pub fn get_current_grammar_context() -> Option<GrammarContext> {
    GRAMMAR_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Attach grammar context and apply the per-grammar event budget.
/// Returns `None` when the event must be dropped.
fn prepare_event(mut event: LogEvent) -> Option<LogEvent> {
    let max_events = config::get_max_log_events_per_grammar();
    let include = config::include_grammar_context();

    let admitted = GRAMMAR_CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        match ctx.as_mut() {
            Some(context) => {
                // Errors always pass; the budget only bounds chatter
                if context.events_logged >= max_events && !event.is_error() {
                    return false;
                }
                context.events_logged += 1;
                if include {
                    event
                        .context
                        .insert("grammar".to_string(), context.grammar.clone());
                    event
                        .context
                        .insert("stage".to_string(), context.stage.to_string());
                }
                true
            }
            None => true,
        }
    });

    admitted.then_some(event)
}

/// Route an event through context and the global logger
pub fn dispatch(event: LogEvent) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };
    if !logger.should_log(event.level) {
        return;
    }
    if let Some(event) = prepare_event(event) {
        logger.log_event(event);
    }
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

/// Log error with context (used by log_error! macro)
pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<crate::utils::Span>,
    context: Vec<(&str, &str)>,
) {
    let mut event = LogEvent::error(code, message);
    if let Some(s) = span {
        event = event.with_span(s);
    }
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    dispatch(event);
}

/// Log success with context (used by log_success! macro)
pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::success(code, message);
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    dispatch(event);
}

/// Log info with context (used by log_info! macro)
pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::info(message);
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    dispatch(event);
}

/// Log warning with optional code (used by log_warning! macro)
pub fn log_warning_with_context(code: Option<Code>, message: &str, context: Vec<(&str, &str)>) {
    let mut event = match code {
        Some(code) => LogEvent::warning_with_code(code, message),
        None => LogEvent::warning(message),
    };
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    dispatch(event);
}

/// Log debug with context (used by log_debug! macro)
pub fn log_debug_with_context(message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::debug(message);
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    dispatch(event);
}

/// Get system diagnostics
pub fn get_system_diagnostics() -> String {
    let mut diagnostics = String::new();

    diagnostics.push_str("=== Logging System Diagnostics ===\n");
    diagnostics.push_str(&format!("Initialized: {}\n", is_initialized()));
    if let Some(context) = get_current_grammar_context() {
        diagnostics.push_str(&format!(
            "Grammar context: {} ({})\n",
            context.grammar, context.stage
        ));
    }
    diagnostics.push('\n');
    diagnostics.push_str(&config::get_config_summary());

    diagnostics
}

/// Safe error logging (won't panic if uninitialized)
pub fn safe_log_error(code: Code, message: &str) {
    if is_initialized() {
        dispatch(LogEvent::error(code, message));
    } else {
        eprintln!("[ERROR] FALLBACK: [{}] {}", code.as_str(), message);
    }
}

/// Shared memory sink installed as the global logger for tests.
///
/// Tests running in parallel share the sink, so assertions should filter by
/// grammar name through `MemoryLogger::get_events_for_grammar`.
#[cfg(test)]
pub(crate) fn test_capture() -> Arc<MemoryLogger> {
    static CAPTURE: OnceLock<Arc<MemoryLogger>> = OnceLock::new();
    CAPTURE
        .get_or_init(|| {
            let memory = Arc::new(MemoryLogger::new());
            let service = Arc::new(LoggingService::new(memory.clone(), LogLevel::Debug));
            let _ = init_global_logging_with_service(service);
            memory
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_context_management() {
        assert!(get_current_grammar_context().is_none());

        set_grammar_context("Calculator", "resolve");
        let context = get_current_grammar_context().unwrap();
        assert_eq!(context.grammar, "Calculator");
        assert_eq!(context.stage, "resolve");

        clear_grammar_context();
        assert!(get_current_grammar_context().is_none());
    }

    #[test]
    fn test_with_grammar_context_restores_previous() {
        set_grammar_context("Outer", "register");

        let result = with_grammar_context("Inner", "parse", || {
            assert_eq!(get_current_grammar_context().unwrap().grammar, "Inner");
            42
        });

        assert_eq!(result, 42);
        assert_eq!(get_current_grammar_context().unwrap().grammar, "Outer");
        clear_grammar_context();
    }

    #[test]
    fn test_events_carry_grammar_context() {
        let memory = test_capture();

        with_grammar_context("ctx-tagging-test", "parse", || {
            log_success_with_context(codes::success::PARSE_COMPLETE, "done", vec![("n", "1")]);
        });

        let events = memory.get_events_for_grammar("ctx-tagging-test");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].context.get("stage").map(String::as_str), Some("parse"));
        assert_eq!(events[0].context.get("n").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_safe_logging_does_not_panic() {
        safe_log_error(codes::system::INTERNAL_ERROR, "Test error");
    }

    #[test]
    fn test_diagnostics() {
        let diagnostics = get_system_diagnostics();
        assert!(diagnostics.contains("Logging System Diagnostics"));
        assert!(diagnostics.contains("Initialized:"));
    }
}
