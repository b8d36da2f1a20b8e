//! Precedence resolution: registry + precedence table to a resolved grammar
//!
//! Every operator rule (a top-level choice holding `left op right`
//! alternatives) is replaced by a chain of per-level rules ending in a
//! primary rule, which removes the left recursion by construction. The
//! resolved grammar also carries the node schema the engine finalizes
//! fields with.

pub mod analysis;
pub mod left_recursion;
pub mod rewrite;
pub mod schema;

pub use schema::{FieldSlot, NodeSchema};

use crate::config::runtime::ResolverPreferences;
use crate::grammar::{GrammarError, GrammarRegistry, GrammarResult, Rule, TokenRule};
use crate::logging::{self, codes};
use crate::precedence::PrecedenceTable;
use crate::{log_debug, log_error, log_success, log_warning};
use std::collections::BTreeSet;

/// Immutable grammar ready for parsing; share it freely across threads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGrammar {
    registry: GrammarRegistry,
    schema: NodeSchema,
    table: PrecedenceTable,
    synthesized_rules: Vec<String>,
    trivia_kinds: BTreeSet<String>,
}

impl ResolvedGrammar {
    /// The rewritten registry; resolving it again yields the same grammar
    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    pub fn name(&self) -> &str {
        self.registry.name()
    }

    pub fn start(&self) -> &str {
        self.registry.start()
    }

    pub fn rule_index(&self, name: &str) -> Option<usize> {
        self.registry.rule_index(name)
    }

    pub fn rule_at(&self, index: usize) -> Option<&Rule> {
        self.registry.rule_at(index)
    }

    pub fn token_rule(&self, name: &str) -> Option<&TokenRule> {
        self.registry.token_rule(name)
    }

    pub fn schema(&self) -> &NodeSchema {
        &self.schema
    }

    pub fn precedence_table(&self) -> &PrecedenceTable {
        &self.table
    }

    /// Names of rules created by the rewrite, in creation order
    pub fn synthesized_rules(&self) -> &[String] {
        &self.synthesized_rules
    }

    pub fn trivia_kinds(&self) -> &BTreeSet<String> {
        &self.trivia_kinds
    }
}

/// Resolve with default resolver preferences
pub fn resolve(registry: &GrammarRegistry, table: &PrecedenceTable) -> GrammarResult<ResolvedGrammar> {
    resolve_with_preferences(registry, table, &ResolverPreferences::default())
}

pub fn resolve_with_preferences(
    registry: &GrammarRegistry,
    table: &PrecedenceTable,
    preferences: &ResolverPreferences,
) -> GrammarResult<ResolvedGrammar> {
    logging::with_grammar_context(registry.name(), "resolve", || {
        log_debug!("Starting precedence resolution",
            "rules" => registry.rule_count(),
            "precedence_levels" => table.len()
        );

        let result = resolve_inner(registry, table, preferences);
        match &result {
            Ok(resolved) => {
                log_success!(
                    codes::success::RESOLUTION_COMPLETE,
                    "Precedence resolution completed",
                    "rules" => resolved.registry.rule_count(),
                    "synthesized_rules" => resolved.synthesized_rules.len()
                );
            }
            Err(error) => {
                log_error!(error.error_code(), "Precedence resolution failed",
                    "error" => error
                );
            }
        }
        result
    })
}

fn resolve_inner(
    registry: &GrammarRegistry,
    table: &PrecedenceTable,
    preferences: &ResolverPreferences,
) -> GrammarResult<ResolvedGrammar> {
    table.validate()?;

    let mut builder = registry.to_builder();
    let mut planned: Vec<String> = Vec::new();

    for rule in registry.rules() {
        let Some(operator_rule) = analysis::analyze_rule(rule) else {
            continue;
        };

        let groups = analysis::group_by_level(&operator_rule, table)?;
        let layered = rewrite::layer_rule(&operator_rule, &groups, &|name| {
            rewrite::is_taken(registry, &planned, name)
        })?;

        builder = builder.replace_rule(&layered.rule, layered.alias);
        for synthesized in layered.synthesized {
            if preferences.log_synthesized_rules {
                log_success!(
                    codes::success::LEVEL_RULE_SYNTHESIZED,
                    "Level rule synthesized",
                    "rule" => synthesized.name,
                    "from" => layered.rule,
                    "level" => synthesized
                        .level
                        .map(|level| level.to_string())
                        .unwrap_or_else(|| "primary".to_string()),
                    "associativity" => synthesized
                        .associativity
                        .map(|a| a.as_str())
                        .unwrap_or("-")
                );
            } else {
                log_debug!("Level rule synthesized", "rule" => synthesized.name);
            }
            planned.push(synthesized.name.clone());
            builder = builder.rule(synthesized.name, synthesized.body);
        }
    }

    let resolved = builder.build()?;

    if preferences.verify_left_recursion {
        if let Some(cycle) = left_recursion::find_left_recursion(&resolved) {
            return Err(GrammarError::LeftRecursion { cycle });
        }
    }

    if preferences.warn_unused_precedence {
        warn_unused_operators(&resolved, table);
    }

    Ok(ResolvedGrammar {
        schema: NodeSchema::from_registry(&resolved),
        trivia_kinds: resolved.trivia_kinds(),
        table: table.clone(),
        synthesized_rules: planned,
        registry: resolved,
    })
}

fn warn_unused_operators(registry: &GrammarRegistry, table: &PrecedenceTable) {
    let referenced: BTreeSet<&str> = registry
        .rules()
        .iter()
        .flat_map(|rule| rule.body.token_references())
        .collect();

    for operator in table.operators() {
        if !referenced.contains(operator) {
            log_warning!(
                code = codes::precedence::UNUSED_PRECEDENCE_ENTRY,
                "Precedence table lists an operator the grammar never uses",
                "operator" => operator
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{choice, field, literal, rule, seq, token, GrammarBuilder, RuleNode};
    use assert_matches::assert_matches;

    fn binary(op: RuleNode) -> RuleNode {
        seq([
            field("left", rule("expr")),
            field("operator", op),
            field("right", rule("expr")),
        ])
    }

    fn grammar(name: &str) -> GrammarRegistry {
        GrammarBuilder::new(name)
            .token(TokenRule::literal("ADD", "+"))
            .token(TokenRule::literal("MUL", "*"))
            .token(TokenRule::any("NUMBER"))
            .rule(
                "expr",
                choice([
                    field("Num", rule("NUMBER")),
                    field("Group", seq([literal("("), field("inner", rule("expr")), literal(")")])),
                    field("Product", binary(token("MUL"))),
                    field("Sum", binary(token("ADD"))),
                ]),
            )
            .build()
            .unwrap()
    }

    fn table() -> PrecedenceTable {
        PrecedenceTable::new().left(1, ["ADD"]).left(2, ["MUL"])
    }

    #[test]
    fn test_resolution_layers_operator_rule() {
        let resolved = resolve(&grammar("resolve-layers"), &table()).unwrap();

        assert_eq!(
            resolved.synthesized_rules(),
            &["expr_level_0", "expr_level_1", "expr_primary"]
        );
        assert_eq!(resolved.registry().rule("expr").unwrap().body, rule("expr_level_0"));
        assert_eq!(resolved.schema().labels("Sum"), vec!["left", "operator", "right"]);
        assert_eq!(resolved.schema().labels("Group"), vec!["inner"]);
        assert_eq!(resolved.start(), "expr");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let once = resolve(&grammar("resolve-idempotent"), &table()).unwrap();
        let twice = resolve(once.registry(), &table()).unwrap();

        assert_eq!(once.registry(), twice.registry());
        assert_eq!(once.schema(), twice.schema());
        assert!(twice.synthesized_rules().is_empty());
    }

    #[test]
    fn test_invalid_table_is_rejected() {
        let table = PrecedenceTable::new().left(1, ["ADD"]).left(1, ["MUL"]);
        assert_matches!(
            resolve(&grammar("resolve-bad-table"), &table),
            Err(GrammarError::DuplicateLevel { level: 1 })
        );
    }

    #[test]
    fn test_name_conflict_with_existing_rule() {
        let registry = grammar("resolve-conflict")
            .to_builder()
            .rule("expr_primary", token("NUMBER"))
            .build()
            .unwrap();
        assert_matches!(
            resolve(&registry, &table()),
            Err(GrammarError::NameConflict { name, .. }) if name == "expr_primary"
        );
    }

    #[test]
    fn test_remaining_left_recursion_is_reported() {
        let registry = grammar("resolve-left-rec")
            .to_builder()
            .rule("list", choice([seq([rule("list"), literal(",")]), token("NUMBER")]))
            .build()
            .unwrap();

        assert_matches!(
            resolve(&registry, &table()),
            Err(GrammarError::LeftRecursion { cycle }) if cycle == vec!["list", "list"]
        );

        let lenient = ResolverPreferences {
            verify_left_recursion: false,
            ..ResolverPreferences::default()
        };
        assert!(resolve_with_preferences(&registry, &table(), &lenient).is_ok());
    }

    #[test]
    fn test_resolution_logging() {
        let memory = logging::test_capture();
        let preferences = ResolverPreferences {
            log_synthesized_rules: true,
            warn_unused_precedence: true,
            ..ResolverPreferences::default()
        };
        let table = table().right(3, ["POW"]);

        resolve_with_preferences(&grammar("resolve-logging"), &table, &preferences).unwrap();

        let events = memory.get_events_for_grammar("resolve-logging");
        let count = |code| events.iter().filter(|e| e.code == code).count();
        assert_eq!(count(codes::success::LEVEL_RULE_SYNTHESIZED), 3);
        assert_eq!(count(codes::success::RESOLUTION_COMPLETE), 1);
        assert_eq!(count(codes::precedence::UNUSED_PRECEDENCE_ENTRY), 1);
    }

    #[test]
    fn test_resolved_grammar_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResolvedGrammar>();
    }
}
