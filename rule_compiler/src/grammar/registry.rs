//! Grammar registry: named rules in an arena, token rules, start rule
//!
//! Grammars are assembled with [`GrammarBuilder`]. `build()` normalizes the
//! authored bodies and validates the whole grammar before anything can be
//! resolved or parsed, so a [`GrammarRegistry`] is always self-consistent.

use crate::config::compile_time::grammar::{MAX_IR_DEPTH, MAX_RULES, MAX_TOKEN_RULES};
use crate::grammar::error::{GrammarError, GrammarResult};
use crate::grammar::ir::RuleNode;
use crate::grammar::token_rule::{TokenPattern, TokenRule};
use crate::logging::{self, codes};
use crate::{log_debug, log_error, log_success};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// One named rule of the grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub name: String,
    pub body: RuleNode,
}

/// Validated grammar: rules addressed by name or arena index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRegistry {
    name: String,
    rules: Vec<Rule>,
    rule_index: HashMap<String, usize>,
    token_rules: Vec<TokenRule>,
    token_index: HashMap<String, usize>,
    start: String,
}

impl GrammarRegistry {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rule_index(name).map(|index| &self.rules[index])
    }

    pub fn rule_index(&self, name: &str) -> Option<usize> {
        self.rule_index.get(name).copied()
    }

    pub fn rule_at(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn contains_rule(&self, name: &str) -> bool {
        self.rule_index.contains_key(name)
    }

    pub fn token_rules(&self) -> &[TokenRule] {
        &self.token_rules
    }

    pub fn token_rule(&self, name: &str) -> Option<&TokenRule> {
        self.token_index.get(name).map(|&index| &self.token_rules[index])
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    /// Kinds the token stream hides before every match attempt
    pub fn trivia_kinds(&self) -> BTreeSet<String> {
        self.token_rules
            .iter()
            .filter(|rule| rule.is_skip_trivia)
            .map(|rule| rule.name.clone())
            .collect()
    }

    /// Start a builder pre-filled with this registry's contents
    pub fn to_builder(&self) -> GrammarBuilder {
        GrammarBuilder {
            name: self.name.clone(),
            token_rules: self.token_rules.clone(),
            rules: self.rules.clone(),
            start: Some(self.start.clone()),
        }
    }
}

/// Collects token rules and rules, then validates them in `build()`
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    name: String,
    token_rules: Vec<TokenRule>,
    rules: Vec<Rule>,
    start: Option<String>,
}

impl GrammarBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn token(mut self, token_rule: TokenRule) -> Self {
        self.token_rules.push(token_rule);
        self
    }

    pub fn tokens(mut self, token_rules: impl IntoIterator<Item = TokenRule>) -> Self {
        self.token_rules.extend(token_rules);
        self
    }

    pub fn rule(mut self, name: impl Into<String>, body: RuleNode) -> Self {
        self.rules.push(Rule {
            name: name.into(),
            body,
        });
        self
    }

    /// Designate the start rule (defaults to the first declared rule)
    pub fn start(mut self, name: impl Into<String>) -> Self {
        self.start = Some(name.into());
        self
    }

    /// Replace the body of an existing rule, or append it
    pub(crate) fn replace_rule(mut self, name: &str, body: RuleNode) -> Self {
        match self.rules.iter_mut().find(|rule| rule.name == name) {
            Some(rule) => rule.body = body,
            None => self.rules.push(Rule {
                name: name.to_string(),
                body,
            }),
        }
        self
    }

    /// Normalize and validate into an immutable registry
    pub fn build(self) -> GrammarResult<GrammarRegistry> {
        let name = self.name.clone();
        logging::with_grammar_context(&name, "register", || {
            let result = self.build_inner();
            match &result {
                Ok(registry) => {
                    log_success!(
                        codes::success::GRAMMAR_REGISTERED,
                        "Grammar registered",
                        "rules" => registry.rule_count(),
                        "token_rules" => registry.token_rules.len(),
                        "start" => registry.start()
                    );
                }
                Err(error) => {
                    log_error!(error.error_code(), "Grammar registration failed",
                        "error" => error
                    );
                }
            }
            result
        })
    }

    fn build_inner(self) -> GrammarResult<GrammarRegistry> {
        if self.token_rules.len() > MAX_TOKEN_RULES {
            return Err(GrammarError::limit_exceeded(
                "token rules",
                self.token_rules.len(),
                MAX_TOKEN_RULES,
            ));
        }
        if self.rules.len() > MAX_RULES {
            return Err(GrammarError::limit_exceeded(
                "rules",
                self.rules.len(),
                MAX_RULES,
            ));
        }

        let mut token_index = HashMap::with_capacity(self.token_rules.len());
        for (index, token_rule) in self.token_rules.iter().enumerate() {
            if let TokenPattern::Literal(text) = &token_rule.pattern {
                if text.is_empty() {
                    return Err(GrammarError::InvalidTokenRule {
                        name: token_rule.name.clone(),
                        reason: "literal pattern is empty".to_string(),
                    });
                }
            }
            if token_index.insert(token_rule.name.clone(), index).is_some() {
                return Err(GrammarError::DuplicateRule {
                    name: token_rule.name.clone(),
                });
            }
        }

        let mut rule_index = HashMap::with_capacity(self.rules.len());
        for (index, rule) in self.rules.iter().enumerate() {
            if token_index.contains_key(&rule.name)
                || rule_index.insert(rule.name.clone(), index).is_some()
            {
                return Err(GrammarError::DuplicateRule {
                    name: rule.name.clone(),
                });
            }
        }

        let rules: Vec<Rule> = self
            .rules
            .into_iter()
            .map(|rule| Rule {
                body: normalize_body(rule.body, &token_index, &rule_index),
                name: rule.name,
            })
            .collect();

        for rule in &rules {
            let depth = rule.body.depth();
            if depth > MAX_IR_DEPTH {
                return Err(GrammarError::limit_exceeded("rule IR depth", depth, MAX_IR_DEPTH));
            }

            for reference in rule.body.rule_references() {
                if !rule_index.contains_key(reference) {
                    return Err(GrammarError::dangling_rule(&rule.name, reference));
                }
            }

            for reference in rule.body.token_references() {
                let Some(&index) = token_index.get(reference) else {
                    return Err(GrammarError::dangling_token(&rule.name, reference));
                };
                if self.token_rules[index].is_skip_trivia {
                    return Err(GrammarError::InvalidTokenRule {
                        name: reference.to_string(),
                        reason: format!("skip trivia is referenced by rule '{}'", rule.name),
                    });
                }
            }

            check_fields(&rule.body, &rule.name, &mut BTreeSet::new())?;
        }

        let start = match self.start {
            Some(start) => start,
            None => rules
                .first()
                .map(|rule| rule.name.clone())
                .ok_or_else(|| GrammarError::MissingStartRule {
                    name: String::new(),
                })?,
        };
        if !rule_index.contains_key(&start) {
            return Err(GrammarError::MissingStartRule { name: start });
        }

        log_debug!("Grammar validated",
            "rules" => rules.len(),
            "start" => start
        );

        Ok(GrammarRegistry {
            name: self.name,
            rules,
            rule_index,
            token_rules: self.token_rules,
            token_index,
            start,
        })
    }
}

/// Rewrite an authored body into its registered form:
/// references to token rules become `Token`, and a `Field` standing as the
/// whole body or as a top-level alternative becomes a labeled alternative.
fn normalize_body(
    body: RuleNode,
    token_index: &HashMap<String, usize>,
    rule_index: &HashMap<String, usize>,
) -> RuleNode {
    let body = body.map(&mut |node| match node {
        RuleNode::RuleRef { name }
            if token_index.contains_key(&name) && !rule_index.contains_key(&name) =>
        {
            RuleNode::Token { name }
        }
        other => other,
    });

    match body {
        RuleNode::Choice { alternatives } => RuleNode::Choice {
            alternatives: alternatives.into_iter().map(label_field).collect(),
        },
        other => label_field(other),
    }
}

fn label_field(node: RuleNode) -> RuleNode {
    match node {
        RuleNode::Field { label, inner } => RuleNode::Labeled { kind: label, inner },
        other => other,
    }
}

/// Reject a label captured twice in one node scope.
///
/// Alternatives of a choice are exclusive, so each is checked on its own
/// and their labels are merged afterwards. `Labeled` and `Fold` open a new
/// scope; a fold's scope already holds `left`.
fn check_fields(node: &RuleNode, kind: &str, seen: &mut BTreeSet<String>) -> GrammarResult<()> {
    match node {
        RuleNode::Field { label, inner } => {
            if !seen.insert(label.clone()) {
                return Err(GrammarError::DuplicateField {
                    kind: kind.to_string(),
                    label: label.clone(),
                });
            }
            check_fields(inner, kind, seen)
        }
        RuleNode::Labeled { kind, inner } => check_fields(inner, kind, &mut BTreeSet::new()),
        RuleNode::Fold { kind, inner } => {
            let mut scope = BTreeSet::from(["left".to_string()]);
            check_fields(inner, kind, &mut scope)
        }
        RuleNode::Choice { alternatives } => {
            let mut merged = seen.clone();
            for alternative in alternatives {
                let mut branch = seen.clone();
                check_fields(alternative, kind, &mut branch)?;
                merged.extend(branch);
            }
            *seen = merged;
            Ok(())
        }
        RuleNode::Sequence { children } => {
            for child in children {
                check_fields(child, kind, seen)?;
            }
            Ok(())
        }
        RuleNode::Repeat { inner }
        | RuleNode::Repeat1 { inner }
        | RuleNode::Optional { inner } => check_fields(inner, kind, seen),
        RuleNode::Token { .. } | RuleNode::Literal { .. } | RuleNode::RuleRef { .. } => Ok(()),
    }
}
