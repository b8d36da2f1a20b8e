//! Recognition of ambiguous binary-operator choices
//!
//! A binary alternative of rule `R` has exactly the shape
//! `seq(field('left', R), field('operator', ops), field('right', R))`,
//! optionally labeled, where `ops` is one token rule or a choice of token
//! rules. A rule whose top-level choice holds at least one such alternative
//! is an operator rule and gets layered by the resolver.

use crate::grammar::{GrammarError, GrammarResult, Rule, RuleNode};
use crate::precedence::{Associativity, PrecedenceTable};
use std::collections::BTreeMap;

/// One binary alternative after recognition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryAlternative {
    /// Node kind the alternative builds
    pub kind: String,
    /// Operator token rule names
    pub operators: Vec<String>,
    /// The operator sub-tree as written
    pub ops: RuleNode,
}

/// Rule whose top-level choice mixes binary and primary alternatives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorRule {
    pub rule: String,
    pub primaries: Vec<RuleNode>,
    pub binaries: Vec<BinaryAlternative>,
}

/// Alternatives sharing one precedence level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelGroup {
    pub level: i32,
    pub associativity: Associativity,
    pub alternatives: Vec<BinaryAlternative>,
}

pub fn analyze_rule(rule: &Rule) -> Option<OperatorRule> {
    let RuleNode::Choice { alternatives } = &rule.body else {
        return None;
    };

    let mut primaries = Vec::new();
    let mut binaries = Vec::new();
    for alternative in alternatives {
        match binary_shape(alternative, &rule.name) {
            Some(binary) => binaries.push(binary),
            None => primaries.push(alternative.clone()),
        }
    }

    if binaries.is_empty() {
        return None;
    }

    Some(OperatorRule {
        rule: rule.name.clone(),
        primaries,
        binaries,
    })
}

fn binary_shape(alternative: &RuleNode, rule_name: &str) -> Option<BinaryAlternative> {
    let (kind, body) = match alternative {
        RuleNode::Labeled { kind, inner } => (kind.as_str(), inner.as_ref()),
        other => (rule_name, other),
    };

    let RuleNode::Sequence { children } = body else {
        return None;
    };
    let [left, operator, right] = children.as_slice() else {
        return None;
    };

    if !is_self_field(left, "left", rule_name) || !is_self_field(right, "right", rule_name) {
        return None;
    }

    let RuleNode::Field { label, inner: ops } = operator else {
        return None;
    };
    if label != "operator" {
        return None;
    }

    let operators = operator_tokens(ops)?;
    Some(BinaryAlternative {
        kind: kind.to_string(),
        operators,
        ops: ops.as_ref().clone(),
    })
}

fn is_self_field(node: &RuleNode, expected: &str, rule_name: &str) -> bool {
    matches!(
        node,
        RuleNode::Field { label, inner }
            if label == expected
                && matches!(inner.as_ref(), RuleNode::RuleRef { name } if name == rule_name)
    )
}

fn operator_tokens(ops: &RuleNode) -> Option<Vec<String>> {
    match ops {
        RuleNode::Token { name } => Some(vec![name.clone()]),
        RuleNode::Choice { alternatives } if !alternatives.is_empty() => alternatives
            .iter()
            .map(|alternative| match alternative {
                RuleNode::Token { name } => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

/// Group binary alternatives by precedence level, loosest level first
pub fn group_by_level(
    operator_rule: &OperatorRule,
    table: &PrecedenceTable,
) -> GrammarResult<Vec<LevelGroup>> {
    let mut groups: BTreeMap<i32, LevelGroup> = BTreeMap::new();

    for binary in &operator_rule.binaries {
        let mut levels = Vec::new();
        let mut associativity = Associativity::Left;
        for operator in &binary.operators {
            let entry = table
                .level_of(operator)
                .ok_or_else(|| GrammarError::MissingPrecedence {
                    operator: operator.clone(),
                    rule: operator_rule.rule.clone(),
                })?;
            if !levels.contains(&entry.level) {
                levels.push(entry.level);
            }
            associativity = entry.associativity;
        }

        if levels.len() > 1 {
            levels.sort_unstable();
            return Err(GrammarError::MixedOperatorLevels {
                rule: operator_rule.rule.clone(),
                alternative: binary.kind.clone(),
                levels,
            });
        }

        let level = levels[0];
        groups
            .entry(level)
            .or_insert_with(|| LevelGroup {
                level,
                associativity,
                alternatives: Vec::new(),
            })
            .alternatives
            .push(binary.clone());
    }

    Ok(groups.into_values().collect())
}
