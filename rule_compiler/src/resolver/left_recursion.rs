//! Detection of left recursion that survives the layered rewrite
//!
//! A rule depends on every rule it can invoke before consuming a token.
//! Any cycle in that leftmost-call graph would make the engine recurse
//! without progress, so resolution rejects it.

use crate::config::compile_time::grammar::MAX_CYCLE_PATH_LENGTH;
use crate::grammar::{GrammarRegistry, RuleNode};
use crate::log_debug;
use std::collections::{BTreeMap, HashSet};

/// Rules that can match without consuming a token
pub fn nullable_rules(registry: &GrammarRegistry) -> HashSet<String> {
    let mut nullable = HashSet::new();
    loop {
        let mut changed = false;
        for rule in registry.rules() {
            if !nullable.contains(&rule.name) && is_nullable(&rule.body, &nullable) {
                nullable.insert(rule.name.clone());
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn is_nullable(node: &RuleNode, nullable: &HashSet<String>) -> bool {
    match node {
        RuleNode::Token { .. } | RuleNode::Literal { .. } => false,
        RuleNode::RuleRef { name } => nullable.contains(name),
        RuleNode::Sequence { children } => children.iter().all(|c| is_nullable(c, nullable)),
        RuleNode::Choice { alternatives } => {
            alternatives.iter().any(|a| is_nullable(a, nullable))
        }
        RuleNode::Repeat { .. } | RuleNode::Optional { .. } => true,
        RuleNode::Field { inner, .. }
        | RuleNode::Repeat1 { inner }
        | RuleNode::Labeled { inner, .. }
        | RuleNode::Fold { inner, .. } => is_nullable(inner, nullable),
    }
}

/// Rules reachable from `node` before any token is consumed
fn leftmost_references<'a>(
    node: &'a RuleNode,
    nullable: &HashSet<String>,
    out: &mut Vec<&'a str>,
) {
    match node {
        RuleNode::Token { .. } | RuleNode::Literal { .. } => {}
        RuleNode::RuleRef { name } => out.push(name),
        RuleNode::Sequence { children } => {
            for child in children {
                leftmost_references(child, nullable, out);
                if !is_nullable(child, nullable) {
                    break;
                }
            }
        }
        RuleNode::Choice { alternatives } => {
            for alternative in alternatives {
                leftmost_references(alternative, nullable, out);
            }
        }
        RuleNode::Field { inner, .. }
        | RuleNode::Repeat { inner }
        | RuleNode::Repeat1 { inner }
        | RuleNode::Optional { inner }
        | RuleNode::Labeled { inner, .. }
        | RuleNode::Fold { inner, .. } => leftmost_references(inner, nullable, out),
    }
}

/// First left-recursive cycle in rule declaration order, if any.
///
/// The returned path starts and ends with the same rule and is truncated to
/// the configured maximum cycle length.
pub fn find_left_recursion(registry: &GrammarRegistry) -> Option<Vec<String>> {
    let nullable = nullable_rules(registry);

    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for rule in registry.rules() {
        let mut targets = Vec::new();
        leftmost_references(&rule.body, &nullable, &mut targets);
        targets.dedup();
        adjacency.insert(rule.name.as_str(), targets);
    }

    log_debug!("Left recursion graph",
        "rules" => adjacency.len(),
        "edges" => adjacency.values().map(Vec::len).sum::<usize>()
    );

    let mut visited = HashSet::new();
    let mut on_stack = HashSet::new();
    let mut path = Vec::new();

    for rule in registry.rules() {
        if visited.contains(rule.name.as_str()) {
            continue;
        }
        if let Some(cycle) = find_cycle_dfs(
            rule.name.as_str(),
            &adjacency,
            &mut visited,
            &mut on_stack,
            &mut path,
        ) {
            return Some(truncate_cycle(cycle));
        }
    }

    None
}

fn find_cycle_dfs<'a>(
    node: &'a str,
    adjacency: &BTreeMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    on_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    on_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = adjacency.get(node) {
        for &neighbor in neighbors {
            if on_stack.contains(neighbor) {
                let start = path.iter().position(|&n| n == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(neighbor.to_string());
                return Some(cycle);
            }
            if !visited.contains(neighbor) {
                if let Some(cycle) = find_cycle_dfs(neighbor, adjacency, visited, on_stack, path) {
                    return Some(cycle);
                }
            }
        }
    }

    on_stack.remove(node);
    path.pop();
    None
}

fn truncate_cycle(mut cycle: Vec<String>) -> Vec<String> {
    if cycle.len() > MAX_CYCLE_PATH_LENGTH {
        log_debug!("Left recursion cycle truncated",
            "length" => cycle.len(),
            "limit" => MAX_CYCLE_PATH_LENGTH
        );
        cycle.truncate(MAX_CYCLE_PATH_LENGTH);
    }
    cycle
}
