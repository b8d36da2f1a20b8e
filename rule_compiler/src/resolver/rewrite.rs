//! Layered rewrite of an operator rule into one rule per precedence level

use super::analysis::{LevelGroup, OperatorRule};
use crate::grammar::{
    choice, field, fold, optional, repeat, rule, seq, GrammarError, GrammarRegistry,
    GrammarResult, RuleNode,
};
use crate::precedence::Associativity;

/// A rule created by the rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedRule {
    pub name: String,
    pub body: RuleNode,
    /// Precedence level the rule implements; `None` for the primary rule
    pub level: Option<i32>,
    pub associativity: Option<Associativity>,
}

/// Rewritten operator rule: the new alias body plus the synthesized chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayeredRule {
    pub rule: String,
    pub alias: RuleNode,
    pub synthesized: Vec<SynthesizedRule>,
}

pub fn primary_rule_name(rule: &str) -> String {
    format!("{}_primary", rule)
}

pub fn level_rule_name(rule: &str, index: usize) -> String {
    format!("{}_level_{}", rule, index)
}

/// Build the layered chain for one operator rule.
///
/// `taken` reports whether a name is already used by the grammar or by an
/// earlier rewrite.
pub fn layer_rule(
    operator_rule: &OperatorRule,
    groups: &[LevelGroup],
    taken: &dyn Fn(&str) -> bool,
) -> GrammarResult<LayeredRule> {
    let name = &operator_rule.rule;

    if operator_rule.primaries.is_empty() {
        return Err(GrammarError::NoPrimaryAlternative { rule: name.clone() });
    }

    let primary_name = primary_rule_name(name);
    let level_names: Vec<String> = (0..groups.len())
        .map(|index| level_rule_name(name, index))
        .collect();

    for candidate in level_names.iter().chain(std::iter::once(&primary_name)) {
        if taken(candidate) {
            return Err(GrammarError::NameConflict {
                name: candidate.clone(),
                rule: name.clone(),
            });
        }
    }

    let mut synthesized = Vec::with_capacity(groups.len() + 1);
    for (index, group) in groups.iter().enumerate() {
        let this = &level_names[index];
        let next = level_names.get(index + 1).unwrap_or(&primary_name);

        let operand = match group.associativity {
            Associativity::Left => next,
            Associativity::Right => this,
        };

        let folds = choice(group.alternatives.iter().map(|alternative| {
            fold(
                alternative.kind.clone(),
                seq([
                    field("operator", alternative.ops.clone()),
                    field("right", rule(operand.clone())),
                ]),
            )
        }));

        let tail = match group.associativity {
            Associativity::Left => repeat(folds),
            Associativity::Right => optional(folds),
        };

        synthesized.push(SynthesizedRule {
            name: this.clone(),
            body: seq([rule(next.clone()), tail]),
            level: Some(group.level),
            associativity: Some(group.associativity),
        });
    }

    synthesized.push(SynthesizedRule {
        name: primary_name.clone(),
        body: choice(operator_rule.primaries.iter().cloned()),
        level: None,
        associativity: None,
    });

    let entry = level_names.first().unwrap_or(&primary_name);
    Ok(LayeredRule {
        rule: name.clone(),
        alias: rule(entry.clone()),
        synthesized,
    })
}

/// Name check against an existing registry plus names planned so far
pub fn is_taken(registry: &GrammarRegistry, planned: &[String], name: &str) -> bool {
    registry.contains_rule(name)
        || registry.token_rule(name).is_some()
        || planned.iter().any(|p| p == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{labeled, token, Rule};
    use crate::precedence::PrecedenceTable;
    use crate::resolver::analysis::{analyze_rule, group_by_level};
    use assert_matches::assert_matches;

    fn expr() -> OperatorRule {
        let binary = |kind: &str, op: &str| {
            labeled(
                kind,
                seq([
                    field("left", rule("expr")),
                    field("operator", token(op)),
                    field("right", rule("expr")),
                ]),
            )
        };
        analyze_rule(&Rule {
            name: "expr".to_string(),
            body: choice([
                labeled("Number", token("NUMBER")),
                binary("Power", "POW"),
                binary("Sum", "ADD"),
            ]),
        })
        .unwrap()
    }

    fn table() -> PrecedenceTable {
        PrecedenceTable::new().left(1, ["ADD"]).right(2, ["POW"])
    }

    #[test]
    fn test_layered_chain_shape() {
        let operator_rule = expr();
        let groups = group_by_level(&operator_rule, &table()).unwrap();
        let layered = layer_rule(&operator_rule, &groups, &|_| false).unwrap();

        assert_eq!(layered.alias, rule("expr_level_0"));
        let names: Vec<&str> = layered.synthesized.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["expr_level_0", "expr_level_1", "expr_primary"]);

        assert_eq!(
            layered.synthesized[0].body.to_string(),
            "seq(expr_level_1, repeat(choice(fold('Sum', \
             seq(field('operator', $ADD), field('right', expr_level_1))))))"
        );
        assert_eq!(
            layered.synthesized[1].body.to_string(),
            "seq(expr_primary, optional(choice(fold('Power', \
             seq(field('operator', $POW), field('right', expr_level_1))))))"
        );
    }

    #[test]
    fn test_name_conflict() {
        let operator_rule = expr();
        let groups = group_by_level(&operator_rule, &table()).unwrap();
        let result = layer_rule(&operator_rule, &groups, &|name| name == "expr_primary");
        assert_matches!(
            result,
            Err(GrammarError::NameConflict { name, .. }) if name == "expr_primary"
        );
    }

    #[test]
    fn test_no_primary_alternative() {
        let mut operator_rule = expr();
        operator_rule.primaries.clear();
        let groups = group_by_level(&operator_rule, &table()).unwrap();
        assert_matches!(
            layer_rule(&operator_rule, &groups, &|_| false),
            Err(GrammarError::NoPrimaryAlternative { .. })
        );
    }
}
