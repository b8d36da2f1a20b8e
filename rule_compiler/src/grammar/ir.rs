//! Rule IR: the combinator tree every grammar rule body is made of
//!
//! The authoring constructors at the bottom of this file mirror the grammar
//! DSL (`seq`, `choice`, `field`, `token`, `literal`, `rule`, `repeat`,
//! `repeat1`, `optional`). `Labeled` and `Fold` are normally produced by registration and
//! precedence resolution rather than written by hand.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleNode {
    /// One terminal whose kind is the named token rule
    Token { name: String },
    /// One anonymous terminal with exactly this text
    Literal { text: String },
    /// All children in order; fails as a unit
    Sequence { children: Vec<RuleNode> },
    /// Ordered choice; the first matching alternative commits
    Choice { alternatives: Vec<RuleNode> },
    /// Capture the inner value under `label` in the node under construction
    Field { label: String, inner: Box<RuleNode> },
    /// Invoke another rule by name
    RuleRef { name: String },
    /// Zero or more
    Repeat { inner: Box<RuleNode> },
    /// One or more
    Repeat1 { inner: Box<RuleNode> },
    /// Zero or one
    Optional { inner: Box<RuleNode> },
    /// Build a new tree node of `kind` from whatever `inner` captures
    Labeled { kind: String, inner: Box<RuleNode> },
    /// Wrap the accumulated value as field `left` of a new `kind` node
    Fold { kind: String, inner: Box<RuleNode> },
}

impl RuleNode {
    /// Depth of the combinator tree (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(RuleNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Direct sub-nodes in evaluation order
    pub fn children(&self) -> Vec<&RuleNode> {
        match self {
            RuleNode::Token { .. } | RuleNode::Literal { .. } | RuleNode::RuleRef { .. } => {
                Vec::new()
            }
            RuleNode::Sequence { children } => children.iter().collect(),
            RuleNode::Choice { alternatives } => alternatives.iter().collect(),
            RuleNode::Field { inner, .. }
            | RuleNode::Repeat { inner }
            | RuleNode::Repeat1 { inner }
            | RuleNode::Optional { inner }
            | RuleNode::Labeled { inner, .. }
            | RuleNode::Fold { inner, .. } => vec![inner.as_ref()],
        }
    }

    /// Visit every node of the tree, parents first
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a RuleNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Names of every rule referenced through `RuleRef`
    pub fn rule_references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |node| {
            if let RuleNode::RuleRef { name } = node {
                names.push(name.as_str());
            }
        });
        names
    }

    /// Names of every token rule referenced through `Token`
    pub fn token_references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |node| {
            if let RuleNode::Token { name } = node {
                names.push(name.as_str());
            }
        });
        names
    }

    /// Rewrite every node bottom-up
    pub fn map(self, f: &mut dyn FnMut(RuleNode) -> RuleNode) -> RuleNode {
        let rebuilt = match self {
            RuleNode::Sequence { children } => {
                let mut mapped = Vec::with_capacity(children.len());
                for child in children {
                    mapped.push(child.map(f));
                }
                RuleNode::Sequence { children: mapped }
            }
            RuleNode::Choice { alternatives } => {
                let mut mapped = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    mapped.push(alternative.map(f));
                }
                RuleNode::Choice {
                    alternatives: mapped,
                }
            }
            RuleNode::Field { label, inner } => RuleNode::Field {
                label,
                inner: Box::new(inner.map(f)),
            },
            RuleNode::Repeat { inner } => RuleNode::Repeat {
                inner: Box::new(inner.map(f)),
            },
            RuleNode::Repeat1 { inner } => RuleNode::Repeat1 {
                inner: Box::new(inner.map(f)),
            },
            RuleNode::Optional { inner } => RuleNode::Optional {
                inner: Box::new(inner.map(f)),
            },
            RuleNode::Labeled { kind, inner } => RuleNode::Labeled {
                kind,
                inner: Box::new(inner.map(f)),
            },
            RuleNode::Fold { kind, inner } => RuleNode::Fold {
                kind,
                inner: Box::new(inner.map(f)),
            },
            leaf => leaf,
        };
        f(rebuilt)
    }
}

impl fmt::Display for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, name: &str, items: &[RuleNode]) -> fmt::Result {
            write!(f, "{}(", name)?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            write!(f, ")")
        }

        match self {
            RuleNode::Token { name } => write!(f, "${}", name),
            RuleNode::Literal { text } => write!(f, "'{}'", text),
            RuleNode::Sequence { children } => list(f, "seq", children),
            RuleNode::Choice { alternatives } => list(f, "choice", alternatives),
            RuleNode::Field { label, inner } => write!(f, "field('{}', {})", label, inner),
            RuleNode::RuleRef { name } => write!(f, "{}", name),
            RuleNode::Repeat { inner } => write!(f, "repeat({})", inner),
            RuleNode::Repeat1 { inner } => write!(f, "repeat1({})", inner),
            RuleNode::Optional { inner } => write!(f, "optional({})", inner),
            RuleNode::Labeled { kind, inner } => write!(f, "label('{}', {})", kind, inner),
            RuleNode::Fold { kind, inner } => write!(f, "fold('{}', {})", kind, inner),
        }
    }
}

// ============================================================================
// AUTHORING CONSTRUCTORS
// ============================================================================

pub fn seq(children: impl IntoIterator<Item = RuleNode>) -> RuleNode {
    RuleNode::Sequence {
        children: children.into_iter().collect(),
    }
}

pub fn choice(alternatives: impl IntoIterator<Item = RuleNode>) -> RuleNode {
    RuleNode::Choice {
        alternatives: alternatives.into_iter().collect(),
    }
}

pub fn field(label: impl Into<String>, inner: RuleNode) -> RuleNode {
    RuleNode::Field {
        label: label.into(),
        inner: Box::new(inner),
    }
}

pub fn token(name: impl Into<String>) -> RuleNode {
    RuleNode::Token { name: name.into() }
}

pub fn literal(text: impl Into<String>) -> RuleNode {
    RuleNode::Literal { text: text.into() }
}

/// Reference a rule by name. References to token rules become `Token` at registration.
pub fn rule(name: impl Into<String>) -> RuleNode {
    RuleNode::RuleRef { name: name.into() }
}

pub fn repeat(inner: RuleNode) -> RuleNode {
    RuleNode::Repeat {
        inner: Box::new(inner),
    }
}

pub fn repeat1(inner: RuleNode) -> RuleNode {
    RuleNode::Repeat1 {
        inner: Box::new(inner),
    }
}

pub fn optional(inner: RuleNode) -> RuleNode {
    RuleNode::Optional {
        inner: Box::new(inner),
    }
}

pub fn labeled(kind: impl Into<String>, inner: RuleNode) -> RuleNode {
    RuleNode::Labeled {
        kind: kind.into(),
        inner: Box::new(inner),
    }
}

pub fn fold(kind: impl Into<String>, inner: RuleNode) -> RuleNode {
    RuleNode::Fold {
        kind: kind.into(),
        inner: Box::new(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RuleNode {
        choice([
            field("Number", rule("NUMBER")),
            field(
                "Parentheses",
                seq([literal("("), field("inner", rule("expression")), literal(")")]),
            ),
        ])
    }

    #[test]
    fn test_depth() {
        assert_eq!(token("A").depth(), 1);
        // choice -> field -> seq -> field -> ruleref
        assert_eq!(sample().depth(), 5);
    }

    #[test]
    fn test_rule_references_in_order() {
        assert_eq!(sample().rule_references(), vec!["NUMBER", "expression"]);
    }

    #[test]
    fn test_map_rewrites_bottom_up() {
        let rewritten = sample().map(&mut |node| match node {
            RuleNode::RuleRef { name } if name == "NUMBER" => token(name),
            other => other,
        });
        assert_eq!(rewritten.token_references(), vec!["NUMBER"]);
        assert_eq!(rewritten.rule_references(), vec!["expression"]);
    }

    #[test]
    fn test_display_mirrors_dsl() {
        let node = seq([literal("("), field("inner", rule("expression")), literal(")")]);
        assert_eq!(node.to_string(), "seq('(', field('inner', expression), ')')");
        assert_eq!(fold("Power", token("POW")).to_string(), "fold('Power', $POW)");
        assert_eq!(repeat1(token("NUMBER")).to_string(), "repeat1($NUMBER)");
    }

    #[test]
    fn test_repeat1_is_traversed() {
        let node = repeat1(field("item", rule("NUMBER")));
        assert_eq!(node.depth(), 3);
        assert_eq!(node.rule_references(), vec!["NUMBER"]);

        let rewritten = node.map(&mut |node| match node {
            RuleNode::RuleRef { name } => token(name),
            other => other,
        });
        assert_eq!(rewritten, repeat1(field("item", token("NUMBER"))));
        assert_eq!(serde_json::to_value(&rewritten).unwrap()["type"], "repeat1");
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_value(token("POW")).unwrap();
        assert_eq!(json["type"], "token");
        assert_eq!(json["name"], "POW");
    }
}
