//! Calculator grammar: five-operator arithmetic with parentheses
//!
//! The grammar is written the ambiguous way, as one `expression` rule whose
//! binary alternatives recurse on both sides. The precedence table decides
//! how they bind: `+ -` loosest, then `* /`, then right-associative `^`.

use crate::grammar::{
    choice, field, literal, rule, seq, token, GrammarBuilder, GrammarRegistry, GrammarResult,
    RuleNode, TokenRule,
};
use crate::logging::{codes, Code};
use crate::precedence::PrecedenceTable;
use crate::tree::ParseNode;

pub const GRAMMAR_NAME: &str = "Calculator";

fn binary(kind: &str, operator: RuleNode) -> RuleNode {
    field(
        kind,
        seq([
            field("left", rule("expression")),
            field("operator", operator),
            field("right", rule("expression")),
        ]),
    )
}

/// Unresolved calculator grammar
pub fn grammar() -> GrammarResult<GrammarRegistry> {
    GrammarBuilder::new(GRAMMAR_NAME)
        .tokens([
            TokenRule::literal("POW", "^"),
            TokenRule::literal("MUL", "*"),
            TokenRule::literal("DIV", "/"),
            TokenRule::literal("ADD", "+"),
            TokenRule::literal("SUB", "-"),
            TokenRule::any("NUMBER"),
            TokenRule::skip("WHITESPACE"),
        ])
        .rule("start", rule("expression"))
        .rule(
            "expression",
            choice([
                field("Number", token("NUMBER")),
                field(
                    "Parentheses",
                    seq([literal("("), field("inner", rule("expression")), literal(")")]),
                ),
                binary("Power", token("POW")),
                binary(
                    "MultiplicationOrDivision",
                    choice([token("MUL"), token("DIV")]),
                ),
                binary("AdditionOrSubtraction", choice([token("ADD"), token("SUB")])),
            ]),
        )
        .start("start")
        .build()
}

pub fn precedence_table() -> PrecedenceTable {
    PrecedenceTable::new()
        .left(1, ["ADD", "SUB"])
        .left(2, ["MUL", "DIV"])
        .right(3, ["POW"])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Pow,
    Mul,
    Div,
    Add,
    Sub,
}

impl BinaryOp {
    fn from_token_kind(kind: &str) -> Option<Self> {
        match kind {
            "POW" => Some(Self::Pow),
            "MUL" => Some(Self::Mul),
            "DIV" => Some(Self::Div),
            "ADD" => Some(Self::Add),
            "SUB" => Some(Self::Sub),
            _ => None,
        }
    }

    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Self::Pow => left.powf(right),
            Self::Mul => left * right,
            Self::Div => left / right,
            Self::Add => left + right,
            Self::Sub => left - right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeShapeError {
    #[error("Unexpected node kind '{kind}'")]
    UnexpectedKind { kind: String },

    #[error("Node '{kind}' is missing field '{label}'")]
    MissingField { kind: String, label: &'static str },

    #[error("Invalid number literal '{literal}'")]
    InvalidNumber { literal: String },
}

impl TreeShapeError {
    pub fn error_code(&self) -> Code {
        codes::parse::UNEXPECTED_TREE_SHAPE
    }
}

/// Typed view of a calculator parse tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Parentheses(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn from_tree(node: &ParseNode) -> Result<Self, TreeShapeError> {
        match node.kind.as_str() {
            "Number" => number_value(node).map(Expr::Number),
            "Parentheses" => {
                let inner = required(node, "inner")?;
                Ok(Expr::Parentheses(Box::new(Self::from_tree(inner)?)))
            }
            "Power" | "MultiplicationOrDivision" | "AdditionOrSubtraction" => {
                Ok(Expr::Binary {
                    op: binary_op(node)?,
                    left: Box::new(Self::from_tree(required(node, "left")?)?),
                    right: Box::new(Self::from_tree(required(node, "right")?)?),
                })
            }
            other => Err(TreeShapeError::UnexpectedKind {
                kind: other.to_string(),
            }),
        }
    }

    pub fn evaluate(&self) -> f64 {
        match self {
            Expr::Number(value) => *value,
            Expr::Parentheses(inner) => inner.evaluate(),
            Expr::Binary { op, left, right } => op.apply(left.evaluate(), right.evaluate()),
        }
    }
}

fn required<'n>(node: &'n ParseNode, label: &'static str) -> Result<&'n ParseNode, TreeShapeError> {
    node.child(label).ok_or_else(|| TreeShapeError::MissingField {
        kind: node.kind.clone(),
        label,
    })
}

fn number_value(node: &ParseNode) -> Result<f64, TreeShapeError> {
    let literal = node.literal.as_deref().unwrap_or_default();
    literal
        .parse::<f64>()
        .map_err(|_| TreeShapeError::InvalidNumber {
            literal: literal.to_string(),
        })
}

fn binary_op(node: &ParseNode) -> Result<BinaryOp, TreeShapeError> {
    let operator = required(node, "operator")?;
    BinaryOp::from_token_kind(&operator.kind).ok_or_else(|| TreeShapeError::UnexpectedKind {
        kind: operator.kind.clone(),
    })
}

/// Evaluate a calculator parse tree.
///
/// Works over an explicit stack, so chains of any length evaluate without
/// recursion.
pub fn evaluate(node: &ParseNode) -> Result<f64, TreeShapeError> {
    enum Step<'n> {
        Visit(&'n ParseNode),
        Apply(BinaryOp),
    }

    let mut steps = vec![Step::Visit(node)];
    let mut values: Vec<f64> = Vec::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Visit(node) => match node.kind.as_str() {
                "Number" => values.push(number_value(node)?),
                "Parentheses" => steps.push(Step::Visit(required(node, "inner")?)),
                "Power" | "MultiplicationOrDivision" | "AdditionOrSubtraction" => {
                    steps.push(Step::Apply(binary_op(node)?));
                    steps.push(Step::Visit(required(node, "right")?));
                    steps.push(Step::Visit(required(node, "left")?));
                }
                other => {
                    return Err(TreeShapeError::UnexpectedKind {
                        kind: other.to_string(),
                    })
                }
            },
            Step::Apply(op) => {
                // both operands were visited before the operator
                let right = values.pop().unwrap_or_default();
                let left = values.pop().unwrap_or_default();
                values.push(op.apply(left, right));
            }
        }
    }

    Ok(values.pop().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{self, ParseError};
    use crate::grammar::GrammarError;
    use crate::lexical;
    use crate::resolver::{resolve, ResolvedGrammar};
    use assert_matches::assert_matches;

    fn calculator() -> ResolvedGrammar {
        resolve(&grammar().unwrap(), &precedence_table()).unwrap()
    }

    fn parse(grammar: &ResolvedGrammar, source: &str) -> Result<ParseNode, ParseError> {
        engine::parse(grammar, "start", lexical::tokenize(source).unwrap())
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let grammar = calculator();
        let tree = parse(&grammar, "2+3*4").unwrap();

        assert_eq!(
            tree.to_sexpr(),
            r#"(AdditionOrSubtraction left:(Number "2") operator:(ADD "+") right:(MultiplicationOrDivision left:(Number "3") operator:(MUL "*") right:(Number "4")))"#
        );
        assert_eq!(evaluate(&tree).unwrap(), 14.0);
    }

    #[test]
    fn test_power_is_right_associative() {
        let grammar = calculator();
        let tree = parse(&grammar, "2^3^2").unwrap();

        assert_eq!(tree.kind, "Power");
        assert_eq!(tree.child("left").unwrap().literal.as_deref(), Some("2"));
        assert_eq!(tree.child("right").unwrap().kind, "Power");
        assert_eq!(evaluate(&tree).unwrap(), 512.0);
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let grammar = calculator();
        let tree = parse(&grammar, "8 - 3 - 2").unwrap();

        assert_eq!(tree.child("left").unwrap().kind, "AdditionOrSubtraction");
        assert_eq!(tree.child("right").unwrap().literal.as_deref(), Some("2"));
        assert_eq!(evaluate(&tree).unwrap(), 3.0);
        // whitespace is skipped but spans keep original token indices
        assert_eq!(tree.span, crate::utils::Span::new(0, 9));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let grammar = calculator();
        let tree = parse(&grammar, "(2+3)*4").unwrap();

        assert_eq!(tree.kind, "MultiplicationOrDivision");
        let group = tree.child("left").unwrap();
        assert_eq!(group.kind, "Parentheses");
        assert_eq!(group.child("inner").unwrap().kind, "AdditionOrSubtraction");
        assert_eq!(evaluate(&tree).unwrap(), 20.0);
    }

    #[test]
    fn test_division_and_decimals() {
        let grammar = calculator();
        let tree = parse(&grammar, "7.5/2.5*2").unwrap();
        assert_eq!(evaluate(&tree).unwrap(), 6.0);
    }

    #[test]
    fn test_leading_operator_is_a_syntax_error() {
        let grammar = calculator();
        let error = parse(&grammar, "*").unwrap_err();

        assert_matches!(error, ParseError::SyntaxError { position: 0, .. });
        assert!(error.expected().iter().any(|e| e == "NUMBER"));
        assert!(error.expected().iter().any(|e| e == "("));
    }

    #[test]
    fn test_dangling_operator_and_trailing_input() {
        let grammar = calculator();
        assert_matches!(
            parse(&grammar, "2+"),
            Err(ParseError::SyntaxError { position: 2, .. })
        );
        assert_matches!(
            parse(&grammar, "2 3"),
            Err(ParseError::UnexpectedTrailingInput { position: 2, .. })
        );
    }

    #[test]
    fn test_missing_precedence_entry() {
        let table = PrecedenceTable::new()
            .left(1, ["ADD", "SUB"])
            .left(2, ["MUL", "DIV"]);
        assert_matches!(
            resolve(&grammar().unwrap(), &table),
            Err(GrammarError::MissingPrecedence { operator, .. }) if operator == "POW"
        );
    }

    #[test]
    fn test_resolving_twice_changes_nothing() {
        let once = calculator();
        let twice = resolve(once.registry(), &precedence_table()).unwrap();

        assert_eq!(once.registry(), twice.registry());
        for source in ["1+2*3^2", "(1-2)-3", "2^(1+1)"] {
            assert_eq!(parse(&once, source), parse(&twice, source));
        }
    }

    #[test]
    fn test_typed_view_agrees_with_evaluate() {
        let grammar = calculator();
        for source in ["1+2*3^2", "(1-2)-3", "2^(1+1)", "9/3/3"] {
            let tree = parse(&grammar, source).unwrap();
            let expr = Expr::from_tree(&tree).unwrap();
            assert_eq!(expr.evaluate(), evaluate(&tree).unwrap(), "{}", source);
        }
    }

    #[test]
    fn test_long_left_chain() {
        let grammar = calculator();
        let source = vec!["1"; 20_000].join("-");
        let tree = parse(&grammar, &source).unwrap();

        assert_eq!(tree.kind, "AdditionOrSubtraction");
        // every operand, operator and fold
        assert_eq!(tree.descendants().len(), 20_000 + 19_999 * 2);
        assert_eq!(evaluate(&tree).unwrap(), -19_998.0);
        assert!(tree.to_sexpr().starts_with("(AdditionOrSubtraction left:(AdditionOrSubtraction"));
    }

    #[test]
    fn test_right_chain_within_depth_limit() {
        let grammar = calculator();
        let source = vec!["1"; 50].join("^");
        let tree = parse(&grammar, &source).unwrap();
        assert_eq!(tree.kind, "Power");
        assert_eq!(evaluate(&tree).unwrap(), 1.0);
    }

    #[test]
    fn test_deep_nesting_reports_depth_error() {
        let grammar = calculator();

        let power = vec!["1"; 1000].join("^");
        assert_matches!(parse(&grammar, &power), Err(ParseError::MaxRecursionDepth { .. }));

        let nested = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        assert_matches!(
            parse(&grammar, &nested),
            Err(ParseError::MaxRecursionDepth { depth, .. })
                if depth == crate::config::compile_time::syntax::MAX_PARSE_DEPTH
        );

        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(evaluate(&parse(&grammar, &shallow).unwrap()).unwrap(), 1.0);
    }

    #[test]
    fn test_tree_shape_errors() {
        let stray = ParseNode::leaf("NUMBER", "1", crate::utils::Span::single(0));
        let error = evaluate(&stray).unwrap_err();
        assert_matches!(&error, TreeShapeError::UnexpectedKind { kind } if kind == "NUMBER");
        assert_eq!(error.error_code(), codes::parse::UNEXPECTED_TREE_SHAPE);
    }
}
