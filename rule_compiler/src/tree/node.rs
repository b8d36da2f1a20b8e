//! Parse tree nodes produced by the engine

use crate::utils::Span;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Captured value of one field slot.
///
/// Subtrees are shared, so cloning a node copies one level only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Node(Arc<ParseNode>),
    List(Vec<Arc<ParseNode>>),
}

impl FieldValue {
    pub fn as_node(&self) -> Option<&ParseNode> {
        match self {
            FieldValue::Node(node) => Some(node),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Arc<ParseNode>]> {
        match self {
            FieldValue::Node(_) => None,
            FieldValue::List(nodes) => Some(nodes),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Node(node) => node.as_ref().serialize(serializer),
            FieldValue::List(nodes) => serializer.collect_seq(nodes.iter().map(Arc::as_ref)),
        }
    }
}

/// One node of the parse tree.
///
/// Leaves carry the matched token text in `literal`. Interior nodes carry
/// their fields in the order the node schema declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
    pub kind: String,
    pub fields: Vec<(String, FieldValue)>,
    pub span: Span,
    pub literal: Option<String>,
}

impl ParseNode {
    pub fn leaf(kind: impl Into<String>, literal: impl Into<String>, span: Span) -> Self {
        Self {
            kind: kind.into(),
            fields: Vec::new(),
            span,
            literal: Some(literal.into()),
        }
    }

    pub fn branch(kind: impl Into<String>, fields: Vec<(String, FieldValue)>, span: Span) -> Self {
        Self {
            kind: kind.into(),
            fields,
            span,
            literal: None,
        }
    }

    pub fn field(&self, label: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, value)| value)
    }

    /// Single-node field by label
    pub fn child(&self, label: &str) -> Option<&ParseNode> {
        self.field(label).and_then(FieldValue::as_node)
    }

    /// List field by label; empty when absent
    pub fn children(&self, label: &str) -> &[Arc<ParseNode>] {
        self.field(label).and_then(FieldValue::as_list).unwrap_or(&[])
    }

    pub fn is_leaf(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compact S-expression rendering, e.g. `(Sum left:(Number "2") ...)`
    pub fn to_sexpr(&self) -> String {
        let mut out = String::new();
        let mut pending = vec![Sexpr::Open(self)];

        while let Some(piece) = pending.pop() {
            match piece {
                Sexpr::Text(text) => out.push_str(text),
                Sexpr::Open(node) => {
                    out.push('(');
                    out.push_str(&node.kind);
                    if let Some(literal) = &node.literal {
                        out.push_str(&format!(" {:?}", literal));
                    }

                    let mut pieces = Vec::new();
                    for (label, value) in &node.fields {
                        pieces.push(Sexpr::Text(" "));
                        pieces.push(Sexpr::Text(label));
                        pieces.push(Sexpr::Text(":"));
                        match value {
                            FieldValue::Node(child) => pieces.push(Sexpr::Open(child)),
                            FieldValue::List(children) => {
                                pieces.push(Sexpr::Text("["));
                                for (i, child) in children.iter().enumerate() {
                                    if i > 0 {
                                        pieces.push(Sexpr::Text(" "));
                                    }
                                    pieces.push(Sexpr::Open(child));
                                }
                                pieces.push(Sexpr::Text("]"));
                            }
                        }
                    }
                    pieces.push(Sexpr::Text(")"));
                    pending.extend(pieces.into_iter().rev());
                }
            }
        }
        out
    }

    /// Nodes of the subtree, parents first
    pub fn descendants(&self) -> Vec<&ParseNode> {
        let mut nodes = vec![self];
        let mut index = 0;
        while index < nodes.len() {
            let node = nodes[index];
            for (_, value) in &node.fields {
                match value {
                    FieldValue::Node(child) => nodes.push(child),
                    FieldValue::List(children) => nodes.extend(children.iter().map(Arc::as_ref)),
                }
            }
            index += 1;
        }
        nodes
    }
}

/// Pending output of the S-expression writer
enum Sexpr<'a> {
    Open(&'a ParseNode),
    Text(&'a str),
}

/// Unlinks subtrees one level at a time so dropping a deep tree never recurses
impl Drop for ParseNode {
    fn drop(&mut self) {
        if self.fields.is_empty() {
            return;
        }
        let mut pending = Vec::new();
        detach_children(&mut self.fields, &mut pending);
        while let Some(child) = pending.pop() {
            // shared subtrees are left to their other owners
            if let Ok(mut node) = Arc::try_unwrap(child) {
                detach_children(&mut node.fields, &mut pending);
            }
        }
    }
}

fn detach_children(fields: &mut Vec<(String, FieldValue)>, pending: &mut Vec<Arc<ParseNode>>) {
    for (_, value) in fields.drain(..) {
        match value {
            FieldValue::Node(node) => pending.push(node),
            FieldValue::List(nodes) => pending.extend(nodes),
        }
    }
}

/// Fields serialize as a map so the schema order survives in JSON
struct OrderedFields<'a>(&'a [(String, FieldValue)]);

impl Serialize for OrderedFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

impl Serialize for ParseNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ParseNode", 4)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("span", &self.span)?;
        if let Some(literal) = &self.literal {
            state.serialize_field("literal", literal)?;
        } else {
            state.skip_field("literal")?;
        }
        if self.fields.is_empty() {
            state.skip_field("fields")?;
        } else {
            state.serialize_field("fields", &OrderedFields(&self.fields))?;
        }
        state.end()
    }
}

impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sexpr())
    }
}
