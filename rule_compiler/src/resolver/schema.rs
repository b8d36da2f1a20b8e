//! Node schema: the fixed, ordered label slots of every node kind

use crate::grammar::{GrammarRegistry, RuleNode};
use serde::Serialize;
use std::collections::BTreeMap;

/// One labeled slot of a node kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSlot {
    pub label: String,
    /// Slot holds a list (field over `repeat`/`repeat1`, or a field inside one)
    pub multiple: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeSchema {
    kinds: BTreeMap<String, Vec<FieldSlot>>,
}

impl NodeSchema {
    /// Collect slots from every node scope of the grammar.
    ///
    /// A rule body whose own scope captures fields produces nodes named after
    /// the rule, so it gets a schema entry under the rule name.
    pub fn from_registry(registry: &GrammarRegistry) -> Self {
        let mut schema = Self::default();
        for rule in registry.rules() {
            let mut slots = Vec::new();
            schema.collect(&rule.body, &mut slots, false);
            if !slots.is_empty() {
                schema.merge(&rule.name, slots);
            }
        }
        schema
    }

    fn collect(&mut self, node: &RuleNode, slots: &mut Vec<FieldSlot>, in_repeat: bool) {
        match node {
            RuleNode::Field { label, inner } => {
                let multiple = in_repeat
                    || matches!(
                        inner.as_ref(),
                        RuleNode::Repeat { .. } | RuleNode::Repeat1 { .. }
                    );
                add_slot(slots, label, multiple);
                self.collect(inner, slots, in_repeat);
            }
            RuleNode::Labeled { kind, inner } => {
                let mut own = Vec::new();
                self.collect(inner, &mut own, false);
                self.merge(kind, own);
            }
            RuleNode::Fold { kind, inner } => {
                let mut own = vec![FieldSlot {
                    label: "left".to_string(),
                    multiple: false,
                }];
                self.collect(inner, &mut own, false);
                self.merge(kind, own);
            }
            RuleNode::Repeat { inner } | RuleNode::Repeat1 { inner } => {
                self.collect(inner, slots, true)
            }
            other => {
                for child in other.children() {
                    self.collect(child, slots, in_repeat);
                }
            }
        }
    }

    fn merge(&mut self, kind: &str, slots: Vec<FieldSlot>) {
        let entry = self.kinds.entry(kind.to_string()).or_default();
        for slot in slots {
            add_slot(entry, &slot.label, slot.multiple);
        }
    }

    /// Ordered slots of a node kind
    pub fn slots(&self, kind: &str) -> Option<&[FieldSlot]> {
        self.kinds.get(kind).map(Vec::as_slice)
    }

    pub fn labels(&self, kind: &str) -> Vec<&str> {
        self.slots(kind)
            .map(|slots| slots.iter().map(|slot| slot.label.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn contains_kind(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn is_multiple(&self, kind: &str, label: &str) -> bool {
        self.slots(kind)
            .and_then(|slots| slots.iter().find(|slot| slot.label == label))
            .map(|slot| slot.multiple)
            .unwrap_or(false)
    }
}

fn add_slot(slots: &mut Vec<FieldSlot>, label: &str, multiple: bool) {
    match slots.iter_mut().find(|slot| slot.label == label) {
        Some(slot) => slot.multiple |= multiple,
        None => slots.push(FieldSlot {
            label: label.to_string(),
            multiple,
        }),
    }
}
