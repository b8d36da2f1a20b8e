//! Recursive-descent interpreter over a resolved grammar
//!
//! Ordered choice commits to the first alternative that matches. Every
//! combinator that fails leaves the cursor, the field frame and the value
//! accumulator exactly as it found them, so failure never needs cleanup by
//! the caller. Rule invocations are memoized per `(rule, position)`.
//!
//! Subtrees are shared through `Arc`, so memo hits, folds and unwinding
//! move pointers instead of copying trees. The depth limit counts every
//! nested combinator evaluation, which bounds native stack use.

use super::error::{ParseError, ParseResult};
use super::stats::ParseStatistics;
use crate::config::compile_time::syntax::{
    MAX_ERROR_CONTEXT_TOKENS, MAX_EXPECTED_TOKENS, MAX_PARSE_DEPTH,
};
use crate::grammar::RuleNode;
use crate::resolver::ResolvedGrammar;
use crate::tokens::TokenStream;
use crate::tree::{FieldValue, ParseNode};
use crate::utils::Span;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Value threaded through a sequence: the first value produced wins,
/// except that a fold wraps it into a new node.
#[derive(Debug, Default)]
struct Accumulator {
    value: Option<Arc<ParseNode>>,
    /// Folds applied to `value` so far; lets a failing sequence unwrap them
    folds: usize,
}

/// Restore point for a unit of backtracking
#[derive(Debug, Clone, Copy)]
struct Mark {
    cursor: usize,
    frame_len: usize,
    had_value: bool,
    folds: usize,
}

/// Memoized result of one rule at one position: value and end cursor
type MemoEntry = Option<(Option<Arc<ParseNode>>, usize)>;

pub(crate) struct ParseRun<'g> {
    grammar: &'g ResolvedGrammar,
    stream: TokenStream,
    memoize: bool,
    memo: HashMap<(usize, usize), MemoEntry>,
    /// Raw field captures of the nodes under construction, innermost last
    frames: Vec<Vec<(String, FieldValue)>>,
    /// Nested combinator evaluations currently on the stack
    depth: usize,
    /// Innermost rule being evaluated, for depth errors
    current_rule: usize,
    farthest: usize,
    expected: BTreeSet<String>,
    stats: ParseStatistics,
}

impl<'g> ParseRun<'g> {
    pub(crate) fn new(grammar: &'g ResolvedGrammar, stream: TokenStream, memoize: bool) -> Self {
        Self {
            grammar,
            stream,
            memoize,
            memo: HashMap::new(),
            frames: vec![Vec::new()],
            depth: 0,
            current_rule: 0,
            farthest: 0,
            expected: BTreeSet::new(),
            stats: ParseStatistics::default(),
        }
    }

    pub(crate) fn statistics(&self) -> ParseStatistics {
        ParseStatistics {
            memo_entries: self.memo.len(),
            ..self.stats
        }
    }

    pub(crate) fn stream(&self) -> &TokenStream {
        &self.stream
    }

    /// Run the start rule and require that it consumes every significant token
    pub(crate) fn run(&mut self, start: &str) -> ParseResult<ParseNode> {
        let index = self
            .grammar
            .rule_index(start)
            .ok_or_else(|| ParseError::UnknownStartRule {
                rule: start.to_string(),
            })?;

        self.current_rule = index;
        let mut root = Accumulator::default();
        if !self.invoke_rule(index, &mut root)? {
            return Err(self.syntax_error());
        }

        let position = self.stream.position();
        if !self.stream.is_at_end() {
            if self.farthest > position {
                return Err(self.syntax_error());
            }
            let token = self.stream.current();
            return Err(ParseError::UnexpectedTrailingInput {
                position: token.position,
                token_index: self.stream.original_index(position),
                found: token.describe(),
            });
        }

        self.stats.tokens_consumed = position;
        Ok(match root.value {
            Some(tree) => Arc::try_unwrap(tree).unwrap_or_else(|shared| ParseNode::clone(&shared)),
            None => ParseNode::branch(start, Vec::new(), self.stream.span_between(0, position)),
        })
    }

    fn syntax_error(&self) -> ParseError {
        let token = self.stream.token_at(self.farthest);
        crate::log_debug!("Syntax error context",
            "tokens" => self
                .stream
                .context_snippet(self.farthest, MAX_ERROR_CONTEXT_TOKENS)
                .iter()
                .map(|t| t.describe())
                .collect::<Vec<_>>()
                .join(" ")
        );
        ParseError::SyntaxError {
            position: token.position,
            token_index: self.stream.original_index(self.farthest),
            expected: self.expected.iter().cloned().collect(),
            found: token.describe(),
        }
    }

    // === EVALUATION ===

    fn eval(&mut self, node: &RuleNode, acc: &mut Accumulator) -> ParseResult<bool> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(self.depth_exceeded());
        }
        self.stats.max_depth = self.stats.max_depth.max(self.depth);

        let result = self.eval_node(node, acc);
        self.depth -= 1;
        result
    }

    fn depth_exceeded(&self) -> ParseError {
        let rule = self
            .grammar
            .rule_at(self.current_rule)
            .map(|rule| rule.name.clone())
            .unwrap_or_default();
        ParseError::MaxRecursionDepth {
            depth: MAX_PARSE_DEPTH,
            rule,
            position: self.stream.current().position,
        }
    }

    fn eval_node(&mut self, node: &RuleNode, acc: &mut Accumulator) -> ParseResult<bool> {
        match node {
            RuleNode::Token { name } => Ok(self.match_token(name, acc)),
            RuleNode::Literal { text } => Ok(self.match_literal(text)),
            RuleNode::Sequence { children } => {
                let mark = self.mark(acc);
                for child in children {
                    if !self.eval(child, acc)? {
                        self.reset(mark, acc);
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            RuleNode::Choice { alternatives } => {
                for alternative in alternatives {
                    if self.eval(alternative, acc)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            RuleNode::Field { label, inner } => self.eval_field(label, inner),
            RuleNode::RuleRef { name } => match self.grammar.rule_index(name) {
                Some(index) => self.invoke_rule(index, acc),
                None => Err(ParseError::UnknownStartRule { rule: name.clone() }),
            },
            RuleNode::Repeat { inner } => self.eval_repeat(inner, acc),
            RuleNode::Repeat1 { inner } => {
                let start = self.stream.position();
                if !self.eval(inner, acc)? {
                    return Ok(false);
                }
                if self.stream.position() == start {
                    return Ok(true);
                }
                self.eval_repeat(inner, acc)
            }
            RuleNode::Optional { inner } => {
                self.eval(inner, acc)?;
                Ok(true)
            }
            RuleNode::Labeled { kind, inner } => self.eval_labeled(kind, inner, acc),
            RuleNode::Fold { kind, inner } => self.eval_fold(kind, inner, acc),
        }
    }

    /// Zero or more; a match that consumes nothing ends the loop
    fn eval_repeat(&mut self, inner: &RuleNode, acc: &mut Accumulator) -> ParseResult<bool> {
        loop {
            let mark = self.mark(acc);
            if !self.eval(inner, acc)? {
                break;
            }
            if self.stream.position() == mark.cursor {
                self.reset(mark, acc);
                break;
            }
        }
        Ok(true)
    }

    fn match_token(&mut self, name: &str, acc: &mut Accumulator) -> bool {
        self.stats.terminal_attempts += 1;
        let token = self.stream.current();
        let matched = self
            .grammar
            .token_rule(name)
            .is_some_and(|rule| rule.matches(token));

        if !matched {
            self.record_failure(name);
            return false;
        }

        if acc.value.is_none() {
            let index = self.stream.original_index(self.stream.position());
            acc.value = Some(Arc::new(ParseNode::leaf(
                name,
                token.literal.clone(),
                Span::single(index),
            )));
        }
        self.stream.advance();
        true
    }

    fn match_literal(&mut self, text: &str) -> bool {
        self.stats.terminal_attempts += 1;
        let token = self.stream.current();
        if token.kind == text && token.literal == text {
            self.stream.advance();
            true
        } else {
            self.record_failure(text);
            false
        }
    }

    fn eval_field(&mut self, label: &str, inner: &RuleNode) -> ParseResult<bool> {
        match inner {
            RuleNode::Repeat { inner: item } => {
                let (items, _) = self.collect_list(item)?;
                self.record(label, FieldValue::List(items));
                return Ok(true);
            }
            RuleNode::Repeat1 { inner: item } => {
                let (items, matched) = self.collect_list(item)?;
                if !matched {
                    return Ok(false);
                }
                self.record(label, FieldValue::List(items));
                return Ok(true);
            }
            _ => {}
        }

        let mut captured = Accumulator::default();
        if !self.eval(inner, &mut captured)? {
            return Ok(false);
        }
        if let Some(value) = captured.value {
            self.record(label, FieldValue::Node(value));
        }
        Ok(true)
    }

    /// Items of a list field, and whether `item` matched at least once
    fn collect_list(&mut self, item: &RuleNode) -> ParseResult<(Vec<Arc<ParseNode>>, bool)> {
        let mut items = Vec::new();
        let mut matched = false;
        loop {
            let mut captured = Accumulator::default();
            let mark = self.mark(&captured);
            if !self.eval(item, &mut captured)? {
                break;
            }
            matched = true;
            if self.stream.position() == mark.cursor {
                self.reset(mark, &mut captured);
                break;
            }
            items.extend(captured.value);
        }
        Ok((items, matched))
    }

    fn eval_labeled(
        &mut self,
        kind: &str,
        inner: &RuleNode,
        acc: &mut Accumulator,
    ) -> ParseResult<bool> {
        let start = self.stream.position();
        self.frames.push(Vec::new());

        let mut captured = Accumulator::default();
        let matched = self.eval(inner, &mut captured)?;
        let raw = self.frames.pop().unwrap_or_default();
        if !matched {
            return Ok(false);
        }

        let span = self.stream.span_between(start, self.stream.position());
        let mut node = self.build_node(kind, raw, span);
        if node.fields.is_empty() {
            node.literal = captured.value.and_then(|value| value.literal.clone());
        }

        if acc.value.is_none() {
            acc.value = Some(Arc::new(node));
        }
        Ok(true)
    }

    fn eval_fold(&mut self, kind: &str, inner: &RuleNode, acc: &mut Accumulator) -> ParseResult<bool> {
        let start = self.stream.position();
        let left = acc.value.take();
        let left_span = left.as_ref().map(|node| node.span);

        let mut frame = Vec::new();
        if let Some(left) = left {
            frame.push(("left".to_string(), FieldValue::Node(left)));
        }
        self.frames.push(frame);

        let mut captured = Accumulator::default();
        let matched = self.eval(inner, &mut captured)?;
        let raw = self.frames.pop().unwrap_or_default();

        if !matched {
            acc.value = take_left(raw);
            return Ok(false);
        }

        let consumed = self.stream.span_between(start, self.stream.position());
        let span = left_span.map_or(consumed, |left| left.merge(consumed));
        acc.value = Some(Arc::new(self.build_node(kind, raw, span)));
        acc.folds += 1;
        Ok(true)
    }

    fn invoke_rule(&mut self, index: usize, acc: &mut Accumulator) -> ParseResult<bool> {
        let start = self.stream.position();

        let cached = if self.memoize {
            // entries hold shared subtrees, so this clones pointers only
            self.memo.get(&(index, start)).cloned()
        } else {
            None
        };

        let entry = match cached {
            Some(entry) => {
                self.stats.memo_hits += 1;
                entry
            }
            None => {
                let entry = self.evaluate_rule(index, start)?;
                if self.memoize {
                    self.memo.insert((index, start), entry.clone());
                }
                entry
            }
        };

        match entry {
            Some((value, end)) => {
                self.stream.restore_position(end);
                if acc.value.is_none() {
                    acc.value = value;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn evaluate_rule(&mut self, index: usize, start: usize) -> ParseResult<MemoEntry> {
        let grammar = self.grammar;
        let Some(rule) = grammar.rule_at(index) else {
            return Ok(None);
        };

        self.stats.rule_invocations += 1;
        let caller = std::mem::replace(&mut self.current_rule, index);

        self.frames.push(Vec::new());
        let mut captured = Accumulator::default();
        let matched = self.eval(&rule.body, &mut captured)?;
        let raw = self.frames.pop().unwrap_or_default();
        self.current_rule = caller;

        if !matched {
            return Ok(None);
        }

        let end = self.stream.position();
        let value = if raw.is_empty() {
            captured.value
        } else {
            let span = self.stream.span_between(start, end);
            Some(Arc::new(self.build_node(&rule.name, raw, span)))
        };
        Ok(Some((value, end)))
    }

    // === FIELDS AND BACKTRACKING ===

    fn record(&mut self, label: &str, value: FieldValue) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push((label.to_string(), value));
        }
    }

    fn record_failure(&mut self, expected: &str) {
        let position = self.stream.position();
        if position > self.farthest {
            self.farthest = position;
            self.expected.clear();
        }
        if position == self.farthest && self.expected.len() < MAX_EXPECTED_TOKENS {
            self.expected.insert(expected.to_string());
        }
    }

    fn mark(&self, acc: &Accumulator) -> Mark {
        Mark {
            cursor: self.stream.position(),
            frame_len: self.frames.last().map_or(0, Vec::len),
            had_value: acc.value.is_some(),
            folds: acc.folds,
        }
    }

    fn reset(&mut self, mark: Mark, acc: &mut Accumulator) {
        self.stream.restore_position(mark.cursor);
        if let Some(frame) = self.frames.last_mut() {
            frame.truncate(mark.frame_len);
        }
        while acc.folds > mark.folds {
            acc.value = acc.value.take().and_then(unfold);
            acc.folds -= 1;
        }
        if !mark.had_value {
            acc.value = None;
        }
    }

    /// Order raw captures by the node schema; list slots collect every capture
    fn build_node(&self, kind: &str, raw: Vec<(String, FieldValue)>, span: Span) -> ParseNode {
        let slots = self.grammar.schema().slots(kind).unwrap_or(&[]);
        let mut remaining = raw;
        let mut fields = Vec::with_capacity(slots.len());

        for slot in slots {
            let (mine, rest): (Vec<_>, Vec<_>) = remaining
                .into_iter()
                .partition(|(label, _)| *label == slot.label);
            remaining = rest;

            if slot.multiple {
                let mut items = Vec::new();
                for (_, value) in mine {
                    match value {
                        FieldValue::Node(node) => items.push(node),
                        FieldValue::List(nodes) => items.extend(nodes),
                    }
                }
                fields.push((slot.label.clone(), FieldValue::List(items)));
            } else if let Some(last) = mine.into_iter().last() {
                fields.push(last);
            }
        }

        fields.extend(remaining);
        ParseNode::branch(kind, fields, span)
    }
}

/// Recover the value a fold wrapped
fn unfold(node: Arc<ParseNode>) -> Option<Arc<ParseNode>> {
    match node.field("left")? {
        FieldValue::Node(left) => Some(Arc::clone(left)),
        FieldValue::List(_) => None,
    }
}

fn take_left(raw: Vec<(String, FieldValue)>) -> Option<Arc<ParseNode>> {
    raw.into_iter()
        .find(|(label, _)| label == "left")
        .and_then(|(_, value)| match value {
            FieldValue::Node(left) => Some(left),
            FieldValue::List(_) => None,
        })
}
