//! Static check of the variables a template set reads.
//!
//! Tera treats an unknown name inside `{% if %}`, `and`/`or`, or a comparison
//! as false, so a misspelled field in a guard silently drops a section of the
//! output. Before executing, every identifier reachable from the top-level
//! unit is resolved against the context:
//!
//! - `include`d templates are walked at the include site, with the caller's
//!   loop variables in scope;
//! - an `extends` parent is walked after the child;
//! - `for` and `set` bindings shadow context fields;
//! - `is defined` / `is undefined` tests and the `default` filter are the
//!   explicit ways to read something that may be absent, and a name tested
//!   with `is defined` may be read inside the guarded branch;
//! - a `null` value (an unset `Option`) ends resolution, since its fields
//!   can only be reached behind a guard on the value itself.

use std::collections::HashMap;

use serde_json::Value;
use strsim::levenshtein;
use tera::Tera;
use tera::ast::{Expr, ExprVal, Forloop, FunctionCall, LogicOperator, Node};

use super::error::TemplateError;
use crate::constants::SIMILARITY_THRESHOLD_PERCENT;

const CONTEXT_DUMP: &str = "__tera_context";
const LOOP_VARIABLE: &str = "loop";

/// Resolve every identifier reachable from `entry` against `context`.
///
/// # Errors
///
/// [`TemplateError::VariableNotFound`] for the first identifier that names
/// nothing, with the closest known paths as suggestions.
pub(super) fn check_variables(tera: &Tera, entry: &str, context: &Value) -> Result<(), TemplateError> {
    let mut checker = Checker {
        tera,
        context,
        scopes: vec![HashMap::new()],
        guards: Vec::new(),
        active: Vec::new(),
    };
    checker.check_template(entry)
}

/// Dotted paths of every field in the context (arrays are not descended).
pub(super) fn available_variables(context: &Value) -> Vec<String> {
    fn walk(prefix: &str, value: &Value, out: &mut Vec<String>) {
        if let Value::Object(map) = value {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                out.push(path.clone());
                walk(&path, child, out);
            }
        }
    }

    let mut out = Vec::new();
    walk("", context, &mut out);
    out
}

/// Closest known paths to `target`, at most three.
pub(super) fn find_similar_variables(target: &str, available: &[String]) -> Vec<String> {
    let threshold = target.len() * SIMILARITY_THRESHOLD_PERCENT / 100;
    let mut scored: Vec<(usize, &String)> = available
        .iter()
        .map(|var| (levenshtein(target, var), var))
        .filter(|(distance, _)| *distance <= threshold)
        .collect();

    scored.sort();
    scored.into_iter().take(3).map(|(_, var)| var.clone()).collect()
}

/// What a local name is bound to.
#[derive(Debug, Clone)]
enum Binding {
    /// Every value the name can take, e.g. each element of a loop container.
    Samples(Vec<Value>),
    /// A `set` result, loop metadata, or a loop over something opaque.
    Unknown,
}

#[derive(Debug)]
enum Lookup {
    Found(Vec<Value>),
    Unknown,
    Missing,
}

/// One step of an identifier path.
#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    /// `[name]`: the key is read from another variable.
    Dynamic(String),
}

impl Segment {
    fn bracketed(inner: &str) -> Self {
        let inner = inner.trim();
        for quote in ['"', '\'', '`'] {
            if inner.len() >= 2 && inner.starts_with(quote) && inner.ends_with(quote) {
                return Self::Key(inner[1..inner.len() - 1].to_string());
            }
        }
        match inner.parse() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Dynamic(inner.to_string()),
        }
    }
}

/// Split `a.b["c"][0][d]` into segments.
fn split_path(path: &str) -> Vec<Segment> {
    fn flush(current: &mut String, segments: &mut Vec<Segment>) {
        if !current.is_empty() {
            segments.push(Segment::Key(std::mem::take(current)));
        }
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => flush(&mut current, &mut segments),
            '[' => {
                flush(&mut current, &mut segments);
                let mut inner = String::new();
                let mut depth = 1;
                for c in chars.by_ref() {
                    match c {
                        '[' => depth += 1,
                        ']' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    inner.push(c);
                }
                segments.push(Segment::bracketed(&inner));
            }
            _ => current.push(c),
        }
    }
    flush(&mut current, &mut segments);
    segments
}

enum Step<'v> {
    Found(&'v Value),
    Unknown,
    Missing,
}

fn descend<'v>(value: &'v Value, segments: &[Segment]) -> Step<'v> {
    let mut current = value;
    for segment in segments {
        current = match (current, segment) {
            (Value::Null, _) => return Step::Unknown,
            (_, Segment::Dynamic(_)) => return Step::Unknown,
            (Value::Object(map), Segment::Key(key)) => match map.get(key) {
                Some(child) => child,
                None => return Step::Missing,
            },
            (Value::Object(map), Segment::Index(index)) => match map.get(&index.to_string()) {
                Some(child) => child,
                None => return Step::Missing,
            },
            (Value::Array(items), Segment::Index(index)) => match items.get(*index) {
                Some(child) => child,
                None => return Step::Unknown,
            },
            (Value::Array(items), Segment::Key(key)) => match key.parse::<usize>() {
                Ok(index) => match items.get(index) {
                    Some(child) => child,
                    None => return Step::Unknown,
                },
                Err(_) => return Step::Missing,
            },
            _ => return Step::Missing,
        };
    }
    Step::Found(current)
}

/// Paths a condition proves present when it holds: `x is defined`, alone or
/// joined with `and`.
fn defined_guards(condition: &Expr) -> Vec<String> {
    if condition.negated {
        return Vec::new();
    }
    match &condition.val {
        ExprVal::Test(test) if test.name == "defined" && !test.negated => vec![test.ident.clone()],
        ExprVal::Logic(logic) if logic.operator == LogicOperator::And => {
            let mut guards = defined_guards(&logic.lhs);
            guards.extend(defined_guards(&logic.rhs));
            guards
        }
        _ => Vec::new(),
    }
}

struct Checker<'t> {
    tera: &'t Tera,
    context: &'t Value,
    scopes: Vec<HashMap<String, Binding>>,
    /// Paths tested with `is defined` by an enclosing condition.
    guards: Vec<String>,
    /// Templates currently being walked, innermost last.
    active: Vec<String>,
}

impl<'t> Checker<'t> {
    fn check_template(&mut self, name: &str) -> Result<(), TemplateError> {
        if self.active.iter().any(|active| active == name) {
            return Ok(());
        }
        // Unknown names are reported by Tera when it renders.
        let tera = self.tera;
        let Ok(template) = tera.get_template(name) else {
            return Ok(());
        };

        self.active.push(name.to_string());
        let result = self.check_nodes(&template.ast).and_then(|()| match &template.parent {
            Some(parent) => self.check_template(parent),
            None => Ok(()),
        });
        self.active.pop();
        result
    }

    fn check_nodes(&mut self, nodes: &[Node]) -> Result<(), TemplateError> {
        nodes.iter().try_for_each(|node| self.check_node(node))
    }

    fn check_node(&mut self, node: &Node) -> Result<(), TemplateError> {
        match node {
            Node::VariableBlock(_, expr) => self.check_expr(expr),
            Node::Set(_, set) => {
                self.check_expr(&set.value)?;
                let scope = if set.global {
                    self.scopes.first_mut()
                } else {
                    self.scopes.last_mut()
                };
                if let Some(scope) = scope {
                    scope.insert(set.key.clone(), Binding::Unknown);
                }
                Ok(())
            }
            Node::FilterSection(_, section, _) => {
                self.check_call(&section.filter)?;
                self.check_nodes(&section.body)
            }
            Node::Block(_, block, _) => self.check_nodes(&block.body),
            Node::Forloop(_, forloop, _) => self.check_forloop(forloop),
            Node::If(branches, _) => {
                for (_, condition, body) in &branches.conditions {
                    self.check_expr(condition)?;
                    self.guarded(defined_guards(condition), |checker| checker.check_nodes(body))?;
                }
                match &branches.otherwise {
                    Some((_, body)) => self.check_nodes(body),
                    None => Ok(()),
                }
            }
            Node::Include(_, names, _) => {
                let tera = self.tera;
                match names.iter().find(|name| tera.get_template(name).is_ok()) {
                    Some(name) => self.scoped(HashMap::new(), |checker| checker.check_template(name)),
                    None => Ok(()),
                }
            }
            // Macro bodies only see their own arguments.
            _ => Ok(()),
        }
    }

    fn check_forloop(&mut self, forloop: &Forloop) -> Result<(), TemplateError> {
        self.check_expr(&forloop.container)?;

        let containers = match &forloop.container.val {
            ExprVal::Ident(path) if forloop.container.filters.is_empty() => match self.lookup(path) {
                Lookup::Found(values) => Some(values),
                Lookup::Unknown | Lookup::Missing => None,
            },
            _ => None,
        };

        let mut frame = HashMap::new();
        frame.insert(LOOP_VARIABLE.to_string(), Binding::Unknown);
        match containers {
            Some(containers) => {
                let mut keys = Vec::new();
                let mut values = Vec::new();
                for container in containers {
                    match container {
                        Value::Object(map) => {
                            for (key, value) in map {
                                keys.push(Value::String(key));
                                values.push(value);
                            }
                        }
                        Value::Array(items) => values.extend(items),
                        _ => {}
                    }
                }
                if let Some(key) = &forloop.key {
                    frame.insert(key.clone(), Binding::Samples(keys));
                }
                frame.insert(forloop.value.clone(), Binding::Samples(values));
            }
            None => {
                if let Some(key) = &forloop.key {
                    frame.insert(key.clone(), Binding::Unknown);
                }
                frame.insert(forloop.value.clone(), Binding::Unknown);
            }
        }

        self.scoped(frame, |checker| checker.check_nodes(&forloop.body))?;
        match &forloop.empty_body {
            Some(body) => self.check_nodes(body),
            None => Ok(()),
        }
    }

    fn scoped<F>(&mut self, frame: HashMap<String, Binding>, f: F) -> Result<(), TemplateError>
    where
        F: FnOnce(&mut Self) -> Result<(), TemplateError>,
    {
        self.scopes.push(frame);
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn guarded<F>(&mut self, guards: Vec<String>, f: F) -> Result<(), TemplateError>
    where
        F: FnOnce(&mut Self) -> Result<(), TemplateError>,
    {
        let depth = self.guards.len();
        self.guards.extend(guards);
        let result = f(self);
        self.guards.truncate(depth);
        result
    }

    fn is_guarded(&self, path: &str) -> bool {
        self.guards.iter().any(|guard| {
            path.strip_prefix(guard.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', '[']))
        })
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<(), TemplateError> {
        let defaulted = expr.has_default_filter() && matches!(expr.val, ExprVal::Ident(_));
        if !defaulted {
            self.check_val(&expr.val)?;
        }
        expr.filters.iter().try_for_each(|filter| self.check_call(filter))
    }

    fn check_call(&mut self, call: &FunctionCall) -> Result<(), TemplateError> {
        call.args.values().try_for_each(|arg| self.check_expr(arg))
    }

    fn check_val(&mut self, val: &ExprVal) -> Result<(), TemplateError> {
        match val {
            ExprVal::Ident(path) => self.check_ident(path),
            ExprVal::Math(math) => {
                self.check_expr(&math.lhs)?;
                self.check_expr(&math.rhs)
            }
            ExprVal::Logic(logic) if logic.operator == LogicOperator::And => {
                self.check_expr(&logic.lhs)?;
                self.guarded(defined_guards(&logic.lhs), |checker| checker.check_expr(&logic.rhs))
            }
            ExprVal::Logic(logic) => {
                self.check_expr(&logic.lhs)?;
                self.check_expr(&logic.rhs)
            }
            ExprVal::In(in_expr) => {
                self.check_expr(&in_expr.lhs)?;
                self.check_expr(&in_expr.rhs)
            }
            ExprVal::Test(test) => {
                if !matches!(test.name.as_str(), "defined" | "undefined") {
                    self.check_ident(&test.ident)?;
                }
                test.args.iter().try_for_each(|arg| self.check_expr(arg))
            }
            ExprVal::MacroCall(call) => call.args.values().try_for_each(|arg| self.check_expr(arg)),
            ExprVal::FunctionCall(call) => self.check_call(call),
            ExprVal::Array(items) => items.iter().try_for_each(|item| self.check_expr(item)),
            ExprVal::StringConcat(concat) => {
                concat.values.iter().try_for_each(|value| self.check_val(value))
            }
            ExprVal::String(_) | ExprVal::Int(_) | ExprVal::Float(_) | ExprVal::Bool(_) => Ok(()),
        }
    }

    fn check_ident(&mut self, path: &str) -> Result<(), TemplateError> {
        for segment in split_path(path) {
            if let Segment::Dynamic(inner) = segment {
                self.check_ident(&inner)?;
            }
        }

        if self.is_guarded(path) {
            return Ok(());
        }
        match self.lookup(path) {
            Lookup::Found(_) | Lookup::Unknown => Ok(()),
            Lookup::Missing => Err(self.not_found(path)),
        }
    }

    fn binding(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn lookup(&self, path: &str) -> Lookup {
        let segments = split_path(path);
        let Some((Segment::Key(root), rest)) = segments.split_first() else {
            return Lookup::Unknown;
        };
        if root == CONTEXT_DUMP {
            return Lookup::Unknown;
        }

        let samples = match self.binding(root) {
            Some(Binding::Unknown) => return Lookup::Unknown,
            // An empty container never runs the loop body.
            Some(Binding::Samples(samples)) if samples.is_empty() => return Lookup::Unknown,
            Some(Binding::Samples(samples)) => samples.iter().collect::<Vec<_>>(),
            None => match self.context.get(root) {
                Some(value) => vec![value],
                None => return Lookup::Missing,
            },
        };

        let mut found = Vec::new();
        let mut unknown = false;
        for sample in samples {
            match descend(sample, rest) {
                Step::Found(value) => found.push(value.clone()),
                Step::Unknown => unknown = true,
                Step::Missing => {}
            }
        }

        if unknown {
            Lookup::Unknown
        } else if found.is_empty() {
            Lookup::Missing
        } else {
            Lookup::Found(found)
        }
    }

    fn not_found(&self, path: &str) -> TemplateError {
        let root = match split_path(path).into_iter().next() {
            Some(Segment::Key(root)) => root,
            _ => String::new(),
        };

        let available = match self.binding(&root) {
            Some(Binding::Samples(samples)) => {
                let mut available = vec![root.clone()];
                if let Some(sample) = samples.first() {
                    available.extend(
                        available_variables(sample).into_iter().map(|field| format!("{root}.{field}")),
                    );
                }
                available
            }
            _ => {
                let mut available = available_variables(self.context);
                available.extend(self.scopes.iter().flat_map(|scope| scope.keys().cloned()));
                available
            }
        };

        TemplateError::VariableNotFound {
            template: self.active.last().cloned().unwrap_or_default(),
            variable: path.to_string(),
            suggestions: find_similar_variables(path, &available),
        }
    }
}
