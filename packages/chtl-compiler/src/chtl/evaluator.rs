//! The expression evaluator (spec §4.5): evaluates a style-property
//! expression tree to a `{kind, unit?}` value, resolving `PropertyRef`
//! nodes against the fully-resolved element tree and memoising/cycle-
//! detecting per property via a tri-state cache (spec §9's "Cyclic
//! property references" design note).

use super::ast::{BinaryOp, Element, Expr, Literal, Node, StyleChild, UnaryOp};
use crate::error::{CompileError, Result};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number { value: f64, unit: Option<String> },
    Str(String),
}

impl Value {
    pub fn truthy(&self) -> bool {
        match self {
            Value::Number { value, .. } => *value != 0.0,
            Value::Str(s) => !s.is_empty() && s != "false",
        }
    }

    pub fn to_css_string(&self) -> String {
        match self {
            Value::Number { value, unit } => {
                let num = if value.fract() == 0.0 { format!("{value:.0}") } else { value.to_string() };
                match unit {
                    Some(u) => format!("{num}{u}"),
                    None => num,
                }
            }
            Value::Str(s) => s.clone(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CacheState {
    Evaluating,
}

/// Per-property evaluation cache. Installing `Evaluating` before recursing
/// and checking for it on re-entry is the cycle detector (spec §4.5, §9).
#[derive(Default)]
pub struct EvalCache {
    done: RefCell<HashMap<(String, String), Value>>,
    in_progress: RefCell<HashMap<(String, String), CacheState>>,
}

impl EvalCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A minimal view over the resolved CHTL tree the evaluator needs to look
/// up another element's effective property value by selector (spec §4.5:
/// `#id` uses id, bare tag uses first-match DFS).
pub struct ElementIndex<'a> {
    roots: &'a [Node],
}

impl<'a> ElementIndex<'a> {
    pub fn new(roots: &'a [Node]) -> Self {
        ElementIndex { roots }
    }

    fn find<'b>(&'b self, selector: &str) -> Option<&'b Element> {
        fn visit<'b>(nodes: &'b [Node], selector: &str) -> Option<&'b Element> {
            for node in nodes {
                if let Node::Element(el) = node {
                    if matches_selector(el, selector) {
                        return Some(el);
                    }
                    if let Some(found) = visit(&el.children, selector) {
                        return Some(found);
                    }
                }
            }
            None
        }
        visit(self.roots, selector)
    }
}

fn matches_selector(el: &Element, selector: &str) -> bool {
    if let Some(id) = selector.strip_prefix('#') {
        return el.attributes.iter().any(|a| a.name == "id" && attr_literal(a) == Some(id));
    }
    if let Some(class) = selector.strip_prefix('.') {
        return el.attributes.iter().any(|a| {
            a.name == "class" && attr_literal(a).map(|v| v.split_whitespace().any(|c| c == class)).unwrap_or(false)
        });
    }
    el.tag == selector
}

fn attr_literal(prop: &super::ast::Property) -> Option<&str> {
    match &prop.value {
        Expr::Literal(Literal::Str(s)) => Some(s.as_str()),
        _ => None,
    }
}

fn find_property<'a>(el: &'a Element, name: &str) -> Option<&'a Expr> {
    let style = el.style.as_ref()?;
    style.children.iter().rev().find_map(|c| match c {
        StyleChild::Property(p) if p.name == name => Some(&p.value),
        _ => None,
    })
}

pub struct Evaluator<'a> {
    index: ElementIndex<'a>,
    cache: EvalCache,
}

impl<'a> Evaluator<'a> {
    pub fn new(roots: &'a [Node]) -> Self {
        Evaluator { index: ElementIndex::new(roots), cache: EvalCache::new() }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(Literal::Number { value, unit }) => {
                Ok(Value::Number { value: *value, unit: unit.clone() })
            }
            Expr::Literal(Literal::Str(s)) => Ok(Value::Str(s.clone())),
            Expr::Literal(Literal::Bool(b)) => Ok(Value::Str(b.to_string())),
            Expr::Unary(UnaryOp::Neg, inner) => match self.eval(inner)? {
                Value::Number { value, unit } => Ok(Value::Number { value: -value, unit }),
                Value::Str(s) => Ok(Value::Str(format!("-{s}"))),
            },
            Expr::Binary(op, lhs, rhs) => self.eval_binary(*op, lhs, rhs),
            Expr::Ternary(cond, then_branch, else_branch) => {
                if self.eval(cond)?.truthy() {
                    self.eval(then_branch)
                } else {
                    self.eval(else_branch)
                }
            }
            Expr::PropertyRef(r) => self.eval_property_ref(&r.selector, &r.property),
            Expr::FunctionCall { name, .. } => Err(CompileError::evaluation(
                "unknown-function",
                format!("function `{name}` has no registered lowering"),
                None,
            )),
        }
    }

    fn eval_binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value> {
        let l = self.eval(lhs)?;
        let r = self.eval(rhs)?;
        match (op, &l, &r) {
            (BinaryOp::Add, Value::Str(_), _) | (BinaryOp::Add, _, Value::Str(_)) => {
                Ok(Value::Str(format!("{}{}", l.to_css_string(), r.to_css_string())))
            }
            (_, Value::Number { value: lv, unit: lu }, Value::Number { value: rv, unit: ru }) => {
                self.eval_numeric(op, *lv, lu.clone(), *rv, ru.clone())
            }
            _ => Err(CompileError::evaluation(
                "unit-mismatch",
                "cannot combine these operand kinds",
                None,
            )),
        }
    }

    fn eval_numeric(
        &self,
        op: BinaryOp,
        lv: f64,
        lu: Option<String>,
        rv: f64,
        ru: Option<String>,
    ) -> Result<Value> {
        match op {
            BinaryOp::Add | BinaryOp::Sub => {
                let unit = match (&lu, &ru) {
                    (Some(a), Some(b)) if a == b => Some(a.clone()),
                    (Some(a), None) => Some(a.clone()),
                    (None, Some(b)) => Some(b.clone()),
                    (None, None) => None,
                    (Some(a), Some(b)) => {
                        return Err(CompileError::evaluation(
                            "unit-mismatch",
                            format!("cannot combine incompatible units `{a}` and `{b}`"),
                            None,
                        ))
                    }
                };
                let value = if op == BinaryOp::Add { lv + rv } else { lv - rv };
                Ok(Value::Number { value, unit })
            }
            BinaryOp::Mul => {
                let unit = match (&lu, &ru) {
                    (Some(_), Some(_)) => {
                        return Err(CompileError::evaluation(
                            "unit-mismatch",
                            "`*` requires at least one unitless operand",
                            None,
                        ))
                    }
                    (Some(a), None) => Some(a.clone()),
                    (None, Some(b)) => Some(b.clone()),
                    (None, None) => None,
                };
                Ok(Value::Number { value: lv * rv, unit })
            }
            BinaryOp::Div => {
                if rv == 0.0 {
                    return Err(CompileError::evaluation("division-by-zero", "division by zero", None));
                }
                match (&lu, &ru) {
                    (Some(a), Some(b)) if a == b => Ok(Value::Number { value: lv / rv, unit: None }),
                    (Some(_), Some(_)) => Err(CompileError::evaluation(
                        "unit-mismatch",
                        "`/` between differing units is not supported",
                        None,
                    )),
                    (Some(a), None) => Ok(Value::Number { value: lv / rv, unit: Some(a.clone()) }),
                    (None, Some(b)) => Ok(Value::Number { value: lv / rv, unit: Some(b.clone()) }),
                    (None, None) => Ok(Value::Number { value: lv / rv, unit: None }),
                }
            }
        }
    }

    fn eval_property_ref(&self, selector: &str, property: &str) -> Result<Value> {
        let key = (selector.to_string(), property.to_string());
        if let Some(v) = self.cache.done.borrow().get(&key) {
            return Ok(v.clone());
        }
        if self.cache.in_progress.borrow().contains_key(&key) {
            return Err(CompileError::evaluation(
                "cyclic-property-dependency",
                format!("cyclic reference evaluating `{selector}.{property}`"),
                None,
            ));
        }
        let el = self.index.find(selector).ok_or_else(|| {
            CompileError::evaluation(
                "unresolved-property-ref",
                format!("no element matches selector `{selector}`"),
                None,
            )
        })?;
        let expr = find_property(el, property).ok_or_else(|| {
            CompileError::evaluation(
                "unresolved-property-ref",
                format!("`{selector}` has no property `{property}`"),
                None,
            )
        })?;

        self.cache.in_progress.borrow_mut().insert(key.clone(), CacheState::Evaluating);
        let result = self.eval(expr);
        self.cache.in_progress.borrow_mut().remove(&key);
        let value = result?;
        self.cache.done.borrow_mut().insert(key, value.clone());
        Ok(value)
    }
}
