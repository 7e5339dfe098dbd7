/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Expression evaluation against a scope chain.
//!
//! Two resolution modes coexist. A dotted identifier (`user.address.city`)
//! resolves strictly: stepping through `null` or `undefined` is an error
//! naming the offending property and the full path. Member access on a
//! composite base (`items[0]`, `[1, 2].length`) resolves leniently: a miss
//! or a non-container base yields the empty string. Calls may only target
//! registered filters, looked up before any argument is evaluated.

use crate::error::{TemplateError, TemplateResult};
use crate::expression::{parse_expression, BinaryOp, Expr, Literal, Property, UnaryOp};
use crate::filters::FilterRegistry;
use crate::scope::Scope;
use crate::value::{format_number, Value, ValueMap};
use std::cmp::Ordering;
use std::rc::Rc;

/// Evaluate expression source text against a scope.
pub fn evaluate(
    source: &str,
    scope: &Rc<Scope>,
    filters: &FilterRegistry,
) -> TemplateResult<Value> {
    let trimmed = source.trim();
    let expr = parse_expression(trimmed).map_err(|_| TemplateError::Evaluation {
        message: format!("Failed to parse expression: \"{trimmed}\""),
    })?;
    Evaluator { scope, filters }.eval(&expr)
}

struct Evaluator<'a> {
    scope: &'a Rc<Scope>,
    filters: &'a FilterRegistry,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &Expr) -> TemplateResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expr::Identifier(path) => self.resolve_variable(path),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Minus => Value::Number(-value.to_number()),
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                })
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Member { object, property } => {
                let base = self.eval(object)?;
                let key = match property {
                    Property::Named(name) => Value::String(name.clone()),
                    Property::Computed(index) => self.eval(index)?,
                };
                Ok(member_access(&base, &key))
            }
            Expr::Call { callee, args } => self.eval_call(callee, args),
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element)?);
                }
                Ok(Value::Array(values))
            }
            Expr::Object(entries) => {
                let mut map = ValueMap::new();
                for (key, value) in entries {
                    let evaluated = self.eval(value)?;
                    map.insert(key.clone(), evaluated);
                }
                Ok(Value::Object(map))
            }
        }
    }

    /// Strict dotted-path resolution. The first segment comes from the
    /// scope chain; a missing binding is `undefined`. Every further step
    /// through `null` or `undefined` fails.
    fn resolve_variable(&self, path: &str) -> TemplateResult<Value> {
        let mut parts = path.split('.');
        let first = parts.next().unwrap_or(path);
        let mut current = self.scope.get(first).unwrap_or(Value::Undefined);
        for part in parts {
            if matches!(current, Value::Null | Value::Undefined) {
                return Err(TemplateError::Evaluation {
                    message: format!(
                        "Cannot access property \"{part}\" of null or undefined in \"{path}\"."
                    ),
                });
            }
            current = property_of(&current, part);
        }
        Ok(current)
    }

    fn eval_binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> TemplateResult<Value> {
        let lhs = self.eval(left)?;
        // && and || short-circuit and yield the deciding operand itself
        match op {
            BinaryOp::And => {
                return if lhs.is_truthy() { self.eval(right) } else { Ok(lhs) };
            }
            BinaryOp::Or => {
                return if lhs.is_truthy() { Ok(lhs) } else { self.eval(right) };
            }
            _ => {}
        }
        let rhs = self.eval(right)?;
        Ok(apply_operator(op, &lhs, &rhs))
    }

    fn eval_call(&self, callee: &Expr, args: &[Expr]) -> TemplateResult<Value> {
        enum InputSource<'e> {
            Variable(&'e str),
            Expression(&'e Expr),
            FirstArg,
        }

        let (name, source) = match callee {
            Expr::Identifier(path) => match path.rsplit_once('.') {
                Some((head, name)) => (name, InputSource::Variable(head)),
                None => (path.as_str(), InputSource::FirstArg),
            },
            Expr::Member {
                object,
                property: Property::Named(name),
            } => (name.as_str(), InputSource::Expression(object)),
            _ => {
                return Err(TemplateError::Evaluation {
                    message: "Only calls to registered filters are allowed.".to_string(),
                });
            }
        };

        // the name must be registered before any argument runs
        let Some(filter) = self.filters.get(name) else {
            return Err(TemplateError::Evaluation {
                message: format!("Filter \"{name}\" is not registered."),
            });
        };

        let (input, rest) = match source {
            InputSource::Variable(head) => (self.resolve_variable(head)?, args),
            InputSource::Expression(object) => (self.eval(object)?, args),
            InputSource::FirstArg => match args.split_first() {
                Some((first, rest)) => (self.eval(first)?, rest),
                None => (Value::Undefined, args),
            },
        };
        let mut filter_args = Vec::with_capacity(rest.len());
        for arg in rest {
            filter_args.push(self.eval(arg)?);
        }
        filter(&input, &filter_args)
    }
}

fn apply_operator(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOp::Add => lhs.add(rhs),
        BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
        BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
        BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
        BinaryOp::Mod => Value::Number(lhs.to_number() % rhs.to_number()),
        BinaryOp::Eq => Value::Bool(lhs.loose_eq(rhs)),
        BinaryOp::Ne => Value::Bool(!lhs.loose_eq(rhs)),
        BinaryOp::Gt => Value::Bool(lhs.compare(rhs) == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(
            lhs.compare(rhs),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Lt => Value::Bool(lhs.compare(rhs) == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(
            lhs.compare(rhs),
            Some(Ordering::Less | Ordering::Equal)
        )),
        // short-circuit forms never reach this point
        BinaryOp::And | BinaryOp::Or => Value::Undefined,
    }
}

/// One strict step along a dotted path. Only identifier-shaped keys can
/// appear here, so arrays and strings expose `length` and nothing else.
fn property_of(value: &Value, key: &str) -> Value {
    match value {
        Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Undefined),
        Value::Array(items) => {
            if key == "length" {
                Value::Number(items.len() as f64)
            } else {
                Value::Undefined
            }
        }
        Value::String(s) => {
            if key == "length" {
                Value::Number(s.chars().count() as f64)
            } else {
                Value::Undefined
            }
        }
        _ => Value::Undefined,
    }
}

/// Lenient member access. Misses and non-container bases produce the
/// empty string rather than an error.
fn member_access(base: &Value, key: &Value) -> Value {
    let key_text = match key {
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        other => other.to_display_string(),
    };
    let found = match base {
        Value::Object(map) => map.get(&key_text).cloned(),
        Value::Array(items) => {
            if key_text == "length" {
                Some(Value::Number(items.len() as f64))
            } else {
                match key_text.parse::<usize>() {
                    // only canonical indexes count, "01" is not an index
                    Ok(index) if index.to_string() == key_text => items.get(index).cloned(),
                    _ => None,
                }
            }
        }
        _ => None,
    };
    match found {
        Some(Value::Undefined) | None => Value::String(String::new()),
        Some(value) => value,
    }
}
