/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Runtime values for expression evaluation.
//!
//! [`Value`] is the closed set of types an expression can produce. The
//! coercion rules (truthiness, loose equality, string concatenation, display
//! formatting) match a JavaScript host, so existing documents keep their
//! meaning when evaluated here. `Undefined` and `Null` are distinct: a
//! missing variable
//! is `Undefined`, an explicit `null` literal is `Null`, and the two are
//! loosely equal to each other but to nothing else.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered string-keyed map of values.
pub type ValueMap = IndexMap<String, Value>;

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(ValueMap),
}

impl Value {
    /// Truthiness: `false`, `0`, `NaN`, `""`, `null` and `undefined` are
    /// falsy; everything else (including empty arrays and objects) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !(*n == 0.0 || n.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Numeric coercion.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) | Value::Object(_) => self.to_primitive().to_number(),
        }
    }

    /// Containers collapse to their string form; primitives pass through.
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) | Value::Object(_) => Value::String(self.to_display_string()),
            other => other.clone(),
        }
    }

    /// The value's display form: how `String(value)` renders it.
    ///
    /// Arrays join their elements with commas (with null/undefined elements
    /// rendering as nothing); objects render as `[object Object]`.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => join_values(items, ","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    /// The text a fully evaluated expression node becomes.
    ///
    /// Arrays concatenate their elements with no separator, objects
    /// JSON-encode, and everything else uses its display form (so a missing
    /// value renders as `undefined`).
    pub fn stringified(&self) -> String {
        match self {
            Value::Array(items) => join_values(items, ""),
            Value::Object(_) => self
                .to_json_string()
                .unwrap_or_else(|| "undefined".to_string()),
            other => other.to_display_string(),
        }
    }

    /// JSON-encode the value. `None` means the value has no JSON form
    /// (a top-level `undefined`).
    ///
    /// Inside containers the JSON rules apply: undefined object entries are
    /// dropped, undefined array elements and non-finite numbers become
    /// `null`. Object keys keep insertion order.
    pub fn to_json_string(&self) -> Option<String> {
        fn write(value: &Value, out: &mut String) {
            match value {
                Value::Undefined | Value::Null => out.push_str("null"),
                Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
                Value::Number(n) => {
                    if n.is_finite() {
                        out.push_str(&format_number(*n));
                    } else {
                        out.push_str("null");
                    }
                }
                Value::String(s) => out.push_str(&escape_json_string(s)),
                Value::Array(items) => {
                    out.push('[');
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        write(item, out);
                    }
                    out.push(']');
                }
                Value::Object(map) => {
                    out.push('{');
                    let mut first = true;
                    for (key, item) in map {
                        if matches!(item, Value::Undefined) {
                            continue;
                        }
                        if !first {
                            out.push(',');
                        }
                        first = false;
                        out.push_str(&escape_json_string(key));
                        out.push(':');
                        write(item, out);
                    }
                    out.push('}');
                }
            }
        }

        if matches!(self, Value::Undefined) {
            return None;
        }
        let mut out = String::new();
        write(self, &mut out);
        Some(out)
    }

    /// Loose (coercing) equality.
    ///
    /// `null == undefined`; number/string/bool pairs coerce numerically; two
    /// containers are never equal (they are distinct identities); a container
    /// compared against a primitive collapses to its string form first.
    pub fn loose_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Array(_) | Object(_), Array(_) | Object(_)) => false,
            (Array(_) | Object(_), _) => self.to_primitive().loose_eq(other),
            (_, Array(_) | Object(_)) => self.loose_eq(&other.to_primitive()),
            // remaining pairs mix bool, number and string: compare as numbers
            _ => {
                let a = self.to_number();
                let b = other.to_number();
                a == b
            }
        }
    }

    /// Addition: string concatenation when either side collapses to a
    /// string, numeric addition otherwise.
    pub fn add(&self, other: &Value) -> Value {
        let a = self.to_primitive();
        let b = other.to_primitive();
        match (&a, &b) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(a.to_display_string() + &b.to_display_string())
            }
            _ => Value::Number(a.to_number() + b.to_number()),
        }
    }

    /// Relational comparison for `<`, `>`, `<=`, `>=`.
    ///
    /// Two strings compare lexicographically; everything else compares
    /// numerically. `None` means the comparison is undefined (NaN involved),
    /// in which case every relational operator is false.
    pub fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        let a = self.to_primitive();
        let b = other.to_primitive();
        match (&a, &b) {
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            _ => {
                let x = a.to_number();
                let y = b.to_number();
                x.partial_cmp(&y)
            }
        }
    }
}

/// Join array elements for display: null and undefined render as nothing,
/// everything else uses its display form.
pub(crate) fn join_values(items: &[Value], separator: &str) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Undefined | Value::Null => String::new(),
            other => other.to_display_string(),
        })
        .collect();
    parts.join(separator)
}

/// Format a number the way the host runtime's `String(n)` does: integral
/// values without a fraction, `NaN`/`Infinity` spelled out, `-0` as `0`,
/// exponent notation only for very large or very small magnitudes.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{n:e}");
        // Rust writes `1e21`; the host runtime writes `1e+21`.
        if let Some(pos) = formatted.find('e') {
            if formatted.as_bytes().get(pos + 1) != Some(&b'-') {
                return format!("{}e+{}", &formatted[..pos], &formatted[pos + 1..]);
            }
        }
        return formatted;
    }
    if n.fract() == 0.0 {
        return format!("{}", n as i128);
    }
    format!("{n}")
}

/// Numeric coercion of a string: empty (after trimming) is zero, `Infinity`
/// is spelled out, hex literals are accepted, anything else that does not
/// parse as a decimal number is NaN.
pub(crate) fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return match u64::from_str_radix(hex, 16) {
            Ok(v) => v as f64,
            Err(_) => f64::NAN,
        };
    }
    // Reject the alphabetic spellings Rust's parser accepts ("inf", "nan").
    let decimal = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !decimal {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn escape_json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Object(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
