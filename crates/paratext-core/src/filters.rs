/*
 * filters.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Filter registry and the built-in filter set.
//!
//! Filters are the only callable things inside expressions. Each filter
//! receives the input value (the first argument, or the base of a method
//! style call like `name.upper()`) plus any remaining arguments. A filter
//! that does not apply to its input passes the value through untouched
//! rather than failing, so `upper(5)` style mistakes surface in the output
//! instead of aborting the whole document.

use crate::error::TemplateResult;
use crate::value::{format_number, join_values, string_to_number, Value};
use indexmap::IndexMap;
use std::rc::Rc;

/// A filter callable from expressions.
pub type FilterFn = Rc<dyn Fn(&Value, &[Value]) -> TemplateResult<Value>>;

/// An explicit, instance-scoped collection of named filters.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: IndexMap<String, FilterFn>,
}

impl FilterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            filters: IndexMap::new(),
        }
    }

    /// Create a registry preloaded with the built-in filters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Register a filter under a name, replacing any previous registration.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        filter: impl Fn(&Value, &[Value]) -> TemplateResult<Value> + 'static,
    ) {
        self.filters.insert(name.into(), Rc::new(filter));
    }

    pub fn get(&self, name: &str) -> Option<FilterFn> {
        self.filters.get(name).cloned()
    }

    /// All registered filters, in registration order.
    pub fn get_all(&self) -> IndexMap<String, FilterFn> {
        self.filters.clone()
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterFn> {
        self.filters.shift_remove(name)
    }

    pub fn remove_all(&mut self) {
        self.filters.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Register the built-in filter set onto an existing registry.
pub fn register_builtins(registry: &mut FilterRegistry) {
    registry.register("capitalize", capitalize);
    registry.register("upper", upper);
    registry.register("lower", lower);
    registry.register("truncate", truncate);
    registry.register("abs", abs);
    registry.register("join", join);
    registry.register("round", round);
    registry.register("replace", replace);
    registry.register("urlencode", urlencode);
    registry.register("dump", dump);
}

fn capitalize(input: &Value, _args: &[Value]) -> TemplateResult<Value> {
    let Value::String(s) = input else {
        return Ok(input.clone());
    };
    let mut chars = s.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    Ok(Value::String(capitalized))
}

fn upper(input: &Value, _args: &[Value]) -> TemplateResult<Value> {
    Ok(match input {
        Value::String(s) => Value::String(s.to_uppercase()),
        other => other.clone(),
    })
}

fn lower(input: &Value, _args: &[Value]) -> TemplateResult<Value> {
    Ok(match input {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other.clone(),
    })
}

fn truncate(input: &Value, args: &[Value]) -> TemplateResult<Value> {
    let Value::String(s) = input else {
        return Ok(input.clone());
    };
    // no length still appends the ellipsis, with nothing cut
    let length = match args.first() {
        None | Some(Value::Undefined) => return Ok(Value::String(format!("{s}..."))),
        Some(value) => value.to_number(),
    };
    let chars: Vec<char> = s.chars().collect();
    let count = chars.len() as f64;
    if count <= length {
        return Ok(Value::String(s.clone()));
    }
    // substring clamping: NaN and negative ends cut everything
    let end = if length.is_nan() || length < 0.0 {
        0
    } else {
        length.trunc().min(count) as usize
    };
    let mut truncated: String = chars[..end].iter().collect();
    truncated.push_str("...");
    Ok(Value::String(truncated))
}

fn abs(input: &Value, _args: &[Value]) -> TemplateResult<Value> {
    Ok(Value::Number(input.to_number().abs()))
}

fn join(input: &Value, args: &[Value]) -> TemplateResult<Value> {
    let Value::Array(items) = input else {
        return Ok(input.clone());
    };
    let separator = match args.first() {
        None | Some(Value::Undefined) => ", ".to_string(),
        Some(value) => value.to_display_string(),
    };
    Ok(Value::String(join_values(items, &separator)))
}

// Rounds half away from zero by shifting the decimal point through the
// string form, which sidesteps the binary representation of inputs
// like 2.675.
fn round(input: &Value, args: &[Value]) -> TemplateResult<Value> {
    let decimals = match args.first() {
        None | Some(Value::Undefined) => "0".to_string(),
        Some(value) => value.to_display_string(),
    };
    let shifted = string_to_number(&format!("{}e{}", input.to_display_string(), decimals));
    let rounded = (shifted + 0.5).floor();
    let result = string_to_number(&format!("{}e-{}", format_number(rounded), decimals));
    Ok(Value::Number(result))
}

fn replace(input: &Value, args: &[Value]) -> TemplateResult<Value> {
    let Value::String(s) = input else {
        return Ok(input.clone());
    };
    let search = match args.first() {
        None | Some(Value::Undefined) => return Ok(input.clone()),
        Some(value) => value.to_display_string(),
    };
    let replacement = match args.get(1) {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(value) => value.to_display_string(),
    };
    if search.is_empty() {
        // split on the empty string separates every character
        let parts: Vec<String> = s.chars().map(|c| c.to_string()).collect();
        return Ok(Value::String(parts.join(&replacement)));
    }
    Ok(Value::String(s.replace(&search, &replacement)))
}

fn urlencode(input: &Value, _args: &[Value]) -> TemplateResult<Value> {
    let Value::String(s) = input else {
        return Ok(input.clone());
    };
    let mut encoded = String::with_capacity(s.len());
    for byte in s.as_bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(*byte as char),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    Ok(Value::String(encoded))
}

fn dump(input: &Value, _args: &[Value]) -> TemplateResult<Value> {
    Ok(match input.to_json_string() {
        Some(json) => Value::String(json),
        None => Value::Undefined,
    })
}
