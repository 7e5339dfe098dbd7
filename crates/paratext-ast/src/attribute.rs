/*
 * attribute.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Attributes carried by tag elements.

use serde::{Deserialize, Serialize};

/// An attribute on a tag element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    /// A named attribute: `flag`, `name="text"`, or `name={expr}`.
    Named {
        name: String,
        /// `None` for a bare attribute with no value (`<Tag flag>`).
        value: Option<AttributeValue>,
    },

    /// A spread attribute: `{...expr}`.
    ///
    /// Spreads are representable so that consumers can reject them with a
    /// useful error; neither bundling nor transformation supports them.
    Spread {
        /// Raw source text of the spread expression.
        expression: String,
    },
}

/// The value side of a named attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// A literal string value: `name="text"`.
    Literal(String),
    /// An unevaluated expression, stored as raw source: `name={count + 1}`.
    Expression(String),
}

impl Attribute {
    /// Create a named attribute with a literal string value.
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute::Named {
            name: name.into(),
            value: Some(AttributeValue::Literal(value.into())),
        }
    }

    /// Create a named attribute whose value is an unevaluated expression.
    pub fn expression(name: impl Into<String>, source: impl Into<String>) -> Self {
        Attribute::Named {
            name: name.into(),
            value: Some(AttributeValue::Expression(source.into())),
        }
    }

    /// Create a bare attribute with no value.
    pub fn bare(name: impl Into<String>) -> Self {
        Attribute::Named {
            name: name.into(),
            value: None,
        }
    }

    /// Create a spread attribute from its raw expression source.
    pub fn spread(expression: impl Into<String>) -> Self {
        Attribute::Spread {
            expression: expression.into(),
        }
    }

    /// The attribute name, if this is a named attribute.
    pub fn name(&self) -> Option<&str> {
        match self {
            Attribute::Named { name, .. } => Some(name),
            Attribute::Spread { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_constructor() {
        let attr = Attribute::literal("title", "Hello");
        assert_eq!(attr.name(), Some("title"));
        assert_eq!(
            attr,
            Attribute::Named {
                name: "title".to_string(),
                value: Some(AttributeValue::Literal("Hello".to_string())),
            }
        );
    }

    #[test]
    fn test_bare_attribute_has_no_value() {
        let attr = Attribute::bare("draft");
        assert_eq!(
            attr,
            Attribute::Named {
                name: "draft".to_string(),
                value: None,
            }
        );
    }

    #[test]
    fn test_spread_attribute_has_no_name() {
        let attr = Attribute::spread("props");
        assert_eq!(attr.name(), None);
    }
}
