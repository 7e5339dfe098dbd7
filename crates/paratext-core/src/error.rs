/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for bundling and transformation.
//!
//! The first error aborts the whole operation; there are no partial results
//! and no retries. Message text for the user-facing variants is part of the
//! engine's observable behavior, so several variants render their stored
//! `message` verbatim.

use thiserror::Error;

/// Errors that can occur while bundling or transforming a document tree.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// An import chain revisited a file that is still being processed.
    #[error("Circular import detected: {}", chain.join(" -> "))]
    CircularImport { chain: Vec<String> },

    /// An import or export statement with an unsupported shape.
    #[error("{message}")]
    Import { path: String, message: String },

    /// Prop placeholder substitution failed while inlining a component.
    #[error("Error substituting props in expression: {message}")]
    Prop { message: String },

    /// An attribute form that neither bundling nor transformation supports.
    #[error("{message}")]
    UnsupportedAttribute { element: String, message: String },

    /// Expression parsing or evaluation failed.
    #[error("{message}")]
    Evaluation { message: String },

    /// A tag plugin rejected its input.
    #[error("{message}")]
    Plugin { tag: String, message: String },

    /// Component inlining recursed past the depth limit, which means a
    /// component's body (directly or indirectly) references itself.
    #[error("Recursive component inlining detected (depth > {max_depth}): {name}")]
    RecursiveInline { name: String, max_depth: usize },

    /// The external parser failed or produced a tree of the wrong shape.
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Front matter could not be decoded.
    #[error("Invalid front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    /// A content loader failed to produce a file.
    #[error("Failed to load {path}: {source}")]
    Load {
        path: String,
        source: std::io::Error,
    },

    /// Context wrapper added while processing a named element.
    #[error("Error processing element <{name}>: {source}")]
    Element {
        name: String,
        source: Box<TemplateError>,
    },
}

/// Result type for bundling and transformation operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_import_renders_chain() {
        let err = TemplateError::CircularImport {
            chain: vec![
                "/a.md".to_string(),
                "/b.md".to_string(),
                "/a.md".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Circular import detected: /a.md -> /b.md -> /a.md"
        );
    }

    #[test]
    fn test_element_wrapper_nests_messages() {
        let inner = TemplateError::Evaluation {
            message: "Filter \"nope\" is not registered.".to_string(),
        };
        let err = TemplateError::Element {
            name: "Card".to_string(),
            source: Box::new(inner),
        };
        assert_eq!(
            err.to_string(),
            "Error processing element <Card>: Filter \"nope\" is not registered."
        );
    }
}
