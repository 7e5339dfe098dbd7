/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Document tree type definitions for Paratext.
 *
 * This crate provides pure data type definitions for the templated-document
 * tree: markup nodes, tag elements with attributes, embedded expressions,
 * and module (import) declarations. It has minimal dependencies (serde) and
 * can be used by any crate that needs to construct or inspect document
 * trees, including external parsers and serializers.
 */

pub mod attribute;
pub mod node;

// Re-export commonly used types at the crate root
pub use attribute::{Attribute, AttributeValue};
pub use node::{
    BlockTemplate, Element, ExpressionBlock, ExpressionInline, Heading, Html, Import, List,
    ListItem, ModuleStatement, Node, Nodes, Paragraph, Root, Text, Yaml,
};
