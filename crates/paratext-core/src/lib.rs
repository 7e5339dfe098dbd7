/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Template engine for componentized documents.
 *
 * This crate bundles a document tree with everything it imports (inlining
 * component elements at their call sites) and transforms the bundled tree
 * by evaluating embedded expressions, applying filters, and dispatching
 * tag plugins such as conditionals and loops. Parsing and serialization
 * are pluggable: the engine consumes trees through the `TreeParser` seam
 * and renders them back out through `TreeSerializer`.
 */

mod bundler;
pub mod engine;
pub mod error;
pub mod evaluator;
mod expression;
pub mod filters;
pub mod frontmatter;
pub mod loader;
pub mod scope;
pub mod tags;
pub mod transformer;
pub mod value;
pub mod writer;

// Re-export commonly used types at the crate root
pub use engine::{Engine, TreeParser};
pub use error::{TemplateError, TemplateResult};
pub use filters::{FilterFn, FilterRegistry};
pub use frontmatter::front_matter;
pub use loader::{ContentLoader, FileSystemLoader, MemoryLoader, NullLoader};
pub use scope::{Bindings, Scope, SharedBindings};
pub use tags::{PluginContext, TagPlugin, TagPluginRegistry};
pub use transformer::NodeTransformer;
pub use value::{Value, ValueMap};
pub use writer::{MarkdownWriter, TreeSerializer};
