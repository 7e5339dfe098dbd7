/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The template engine: parser seam, registries, bundling, transformation,
//! and serialization behind one façade.

use crate::bundler::Bundler;
use crate::error::{TemplateError, TemplateResult};
use crate::filters::FilterRegistry;
use crate::loader::{resolve_path, ContentLoader};
use crate::scope::{Bindings, Scope, SharedBindings};
use crate::tags::TagPluginRegistry;
use crate::transformer::{NodeTransformer, TransformEnv};
use crate::value::{Value, ValueMap};
use crate::writer::{MarkdownWriter, TreeSerializer};
use paratext_ast::Node;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Parses template source text into a document tree.
///
/// Parsing is pluggable so the engine stays independent of any one markup
/// flavor. An implementation wraps whatever parser produces the tree and
/// reports failures as [`TemplateError::Parse`].
pub trait TreeParser {
    fn parse(&self, source: &str) -> TemplateResult<Node>;
}

/// A template engine configured with a parser, a serializer, and the
/// registries of filters and tag plugins.
///
/// The built-in filters and tags are registered on construction; callers
/// extend or replace them through [`Engine::filters_mut`] and
/// [`Engine::tags_mut`].
pub struct Engine {
    parser: Box<dyn TreeParser>,
    serializer: Box<dyn TreeSerializer>,
    filters: FilterRegistry,
    tags: TagPluginRegistry,
}

impl Engine {
    /// Create an engine that serializes with the Markdown writer.
    pub fn new(parser: impl TreeParser + 'static) -> Self {
        Self::with_serializer(parser, MarkdownWriter::new())
    }

    /// Create an engine with a custom serializer.
    pub fn with_serializer(
        parser: impl TreeParser + 'static,
        serializer: impl TreeSerializer + 'static,
    ) -> Self {
        Self {
            parser: Box::new(parser),
            serializer: Box::new(serializer),
            filters: FilterRegistry::with_builtins(),
            tags: TagPluginRegistry::with_builtins(),
        }
    }

    /// Parse source text into a document tree.
    pub fn parse(&self, source: &str) -> TemplateResult<Node> {
        self.parser.parse(source)
    }

    /// Bundle in-memory content, resolving its imports against `base_dir`.
    pub fn bundle(
        &self,
        content: &str,
        base_dir: &str,
        loader: &dyn ContentLoader,
    ) -> TemplateResult<Node> {
        let mut bundler = Bundler::new(&*self.parser, loader);
        bundler.bundle(content, base_dir)
    }

    /// Load `path` through `loader` and bundle it, resolving its imports
    /// relative to the file's own directory.
    pub fn bundle_file(&self, path: &str, loader: &dyn ContentLoader) -> TemplateResult<Node> {
        let content = loader.load(path).map_err(|source| TemplateError::Load {
            path: path.to_string(),
            source,
        })?;
        let entry = resolve_path("/", path);
        debug!(path, "bundling file");
        let mut bundler = Bundler::new(&*self.parser, loader);
        bundler.bundle_at(&content, &entry)
    }

    /// Transform a bundled tree with `props` bound in the root scope.
    pub fn transform(&self, tree: &Node, props: ValueMap) -> TemplateResult<Node> {
        let shared = SharedBindings::new(RefCell::new(Bindings::new()));
        self.transform_with_shared(tree, props, shared)
    }

    /// Transform a bundled tree with caller-provided shared bindings, which
    /// remain visible (and mutated) after the call.
    pub fn transform_with_shared(
        &self,
        tree: &Node,
        props: ValueMap,
        shared: SharedBindings,
    ) -> TemplateResult<Node> {
        let mut locals = Bindings::new();
        locals.insert("props".to_string(), Value::Object(props));
        let scope = Rc::new(Scope::new(locals, shared));
        let transformer = NodeTransformer::with_env(
            scope,
            TransformEnv {
                filters: &self.filters,
                tags: &self.tags,
                serializer: &*self.serializer,
            },
        );
        let results = transformer.transform_node(tree)?;
        Ok(results
            .into_iter()
            .next()
            .unwrap_or_else(|| Node::root(Vec::new())))
    }

    /// Serialize a tree back to text with the engine's serializer.
    pub fn stringify(&self, tree: &Node) -> String {
        let nodes = match tree {
            Node::Root(root) => root.children.as_slice(),
            other => std::slice::from_ref(other),
        };
        self.serializer.stringify(nodes)
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterRegistry {
        &mut self.filters
    }

    pub fn tags(&self) -> &TagPluginRegistry {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagPluginRegistry {
        &mut self.tags
    }
}
