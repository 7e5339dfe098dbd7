/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tag plugins and their registry.
//!
//! A tag plugin owns the transformation of one or more element names. The
//! transformer hands it the evaluated props, the element's untransformed
//! children, and a context carrying the active scope plus hooks back into
//! child transformation, serialization, and expression evaluation. Whatever
//! nodes the plugin returns replace the element in the output tree.

pub mod conditional;
pub mod foreach;
pub mod raw;

pub use conditional::ConditionalPlugin;
pub use foreach::ForEachPlugin;
pub use raw::RawPlugin;

use crate::error::TemplateResult;
use crate::evaluator;
use crate::scope::Scope;
use crate::transformer::{NodeTransformer, TransformEnv};
use crate::value::{Value, ValueMap};
use indexmap::IndexMap;
use paratext_ast::{BlockTemplate, Node};
use std::rc::Rc;

/// A transformation hook for one or more element names.
pub trait TagPlugin {
    /// Replace the element with the returned nodes.
    fn transform(
        &self,
        props: &ValueMap,
        children: &[Node],
        context: &PluginContext,
    ) -> TemplateResult<Vec<Node>>;
}

/// What a plugin sees while transforming an element.
pub struct PluginContext<'e> {
    /// The scope active at the element.
    pub scope: Rc<Scope>,
    /// The element name that selected the plugin.
    pub tag_name: String,
    pub(crate) env: TransformEnv<'e>,
}

impl<'e> PluginContext<'e> {
    /// A transformer bound to the given scope, for transforming children.
    pub fn transformer(&self, scope: Rc<Scope>) -> NodeTransformer<'e> {
        NodeTransformer::with_env(scope, self.env)
    }

    /// Serialize nodes back to text with the engine's serializer.
    pub fn serialize(&self, nodes: &[Node]) -> String {
        self.env.serializer.stringify(nodes)
    }

    /// Evaluate expression source in the element's scope.
    pub fn evaluate(&self, source: &str) -> TemplateResult<Value> {
        evaluator::evaluate(source, &self.scope, self.env.filters)
    }
}

/// An explicit, instance-scoped collection of tag plugins.
#[derive(Clone, Default)]
pub struct TagPluginRegistry {
    plugins: IndexMap<String, Rc<dyn TagPlugin>>,
}

impl TagPluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            plugins: IndexMap::new(),
        }
    }

    /// Create a registry preloaded with the built-in plugins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Register one plugin instance under each of the given names.
    pub fn register(&mut self, plugin: Rc<dyn TagPlugin>, names: &[&str]) {
        for name in names {
            self.plugins.insert((*name).to_string(), Rc::clone(&plugin));
        }
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn TagPlugin>> {
        self.plugins.get(name).cloned()
    }

    /// All registered plugins, keyed by name, in registration order.
    pub fn get_all(&self) -> IndexMap<String, Rc<dyn TagPlugin>> {
        self.plugins.clone()
    }

    pub fn remove(&mut self, name: &str) -> Option<Rc<dyn TagPlugin>> {
        self.plugins.shift_remove(name)
    }

    pub fn remove_all(&mut self) {
        self.plugins.clear();
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Register the built-in plugins onto an existing registry.
pub fn register_builtins(registry: &mut TagPluginRegistry) {
    registry.register(Rc::new(ConditionalPlugin), &["If", "ElseIf", "Else"]);
    registry.register(Rc::new(ForEachPlugin), &["ForEach"]);
    registry.register(Rc::new(RawPlugin), &["Raw"]);
}

/// The arrow-function template a node carries, if any.
pub fn block_template(node: &Node) -> Option<&BlockTemplate> {
    match node {
        Node::ExpressionBlock(block) => block.template.as_ref(),
        _ => None,
    }
}

/// Flatten unnamed fragment wrappers, recursively.
pub fn unwrap_fragments(nodes: &[Node]) -> Vec<Node> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            Node::Element(element) if element.name.is_none() => {
                out.extend(unwrap_fragments(&element.children));
            }
            other => out.push(other.clone()),
        }
    }
    out
}
