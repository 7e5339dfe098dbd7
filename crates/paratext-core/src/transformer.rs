/*
 * transformer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tree transformation.
//!
//! Walks a bundled tree and produces the rendered tree: expression nodes
//! become text, elements with a registered tag plugin are replaced by the
//! plugin's output, fragments splice their children through, and unknown
//! elements keep their wrapper while their children transform in place.
//! Scopes never leak downward implicitly; children are transformed in the
//! same scope unless a plugin creates a child scope on purpose.

use crate::error::{TemplateError, TemplateResult};
use crate::evaluator;
use crate::filters::FilterRegistry;
use crate::scope::Scope;
use crate::tags::{PluginContext, TagPluginRegistry};
use crate::value::{Value, ValueMap};
use crate::writer::TreeSerializer;
use paratext_ast::{Attribute, AttributeValue, Element, Node};
use std::rc::Rc;
use tracing::debug;

/// The fixed surroundings of a transformation run.
#[derive(Clone, Copy)]
pub(crate) struct TransformEnv<'e> {
    pub(crate) filters: &'e FilterRegistry,
    pub(crate) tags: &'e TagPluginRegistry,
    pub(crate) serializer: &'e dyn TreeSerializer,
}

/// Transforms nodes within one scope.
pub struct NodeTransformer<'e> {
    scope: Rc<Scope>,
    env: TransformEnv<'e>,
}

impl<'e> NodeTransformer<'e> {
    pub(crate) fn with_env(scope: Rc<Scope>, env: TransformEnv<'e>) -> Self {
        Self { scope, env }
    }

    /// Transform one node into its replacement nodes.
    pub fn transform_node(&self, node: &Node) -> TemplateResult<Vec<Node>> {
        match node {
            Node::ExpressionInline(expr) => self.transform_expression(&expr.value),
            Node::ExpressionBlock(expr) => self.transform_expression(&expr.value),
            Node::Element(element) => {
                if element.is_fragment() {
                    // fragments splice their children into the parent
                    return self.transform_children(&element.children);
                }
                let name = element.name.clone().unwrap_or_default();
                self.process_element(&name, element)
                    .map_err(|err| TemplateError::Element {
                        name,
                        source: Box::new(err),
                    })
            }
            parent if parent.children().is_some() => {
                let mut rebuilt = parent.clone();
                if let Some(children) = rebuilt.children_mut() {
                    let original = std::mem::take(children);
                    *children = self.transform_children(&original)?;
                }
                Ok(vec![rebuilt])
            }
            leaf => Ok(vec![leaf.clone()]),
        }
    }

    /// Transform a node list in this same scope, splicing replacements flat.
    pub fn transform_children(&self, nodes: &[Node]) -> TemplateResult<Vec<Node>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            out.extend(self.transform_node(node)?);
        }
        Ok(out)
    }

    /// Evaluate expression source in this transformer's scope.
    pub fn resolve_expression(&self, source: &str) -> TemplateResult<Value> {
        evaluator::evaluate(source, &self.scope, self.env.filters)
    }

    fn transform_expression(&self, source: &str) -> TemplateResult<Vec<Node>> {
        match self.resolve_expression(source) {
            Ok(value) => Ok(vec![Node::text(value.stringified())]),
            Err(err) => Err(TemplateError::Evaluation {
                message: format!("Error evaluating expression \"{source}\": {err}"),
            }),
        }
    }

    fn process_element(&self, name: &str, element: &Element) -> TemplateResult<Vec<Node>> {
        if let Some(plugin) = self.env.tags.get(name) {
            debug!(tag = name, "dispatching tag plugin");
            let props = self.evaluate_props(name, &element.attributes)?;
            let context = PluginContext {
                scope: Rc::clone(&self.scope),
                tag_name: name.to_string(),
                env: self.env,
            };
            return plugin.transform(&props, &element.children, &context);
        }
        // no plugin: keep the wrapper, attributes untouched
        let children = self.transform_children(&element.children)?;
        Ok(vec![Node::Element(Element {
            name: Some(name.to_string()),
            attributes: element.attributes.clone(),
            children,
        })])
    }

    fn evaluate_props(&self, element: &str, attributes: &[Attribute]) -> TemplateResult<ValueMap> {
        let mut props = ValueMap::new();
        for attribute in attributes {
            match attribute {
                Attribute::Named { name, value } => {
                    let evaluated = match value {
                        None => Value::String(String::new()),
                        Some(AttributeValue::Literal(text)) => Value::String(text.clone()),
                        Some(AttributeValue::Expression(source)) => {
                            self.resolve_expression(source)?
                        }
                    };
                    props.insert(name.clone(), evaluated);
                }
                Attribute::Spread { .. } => {
                    return Err(TemplateError::UnsupportedAttribute {
                        element: element.to_string(),
                        message: format!("Unsupported attribute type in component <{element}>."),
                    });
                }
            }
        }
        Ok(props)
    }
}
