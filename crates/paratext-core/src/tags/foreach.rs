/*
 * foreach.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `<ForEach>` iteration.
//!
//! The element's single child must be an arrow-function block. Its body is
//! instantiated once per element of the `arr` prop, with the first parameter
//! bound to the element and the optional second parameter bound to the
//! index. When every produced node is list-shaped the groups merge into one
//! list, so iterating list items yields a single list in the output.

use crate::error::{TemplateError, TemplateResult};
use crate::scope::Bindings;
use crate::tags::{block_template, unwrap_fragments, PluginContext, TagPlugin};
use crate::value::{Value, ValueMap};
use paratext_ast::Node;

pub struct ForEachPlugin;

impl TagPlugin for ForEachPlugin {
    fn transform(
        &self,
        props: &ValueMap,
        children: &[Node],
        context: &PluginContext,
    ) -> TemplateResult<Vec<Node>> {
        let fail = |message: &str| TemplateError::Plugin {
            tag: context.tag_name.clone(),
            message: message.to_string(),
        };

        if children.len() != 1 {
            return Err(fail("ForEach expects exactly one child function."));
        }
        let Some(template) = block_template(&children[0]) else {
            return Err(fail("ForEach expects a function as its child."));
        };
        let Some(item_param) = template.params.first() else {
            return Err(fail("Function must have at least one parameter."));
        };
        let index_param = template.params.get(1);
        let body = unwrap_fragments(&template.body);

        let Some(Value::Array(items)) = props.get("arr") else {
            return Err(fail("The 'arr' prop for <ForEach> must be an array."));
        };

        let mut groups = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let mut bindings = Bindings::new();
            bindings.insert(item_param.clone(), item.clone());
            if let Some(index_param) = index_param {
                bindings.insert(index_param.clone(), Value::Number(index as f64));
            }
            let iteration_scope = context.scope.create_child(bindings);
            groups.push(context.transformer(iteration_scope).transform_children(&body)?);
        }
        Ok(merge_list_output(groups))
    }
}

/// Merge per-item output into one list when every node is list-shaped.
fn merge_list_output(groups: Vec<Vec<Node>>) -> Vec<Node> {
    let list_shaped = groups
        .iter()
        .flatten()
        .all(|node| matches!(node, Node::List(_) | Node::ListItem(_)));
    if !list_shaped {
        return groups.into_iter().flatten().collect();
    }
    let mut items = Vec::new();
    for node in groups.into_iter().flatten() {
        match node {
            Node::List(list) => items.extend(list.children),
            other => items.push(other),
        }
    }
    vec![Node::list(false, items)]
}
