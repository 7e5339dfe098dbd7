/*
 * raw.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `<Raw>` verbatim passthrough.
//!
//! Children are serialized back to text without transformation, so embedded
//! expressions and tags survive into the output literally.

use crate::error::TemplateResult;
use crate::tags::{PluginContext, TagPlugin};
use crate::value::ValueMap;
use paratext_ast::Node;

pub struct RawPlugin;

impl TagPlugin for RawPlugin {
    fn transform(
        &self,
        _props: &ValueMap,
        children: &[Node],
        context: &PluginContext,
    ) -> TemplateResult<Vec<Node>> {
        let serialized = context.serialize(children);
        Ok(vec![Node::text(serialized)])
    }
}
