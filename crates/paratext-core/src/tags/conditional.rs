/*
 * conditional.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `<If>` / `<ElseIf>` / `<Else>` branching.
//!
//! Sibling branches coordinate through a `conditionMet` binding local to
//! the scope the chain appears in. The first branch to render flips it, and
//! every later branch in the same scope sees the flag and yields nothing.
//! Branches inside a rendered body get a child scope, so nested chains
//! track their own flag.

use crate::error::{TemplateError, TemplateResult};
use crate::scope::Bindings;
use crate::tags::{PluginContext, TagPlugin};
use crate::value::{Value, ValueMap};
use paratext_ast::Node;

const CONDITION_MET: &str = "conditionMet";

pub struct ConditionalPlugin;

impl TagPlugin for ConditionalPlugin {
    fn transform(
        &self,
        props: &ValueMap,
        children: &[Node],
        context: &PluginContext,
    ) -> TemplateResult<Vec<Node>> {
        let met = match context.scope.get_local(CONDITION_MET) {
            Some(flag) => flag.is_truthy(),
            None => {
                context.scope.set_local(CONDITION_MET, Value::Bool(false));
                false
            }
        };
        if met {
            return Ok(Vec::new());
        }

        let tag = context.tag_name.as_str();
        match tag {
            "If" | "ElseIf" => {
                let Some(Value::Bool(condition)) = props.get("condition") else {
                    return Err(TemplateError::Plugin {
                        tag: tag.to_string(),
                        message: format!(
                            "The 'condition' prop for <{tag}> must be a boolean."
                        ),
                    });
                };
                if *condition {
                    render_branch(children, context)
                } else {
                    Ok(Vec::new())
                }
            }
            "Else" => render_branch(children, context),
            other => Err(TemplateError::Plugin {
                tag: other.to_string(),
                message: format!("Unsupported element type: {other}"),
            }),
        }
    }
}

fn render_branch(children: &[Node], context: &PluginContext) -> TemplateResult<Vec<Node>> {
    context.scope.set_local(CONDITION_MET, Value::Bool(true));
    let branch_scope = context.scope.create_child(Bindings::new());
    context.transformer(branch_scope).transform_children(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterRegistry;
    use crate::scope::Scope;
    use crate::tags::TagPluginRegistry;
    use crate::transformer::TransformEnv;
    use crate::writer::MarkdownWriter;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Fixture {
        filters: FilterRegistry,
        tags: TagPluginRegistry,
        writer: MarkdownWriter,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                filters: FilterRegistry::with_builtins(),
                tags: TagPluginRegistry::with_builtins(),
                writer: MarkdownWriter::new(),
            }
        }

        fn context(&self, tag: &str, scope: &Rc<Scope>) -> PluginContext<'_> {
            PluginContext {
                scope: Rc::clone(scope),
                tag_name: tag.to_string(),
                env: TransformEnv {
                    filters: &self.filters,
                    tags: &self.tags,
                    serializer: &self.writer,
                },
            }
        }
    }

    fn fresh_scope() -> Rc<Scope> {
        Rc::new(Scope::new(
            Bindings::new(),
            Rc::new(RefCell::new(Bindings::new())),
        ))
    }

    fn bool_props(value: bool) -> ValueMap {
        let mut props = ValueMap::new();
        props.insert("condition".to_string(), Value::Bool(value));
        props
    }

    #[test]
    fn test_true_branch_renders_and_flags_the_scope() {
        let fixture = Fixture::new();
        let scope = fresh_scope();
        let context = fixture.context("If", &scope);
        let out = ConditionalPlugin
            .transform(&bool_props(true), &[Node::text("yes")], &context)
            .unwrap();
        assert_eq!(out, vec![Node::text("yes")]);
        assert_eq!(scope.get_local("conditionMet"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_later_branches_skip_after_a_match() {
        let fixture = Fixture::new();
        let scope = fresh_scope();
        let context = fixture.context("If", &scope);
        ConditionalPlugin
            .transform(&bool_props(true), &[Node::text("first")], &context)
            .unwrap();

        let else_context = fixture.context("Else", &scope);
        let out = ConditionalPlugin
            .transform(&ValueMap::new(), &[Node::text("second")], &else_context)
            .unwrap();
        assert_eq!(out, Vec::<Node>::new());
    }

    #[test]
    fn test_else_renders_when_nothing_matched() {
        let fixture = Fixture::new();
        let scope = fresh_scope();
        let context = fixture.context("If", &scope);
        ConditionalPlugin
            .transform(&bool_props(false), &[Node::text("first")], &context)
            .unwrap();

        let else_context = fixture.context("Else", &scope);
        let out = ConditionalPlugin
            .transform(&ValueMap::new(), &[Node::text("fallback")], &else_context)
            .unwrap();
        assert_eq!(out, vec![Node::text("fallback")]);
    }

    #[test]
    fn test_condition_must_be_a_boolean() {
        let fixture = Fixture::new();
        let scope = fresh_scope();
        let context = fixture.context("If", &scope);
        let mut props = ValueMap::new();
        props.insert("condition".to_string(), Value::Number(1.0));
        let err = ConditionalPlugin
            .transform(&props, &[], &context)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The 'condition' prop for <If> must be a boolean."
        );
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let fixture = Fixture::new();
        let scope = fresh_scope();
        let context = fixture.context("Unless", &scope);
        let err = ConditionalPlugin
            .transform(&ValueMap::new(), &[], &context)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported element type: Unless");
    }
}
