/*
 * frontmatter.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Front matter extraction.

use crate::error::TemplateResult;
use crate::value::Value;
use paratext_ast::Node;

/// Decode the first YAML front matter block at the top level of `tree`.
///
/// Returns `Ok(None)` when the tree has no YAML block or the block is
/// blank. Invalid YAML is an error rather than `None`, since a document
/// that carries front matter usually depends on it.
pub fn front_matter(tree: &Node) -> TemplateResult<Option<Value>> {
    let children = match tree {
        Node::Root(root) => root.children.as_slice(),
        other => std::slice::from_ref(other),
    };
    for node in children {
        let Node::Yaml(yaml) = node else {
            continue;
        };
        if yaml.value.trim().is_empty() {
            return Ok(None);
        }
        let decoded: serde_json::Value = serde_yaml::from_str(&yaml.value)?;
        return Ok(Some(Value::from(decoded)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reads_mapping_front_matter() {
        let tree = Node::root(vec![
            Node::yaml("title: Hello\ncount: 2"),
            Node::paragraph(vec![Node::text("body")]),
        ]);
        let matter = front_matter(&tree).unwrap().unwrap();
        let Value::Object(map) = matter else {
            panic!("expected an object");
        };
        assert_eq!(map.get("title"), Some(&Value::String("Hello".to_string())));
        assert_eq!(map.get("count"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_missing_front_matter_is_none() {
        let tree = Node::root(vec![Node::paragraph(vec![Node::text("body")])]);
        assert_eq!(front_matter(&tree).unwrap(), None);
    }

    #[test]
    fn test_blank_front_matter_is_none() {
        let tree = Node::root(vec![Node::yaml("  \n")]);
        assert_eq!(front_matter(&tree).unwrap(), None);
    }

    #[test]
    fn test_invalid_front_matter_is_an_error() {
        let tree = Node::root(vec![Node::yaml("title: [unclosed")]);
        let err = front_matter(&tree).unwrap_err();
        assert!(err.to_string().starts_with("Invalid front matter:"));
    }

    #[test]
    fn test_scalar_front_matter() {
        let tree = Node::root(vec![Node::yaml("42")]);
        assert_eq!(front_matter(&tree).unwrap(), Some(Value::Number(42.0)));
    }

    #[test]
    fn test_bare_yaml_node() {
        let matter = front_matter(&Node::yaml("name: solo")).unwrap().unwrap();
        let Value::Object(map) = matter else {
            panic!("expected an object");
        };
        assert_eq!(map.get("name"), Some(&Value::String("solo".to_string())));
    }
}
