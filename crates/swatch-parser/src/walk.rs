//! Depth-first traversal over a [`Tree`] with mutation and path tracking.
//!
//! The walker keeps a path of member names from the document body down to
//! the current node; array elements contribute their index as a segment.
//! A `Member` node's own path already ends with its name.
//!
//! Children are re-read from the tree after every visit, so a visitor may
//! replace the children of the node it is entering and the traversal
//! descends into the replacements.

use crate::{
    error::ParseError,
    tree::{NodeId, NodeKind, Tree},
};

/// What the walker does after [`Visitor::enter`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Descend into the node's children.
    Continue,
    /// Do not descend; siblings are still visited.
    Skip,
}

/// Callbacks for [`traverse`].
///
/// Both methods default to doing nothing. Returning `Err` stops the whole
/// traversal.
pub trait Visitor {
    /// Called before the node's children are visited.
    fn enter(
        &mut self,
        _tree: &mut Tree,
        _node: NodeId,
        _parent: Option<NodeId>,
        _path: &[String],
    ) -> Result<Flow, ParseError> {
        Ok(Flow::Continue)
    }

    /// Called after the node's children are visited, or right after `enter`
    /// when the subtree was skipped.
    fn exit(
        &mut self,
        _tree: &mut Tree,
        _node: NodeId,
        _parent: Option<NodeId>,
        _path: &[String],
    ) -> Result<(), ParseError> {
        Ok(())
    }
}

/// Walk `tree` from its document root.
pub fn traverse<V: Visitor + ?Sized>(tree: &mut Tree, visitor: &mut V) -> Result<(), ParseError> {
    let mut path = Vec::new();
    visit(tree, tree.root(), None, &mut path, visitor)
}

fn visit<V: Visitor + ?Sized>(
    tree: &mut Tree,
    node: NodeId,
    parent: Option<NodeId>,
    path: &mut Vec<String>,
    visitor: &mut V,
) -> Result<(), ParseError> {
    let is_member = matches!(tree.kind(node), NodeKind::Member);
    if is_member {
        path.push(tree.member_name(node).to_string());
    }

    if visitor.enter(tree, node, parent, path)? == Flow::Continue {
        let mut index = 0;
        while let Some(&child) = tree.children(node).get(index) {
            let is_element = matches!(tree.kind(child), NodeKind::Element);
            if is_element {
                path.push(index.to_string());
            }
            visit(tree, child, Some(node), path, visitor)?;
            if is_element {
                path.pop();
            }
            index += 1;
        }
    }

    visitor.exit(tree, node, parent, path)?;

    if is_member {
        path.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::tokenize, parser::parse_document, span::Span};

    fn tree(src: &str) -> Tree {
        let tokens = tokenize(src).unwrap();
        Tree::from_syntax(parse_document(&tokens).unwrap(), Span::new(0..src.len()))
    }

    #[derive(Default)]
    struct Recorder {
        entered: Vec<String>,
        exited: Vec<String>,
        skip: Option<&'static str>,
    }

    impl Visitor for Recorder {
        fn enter(
            &mut self,
            tree: &mut Tree,
            node: NodeId,
            _parent: Option<NodeId>,
            path: &[String],
        ) -> Result<Flow, ParseError> {
            self.entered
                .push(format!("{}@{}", tree.kind(node).name(), path.join("/")));
            if matches!(tree.kind(node), NodeKind::Member)
                && self.skip == path.last().map(String::as_str)
            {
                return Ok(Flow::Skip);
            }
            Ok(Flow::Continue)
        }

        fn exit(
            &mut self,
            tree: &mut Tree,
            node: NodeId,
            _parent: Option<NodeId>,
            path: &[String],
        ) -> Result<(), ParseError> {
            self.exited
                .push(format!("{}@{}", tree.kind(node).name(), path.join("/")));
            Ok(())
        }
    }

    #[test]
    fn test_paths_include_member_names_and_indices() {
        let mut tree = tree(r#"{"a": [{"b": 1}]}"#);
        let mut recorder = Recorder::default();
        traverse(&mut tree, &mut recorder).unwrap();

        assert!(recorder.entered.contains(&"Member@a".to_string()));
        assert!(recorder.entered.contains(&"Element@a/0".to_string()));
        assert!(recorder.entered.contains(&"Member@a/0/b".to_string()));
        assert!(recorder.entered.contains(&"Number@a/0/b".to_string()));
        assert_eq!(recorder.entered[0], "Document@");
    }

    #[test]
    fn test_enter_is_preorder_exit_is_postorder() {
        let mut tree = tree(r#"{"a": 1}"#);
        let mut recorder = Recorder::default();
        traverse(&mut tree, &mut recorder).unwrap();

        assert_eq!(recorder.exited.last().map(String::as_str), Some("Document@"));
        assert_eq!(recorder.exited[0], "String@a");
    }

    #[test]
    fn test_skip_prunes_subtree_only() {
        let mut tree = tree(r#"{"a": {"x": 1}, "b": {"y": 2}}"#);
        let mut recorder = Recorder {
            skip: Some("a"),
            ..Default::default()
        };
        traverse(&mut tree, &mut recorder).unwrap();

        assert!(!recorder.entered.iter().any(|e| e.contains("a/x")));
        assert!(recorder.entered.contains(&"Member@b/y".to_string()));
        assert!(recorder.exited.contains(&"Member@a".to_string()));
    }

    /// Replaces `{"$swap": …}` objects with `{"swapped": true}` on enter.
    struct Swapper {
        seen_swapped: bool,
    }

    impl Visitor for Swapper {
        fn enter(
            &mut self,
            tree: &mut Tree,
            node: NodeId,
            _parent: Option<NodeId>,
            path: &[String],
        ) -> Result<Flow, ParseError> {
            if matches!(tree.kind(node), NodeKind::Member) {
                let value = tree.member_value(node);
                if tree.get(value, "$swap").is_some() {
                    let object = tree.alloc(NodeKind::Object, Span::default(), Vec::new());
                    let flag = tree.alloc(NodeKind::Boolean(true), Span::default(), Vec::new());
                    tree.push_member(object, "swapped", flag);
                    tree.replace_child(node, 1, object);
                }
                if path.last().map(String::as_str) == Some("swapped") {
                    self.seen_swapped = true;
                }
            }
            Ok(Flow::Continue)
        }
    }

    #[test]
    fn test_mutation_in_enter_is_visible() {
        let mut tree = tree(r#"{"a": {"$swap": 1}}"#);
        let mut swapper = Swapper {
            seen_swapped: false,
        };
        traverse(&mut tree, &mut swapper).unwrap();

        assert!(swapper.seen_swapped);
        assert_eq!(
            tree.to_value(tree.root()),
            serde_json::json!({"a": {"swapped": true}})
        );
    }
}
