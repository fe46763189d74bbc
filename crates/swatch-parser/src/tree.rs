//! Arena-backed, position-tracking syntax tree.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. Substituting a
//! subtree is an update of the parent's child list, so node handles held
//! elsewhere never dangle. Every node keeps the [`Span`] it was parsed from.
//!
//! Shape invariants:
//! - `Document` has exactly one child, the body.
//! - `Member` has exactly two children: the name (`String` or `Identifier`)
//!   and the value.
//! - `Element` has exactly one child, the value.
//! - Member names inside an `Object` need not be unique.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::{
    parser::{NameStyle, Syntax},
    span::{Span, Spanned},
};

/// Handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The tag and payload of a syntax node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Object,
    Member,
    Array,
    Element,
    String(String),
    Number(Number),
    Boolean(bool),
    Null,
    Identifier(String),
}

impl NodeKind {
    /// Node type name, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "Document",
            NodeKind::Object => "Object",
            NodeKind::Member => "Member",
            NodeKind::Array => "Array",
            NodeKind::Element => "Element",
            NodeKind::String(_) => "String",
            NodeKind::Number(_) => "Number",
            NodeKind::Boolean(_) => "Boolean",
            NodeKind::Null => "Null",
            NodeKind::Identifier(_) => "Identifier",
        }
    }
}

/// Where a value substituted by a structural reference came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Token id of the direct target
    pub alias_of: String,
    /// Token ids of every hop, nearest first
    pub chain: Vec<String>,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    span: Span,
    children: Vec<NodeId>,
}

/// A syntax tree for one source document.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
    provenance: HashMap<NodeId, Provenance>,
}

impl Tree {
    /// Lower a parsed document into a tree whose root spans `document_span`.
    pub fn from_syntax(body: Spanned<Syntax>, document_span: Span) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            provenance: HashMap::new(),
        };
        let root = tree.alloc(NodeKind::Document, document_span, Vec::new());
        let body = tree.lower(body);
        tree.nodes[root.index()].children.push(body);
        tree.root = root;
        tree
    }

    fn lower(&mut self, syntax: Spanned<Syntax>) -> NodeId {
        let span = syntax.span();
        match syntax.into_inner() {
            Syntax::Object(members) => {
                let children = members
                    .into_iter()
                    .map(|member| {
                        let member_span = member.span();
                        let name_span = member.name.span();
                        let name_kind = match member.style {
                            NameStyle::Quoted => NodeKind::String(member.name.into_inner()),
                            NameStyle::Bare => NodeKind::Identifier(member.name.into_inner()),
                        };
                        let name = self.alloc(name_kind, name_span, Vec::new());
                        let value = self.lower(member.value);
                        self.alloc(NodeKind::Member, member_span, vec![name, value])
                    })
                    .collect();
                self.alloc(NodeKind::Object, span, children)
            }
            Syntax::Array(elements) => {
                let children = elements
                    .into_iter()
                    .map(|element| {
                        let element_span = element.span();
                        let value = self.lower(element);
                        self.alloc(NodeKind::Element, element_span, vec![value])
                    })
                    .collect();
                self.alloc(NodeKind::Array, span, children)
            }
            Syntax::String(s) => self.alloc(NodeKind::String(s), span, Vec::new()),
            Syntax::Number(n) => self.alloc(NodeKind::Number(n), span, Vec::new()),
            Syntax::Boolean(b) => self.alloc(NodeKind::Boolean(b), span, Vec::new()),
            Syntax::Null => self.alloc(NodeKind::Null, span, Vec::new()),
        }
    }

    /// Allocate a new detached node.
    pub fn alloc(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(NodeData {
            kind,
            span,
            children,
        });
        id
    }

    /// The `Document` node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The document body, normally an `Object`.
    pub fn body(&self) -> NodeId {
        self.children(self.root)[0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Replace the `index`-th child of `parent`.
    pub fn replace_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[parent.index()].children[index] = child;
    }

    /// Replace the whole child list of `parent`.
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        self.nodes[parent.index()].children = children;
    }

    /// Name of a `Member` node.
    pub fn member_name(&self, member: NodeId) -> &str {
        match self.kind(self.children(member)[0]) {
            NodeKind::String(name) | NodeKind::Identifier(name) => name,
            _ => "",
        }
    }

    /// Value of a `Member` or `Element` node.
    pub fn member_value(&self, member: NodeId) -> NodeId {
        let children = self.children(member);
        children[children.len() - 1]
    }

    /// Iterate `(name, member)` pairs of an `Object`, in source order.
    pub fn members(&self, object: NodeId) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        let members = match self.kind(object) {
            NodeKind::Object => self.children(object),
            _ => &[],
        };
        members
            .iter()
            .map(move |&member| (self.member_name(member), member))
    }

    /// The `Member` named `name` in an `Object`; the last one wins when the
    /// name repeats.
    pub fn find_member(&self, object: NodeId, name: &str) -> Option<NodeId> {
        self.members(object)
            .filter(|(member_name, _)| *member_name == name)
            .map(|(_, member)| member)
            .last()
    }

    /// The value of the member named `name` in an `Object`.
    pub fn get(&self, object: NodeId, name: &str) -> Option<NodeId> {
        self.find_member(object, name)
            .map(|member| self.member_value(member))
    }

    /// String payload of a `String` node.
    pub fn as_str(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::String(s) => Some(s),
            _ => None,
        }
    }

    /// Append a member to an `Object`, returning the new `Member` node.
    pub fn push_member(&mut self, object: NodeId, name: &str, value: NodeId) -> NodeId {
        let span = self.span(value);
        let name = self.alloc(NodeKind::String(name.to_string()), span, Vec::new());
        let member = self.alloc(NodeKind::Member, span, vec![name, value]);
        self.nodes[object.index()].children.push(member);
        member
    }

    /// Look up a node by path segments below the document body.
    ///
    /// Object members are matched by name and array elements by index. An
    /// empty path has no target.
    pub fn find(&self, path: &[String]) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }
        path.iter().try_fold(self.body(), |node, segment| match self.kind(node) {
            NodeKind::Object => self.get(node, segment),
            NodeKind::Array => {
                let index: usize = segment.parse().ok()?;
                self.children(node)
                    .get(index)
                    .map(|&element| self.member_value(element))
            }
            _ => None,
        })
    }

    /// Deep-copy the subtree at `id` of `other` into this tree.
    ///
    /// Spans are kept as they were in `other`, and so is provenance.
    pub fn graft(&mut self, other: &Tree, id: NodeId) -> NodeId {
        let children = other
            .children(id)
            .iter()
            .map(|&child| self.graft(other, child))
            .collect();
        let copy = self.alloc(other.kind(id).clone(), other.span(id), children);
        if let Some(provenance) = other.provenance.get(&id) {
            self.provenance.insert(copy, provenance.clone());
        }
        copy
    }

    /// A standalone tree whose body is a copy of the subtree at `id` of
    /// `other`.
    pub fn fragment(other: &Tree, id: NodeId) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            provenance: HashMap::new(),
        };
        let root = tree.alloc(NodeKind::Document, other.span(id), Vec::new());
        let body = tree.graft(other, id);
        tree.nodes[root.index()].children.push(body);
        tree.root = root;
        tree
    }

    /// Record that `id` was substituted through a structural reference.
    pub fn set_provenance(&mut self, id: NodeId, provenance: Provenance) {
        self.provenance.insert(id, provenance);
    }

    pub fn provenance(&self, id: NodeId) -> Option<&Provenance> {
        self.provenance.get(&id)
    }

    /// Convert the subtree at `id` to a plain JSON value.
    ///
    /// Repeated member names keep the last value. Identifiers convert to
    /// strings.
    pub fn to_value(&self, id: NodeId) -> Value {
        match self.kind(id) {
            NodeKind::Document | NodeKind::Member | NodeKind::Element => {
                self.to_value(self.member_value(id))
            }
            NodeKind::Object => {
                let mut map = Map::new();
                for (name, member) in self.members(id) {
                    map.insert(name.to_string(), self.to_value(self.member_value(member)));
                }
                Value::Object(map)
            }
            NodeKind::Array => Value::Array(
                self.children(id)
                    .iter()
                    .map(|&element| self.to_value(element))
                    .collect(),
            ),
            NodeKind::String(s) | NodeKind::Identifier(s) => Value::String(s.clone()),
            NodeKind::Number(n) => Value::Number(n.clone()),
            NodeKind::Boolean(b) => Value::Bool(*b),
            NodeKind::Null => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::tokenize, parser::parse_document};

    fn tree(src: &str) -> Tree {
        let tokens = tokenize(src).unwrap();
        let body = parse_document(&tokens).unwrap();
        Tree::from_syntax(body, Span::new(0..src.len()))
    }

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_member_shape() {
        let src = r#"{"color": {"$value": "red"}}"#;
        let tree = tree(src);
        let body = tree.body();
        assert_eq!(tree.kind(body), &NodeKind::Object);

        let (name, member) = tree.members(body).next().unwrap();
        assert_eq!(name, "color");
        assert_eq!(tree.children(member).len(), 2);
        assert_eq!(&src[tree.span(member).range()], r#""color": {"$value": "red"}"#);
    }

    #[test]
    fn test_find_objects_and_arrays() {
        let tree = tree(r#"{"a": {"list": [10, {"b": true}]}}"#);

        let node = tree.find(&path(&["a", "list", "1", "b"])).unwrap();
        assert_eq!(tree.kind(node), &NodeKind::Boolean(true));

        let node = tree.find(&path(&["a", "list", "0"])).unwrap();
        assert_eq!(tree.to_value(node), serde_json::json!(10));

        assert!(tree.find(&path(&["a", "missing"])).is_none());
        assert!(tree.find(&path(&["a", "list", "7"])).is_none());
        assert!(tree.find(&[]).is_none());
    }

    #[test]
    fn test_duplicate_member_last_wins() {
        let tree = tree(r#"{"a": 1, "a": 2}"#);
        assert_eq!(tree.members(tree.body()).count(), 2);
        assert_eq!(tree.to_value(tree.body()), serde_json::json!({"a": 2}));
    }

    #[test]
    fn test_bare_names_are_identifiers() {
        let tree = tree("{ size: 4 }");
        let (_, member) = tree.members(tree.body()).next().unwrap();
        assert_eq!(
            tree.kind(tree.children(member)[0]),
            &NodeKind::Identifier("size".to_string())
        );
        assert_eq!(tree.get(tree.body(), "size").map(|n| tree.to_value(n)), Some(serde_json::json!(4)));
    }

    #[test]
    fn test_graft_copies_subtree_and_provenance() {
        let mut source = tree(r##"{"brand": {"$value": "#663399"}}"##);
        let brand = source.get(source.body(), "brand").unwrap();
        source.set_provenance(
            brand,
            Provenance {
                alias_of: "x".to_string(),
                chain: vec!["x".to_string()],
            },
        );

        let mut target = tree(r#"{"a": null}"#);
        let copy = target.graft(&source, brand);
        let member = target.find_member(target.body(), "a").unwrap();
        target.replace_child(member, 1, copy);

        assert_eq!(
            target.to_value(target.body()),
            serde_json::json!({"a": {"$value": "#663399"}})
        );
        assert_eq!(target.provenance(copy).map(|p| p.alias_of.as_str()), Some("x"));
    }

    #[test]
    fn test_push_member() {
        let mut tree = tree("{}");
        let value = tree.alloc(NodeKind::Number(3.into()), Span::default(), Vec::new());
        tree.push_member(tree.body(), "n", value);
        assert_eq!(tree.to_value(tree.root()), serde_json::json!({"n": 3}));
    }
}
