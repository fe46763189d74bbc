//! Token validation: classify members as groups or tokens.
//!
//! One walk over a resolved tree. An object member carrying `$value` is a
//! token; any other object member is a group whose `$type` is inherited by
//! the tokens below it. Members whose names start with `$` are never
//! classified. Shape checks here are shallow; deep legality is left to
//! normalization.

use std::{collections::HashMap, str::FromStr, sync::Arc};

use indexmap::IndexMap;
use log::trace;
use serde_json::Value;
use url::Url;

use swatch_core::{
    TokenType,
    identifier::{join_id, parent_id},
};

use crate::{
    builder::Source,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    resolve::contains_ref,
    span::Span,
    token::{DEFAULT_MODE, Group, ModeValue, Token, TokenSource},
    tree::{NodeId, NodeKind, Tree},
    walk::{Flow, Visitor, traverse},
};

/// Inherited `$type` of a group: `None` when the group declared an invalid one.
type Inherited = Option<TokenType>;

struct Validator<'a> {
    locator: Option<Url>,
    text: Arc<str>,
    collector: &'a DiagnosticCollector,
    inherited: HashMap<String, Inherited>,
    groups: HashMap<String, Group>,
    tokens: Vec<Token>,
}

impl Visitor for Validator<'_> {
    fn enter(
        &mut self,
        tree: &mut Tree,
        node: NodeId,
        _parent: Option<NodeId>,
        path: &[String],
    ) -> Result<Flow, ParseError> {
        match tree.kind(node) {
            NodeKind::Document => {
                let body = tree.body();
                if tree.get(body, "$value").is_none() {
                    self.group(tree, body, String::new())?;
                }
                Ok(Flow::Continue)
            }
            NodeKind::Member => {
                let name = tree.member_name(node);
                let value = tree.member_value(node);
                if name.starts_with('$') || !matches!(tree.kind(value), NodeKind::Object) {
                    return Ok(Flow::Skip);
                }
                if tree.get(value, "$value").is_some() {
                    self.token(tree, node, path)?;
                    return Ok(Flow::Skip);
                }
                self.group(tree, value, join_id(path))?;
                Ok(Flow::Continue)
            }
            _ => Ok(Flow::Continue),
        }
    }
}

impl Validator<'_> {
    fn report(&self, diagnostic: Diagnostic) -> Result<(), ParseError> {
        self.collector
            .emit(diagnostic.with_source(self.locator.as_ref(), Arc::clone(&self.text)))
    }

    fn report_at(&self, code: ErrorCode, span: Span, message: String) -> Result<(), ParseError> {
        self.report(
            Diagnostic::error(message)
                .with_code(code)
                .with_label(span, code.description()),
        )
    }

    /// Record the metadata and inherited type of a group.
    fn group(&mut self, tree: &Tree, object: NodeId, id: String) -> Result<(), ParseError> {
        let mut group = Group {
            id: id.clone(),
            ..Group::default()
        };

        if let Some(node) = tree.get(object, "$type") {
            let ty = self.parse_type(tree, node)?;
            group.ty = ty;
            self.inherited.insert(id.clone(), ty);
        }
        if let Some(node) = tree.get(object, "$description") {
            group.description = self.description(tree, node)?;
        }
        if let Some(node) = tree.get(object, "$extensions") {
            group.extensions = self.extensions(tree, node)?;
        }

        self.groups.insert(id, group);
        Ok(())
    }

    fn token(&mut self, tree: &Tree, member: NodeId, path: &[String]) -> Result<(), ParseError> {
        let object = tree.member_value(member);
        let id = join_id(path);
        if contains_ref(tree, object) {
            // Already reported by reference resolution
            trace!(token = id.as_str(); "Skipping token with unresolved $ref");
            return Ok(());
        }

        let mut failed = false;

        let ty = match tree.get(object, "$type") {
            Some(node) => self.parse_type(tree, node)?,
            None => match self.inherited_type(path) {
                Some(ty) => ty,
                None => {
                    self.report(
                        Diagnostic::error(format!("token `{id}` has no $type"))
                            .with_code(ErrorCode::E202)
                            .with_label(tree.span(member), ErrorCode::E202.description())
                            .with_help("add `$type` to the token or to one of its groups"),
                    )?;
                    return Ok(());
                }
            },
        };

        let description = match tree.get(object, "$description") {
            Some(node) => {
                let description = self.description(tree, node)?;
                failed |= description.is_none();
                description
            }
            None => None,
        };
        let extensions = match tree.get(object, "$extensions") {
            Some(node) => {
                let extensions = self.extensions(tree, node)?;
                failed |= extensions.is_none();
                extensions
            }
            None => None,
        };
        let deprecated = match tree.get(object, "$deprecated") {
            Some(node) => match tree.kind(node) {
                NodeKind::Boolean(_) | NodeKind::String(_) => Some(tree.to_value(node)),
                other => {
                    self.report_at(
                        ErrorCode::E204,
                        tree.span(node),
                        format!("$deprecated must be a boolean or a string, found {}", other.name()),
                    )?;
                    failed = true;
                    None
                }
            },
            None => None,
        };

        let value_member = tree.find_member(object, "$value");
        let value_node = tree.get(object, "$value");
        let (Some(value_member), Some(value_node), Some(ty)) = (value_member, value_node, ty) else {
            // An invalid type was reported where it was declared
            return Ok(());
        };

        let provenance = tree.provenance(value_node).cloned();
        // A hoisted value keeps the spans of the document it came from
        let value_span = match provenance {
            Some(_) => tree.span(value_member),
            None => tree.span(value_node),
        };

        let raw = tree.to_value(value_node);
        if let Err(message) = ty.check_shape(&raw) {
            self.report_at(ErrorCode::E201, value_span, format!("invalid $value for `{id}`: {message}"))?;
            failed = true;
        }

        let mut mode = IndexMap::new();
        let mut default = ModeValue::new(raw.clone(), value_span);
        default.alias_of = provenance.as_ref().map(|p| p.alias_of.clone());
        mode.insert(DEFAULT_MODE.to_string(), default);

        let modes = tree
            .get(object, "$extensions")
            .and_then(|extensions| tree.get(extensions, "mode"));
        if let Some(modes) = modes {
            if !matches!(tree.kind(modes), NodeKind::Object) {
                self.report_at(
                    ErrorCode::E204,
                    tree.span(modes),
                    format!("$extensions.mode of `{id}` must be an object"),
                )?;
                failed = true;
            }
            for (name, mode_member) in tree.members(modes) {
                let node = tree.member_value(mode_member);
                let raw = tree.to_value(node);
                if let Err(message) = ty.check_shape(&raw) {
                    self.report_at(
                        ErrorCode::E201,
                        tree.span(node),
                        format!("invalid value for mode `{name}` of `{id}`: {message}"),
                    )?;
                    failed = true;
                }
                mode.insert(name.to_string(), ModeValue::new(raw, tree.span(node)));
            }
        }

        if failed {
            return Ok(());
        }

        let group_id = parent_id(&id).unwrap_or_default();
        let group = self.groups.get(group_id).cloned().unwrap_or_else(|| Group {
            id: group_id.to_string(),
            ..Group::default()
        });

        let (alias_of, alias_chain) = match provenance {
            Some(provenance) => (Some(provenance.alias_of), provenance.chain),
            None => (None, Vec::new()),
        };

        trace!(token = id.as_str(), token_type = ty.as_str(); "Validated token");
        self.tokens.push(Token {
            id,
            ty,
            value: None,
            description,
            extensions,
            deprecated,
            raw,
            mode,
            group,
            source: TokenSource {
                locator: self.locator.clone(),
                text: Arc::clone(&self.text),
                span: tree.span(member),
                value_span,
            },
            alias_of,
            alias_chain,
            partial_alias_of: IndexMap::new(),
        });
        Ok(())
    }

    /// The `$type` of the nearest ancestor group that declares one.
    ///
    /// `None` when no ancestor declares a type; `Some(None)` when the nearest
    /// declaration was invalid.
    fn inherited_type(&self, path: &[String]) -> Option<Inherited> {
        (0..path.len())
            .rev()
            .find_map(|len| self.inherited.get(&join_id(&path[..len])).copied())
    }

    /// Parse a `$type` member value, reporting E200 for anything unsupported.
    fn parse_type(&self, tree: &Tree, node: NodeId) -> Result<Inherited, ParseError> {
        let Some(name) = tree.as_str(node) else {
            self.report_at(
                ErrorCode::E200,
                tree.span(node),
                format!("$type must be a string, found {}", tree.kind(node).name()),
            )?;
            return Ok(None);
        };
        match TokenType::from_str(name) {
            Ok(ty) => Ok(Some(ty)),
            Err(message) => {
                let supported: Vec<&str> = TokenType::ALL.iter().map(TokenType::as_str).collect();
                self.report(
                    Diagnostic::error(message)
                        .with_code(ErrorCode::E200)
                        .with_label(tree.span(node), ErrorCode::E200.description())
                        .with_help(format!("supported types are {}", supported.join(", "))),
                )?;
                Ok(None)
            }
        }
    }

    fn description(&self, tree: &Tree, node: NodeId) -> Result<Option<String>, ParseError> {
        match tree.as_str(node) {
            Some(description) => Ok(Some(description.to_string())),
            None => {
                self.report_at(
                    ErrorCode::E204,
                    tree.span(node),
                    format!("$description must be a string, found {}", tree.kind(node).name()),
                )?;
                Ok(None)
            }
        }
    }

    fn extensions(&self, tree: &Tree, node: NodeId) -> Result<Option<Value>, ParseError> {
        match tree.kind(node) {
            NodeKind::Object => Ok(Some(tree.to_value(node))),
            other => {
                self.report_at(
                    ErrorCode::E204,
                    tree.span(node),
                    format!("$extensions must be an object, found {}", other.name()),
                )?;
                Ok(None)
            }
        }
    }
}

/// Validate every token of a resolved source.
///
/// Invalid tokens are reported into `collector` and left out of the result.
pub(crate) fn validate(source: &mut Source, collector: &DiagnosticCollector) -> Result<Vec<Token>, ParseError> {
    let mut validator = Validator {
        locator: source.locator().cloned(),
        text: Arc::clone(source.text()),
        collector,
        inherited: HashMap::new(),
        groups: HashMap::new(),
        tokens: Vec::new(),
    };
    traverse(source.tree_mut(), &mut validator)?;
    Ok(validator.tokens)
}
