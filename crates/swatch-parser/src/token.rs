//! Token records produced by the pipeline.
//!
//! A [`Token`] is created by validation with its raw `$value`, filled in by
//! alias resolution (provenance, group membership) and normalization
//! (canonical values), then handed to the caller inside a [`TokenSet`].

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};
use url::Url;

use swatch_core::{TokenType, TokenValue, identifier::split_id};

use crate::span::Span;

/// Name of the default mode; its value mirrors `$value`.
pub const DEFAULT_MODE: &str = ".";

/// A value of a token under one mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeValue {
    /// Input to normalization: the declared value with aliases substituted
    #[serde(skip)]
    pub raw: Value,
    /// Canonical value, unset when normalization failed
    #[serde(rename = "$value", skip_serializing_if = "Option::is_none")]
    pub value: Option<TokenValue>,
    /// Token the whole mode value aliases
    #[serde(rename = "aliasOf", skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    #[serde(skip)]
    pub span: Span,
}

impl ModeValue {
    pub(crate) fn new(raw: Value, span: Span) -> Self {
        Self {
            raw,
            value: None,
            alias_of: None,
            span,
        }
    }
}

/// Metadata of the group that directly contains a token.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Group {
    /// Dot-joined id of the group; empty for the document root
    pub id: String,
    #[serde(rename = "$description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "$type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TokenType>,
    #[serde(rename = "$extensions", skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
    /// Ids of every token nested under the group, sorted
    pub tokens: Vec<String>,
}

/// Where a token was declared.
#[derive(Debug, Clone, Serialize)]
pub struct TokenSource {
    /// Locator of the input, when it has one
    pub locator: Option<Url>,
    /// Canonical text of the input
    #[serde(skip)]
    pub text: Arc<str>,
    /// The token's member
    #[serde(skip)]
    pub span: Span,
    /// The token's `$value`
    #[serde(skip)]
    pub value_span: Span,
}

/// A validated design token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Dot-joined path, unique across all inputs
    pub id: String,
    #[serde(rename = "$type")]
    pub ty: TokenType,
    /// Canonical value, unset when any stage failed for this token
    #[serde(rename = "$value", skip_serializing_if = "Option::is_none")]
    pub value: Option<TokenValue>,
    #[serde(rename = "$description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "$extensions", skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
    #[serde(rename = "$deprecated", skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Value>,
    /// `$value` as declared, after structural references
    #[serde(skip)]
    pub raw: Value,
    /// Values per mode name, `"."` first
    pub mode: IndexMap<String, ModeValue>,
    pub group: Group,
    pub source: TokenSource,
    /// Token the whole `$value` aliases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    /// Every token on the way to the final value, nearest first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alias_chain: Vec<String>,
    /// Aliases inside composite values, by field path
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub partial_alias_of: IndexMap<String, String>,
}

impl Token {
    /// The canonical value under `mode`, falling back to the default mode.
    pub fn value_in(&self, mode: &str) -> Option<&TokenValue> {
        self.mode
            .get(mode)
            .and_then(|mode| mode.value.as_ref())
            .or(self.value.as_ref())
    }

    /// Names of the explicit modes, without `"."`.
    pub fn mode_names(&self) -> impl Iterator<Item = &str> {
        self.mode
            .keys()
            .map(String::as_str)
            .filter(|name| *name != DEFAULT_MODE)
    }
}

/// Tokens by id, in declaration order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct TokenSet {
    tokens: IndexMap<String, Token>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Token> {
        self.tokens.get_mut(id)
    }

    /// Insert a token, returning the one it replaces.
    pub fn insert(&mut self, token: Token) -> Option<Token> {
        self.tokens.insert(token.id.clone(), token)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tokens.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Token> {
        self.tokens.values_mut()
    }

    /// Render the set as a token document with canonical values.
    ///
    /// Tokens nest by id; tokens without a canonical value are left out.
    /// Mode values are written to `$extensions.mode`.
    pub fn to_document(&self) -> Value {
        let mut root = Map::new();
        'tokens: for token in self.tokens.values() {
            let Some(value) = &token.value else {
                continue;
            };
            let segments: Vec<&str> = split_id(&token.id).collect();
            let Some((name, groups)) = segments.split_last() else {
                continue;
            };

            let mut node = &mut root;
            for (depth, segment) in groups.iter().enumerate() {
                let entry = node
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                // A token cannot also hold children.
                let Value::Object(group) = entry else {
                    continue 'tokens;
                };
                if depth + 1 == groups.len() && !group.contains_key("$description") {
                    if let Some(description) = &token.group.description {
                        group.insert("$description".to_string(), json!(description));
                    }
                }
                node = group;
            }

            node.insert(name.to_string(), token_entry(token, value));
        }
        Value::Object(root)
    }
}

fn token_entry(token: &Token, value: &TokenValue) -> Value {
    let mut entry = Map::new();
    entry.insert("$type".to_string(), json!(token.ty.as_str()));
    entry.insert("$value".to_string(), value.to_json());
    if let Some(description) = &token.description {
        entry.insert("$description".to_string(), json!(description));
    }
    if let Some(deprecated) = &token.deprecated {
        entry.insert("$deprecated".to_string(), deprecated.clone());
    }

    let modes: Map<String, Value> = token
        .mode
        .iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_MODE)
        .filter_map(|(name, mode)| mode.value.as_ref().map(|v| (name.clone(), v.to_json())))
        .collect();
    let mut extensions = match &token.extensions {
        Some(Value::Object(extensions)) => extensions.clone(),
        _ => Map::new(),
    };
    if modes.is_empty() {
        extensions.remove("mode");
    } else {
        extensions.insert("mode".to_string(), Value::Object(modes));
    }
    if !extensions.is_empty() {
        entry.insert("$extensions".to_string(), Value::Object(extensions));
    }
    Value::Object(entry)
}

impl<'a> IntoIterator for &'a TokenSet {
    type Item = &'a Token;
    type IntoIter = indexmap::map::Values<'a, String, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.values()
    }
}

#[cfg(test)]
mod tests {
    use swatch_core::dimension::DimensionValue;

    use super::*;

    fn token(id: &str, value: TokenValue) -> Token {
        let raw = value.to_json();
        let mut mode = IndexMap::new();
        let mut default = ModeValue::new(raw.clone(), Span::default());
        default.value = Some(value.clone());
        mode.insert(DEFAULT_MODE.to_string(), default);
        Token {
            id: id.to_string(),
            ty: TokenType::Dimension,
            value: Some(value),
            description: None,
            extensions: None,
            deprecated: None,
            raw,
            mode,
            group: Group::default(),
            source: TokenSource {
                locator: None,
                text: Arc::from(""),
                span: Span::default(),
                value_span: Span::default(),
            },
            alias_of: None,
            alias_chain: Vec::new(),
            partial_alias_of: IndexMap::new(),
        }
    }

    fn px(n: f64) -> TokenValue {
        TokenValue::Dimension(DimensionValue::new(n, "px"))
    }

    #[test]
    fn test_value_in_falls_back_to_default() {
        let mut t = token("space.sm", px(4.0));
        let mut compact = ModeValue::new(json!("2px"), Span::default());
        compact.value = Some(px(2.0));
        t.mode.insert("compact".to_string(), compact);

        assert_eq!(t.value_in("compact"), Some(&px(2.0)));
        assert_eq!(t.value_in("spacious"), Some(&px(4.0)));
        assert_eq!(t.mode_names().collect::<Vec<_>>(), vec!["compact"]);
    }

    #[test]
    fn test_to_document_nests_by_id() {
        let mut set = TokenSet::new();
        let mut sm = token("space.sm", px(4.0));
        sm.group.description = Some("Spacing scale".to_string());
        set.insert(sm);
        set.insert(token("space.md", px(8.0)));

        let doc = set.to_document();
        assert_eq!(doc["space"]["$description"], json!("Spacing scale"));
        assert_eq!(
            doc["space"]["md"],
            json!({"$type": "dimension", "$value": {"value": 8.0, "unit": "px"}})
        );
    }

    #[test]
    fn test_to_document_writes_modes() {
        let mut set = TokenSet::new();
        let mut t = token("gap", px(4.0));
        let mut compact = ModeValue::new(json!("2px"), Span::default());
        compact.value = Some(px(2.0));
        t.mode.insert("compact".to_string(), compact);
        set.insert(t);

        let doc = set.to_document();
        assert_eq!(
            doc["gap"]["$extensions"]["mode"]["compact"],
            json!({"value": 2.0, "unit": "px"})
        );
    }

    #[test]
    fn test_insert_replaces() {
        let mut set = TokenSet::new();
        assert!(set.insert(token("a", px(1.0))).is_none());
        let previous = set.insert(token("a", px(2.0))).unwrap();
        assert_eq!(previous.value, Some(px(1.0)));
        assert_eq!(set.len(), 1);
    }
}
