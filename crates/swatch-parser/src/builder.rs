//! Document builder: raw input into a [`Source`] with a syntax tree.
//!
//! Text that looks like a brace-delimited document is lexed and parsed as
//! JSONC directly. Any other text goes through the configured
//! [`GrammarAdapter`]; in-memory values and adapter output are serialized as
//! pretty-printed JSON first, so every tree has canonical text to point into.

use std::{fmt, sync::Arc};

use log::debug;
use serde_json::Value;
use url::Url;

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    lexer, parser,
    span::Span,
    tree::{NodeKind, Tree},
};

/// Raw content of one input.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Source text, JSONC or an alternate grammar.
    Text(String),
    /// An already-decoded document.
    Value(Value),
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Content::Value(value)
    }
}

/// Converts text in an alternate grammar (such as YAML) into a document value.
pub trait GrammarAdapter: Send + Sync + fmt::Debug {
    /// Grammar name, used in diagnostics.
    fn name(&self) -> &str;

    /// Decode `text`, or describe why it is not valid in this grammar.
    fn to_value(&self, text: &str) -> Result<Value, String>;
}

/// One parsed input document.
#[derive(Debug, Clone)]
pub struct Source {
    locator: Option<Url>,
    text: Arc<str>,
    tree: Tree,
}

impl Source {
    pub fn locator(&self) -> Option<&Url> {
        self.locator.as_ref()
    }

    /// Canonical text the tree's spans point into.
    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Attach this source's locator and text to a diagnostic.
    pub fn attach(&self, diagnostic: Diagnostic) -> Diagnostic {
        diagnostic.with_source(self.locator.as_ref(), Arc::clone(&self.text))
    }
}

/// Whether `text` should be parsed as JSONC rather than an alternate grammar.
pub fn looks_structural(text: &str) -> bool {
    text.trim().starts_with('{')
}

/// Build a [`Source`] from raw content.
///
/// Grammar errors are emitted into `collector`; when the collector continues
/// on error, `Ok(None)` is returned in their place. A string that needs an
/// alternate grammar while no adapter is configured is fatal.
pub fn build(
    content: Content,
    locator: Option<&Url>,
    adapter: Option<&dyn GrammarAdapter>,
    collector: &DiagnosticCollector,
) -> Result<Option<Source>, ParseError> {
    let text = match content {
        Content::Text(text) if looks_structural(&text) => text,
        Content::Text(text) => {
            let Some(adapter) = adapter else {
                return Err(collector.fatal(located(
                    Diagnostic::error("input is not a JSON document and no alternate grammar is configured")
                        .with_code(ErrorCode::E007)
                        .with_help("enable the `yaml` feature and pass `YamlGrammar` as the grammar adapter"),
                    locator,
                )));
            };
            match adapter.to_value(&text) {
                Ok(value) => serialize(&value, locator, collector)?,
                Err(message) => {
                    collector.emit(located(
                        Diagnostic::error(format!("invalid {}: {message}", adapter.name()))
                            .with_code(ErrorCode::E008),
                        locator,
                    ))?;
                    return Ok(None);
                }
            }
        }
        Content::Value(value) => serialize(&value, locator, collector)?,
    };

    let text: Arc<str> = Arc::from(text);
    let attach = |diagnostic: Diagnostic| diagnostic.with_source(locator, Arc::clone(&text));

    let tokens = match lexer::tokenize(&text) {
        Ok(tokens) => tokens,
        Err(err) => {
            for diagnostic in err.into_diagnostics() {
                collector.emit(attach(diagnostic))?;
            }
            return Ok(None);
        }
    };

    let body = match parser::parse_document(&tokens) {
        Ok(body) => body,
        Err(diagnostic) => {
            collector.emit(attach(diagnostic))?;
            return Ok(None);
        }
    };

    let tree = Tree::from_syntax(body, Span::new(0..text.len()));
    let body = tree.body();
    if !matches!(tree.kind(body), NodeKind::Object) {
        collector.emit(attach(
            Diagnostic::error(format!(
                "document root must be an object, found {}",
                tree.kind(body).name()
            ))
            .with_code(ErrorCode::E001)
            .with_label(tree.span(body), "expected `{`"),
        ))?;
        return Ok(None);
    }

    debug!(locator = locator.map_or("-", Url::as_str), bytes = text.len(); "Built document tree");

    Ok(Some(Source {
        locator: locator.cloned(),
        text,
        tree,
    }))
}

fn located(diagnostic: Diagnostic, locator: Option<&Url>) -> Diagnostic {
    match locator {
        Some(url) => diagnostic.with_locator(url),
        None => diagnostic,
    }
}

fn serialize(
    value: &Value,
    locator: Option<&Url>,
    collector: &DiagnosticCollector,
) -> Result<String, ParseError> {
    serde_json::to_string_pretty(value).map_err(|err| {
        collector.fatal(located(
            Diagnostic::error(format!("input cannot be serialized: {err}")).with_code(ErrorCode::E001),
            locator,
        ))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug)]
    struct Lines;

    /// Toy grammar: `key=value` per line.
    impl GrammarAdapter for Lines {
        fn name(&self) -> &str {
            "lines"
        }

        fn to_value(&self, text: &str) -> Result<Value, String> {
            let mut map = serde_json::Map::new();
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                let (key, value) = line
                    .split_once('=')
                    .ok_or_else(|| format!("missing `=` in {line:?}"))?;
                map.insert(key.trim().to_string(), json!({ "$value": value.trim() }));
            }
            Ok(Value::Object(map))
        }
    }

    #[test]
    fn test_looks_structural() {
        assert!(looks_structural("  \n{ }"));
        assert!(!looks_structural("color: red"));
        assert!(!looks_structural("[1]"));
    }

    #[test]
    fn test_build_text_keeps_source() {
        let collector = DiagnosticCollector::new(false);
        let src = "{ \"a\": { \"$value\": 1 } } // trailing";
        let source = build(Content::from(src), None, None, &collector)
            .unwrap()
            .unwrap();
        assert_eq!(&**source.text(), src);
        assert_eq!(
            source.tree().to_value(source.tree().root()),
            json!({"a": {"$value": 1}})
        );
    }

    #[test]
    fn test_build_value_is_pretty_printed() {
        let collector = DiagnosticCollector::new(false);
        let value = json!({"size": {"$type": "dimension", "$value": "4px"}});
        let source = build(Content::from(value.clone()), None, None, &collector)
            .unwrap()
            .unwrap();
        assert_eq!(&**source.text(), serde_json::to_string_pretty(&value).unwrap());

        let tree = source.tree();
        let size = tree.get(tree.body(), "size").unwrap();
        assert!(source.text()[tree.span(size).range()].starts_with('{'));
    }

    #[test]
    fn test_missing_adapter_is_fatal_even_when_continuing() {
        let collector = DiagnosticCollector::new(true);
        let err = build(Content::from("a: 1"), None, None, &collector).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E007));
    }

    #[test]
    fn test_adapter_output_is_canonical_json() {
        let collector = DiagnosticCollector::new(false);
        let source = build(Content::from("brand = #663399\n"), None, Some(&Lines), &collector)
            .unwrap()
            .unwrap();
        assert!(source.text().starts_with('{'));
        assert_eq!(
            source.tree().to_value(source.tree().root()),
            json!({"brand": {"$value": "#663399"}})
        );
    }

    #[test]
    fn test_adapter_failure() {
        let collector = DiagnosticCollector::new(true);
        let built = build(Content::from("nonsense"), None, Some(&Lines), &collector).unwrap();
        assert!(built.is_none());
        assert_eq!(collector.diagnostics()[0].code(), Some(ErrorCode::E008));
    }

    #[test]
    fn test_grammar_errors_carry_source() {
        let collector = DiagnosticCollector::new(false);
        let url = Url::parse("file:///tokens/bad.json").unwrap();
        let err = build(Content::from("{ \"a\" 1 }"), Some(&url), None, &collector).unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E002));
        assert_eq!(diag.locator(), Some(&url));
        assert!(diag.source_text().is_some());
    }

    #[test]
    fn test_non_object_root() {
        let collector = DiagnosticCollector::new(true);
        let built = build(Content::from(json!([1, 2])), None, None, &collector).unwrap();
        assert!(built.is_none());
        assert_eq!(collector.diagnostics()[0].code(), Some(ErrorCode::E001));
    }
}
