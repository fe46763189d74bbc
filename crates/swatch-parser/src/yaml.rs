//! YAML as an alternate grammar.

use serde_json::Value;

use crate::builder::GrammarAdapter;

/// Decodes YAML documents with `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlGrammar;

impl GrammarAdapter for YamlGrammar {
    fn name(&self) -> &str {
        "YAML"
    }

    fn to_value(&self, text: &str) -> Result<Value, String> {
        serde_yaml::from_str(text).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        builder::{Content, build},
        error::{DiagnosticCollector, ErrorCode},
    };

    #[test]
    fn test_decodes_mapping() {
        let value = YamlGrammar
            .to_value("color:\n  $type: color\n  brand:\n    $value: \"#663399\"\n")
            .unwrap();
        assert_eq!(
            value,
            json!({"color": {"$type": "color", "brand": {"$value": "#663399"}}})
        );
    }

    #[test]
    fn test_builds_canonical_text() {
        let collector = DiagnosticCollector::new(false);
        let source = build(
            Content::from("size:\n  $type: number\n  $value: 4\n"),
            None,
            Some(&YamlGrammar),
            &collector,
        )
        .unwrap()
        .unwrap();
        assert!(source.text().starts_with('{'));
        assert_eq!(
            source.tree().to_value(source.tree().root()),
            json!({"size": {"$type": "number", "$value": 4}})
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let collector = DiagnosticCollector::new(true);
        let source = build(Content::from("a: [unclosed"), None, Some(&YamlGrammar), &collector).unwrap();
        assert!(source.is_none());
        assert_eq!(collector.diagnostics()[0].code(), Some(ErrorCode::E008));
    }
}
