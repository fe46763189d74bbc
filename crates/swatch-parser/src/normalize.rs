//! Normalization stage: canonical values for every resolved token.

use std::{collections::HashSet, sync::Arc};

use log::trace;

use swatch_core::{
    NormalizeError,
    normalize::{normalize, normalize_mode},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    token::{DEFAULT_MODE, Token, TokenSet},
};

fn code_for(err: &NormalizeError) -> ErrorCode {
    match err {
        NormalizeError::MissingUnit(_) => ErrorCode::E303,
        NormalizeError::InvalidColor(_) => ErrorCode::E304,
        NormalizeError::Invalid(_) => ErrorCode::E305,
    }
}

fn report(
    collector: &DiagnosticCollector,
    token: &Token,
    span: Span,
    subject: String,
    err: &NormalizeError,
) -> Result<(), ParseError> {
    let code = code_for(err);
    let mut diagnostic = Diagnostic::error(format!("cannot normalize {subject}: {err}"))
        .with_code(code)
        .with_label(span, code.description())
        .with_source(token.source.locator.as_ref(), Arc::clone(&token.source.text));
    if code == ErrorCode::E303 {
        diagnostic = diagnostic.with_help("add a unit such as `px` or `rem`; only `0` may omit it");
    }
    collector.emit(diagnostic)
}

/// Canonicalize the default and mode values of every token not in `failed`.
///
/// A token whose default value fails keeps `value` unset; a failing mode
/// keeps only that mode unset.
pub(crate) fn normalize_tokens(
    tokens: &mut TokenSet,
    failed: &HashSet<String>,
    collector: &DiagnosticCollector,
) -> Result<(), ParseError> {
    for token in tokens.iter_mut() {
        if failed.contains(&token.id) {
            continue;
        }
        trace!(token = token.id.as_str(); "Normalizing token");

        let base = match normalize(token.ty, &token.raw) {
            Ok(value) => value,
            Err(err) => {
                let subject = format!("`{}`", token.id);
                report(collector, token, token.source.value_span, subject, &err)?;
                continue;
            }
        };

        let mut errors = Vec::new();
        for (name, mode) in token.mode.iter_mut() {
            if name == DEFAULT_MODE {
                mode.value = Some(base.clone());
                continue;
            }
            match normalize_mode(token.ty, &token.raw, &mode.raw) {
                Ok(value) => mode.value = Some(value),
                Err(err) => errors.push((name.clone(), mode.span, err)),
            }
        }
        token.value = Some(base);

        for (name, span, err) in errors {
            let subject = format!("mode `{name}` of `{}`", token.id);
            report(collector, token, span, subject, &err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        alias::resolve_aliases,
        builder::{self, Content},
        validate::validate,
    };

    fn run(text: &str, collector: &DiagnosticCollector) -> Result<TokenSet, ParseError> {
        let mut source = builder::build(Content::from(text), None, None, collector)?
            .expect("document builds");
        let mut tokens = TokenSet::new();
        for token in validate(&mut source, collector)? {
            tokens.insert(token);
        }
        let failed = resolve_aliases(&mut tokens, collector)?;
        normalize_tokens(&mut tokens, &failed, collector)?;
        Ok(tokens)
    }

    #[test]
    fn test_canonical_default_and_modes() {
        let collector = DiagnosticCollector::new(false);
        let tokens = run(
            r#"{"gap": {"$type": "dimension", "$value": "4px", "$extensions": {"mode": {"compact": "2px"}}}}"#,
            &collector,
        )
        .unwrap();
        let gap = tokens.get("gap").unwrap();
        assert_eq!(gap.value.as_ref().unwrap().to_json(), json!({"value": 4.0, "unit": "px"}));
        assert_eq!(gap.mode[DEFAULT_MODE].value, gap.value);
        assert_eq!(
            gap.value_in("compact").unwrap().to_json(),
            json!({"value": 2.0, "unit": "px"})
        );
    }

    #[test]
    fn test_partial_mode_merges_over_base() {
        let collector = DiagnosticCollector::new(false);
        let tokens = run(
            r##"{"frame": {"$type": "border",
                "$value": {"color": "#000000", "width": "1px", "style": "solid"},
                "$extensions": {"mode": {"dark": {"color": "#ffffff"}}}}}"##,
            &collector,
        )
        .unwrap();
        let dark = tokens.get("frame").unwrap().value_in("dark").unwrap().to_json();
        assert_eq!(dark["width"], json!({"value": 1.0, "unit": "px"}));
        assert_eq!(dark["color"]["channels"], json!([1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_error_codes_per_failure() {
        let collector = DiagnosticCollector::new(true);
        let tokens = run(
            r##"{
                "a": {"$type": "dimension", "$value": 4},
                "b": {"$type": "color", "$value": "#zzzzzz"},
                "c": {"$type": "cubicBezier", "$value": [0, 1]},
                "d": {"$type": "dimension", "$value": 0}
            }"##,
            &collector,
        )
        .unwrap();

        let codes: Vec<ErrorCode> = collector.diagnostics().iter().filter_map(Diagnostic::code).collect();
        assert_eq!(codes, vec![ErrorCode::E303, ErrorCode::E304, ErrorCode::E305]);
        assert!(tokens.get("a").unwrap().value.is_none());
        assert!(tokens.get("d").unwrap().value.is_some());
    }

    #[test]
    fn test_failing_mode_keeps_default() {
        let collector = DiagnosticCollector::new(true);
        let tokens = run(
            r#"{"gap": {"$type": "dimension", "$value": "4px", "$extensions": {"mode": {"bad": "12"}}}}"#,
            &collector,
        )
        .unwrap();
        let gap = tokens.get("gap").unwrap();
        assert!(gap.value.is_some());
        assert!(gap.mode["bad"].value.is_none());
        assert!(collector.diagnostics()[0].message().starts_with("cannot normalize mode `bad` of `gap`"));
    }
}
