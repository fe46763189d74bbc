//! Value normalization entry points.
//!
//! [`normalize`] canonicalizes one alias-free value for its type;
//! [`normalize_mode`] does the same for a mode override, first merging it over
//! the base value when the type allows partial overrides.

use log::trace;
use serde_json::Value;

use crate::{error::NormalizeError, token_type::TokenType, value::TokenValue};

/// Canonicalize `value` as a `ty` token.
pub fn normalize(ty: TokenType, value: &Value) -> Result<TokenValue, NormalizeError> {
    trace!(token_type = ty.as_str(); "Normalizing value");
    ty.normalize(value)
}

/// Canonicalize a mode override of a token whose base value is `base`.
///
/// For partial types (border, transition, shadow, typography) the override
/// only replaces the fields it supplies.
pub fn normalize_mode(
    ty: TokenType,
    base: &Value,
    mode: &Value,
) -> Result<TokenValue, NormalizeError> {
    if ty.is_partial() {
        normalize(ty, &merge_partial(base, mode))
    } else {
        normalize(ty, mode)
    }
}

/// Overlay `over` onto `base`.
///
/// Objects merge key by key. A single object laid over a list merges into
/// every element, and two lists of equal length merge element-wise. Anything
/// else is a full replacement.
pub fn merge_partial(base: &Value, over: &Value) -> Value {
    match (base, over) {
        (Value::Object(base), Value::Object(over)) => {
            let mut merged = base.clone();
            for (key, value) in over {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (Value::Array(base), Value::Object(_)) => {
            Value::Array(base.iter().map(|item| merge_partial(item, over)).collect())
        }
        (Value::Array(base), Value::Array(over)) if base.len() == over.len() => Value::Array(
            base.iter()
                .zip(over)
                .map(|(item, over)| merge_partial(item, over))
                .collect(),
        ),
        _ => over.clone(),
    }
}
