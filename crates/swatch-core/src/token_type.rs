//! The `$type` tag and its dispatch table.
//!
//! Each [`TokenType`] maps to exactly one [`TypeRule`], which bundles the
//! shallow structural check run by the validator and the normalizer that
//! produces the canonical [`TokenValue`]. The `match` in [`TokenType::rule`]
//! is exhaustive, so a new type does not compile until it has both.

use std::{fmt, str::FromStr};

use serde::Serialize;
use serde_json::Value;

use crate::{
    color::ColorValue,
    dimension::{DimensionValue, DurationValue},
    error::NormalizeError,
    identifier::is_alias,
    stroke::StrokeStyleValue,
    value::{self, TokenValue},
};

/// Every supported token type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Color,
    Dimension,
    Duration,
    CubicBezier,
    FontFamily,
    FontWeight,
    Number,
    Boolean,
    Link,
    String,
    StrokeStyle,
    Border,
    Transition,
    Shadow,
    Gradient,
    Typography,
}

/// Coarse JSON kinds a `$value` may take for a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl Shape {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(Self::String),
            Value::Number(_) => Some(Self::Number),
            Value::Bool(_) => Some(Self::Boolean),
            Value::Object(_) => Some(Self::Object),
            Value::Array(_) => Some(Self::Array),
            Value::Null => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// Validation and normalization behavior of one token type.
#[derive(Debug, Clone, Copy)]
pub struct TypeRule {
    /// Kinds accepted for `$value`
    pub shapes: &'static [Shape],
    /// Turns a fully alias-resolved value into its canonical form
    pub normalize: fn(&Value) -> Result<TokenValue, NormalizeError>,
    /// Whether mode values override only the fields they supply
    pub partial: bool,
}

impl TokenType {
    /// All types, in declaration order.
    pub const ALL: [TokenType; 16] = [
        Self::Color,
        Self::Dimension,
        Self::Duration,
        Self::CubicBezier,
        Self::FontFamily,
        Self::FontWeight,
        Self::Number,
        Self::Boolean,
        Self::Link,
        Self::String,
        Self::StrokeStyle,
        Self::Border,
        Self::Transition,
        Self::Shadow,
        Self::Gradient,
        Self::Typography,
    ];

    /// Returns the `$type` name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Dimension => "dimension",
            Self::Duration => "duration",
            Self::CubicBezier => "cubicBezier",
            Self::FontFamily => "fontFamily",
            Self::FontWeight => "fontWeight",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Link => "link",
            Self::String => "string",
            Self::StrokeStyle => "strokeStyle",
            Self::Border => "border",
            Self::Transition => "transition",
            Self::Shadow => "shadow",
            Self::Gradient => "gradient",
            Self::Typography => "typography",
        }
    }

    /// Returns the dispatch entry for this type.
    pub fn rule(&self) -> TypeRule {
        use Shape::*;

        match self {
            Self::Color => TypeRule {
                shapes: &[String, Object],
                normalize: |v| ColorValue::normalize(v).map(TokenValue::Color),
                partial: false,
            },
            Self::Dimension => TypeRule {
                shapes: &[String, Number, Object],
                normalize: |v| DimensionValue::normalize(v).map(TokenValue::Dimension),
                partial: false,
            },
            Self::Duration => TypeRule {
                shapes: &[String, Number, Object],
                normalize: |v| DurationValue::normalize(v).map(TokenValue::Duration),
                partial: false,
            },
            Self::CubicBezier => TypeRule {
                shapes: &[Array],
                normalize: |v| value::normalize_cubic_bezier(v).map(TokenValue::CubicBezier),
                partial: false,
            },
            Self::FontFamily => TypeRule {
                shapes: &[String, Array],
                normalize: |v| value::normalize_font_family(v).map(TokenValue::FontFamily),
                partial: false,
            },
            Self::FontWeight => TypeRule {
                shapes: &[String, Number],
                normalize: |v| value::normalize_font_weight(v).map(TokenValue::FontWeight),
                partial: false,
            },
            Self::Number => TypeRule {
                shapes: &[Number],
                normalize: |v| value::normalize_number(v).map(TokenValue::Number),
                partial: false,
            },
            Self::Boolean => TypeRule {
                shapes: &[Boolean],
                normalize: |v| value::normalize_boolean(v).map(TokenValue::Boolean),
                partial: false,
            },
            Self::Link => TypeRule {
                shapes: &[String],
                normalize: |v| value::normalize_string(v).map(TokenValue::Link),
                partial: false,
            },
            Self::String => TypeRule {
                shapes: &[String],
                normalize: |v| value::normalize_string(v).map(TokenValue::String),
                partial: false,
            },
            Self::StrokeStyle => TypeRule {
                shapes: &[String, Object],
                normalize: |v| StrokeStyleValue::normalize(v).map(TokenValue::StrokeStyle),
                partial: false,
            },
            Self::Border => TypeRule {
                shapes: &[Object],
                normalize: |v| value::normalize_border(v).map(TokenValue::Border),
                partial: true,
            },
            Self::Transition => TypeRule {
                shapes: &[Object],
                normalize: |v| value::normalize_transition(v).map(TokenValue::Transition),
                partial: true,
            },
            Self::Shadow => TypeRule {
                shapes: &[Object, Array],
                normalize: |v| value::normalize_shadow(v).map(TokenValue::Shadow),
                partial: true,
            },
            Self::Gradient => TypeRule {
                shapes: &[Array],
                normalize: |v| value::normalize_gradient(v).map(TokenValue::Gradient),
                partial: false,
            },
            Self::Typography => TypeRule {
                shapes: &[Object],
                normalize: |v| value::normalize_typography(v).map(TokenValue::Typography),
                partial: true,
            },
        }
    }

    /// Shallow structural check of a raw `$value`.
    ///
    /// A value that is entirely an alias always passes; whether the aliased
    /// token has a compatible type is checked once aliases are resolved.
    /// Deep legality, such as unit parsing, is left to normalization.
    pub fn check_shape(&self, value: &Value) -> Result<(), String> {
        if value.as_str().is_some_and(is_alias) {
            return Ok(());
        }
        let rule = self.rule();
        match Shape::of(value) {
            Some(shape) if rule.shapes.contains(&shape) => Ok(()),
            found => {
                let expected: Vec<&str> = rule.shapes.iter().map(Shape::as_str).collect();
                Err(format!(
                    "{} expects {}, received {}",
                    self.as_str(),
                    expected.join(" or "),
                    found.map_or("null", |shape| shape.as_str())
                ))
            }
        }
    }

    /// Canonicalize an alias-free raw value.
    pub fn normalize(&self, value: &Value) -> Result<TokenValue, NormalizeError> {
        (self.rule().normalize)(value)
    }

    /// Whether mode overrides are merged field-wise over the base value.
    pub fn is_partial(&self) -> bool {
        self.rule().partial
    }
}

impl FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| format!("unknown token type `{s}`"))
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_str_round_trip() {
        for ty in TokenType::ALL {
            assert_eq!(TokenType::from_str(ty.as_str()).unwrap(), ty);
        }
        assert!(TokenType::from_str("colour").is_err());
    }

    #[test]
    fn test_check_shape() {
        assert!(TokenType::Color.check_shape(&json!("#fff")).is_ok());
        assert!(TokenType::Shadow.check_shape(&json!([{ "color": "#000" }])).is_ok());
        let err = TokenType::Border.check_shape(&json!(12)).unwrap_err();
        assert_eq!(err, "border expects object, received number");
        let err = TokenType::Number.check_shape(&json!(null)).unwrap_err();
        assert_eq!(err, "number expects number, received null");
    }

    #[test]
    fn test_alias_passes_shape_check() {
        assert!(TokenType::Typography.check_shape(&json!("{type.body}")).is_ok());
        assert!(TokenType::Number.check_shape(&json!("{a} {b}")).is_err());
    }

    #[test]
    fn test_partial_types() {
        let partial: Vec<TokenType> = TokenType::ALL.into_iter().filter(TokenType::is_partial).collect();
        assert_eq!(
            partial,
            vec![
                TokenType::Border,
                TokenType::Transition,
                TokenType::Shadow,
                TokenType::Typography
            ]
        );
    }

    #[test]
    fn test_serializes_as_name() {
        assert_eq!(serde_json::to_value(TokenType::CubicBezier).unwrap(), json!("cubicBezier"));
    }
}
