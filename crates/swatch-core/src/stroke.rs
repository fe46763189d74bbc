//! Stroke style definitions.
//!
//! A stroke style is either one of the CSS line-style keywords or a custom
//! dash pattern:
//!
//! ```json
//! { "dashArray": ["0.5rem", "0.25rem"], "lineCap": "round" }
//! ```

use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{
    dimension::DimensionValue,
    error::{NormalizeError, describe},
};

/// Predefined line styles, named after their CSS `border-style` keywords.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrokeKeyword {
    /// Solid continuous line (default)
    #[default]
    Solid,
    Dashed,
    Dotted,
    Double,
    Groove,
    Ridge,
    Outset,
    Inset,
}

impl StrokeKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
            Self::Double => "double",
            Self::Groove => "groove",
            Self::Ridge => "ridge",
            Self::Outset => "outset",
            Self::Inset => "inset",
        }
    }
}

impl FromStr for StrokeKeyword {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "dotted" => Ok(Self::Dotted),
            "double" => Ok(Self::Double),
            "groove" => Ok(Self::Groove),
            "ridge" => Ok(Self::Ridge),
            "outset" => Ok(Self::Outset),
            "inset" => Ok(Self::Inset),
            _ => Err(format!(
                "invalid stroke style `{s}`, valid values: solid, dashed, dotted, double, groove, ridge, outset, inset"
            )),
        }
    }
}

/// Defines how dash endpoints are rendered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl FromStr for LineCap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "butt" => Ok(Self::Butt),
            "round" => Ok(Self::Round),
            "square" => Ok(Self::Square),
            _ => Err(format!(
                "invalid line cap `{s}`, valid values: butt, round, square"
            )),
        }
    }
}

/// A canonical stroke style.
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeStyleValue {
    Keyword(StrokeKeyword),
    /// Alternating dash and gap lengths
    Pattern {
        dash_array: Vec<DimensionValue>,
        line_cap: LineCap,
    },
}

impl Default for StrokeStyleValue {
    fn default() -> Self {
        Self::Keyword(StrokeKeyword::Solid)
    }
}

impl StrokeStyleValue {
    /// Canonicalize a keyword string or a `{ dashArray, lineCap }` object.
    ///
    /// Only `dashArray` and `lineCap` are recognized in the object form; any
    /// other key is rejected.
    pub fn normalize(value: &Value) -> Result<Self, NormalizeError> {
        match value {
            Value::String(s) => StrokeKeyword::from_str(s)
                .map(Self::Keyword)
                .map_err(NormalizeError::Invalid),
            Value::Object(object) => {
                if let Some(key) = object
                    .keys()
                    .find(|key| !matches!(key.as_str(), "dashArray" | "lineCap"))
                {
                    return Err(NormalizeError::invalid(format!(
                        "unknown strokeStyle property \"{key}\""
                    )));
                }

                let dashes = object
                    .get("dashArray")
                    .and_then(Value::as_array)
                    .ok_or_else(|| NormalizeError::invalid("strokeStyle is missing dashArray"))?;
                if dashes.is_empty() {
                    return Err(NormalizeError::invalid("dashArray must not be empty"));
                }
                let dash_array = dashes
                    .iter()
                    .map(|dash| DimensionValue::normalize(dash).map_err(|e| e.in_field("dashArray")))
                    .collect::<Result<Vec<_>, _>>()?;

                let line_cap = match object.get("lineCap") {
                    None => LineCap::default(),
                    Some(Value::String(cap)) => {
                        LineCap::from_str(cap).map_err(NormalizeError::Invalid)?
                    }
                    Some(other) => {
                        return Err(NormalizeError::invalid(format!(
                            "invalid lineCap {}",
                            describe(other)
                        )));
                    }
                };

                Ok(Self::Pattern {
                    dash_array,
                    line_cap,
                })
            }
            other => Err(NormalizeError::invalid(format!(
                "expected strokeStyle, received {}",
                describe(other)
            ))),
        }
    }
}

impl fmt::Display for StrokeStyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => f.write_str(keyword.as_str()),
            Self::Pattern { dash_array, .. } => {
                let dashes: Vec<String> = dash_array.iter().map(ToString::to_string).collect();
                f.write_str(&dashes.join(" "))
            }
        }
    }
}

impl Serialize for StrokeStyleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Pattern<'a> {
            dash_array: &'a [DimensionValue],
            line_cap: LineCap,
        }

        match self {
            Self::Keyword(keyword) => serializer.serialize_str(keyword.as_str()),
            Self::Pattern {
                dash_array,
                line_cap,
            } => Pattern {
                dash_array,
                line_cap: *line_cap,
            }
            .serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_keyword() {
        assert_eq!(
            StrokeStyleValue::normalize(&json!("dashed")).unwrap(),
            StrokeStyleValue::Keyword(StrokeKeyword::Dashed)
        );
        assert!(StrokeStyleValue::normalize(&json!("wavy")).is_err());
    }

    #[test]
    fn test_pattern() {
        let style = StrokeStyleValue::normalize(&json!({
            "dashArray": ["0.5rem", "0.25rem"],
            "lineCap": "round"
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&style).unwrap(),
            json!({
                "dashArray": [
                    { "value": 0.5, "unit": "rem" },
                    { "value": 0.25, "unit": "rem" }
                ],
                "lineCap": "round"
            })
        );
        assert_eq!(style.to_string(), "0.5rem 0.25rem");
    }

    #[test]
    fn test_pattern_rejects_unknown_key() {
        let err = StrokeStyleValue::normalize(&json!({
            "dashArray": ["1px"],
            "lineJoin": "miter"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("lineJoin"));
    }

    #[test]
    fn test_pattern_dash_needs_unit() {
        let err = StrokeStyleValue::normalize(&json!({ "dashArray": [2] })).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingUnit(_)));
    }

    #[test]
    fn test_line_cap_from_str() {
        assert_eq!(LineCap::from_str("square").unwrap(), LineCap::Square);
        assert!(LineCap::from_str("pointy").is_err());
    }
}
