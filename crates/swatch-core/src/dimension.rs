//! Dimension and duration values.
//!
//! Both are a number paired with a unit. Dimensions serialize as
//! `{ "value": 1, "unit": "rem" }`; durations serialize as a single string
//! such as `"150ms"`.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;
use winnow::{
    ModalResult, Parser,
    ascii::{digit0, digit1},
    combinator::{alt, opt},
    token::{one_of, take_while},
};

use crate::error::{NormalizeError, describe};

/// Unit assigned to a bare zero.
pub const ZERO_UNIT: &str = "px";

/// Parse a plain decimal number: optional sign, digits with optional fraction,
/// or a leading-dot fraction. Exponents are not accepted so that a unit such
/// as `em` is never mistaken for one.
fn number(input: &mut &str) -> ModalResult<f64> {
    (
        opt(one_of(['+', '-'])),
        alt((
            (digit1, opt(('.', digit0))).void(),
            ('.', digit1).void(),
        )),
    )
        .take()
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

fn unit<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(0.., |c: char| c.is_ascii_alphabetic() || c == '%').parse_next(input)
}

/// Split a string such as `"1.5rem"` into its number and unit.
///
/// Returns `None` when the string is not a number optionally followed by a unit.
pub fn split_number(input: &str) -> Option<(f64, &str)> {
    (number, unit).parse(input.trim()).ok()
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// A length-like value: `{ value, unit }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionValue {
    value: f64,
    unit: String,
}

impl DimensionValue {
    /// Create a dimension from its parts.
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    /// The zero dimension composites fall back to.
    pub fn zero() -> Self {
        Self::new(0.0, ZERO_UNIT)
    }

    /// Canonicalize a dimension.
    ///
    /// A bare zero (number or string) is valid and gets the `px` unit; any
    /// other bare number fails with [`NormalizeError::MissingUnit`].
    ///
    /// ```
    /// use serde_json::json;
    /// use swatch_core::{NormalizeError, dimension::DimensionValue};
    ///
    /// let lg = DimensionValue::normalize(&json!("1rem")).unwrap();
    /// assert_eq!((lg.value(), lg.unit()), (1.0, "rem"));
    ///
    /// assert_eq!(DimensionValue::normalize(&json!(0)).unwrap(), DimensionValue::zero());
    /// assert!(matches!(
    ///     DimensionValue::normalize(&json!(4)),
    ///     Err(NormalizeError::MissingUnit(_))
    /// ));
    /// ```
    pub fn normalize(value: &Value) -> Result<Self, NormalizeError> {
        match value {
            Value::Number(n) => Self::from_parts(n.as_f64().unwrap_or_default(), "", value),
            Value::String(s) => {
                let (number, unit) = split_number(s).ok_or_else(|| {
                    NormalizeError::invalid(format!("invalid dimension {}", describe(value)))
                })?;
                Self::from_parts(number, unit, value)
            }
            Value::Object(object) => {
                let number = object.get("value").and_then(number_of).ok_or_else(|| {
                    NormalizeError::invalid(format!("invalid dimension {}", describe(value)))
                })?;
                let unit = match object.get("unit") {
                    None | Some(Value::Null) => "",
                    Some(Value::String(unit)) => unit.as_str(),
                    Some(other) => {
                        return Err(NormalizeError::invalid(format!(
                            "invalid unit {}",
                            describe(other)
                        )));
                    }
                };
                Self::from_parts(number, unit, value)
            }
            other => Err(NormalizeError::invalid(format!(
                "expected dimension, received {}",
                describe(other)
            ))),
        }
    }

    fn from_parts(number: f64, unit: &str, raw: &Value) -> Result<Self, NormalizeError> {
        if !number.is_finite() {
            return Err(NormalizeError::invalid(format!(
                "invalid dimension {}",
                describe(raw)
            )));
        }
        if unit.is_empty() {
            if number == 0.0 {
                return Ok(Self::zero());
            }
            return Err(NormalizeError::MissingUnit(describe(raw)));
        }
        Ok(Self::new(number + 0.0, unit))
    }

    /// Returns the numeric part.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the unit.
    pub fn unit(&self) -> &str {
        &self.unit
    }
}

impl fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

/// Time units a duration may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Ms,
    S,
}

impl DurationUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ms => "ms",
            Self::S => "s",
        }
    }
}

/// A span of time, serialized as a string with an explicit unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationValue {
    value: f64,
    unit: DurationUnit,
}

impl DurationValue {
    /// Create a duration in milliseconds.
    pub fn millis(value: f64) -> Self {
        Self {
            value,
            unit: DurationUnit::Ms,
        }
    }

    /// Canonicalize a duration; bare numbers default to milliseconds.
    pub fn normalize(value: &Value) -> Result<Self, NormalizeError> {
        let invalid = || NormalizeError::invalid(format!("invalid duration {}", describe(value)));

        let (number, unit) = match value {
            Value::Number(n) => (n.as_f64().ok_or_else(invalid)?, ""),
            Value::String(s) => split_number(s).ok_or_else(invalid)?,
            Value::Object(object) => {
                let number = object.get("value").and_then(number_of).ok_or_else(invalid)?;
                let unit = object.get("unit").and_then(Value::as_str).unwrap_or_default();
                (number, unit)
            }
            _ => return Err(invalid()),
        };
        if !number.is_finite() || number < 0.0 {
            return Err(invalid());
        }

        let unit = match unit {
            "" | "ms" => DurationUnit::Ms,
            "s" => DurationUnit::S,
            other => {
                return Err(NormalizeError::invalid(format!(
                    "unsupported duration unit \"{other}\""
                )));
            }
        };
        Ok(Self {
            value: number + 0.0,
            unit,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> DurationUnit {
        self.unit
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}

impl Serialize for DurationValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
