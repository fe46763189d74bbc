//! Canonical token values.
//!
//! [`TokenValue`] is the closed set of shapes a normalized token can hold. The
//! composite shapes (border, transition, shadow, gradient, typography) are
//! built by normalizing each sub-field with the rule of its own type.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    color::ColorValue,
    dimension::{DimensionValue, DurationValue},
    error::{NormalizeError, describe},
    stroke::StrokeStyleValue,
};

/// A fully canonicalized token value.
///
/// Serializes untagged, so each variant appears in output exactly as its
/// canonical form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    Color(ColorValue),
    Dimension(DimensionValue),
    Duration(DurationValue),
    CubicBezier([f64; 4]),
    FontFamily(Vec<String>),
    FontWeight(f64),
    Number(f64),
    Boolean(bool),
    Link(String),
    String(String),
    StrokeStyle(StrokeStyleValue),
    Border(BorderValue),
    Transition(TransitionValue),
    Shadow(Vec<ShadowValue>),
    Gradient(Vec<GradientStop>),
    Typography(TypographyValue),
}

impl TokenValue {
    /// Render the canonical form as plain JSON.
    pub fn to_json(&self) -> Value {
        // Every variant serializes to a JSON-compatible structure with string keys.
        serde_json::to_value(self).expect("canonical token values always serialize")
    }
}

/// `{ color, width, style }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorderValue {
    pub color: ColorValue,
    pub width: DimensionValue,
    pub style: StrokeStyleValue,
}

/// `{ duration, delay, timingFunction }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionValue {
    pub duration: DurationValue,
    pub delay: DurationValue,
    pub timing_function: [f64; 4],
}

/// One layer of a shadow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowValue {
    pub color: ColorValue,
    pub offset_x: DimensionValue,
    pub offset_y: DimensionValue,
    pub blur: DimensionValue,
    pub spread: DimensionValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inset: Option<bool>,
}

/// One stop of a gradient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    pub color: ColorValue,
    pub position: f64,
}

/// Either a unitless multiplier or a dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LineHeight {
    Number(f64),
    Dimension(DimensionValue),
}

/// A partial set of typography properties; absent fields stay absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<DimensionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<DimensionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<LineHeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_transform: Option<String>,
}

/// DTCG font weight names and their numeric values.
const FONT_WEIGHT_NAMES: &[(&str, f64)] = &[
    ("thin", 100.0),
    ("hairline", 100.0),
    ("extra-light", 200.0),
    ("ultra-light", 200.0),
    ("light", 300.0),
    ("normal", 400.0),
    ("regular", 400.0),
    ("book", 400.0),
    ("medium", 500.0),
    ("semi-bold", 600.0),
    ("demi-bold", 600.0),
    ("bold", 700.0),
    ("extra-bold", 800.0),
    ("ultra-bold", 800.0),
    ("black", 900.0),
    ("heavy", 900.0),
    ("extra-black", 950.0),
    ("ultra-black", 950.0),
];

fn as_object<'a>(value: &'a Value, ty: &str) -> Result<&'a Map<String, Value>, NormalizeError> {
    value.as_object().ok_or_else(|| {
        NormalizeError::invalid(format!("expected {ty} object, received {}", describe(value)))
    })
}

fn finite(value: &Value, what: &str) -> Result<f64, NormalizeError> {
    value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| NormalizeError::invalid(format!("expected {what}, received {}", describe(value))))
}

/// Normalize an optional sub-field, falling back to `default` when absent.
fn field<T>(
    object: &Map<String, Value>,
    name: &str,
    default: impl FnOnce() -> T,
    normalize: impl FnOnce(&Value) -> Result<T, NormalizeError>,
) -> Result<T, NormalizeError> {
    match object.get(name) {
        None | Some(Value::Null) => Ok(default()),
        Some(value) => normalize(value).map_err(|e| e.in_field(name)),
    }
}

/// Normalize a required sub-field.
fn required<T>(
    object: &Map<String, Value>,
    name: &str,
    normalize: impl FnOnce(&Value) -> Result<T, NormalizeError>,
) -> Result<T, NormalizeError> {
    match object.get(name) {
        None | Some(Value::Null) => Err(NormalizeError::invalid(format!("missing {name}"))),
        Some(value) => normalize(value).map_err(|e| e.in_field(name)),
    }
}

pub(crate) fn normalize_cubic_bezier(value: &Value) -> Result<[f64; 4], NormalizeError> {
    let points = value
        .as_array()
        .filter(|points| points.len() == 4)
        .ok_or_else(|| {
            NormalizeError::invalid(format!(
                "expected cubicBezier of 4 numbers, received {}",
                describe(value)
            ))
        })?;
    let mut bezier = [0.0; 4];
    for (slot, point) in bezier.iter_mut().zip(points) {
        *slot = finite(point, "number")?;
    }
    Ok(bezier)
}

pub(crate) fn normalize_font_family(value: &Value) -> Result<Vec<String>, NormalizeError> {
    let strip = |name: &str| name.trim().trim_matches(|c: char| c == '"' || c == '\'').trim().to_string();
    let families: Vec<String> = match value {
        Value::String(s) => s.split(',').map(strip).collect(),
        Value::Array(names) => names
            .iter()
            .map(|name| {
                name.as_str().map(strip).ok_or_else(|| {
                    NormalizeError::invalid(format!("expected font name, received {}", describe(name)))
                })
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(NormalizeError::invalid(format!(
                "expected fontFamily, received {}",
                describe(other)
            )));
        }
    };
    let families: Vec<String> = families.into_iter().filter(|name| !name.is_empty()).collect();
    if families.is_empty() {
        return Err(NormalizeError::invalid("fontFamily must not be empty"));
    }
    Ok(families)
}

pub(crate) fn normalize_font_weight(value: &Value) -> Result<f64, NormalizeError> {
    let weight = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            FONT_WEIGHT_NAMES
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(s))
                .map(|(_, weight)| *weight)
                .or_else(|| s.parse::<f64>().ok())
        }
        _ => None,
    };
    match weight {
        Some(weight) if (1.0..=1000.0).contains(&weight) => Ok(weight),
        _ => Err(NormalizeError::invalid(format!(
            "invalid fontWeight {}",
            describe(value)
        ))),
    }
}

pub(crate) fn normalize_number(value: &Value) -> Result<f64, NormalizeError> {
    finite(value, "number")
}

pub(crate) fn normalize_string(value: &Value) -> Result<String, NormalizeError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| NormalizeError::invalid(format!("expected string, received {}", describe(value))))
}

pub(crate) fn normalize_boolean(value: &Value) -> Result<bool, NormalizeError> {
    value
        .as_bool()
        .ok_or_else(|| NormalizeError::invalid(format!("expected boolean, received {}", describe(value))))
}

pub(crate) fn normalize_border(value: &Value) -> Result<BorderValue, NormalizeError> {
    let object = as_object(value, "border")?;
    Ok(BorderValue {
        color: field(object, "color", ColorValue::black, ColorValue::normalize)?,
        width: field(
            object,
            "width",
            || DimensionValue::new(1.0, "px"),
            DimensionValue::normalize,
        )?,
        style: field(
            object,
            "style",
            StrokeStyleValue::default,
            StrokeStyleValue::normalize,
        )?,
    })
}

pub(crate) fn normalize_transition(value: &Value) -> Result<TransitionValue, NormalizeError> {
    let object = as_object(value, "transition")?;
    Ok(TransitionValue {
        duration: field(
            object,
            "duration",
            || DurationValue::millis(0.0),
            DurationValue::normalize,
        )?,
        delay: field(
            object,
            "delay",
            || DurationValue::millis(0.0),
            DurationValue::normalize,
        )?,
        timing_function: field(
            object,
            "timingFunction",
            || [0.0, 0.0, 1.0, 1.0],
            normalize_cubic_bezier,
        )?,
    })
}

fn normalize_shadow_layer(value: &Value) -> Result<ShadowValue, NormalizeError> {
    let object = as_object(value, "shadow")?;

    for (name, field_value) in object {
        if let Value::Number(n) = field_value {
            let is_length = matches!(name.as_str(), "offsetX" | "offsetY" | "blur" | "spread");
            if is_length && n.as_f64().is_some_and(|n| n > 0.0) {
                return Err(NormalizeError::MissingUnit(format!("{name}: {n}")));
            }
        }
    }
    for offset in ["offsetX", "offsetY"] {
        match object.get(offset) {
            None | Some(Value::String(_)) | Some(Value::Object(_)) => {}
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {}
            Some(other) => {
                return Err(NormalizeError::invalid(format!(
                    "{offset}: expected dimension, received {}",
                    describe(other)
                )));
            }
        }
    }

    // Unrecognized fields are dropped.
    Ok(ShadowValue {
        color: required(object, "color", ColorValue::normalize)?,
        offset_x: field(object, "offsetX", DimensionValue::zero, DimensionValue::normalize)?,
        offset_y: field(object, "offsetY", DimensionValue::zero, DimensionValue::normalize)?,
        blur: field(object, "blur", DimensionValue::zero, DimensionValue::normalize)?,
        spread: field(object, "spread", DimensionValue::zero, DimensionValue::normalize)?,
        inset: field(object, "inset", || None, |v| normalize_boolean(v).map(Some))?,
    })
}

/// A single shadow object becomes a one-element list.
pub(crate) fn normalize_shadow(value: &Value) -> Result<Vec<ShadowValue>, NormalizeError> {
    match value {
        Value::Array(layers) if layers.is_empty() => {
            Err(NormalizeError::invalid("shadow must have at least one layer"))
        }
        Value::Array(layers) => layers
            .iter()
            .enumerate()
            .map(|(i, layer)| normalize_shadow_layer(layer).map_err(|e| e.in_field(&i.to_string())))
            .collect(),
        other => Ok(vec![normalize_shadow_layer(other)?]),
    }
}

/// Stops without a `position` are spread evenly across `0..=1`.
pub(crate) fn normalize_gradient(value: &Value) -> Result<Vec<GradientStop>, NormalizeError> {
    let stops = value.as_array().ok_or_else(|| {
        NormalizeError::invalid(format!("expected gradient stops, received {}", describe(value)))
    })?;
    if stops.is_empty() {
        return Err(NormalizeError::invalid("gradient must have at least one stop"));
    }
    let last = (stops.len() - 1).max(1) as f64;

    stops
        .iter()
        .enumerate()
        .map(|(i, stop)| {
            let object = as_object(stop, "gradient stop").map_err(|e| e.in_field(&i.to_string()))?;
            Ok(GradientStop {
                color: required(object, "color", ColorValue::normalize)?,
                position: field(object, "position", || i as f64 / last, |p| finite(p, "number"))?,
            })
        })
        .collect()
}

fn normalize_line_height(value: &Value) -> Result<LineHeight, NormalizeError> {
    match value {
        Value::Number(_) => finite(value, "number").map(LineHeight::Number),
        _ => DimensionValue::normalize(value).map(LineHeight::Dimension),
    }
}

pub(crate) fn normalize_typography(value: &Value) -> Result<TypographyValue, NormalizeError> {
    let object = as_object(value, "typography")?;
    let optional = |name: &str| object.get(name).filter(|v| !v.is_null());

    macro_rules! sub_field {
        ($name:literal, $normalize:expr) => {
            optional($name)
                .map(|v| $normalize(v).map_err(|e: NormalizeError| e.in_field($name)))
                .transpose()?
        };
    }

    Ok(TypographyValue {
        font_family: sub_field!("fontFamily", normalize_font_family),
        font_size: sub_field!("fontSize", DimensionValue::normalize),
        font_style: sub_field!("fontStyle", normalize_string),
        font_weight: sub_field!("fontWeight", normalize_font_weight),
        letter_spacing: sub_field!("letterSpacing", DimensionValue::normalize),
        line_height: sub_field!("lineHeight", normalize_line_height),
        text_transform: sub_field!("textTransform", normalize_string),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_shadow_single_object_becomes_list() {
        let shadow = normalize_shadow(&json!({
            "offsetY": "0.25rem",
            "blur": "0.5rem",
            "color": "#000000"
        }))
        .unwrap();
        assert_eq!(shadow.len(), 1);
        assert_eq!(shadow[0].offset_x, DimensionValue::zero());
        assert_eq!(shadow[0].spread, DimensionValue::zero());
        assert_eq!(shadow[0].offset_y, DimensionValue::new(0.25, "rem"));
        assert_eq!(shadow[0].inset, None);
    }

    #[test]
    fn test_shadow_bare_number_missing_unit() {
        let err = normalize_shadow(&json!({ "offsetX": 4, "offsetY": 0, "color": "#000" })).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingUnit(_)));
        assert!(err.to_string().contains("offsetX"));
    }

    #[test]
    fn test_shadow_drops_extra_fields() {
        let shadow = normalize_shadow(&json!([
            { "offsetX": 0, "offsetY": "1px", "color": "#000", "opacity": 0.4 },
            { "offsetX": "2px", "offsetY": "2px", "color": "#fff", "inset": true }
        ]))
        .unwrap();
        assert_eq!(shadow.len(), 2);
        assert_eq!(shadow[1].inset, Some(true));
        let serialized = serde_json::to_value(&shadow[0]).unwrap();
        assert!(serialized.get("opacity").is_none());
    }

    #[test]
    fn test_shadow_requires_color() {
        assert!(normalize_shadow(&json!({ "offsetX": "1px", "offsetY": "1px" })).is_err());
        assert!(normalize_shadow(&json!([])).is_err());
    }

    #[test]
    fn test_shadow_offset_must_be_dimension() {
        let err = normalize_shadow(&json!({ "offsetX": true, "offsetY": 0, "color": "#000" })).unwrap_err();
        assert!(err.to_string().contains("offsetX"));
    }

    #[test]
    fn test_border_defaults() {
        let border = normalize_border(&json!({ "color": "#ff0000" })).unwrap();
        assert_eq!(border.width, DimensionValue::new(1.0, "px"));
        assert_eq!(border.style, StrokeStyleValue::default());
    }

    #[test]
    fn test_transition_defaults() {
        let transition = normalize_transition(&json!({ "duration": "200ms" })).unwrap();
        assert_eq!(transition.delay, DurationValue::millis(0.0));
        assert_eq!(transition.timing_function, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_font_family_split() {
        assert_eq!(
            normalize_font_family(&json!("\"Inter Variable\", 'Helvetica Neue', sans-serif")).unwrap(),
            vec!["Inter Variable", "Helvetica Neue", "sans-serif"]
        );
        assert!(normalize_font_family(&json!("")).is_err());
    }

    #[test]
    fn test_font_weight_names() {
        assert_eq!(normalize_font_weight(&json!("semi-bold")).unwrap(), 600.0);
        assert_eq!(normalize_font_weight(&json!("700")).unwrap(), 700.0);
        assert_eq!(normalize_font_weight(&json!(350)).unwrap(), 350.0);
        assert!(normalize_font_weight(&json!("chunky")).is_err());
        assert!(normalize_font_weight(&json!(0)).is_err());
    }

    #[test]
    fn test_cubic_bezier_arity() {
        assert_eq!(
            normalize_cubic_bezier(&json!([0.4, 0, 0.2, 1])).unwrap(),
            [0.4, 0.0, 0.2, 1.0]
        );
        assert!(normalize_cubic_bezier(&json!([0.4, 0, 0.2])).is_err());
    }

    #[test]
    fn test_gradient_positions_spread() {
        let stops = normalize_gradient(&json!([
            { "color": "#000" },
            { "color": "#777" },
            { "color": "#fff", "position": 0.9 }
        ]))
        .unwrap();
        let positions: Vec<f64> = stops.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.0, 0.5, 0.9]);
    }

    #[test]
    fn test_typography_keeps_absent_fields_absent() {
        let typography = normalize_typography(&json!({
            "fontFamily": "Inter",
            "fontSize": "1rem",
            "lineHeight": 1.5
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&typography).unwrap(),
            json!({
                "fontFamily": ["Inter"],
                "fontSize": { "value": 1.0, "unit": "rem" },
                "lineHeight": 1.5
            })
        );
    }

    #[test]
    fn test_typography_field_error_names_field() {
        let err = normalize_typography(&json!({ "fontSize": 16 })).unwrap_err();
        assert_eq!(err, NormalizeError::MissingUnit("fontSize: 16".to_string()));
    }
}
