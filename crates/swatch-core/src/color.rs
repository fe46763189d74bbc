//! Color handling for design tokens
//!
//! This module provides the [`ColorValue`] type, the canonical color shape
//! every consumer receives: a named color space, three channels and an alpha.
//! Legacy CSS color strings (`#663399`, `rebeccapurple`, `rgb(…)`, `oklch(…)`)
//! are parsed with the `DynamicColor` type from the color crate; structured
//! input is validated directly so already-canonical values pass through
//! unchanged.

use std::{fmt, str::FromStr};

use color::{ColorSpaceTag, DynamicColor};
use serde::Serialize;
use serde_json::Value;

use crate::error::{NormalizeError, describe};

/// Tolerance for gamut checks, to absorb float noise from conversions.
const GAMUT_EPSILON: f64 = 1e-6;

/// A color space a canonical color can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColorSpace {
    #[serde(rename = "srgb")]
    Srgb,
    #[serde(rename = "srgb-linear")]
    SrgbLinear,
    #[serde(rename = "hsl")]
    Hsl,
    #[serde(rename = "hwb")]
    Hwb,
    #[serde(rename = "lab")]
    Lab,
    #[serde(rename = "lch")]
    Lch,
    #[serde(rename = "oklab")]
    Oklab,
    #[serde(rename = "oklch")]
    Oklch,
    #[serde(rename = "display-p3")]
    DisplayP3,
    #[serde(rename = "a98-rgb")]
    A98Rgb,
    #[serde(rename = "prophoto-rgb")]
    ProphotoRgb,
    #[serde(rename = "rec2020")]
    Rec2020,
    #[serde(rename = "xyz-d50")]
    XyzD50,
    #[serde(rename = "xyz-d65")]
    XyzD65,
}

impl ColorSpace {
    /// Returns the CSS name of this color space.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Srgb => "srgb",
            Self::SrgbLinear => "srgb-linear",
            Self::Hsl => "hsl",
            Self::Hwb => "hwb",
            Self::Lab => "lab",
            Self::Lch => "lch",
            Self::Oklab => "oklab",
            Self::Oklch => "oklch",
            Self::DisplayP3 => "display-p3",
            Self::A98Rgb => "a98-rgb",
            Self::ProphotoRgb => "prophoto-rgb",
            Self::Rec2020 => "rec2020",
            Self::XyzD50 => "xyz-d50",
            Self::XyzD65 => "xyz-d65",
        }
    }

    /// Inclusive channel ranges that count as "in gamut", `None` for unbounded.
    fn channel_ranges(&self) -> [Option<(f64, f64)>; 3] {
        match self {
            Self::Srgb
            | Self::SrgbLinear
            | Self::DisplayP3
            | Self::A98Rgb
            | Self::ProphotoRgb
            | Self::Rec2020 => [Some((0.0, 1.0)); 3],
            Self::Hsl | Self::Hwb => [None, Some((0.0, 100.0)), Some((0.0, 100.0))],
            Self::Lab => [Some((0.0, 100.0)), None, None],
            Self::Lch => [Some((0.0, 100.0)), Some((0.0, f64::MAX)), None],
            Self::Oklab => [Some((0.0, 1.0)), None, None],
            Self::Oklch => [Some((0.0, 1.0)), Some((0.0, f64::MAX)), None],
            Self::XyzD50 | Self::XyzD65 => [None; 3],
        }
    }
}

impl FromStr for ColorSpace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "srgb" => Ok(Self::Srgb),
            "srgb-linear" => Ok(Self::SrgbLinear),
            "hsl" => Ok(Self::Hsl),
            "hwb" => Ok(Self::Hwb),
            "lab" => Ok(Self::Lab),
            "lch" => Ok(Self::Lch),
            "oklab" => Ok(Self::Oklab),
            "oklch" => Ok(Self::Oklch),
            "display-p3" => Ok(Self::DisplayP3),
            "a98-rgb" => Ok(Self::A98Rgb),
            "prophoto-rgb" => Ok(Self::ProphotoRgb),
            "rec2020" => Ok(Self::Rec2020),
            "xyz-d50" | "xyz" => Ok(Self::XyzD50),
            "xyz-d65" => Ok(Self::XyzD65),
            _ => Err(format!("unsupported color space `{s}`")),
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical color: `{ colorSpace, channels: [c1, c2, c3], alpha }`.
///
/// # Examples
///
/// ```
/// use swatch_core::color::{ColorSpace, ColorValue};
///
/// let purple = ColorValue::parse_css("#663399").unwrap();
/// assert_eq!(purple.color_space(), ColorSpace::Srgb);
/// assert_eq!(purple.channels(), [0.4, 0.2, 0.6]);
/// assert_eq!(purple.alpha(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorValue {
    color_space: ColorSpace,
    channels: [f64; 3],
    alpha: f64,
}

impl ColorValue {
    /// Create a color, checking every channel and the alpha against the gamut
    /// of `color_space`.
    pub fn new(
        color_space: ColorSpace,
        channels: [f64; 3],
        alpha: f64,
    ) -> Result<Self, NormalizeError> {
        let in_range =
            |v: f64, (lo, hi): (f64, f64)| v >= lo - GAMUT_EPSILON && v <= hi + GAMUT_EPSILON;

        for (channel, range) in channels.iter().zip(color_space.channel_ranges()) {
            if !channel.is_finite() {
                return Err(NormalizeError::InvalidColor(format!(
                    "non-finite channel in {color_space}"
                )));
            }
            if let Some(range) = range {
                if !in_range(*channel, range) {
                    return Err(NormalizeError::InvalidColor(format!(
                        "channel {channel} is out of gamut for {color_space}"
                    )));
                }
            }
        }
        if !in_range(alpha, (0.0, 1.0)) {
            return Err(NormalizeError::InvalidColor(format!(
                "alpha {alpha} must be between 0 and 1"
            )));
        }

        Ok(Self {
            color_space,
            channels,
            alpha: alpha.clamp(0.0, 1.0),
        })
    }

    /// Opaque black in sRGB, used where a composite omits its color.
    pub fn black() -> Self {
        Self {
            color_space: ColorSpace::Srgb,
            channels: [0.0; 3],
            alpha: 1.0,
        }
    }

    /// Parse a CSS color string.
    ///
    /// Legacy syntaxes (hex, named colors, `rgb()`, `hsl()`, `hwb()`) are
    /// converted to sRGB; CSS Color 4 spaces keep their own channels.
    pub fn parse_css(input: &str) -> Result<Self, NormalizeError> {
        let parsed = DynamicColor::from_str(input.trim())
            .map_err(|err| NormalizeError::InvalidColor(format!("unable to parse \"{input}\": {err}")))?;
        Self::from_dynamic(parsed)
    }

    fn from_dynamic(color: DynamicColor) -> Result<Self, NormalizeError> {
        let (space, color) = match color.cs {
            ColorSpaceTag::LinearSrgb => (ColorSpace::SrgbLinear, color),
            ColorSpaceTag::Lab => (ColorSpace::Lab, color),
            ColorSpaceTag::Lch => (ColorSpace::Lch, color),
            ColorSpaceTag::Oklab => (ColorSpace::Oklab, color),
            ColorSpaceTag::Oklch => (ColorSpace::Oklch, color),
            ColorSpaceTag::DisplayP3 => (ColorSpace::DisplayP3, color),
            ColorSpaceTag::A98Rgb => (ColorSpace::A98Rgb, color),
            ColorSpaceTag::ProphotoRgb => (ColorSpace::ProphotoRgb, color),
            ColorSpaceTag::Rec2020 => (ColorSpace::Rec2020, color),
            ColorSpaceTag::XyzD50 => (ColorSpace::XyzD50, color),
            ColorSpaceTag::XyzD65 => (ColorSpace::XyzD65, color),
            _ => (ColorSpace::Srgb, color.convert(ColorSpaceTag::Srgb)),
        };
        let [c1, c2, c3, alpha] = color.components;
        Self::new(
            space,
            [round_channel(c1), round_channel(c2), round_channel(c3)],
            round_channel(alpha),
        )
    }

    /// Parse the structured form `{ colorSpace, channels | components, alpha? }`.
    fn from_object(object: &serde_json::Map<String, Value>) -> Result<Self, NormalizeError> {
        let space = object
            .get("colorSpace")
            .and_then(Value::as_str)
            .ok_or_else(|| NormalizeError::InvalidColor("missing colorSpace".to_string()))?;
        let space = ColorSpace::from_str(space).map_err(NormalizeError::InvalidColor)?;

        let channels = object
            .get("channels")
            .or_else(|| object.get("components"))
            .and_then(Value::as_array)
            .ok_or_else(|| NormalizeError::InvalidColor("missing channels".to_string()))?;
        if channels.len() != 3 {
            return Err(NormalizeError::InvalidColor(format!(
                "expected 3 channels, received {}",
                channels.len()
            )));
        }
        let mut parsed = [0.0; 3];
        for (slot, channel) in parsed.iter_mut().zip(channels) {
            *slot = match channel {
                Value::Number(n) => n.as_f64().unwrap_or_default(),
                Value::String(s) if s == "none" => 0.0,
                other => {
                    return Err(NormalizeError::InvalidColor(format!(
                        "channel {} is not a number",
                        describe(other)
                    )));
                }
            };
        }

        let alpha = match object.get("alpha") {
            None | Some(Value::Null) => 1.0,
            Some(Value::Number(n)) => n.as_f64().unwrap_or(1.0),
            Some(other) => {
                return Err(NormalizeError::InvalidColor(format!(
                    "alpha {} is not a number",
                    describe(other)
                )));
            }
        };

        Self::new(space, parsed, alpha)
    }

    /// Canonicalize any accepted color input.
    pub fn normalize(value: &Value) -> Result<Self, NormalizeError> {
        match value {
            Value::String(s) => Self::parse_css(s),
            Value::Object(object) => Self::from_object(object),
            other => Err(NormalizeError::InvalidColor(format!(
                "expected string or object, received {}",
                describe(other)
            ))),
        }
    }

    /// Returns the color space.
    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Returns the three channels.
    pub fn channels(&self) -> [f64; 3] {
        self.channels
    }

    /// Returns the alpha, between 0.0 and 1.0.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl fmt::Display for ColorValue {
    /// CSS Color 4 serialization, e.g. `color(srgb 0.4 0.2 0.6)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [c1, c2, c3] = self.channels;
        match self.color_space {
            ColorSpace::Hsl
            | ColorSpace::Hwb
            | ColorSpace::Lab
            | ColorSpace::Lch
            | ColorSpace::Oklab
            | ColorSpace::Oklch => write!(f, "{}({c1} {c2} {c3}", self.color_space)?,
            _ => write!(f, "color({} {c1} {c2} {c3}", self.color_space)?,
        }
        if self.alpha < 1.0 {
            write!(f, " / {}", self.alpha)?;
        }
        f.write_str(")")
    }
}

/// Widen a channel to `f64`, dropping the noise `f32` introduces past 6 digits.
fn round_channel(channel: f32) -> f64 {
    let rounded = (f64::from(channel) * 1e6).round() / 1e6;
    // Avoid -0.0 in output.
    rounded + 0.0
}
