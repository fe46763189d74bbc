//! Swatch Core Types and Definitions
//!
//! This crate provides the canonical value model for swatch design tokens.
//! It includes:
//!
//! - **Token types**: The closed set of `$type` tags ([`token_type::TokenType`])
//!   and the dispatch table mapping each tag to its shape check and normalizer
//! - **Colors**: Canonical colors with CSS color support ([`color::ColorValue`])
//! - **Dimensions**: Dimensions and durations ([`dimension`] module)
//! - **Strokes**: Stroke style keywords and dash patterns ([`stroke`] module)
//! - **Values**: Composite canonical values ([`value`] module)
//! - **Identifiers**: Token id helpers and wildcard matching ([`identifier`] module)

pub mod color;
pub mod dimension;
pub mod error;
pub mod identifier;
pub mod normalize;
pub mod stroke;
pub mod token_type;
pub mod value;

pub use error::NormalizeError;
pub use token_type::TokenType;
pub use value::TokenValue;
