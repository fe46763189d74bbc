//! Token lookup for consumers of a compiled set.
//!
//! A [`Query`] narrows a [`TokenSet`] by id pattern, `$type` and mode, the
//! way build plugins select what they emit.
//!
//! ```
//! # use swatch::{Query, TokenType};
//! # fn show(tokens: &swatch::TokenSet) {
//! for (token, value) in Query::new(tokens)
//!     .matching("color.**")
//!     .of_type(TokenType::Color)
//!     .in_mode("dark")
//!     .values()
//! {
//!     println!("{} = {:?}", token.id, value);
//! }
//! # }
//! ```

use swatch_core::{TokenType, TokenValue, identifier::matches};
use swatch_parser::{DEFAULT_MODE, Token, TokenSet};

/// A filtered view over a [`TokenSet`].
#[derive(Debug, Clone)]
pub struct Query<'a> {
    tokens: &'a TokenSet,
    pattern: Option<String>,
    ty: Option<TokenType>,
    mode: String,
}

impl<'a> Query<'a> {
    /// Select every token, in the default mode.
    pub fn new(tokens: &'a TokenSet) -> Self {
        Self {
            tokens,
            pattern: None,
            ty: None,
            mode: DEFAULT_MODE.to_string(),
        }
    }

    /// Keep tokens whose id matches `pattern` (`*` within a segment, `**`
    /// across segments).
    pub fn matching(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Keep tokens of one `$type`.
    pub fn of_type(mut self, ty: TokenType) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Read values under `mode`; tokens without it fall back to their
    /// default value.
    pub fn in_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    fn accepts(&self, token: &Token) -> bool {
        self.ty.is_none_or(|ty| token.ty == ty)
            && self
                .pattern
                .as_deref()
                .is_none_or(|pattern| matches(pattern, &token.id))
    }

    /// The selected tokens, in set order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Token> + '_ {
        self.tokens.iter().filter(move |token| self.accepts(token))
    }

    /// The selected tokens paired with their value in the query's mode.
    ///
    /// Tokens that failed to normalize have no value and are left out.
    pub fn values(&self) -> impl Iterator<Item = (&'a Token, &'a TokenValue)> + '_ {
        self.iter()
            .filter_map(|token| token.value_in(&self.mode).map(|value| (token, value)))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }
}
