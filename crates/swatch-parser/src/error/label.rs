//! Marked regions of a token document.
//!
//! A label underlines part of the document a diagnostic was raised against:
//! the `$ref` member that failed, the `$value` that did not parse, or the
//! earlier definition a duplicate token shadows.

use crate::span::Span;

/// How a label relates to the problem it annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// The site of the problem itself.
    Primary,
    /// Context, such as the object a `$ref` is merged into.
    Secondary,
}

/// An underlined span with a short message.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    emphasis: Emphasis,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>, emphasis: Emphasis) -> Self {
        Self {
            span,
            message: message.into(),
            emphasis,
        }
    }

    /// Label the site of the problem.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message, Emphasis::Primary)
    }

    /// Label a related site.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message, Emphasis::Secondary)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn emphasis(&self) -> Emphasis {
        self.emphasis
    }

    pub fn is_primary(&self) -> bool {
        self.emphasis == Emphasis::Primary
    }

    /// The underlined text, or `None` when the span does not fit `text`.
    ///
    /// Spans of a resolved `$ref` target index the target's document, so a
    /// label is only meaningful against the text it was made for.
    pub fn excerpt<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.span.slice(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const DOC: &str = r##"{"a": {"$value": {"$ref": "#"}}}"##;

    fn span_of(needle: &str) -> Span {
        let start = DOC.find(needle).unwrap();
        Span::new(start..start + needle.len())
    }

    #[test]
    fn test_ref_site_label() {
        let label = Label::primary(span_of(r##""$ref": "#""##), ErrorCode::E100.description());

        assert!(label.is_primary());
        assert_eq!(label.message(), "invalid pointer");
        assert_eq!(label.excerpt(DOC), Some(r##""$ref": "#""##));
    }

    #[test]
    fn test_merge_target_label() {
        let label = Label::secondary(span_of(r##"{"$ref": "#"}"##), "object with local members");

        assert_eq!(label.emphasis(), Emphasis::Secondary);
        assert!(!label.is_primary());
        assert_eq!(label.excerpt(DOC), Some(r##"{"$ref": "#"}"##));
    }

    #[test]
    fn test_excerpt_outside_document() {
        let label = Label::primary(Span::new(20..200), "token `a`");
        assert_eq!(label.excerpt(DOC), None);
        assert_eq!(label.excerpt("{}"), None);
    }
}
