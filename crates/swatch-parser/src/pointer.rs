//! Structural reference expressions (`$ref` values).
//!
//! A pointer has the form `<locator>#<path>` where the locator is a URL
//! relative to the document containing the pointer (empty or `.` meaning that
//! document itself) and the path is a JSON Pointer (RFC 6901):
//! slash-separated segments with `~1` for `/` and `~0` for `~`.

use thiserror::Error;
use url::Url;

use swatch_core::identifier::join_id;

/// Expressions that would embed a document within itself.
const SELF_EMBEDDING: [&str; 4] = ["", "#", "/", "#/"];

/// Errors for `$ref` expressions that cannot be resolved at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("invalid $ref \"{0}\": a document cannot embed itself")]
    SelfEmbedding(String),

    #[error("invalid $ref \"{0}\": the path after `#` must start with `/`")]
    Malformed(String),

    #[error("invalid $ref \"{expr}\": {source}")]
    Locator {
        expr: String,
        #[source]
        source: url::ParseError,
    },
}

/// A parsed `$ref` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    locator: Option<String>,
    path: Vec<String>,
}

impl Pointer {
    /// Parse a pointer expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use swatch_parser::pointer::Pointer;
    ///
    /// let pointer = Pointer::parse("./base.json#/color/brand").unwrap();
    /// assert_eq!(pointer.path(), ["color", "brand"]);
    /// assert!(!pointer.is_local());
    ///
    /// assert!(Pointer::parse("#").is_err());
    /// ```
    pub fn parse(expr: &str) -> Result<Self, PointerError> {
        if SELF_EMBEDDING.contains(&expr) {
            return Err(PointerError::SelfEmbedding(expr.to_string()));
        }

        let (locator, fragment) = expr.split_once('#').unwrap_or((expr, ""));
        let locator = match locator {
            "" | "." => None,
            other => Some(other.to_string()),
        };

        let path = match fragment {
            "" => Vec::new(),
            _ => {
                let Some(rest) = fragment.strip_prefix('/') else {
                    return Err(PointerError::Malformed(expr.to_string()));
                };
                rest.split('/').map(unescape).collect()
            }
        };

        if locator.is_none() && path.is_empty() {
            return Err(PointerError::SelfEmbedding(expr.to_string()));
        }

        Ok(Self { locator, path })
    }

    /// Whether the pointer targets the document that contains it.
    pub fn is_local(&self) -> bool {
        self.locator.is_none()
    }

    /// Path segments below the document body. Empty addresses the whole
    /// document.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Absolute locator of the target document, given the locator of the
    /// document containing the pointer.
    pub fn target(&self, base: &Url) -> Result<Url, PointerError> {
        let Some(locator) = &self.locator else {
            return Ok(base.clone());
        };
        let mut target = base.join(locator).map_err(|source| PointerError::Locator {
            expr: locator.clone(),
            source,
        })?;
        target.set_fragment(None);
        if self.path.is_empty() && same_document(&target, base) {
            return Err(PointerError::SelfEmbedding(format!("{locator}#")));
        }
        Ok(target)
    }

    /// Token id the pointer designates: its path joined with dots, without a
    /// trailing `$value` segment.
    pub fn token_id(&self) -> String {
        let path = match self.path.split_last() {
            Some((last, rest)) if last == "$value" => rest,
            _ => &self.path[..],
        };
        join_id(path)
    }
}

fn same_document(target: &Url, base: &Url) -> bool {
    let mut base = base.clone();
    base.set_fragment(None);
    *target == base
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_embedding_pointers() {
        for expr in ["", "#", "/", "#/", ".", ".#"] {
            let err = Pointer::parse(expr);
            assert!(err.is_err(), "{expr:?} should be rejected");
        }
        assert!(matches!(
            Pointer::parse("#"),
            Err(PointerError::SelfEmbedding(_))
        ));
    }

    #[test]
    fn test_local_pointer() {
        let pointer = Pointer::parse("#/color/brand/$value").unwrap();
        assert!(pointer.is_local());
        assert_eq!(pointer.path(), ["color", "brand", "$value"]);
        assert_eq!(pointer.token_id(), "color.brand");
    }

    #[test]
    fn test_escaped_segments() {
        let pointer = Pointer::parse("#/a~1b/c~0d").unwrap();
        assert_eq!(pointer.path(), ["a/b", "c~d"]);
    }

    #[test]
    fn test_remote_whole_document() {
        let pointer = Pointer::parse("./shared.json").unwrap();
        assert!(!pointer.is_local());
        assert!(pointer.path().is_empty());
    }

    #[test]
    fn test_target_resolves_against_base() {
        let base = Url::parse("file:///tokens/themes/dark.json").unwrap();
        let pointer = Pointer::parse("../base.json#/color").unwrap();
        assert_eq!(
            pointer.target(&base).unwrap().as_str(),
            "file:///tokens/base.json"
        );

        let local = Pointer::parse("#/color").unwrap();
        assert_eq!(local.target(&base).unwrap(), base);
    }

    #[test]
    fn test_explicit_self_locator() {
        let base = Url::parse("file:///tokens/a.json").unwrap();
        for expr in ["./a.json#", "a.json", "../tokens/a.json#"] {
            let pointer = Pointer::parse(expr).unwrap();
            assert!(
                matches!(pointer.target(&base), Err(PointerError::SelfEmbedding(_))),
                "{expr:?} should be rejected"
            );
        }

        let pointer = Pointer::parse("./a.json#/color").unwrap();
        assert_eq!(pointer.target(&base).unwrap(), base);
    }

    #[test]
    fn test_malformed_fragment() {
        assert!(matches!(
            Pointer::parse("#color"),
            Err(PointerError::Malformed(_))
        ));
    }
}
