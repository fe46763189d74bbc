//! Token identifiers and alias syntax.
//!
//! A token id is the dot-joined path of member names leading to the token,
//! e.g. `color.brand.primary`. Aliases reference another token by wrapping
//! its id in braces: `{color.brand.primary}`.

use std::ops::Range;

/// Separator between id segments.
pub const SEPARATOR: char = '.';

/// Join path segments into a token id.
///
/// # Examples
///
/// ```
/// use swatch_core::identifier::join_id;
///
/// assert_eq!(join_id(["color", "brand"]), "color.brand");
/// ```
pub fn join_id<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut id = String::new();
    for segment in segments {
        if !id.is_empty() {
            id.push(SEPARATOR);
        }
        id.push_str(segment.as_ref());
    }
    id
}

/// Split a token id into its segments.
pub fn split_id(id: &str) -> impl Iterator<Item = &str> {
    id.split(SEPARATOR)
}

/// Returns the id of the group that directly contains `id`, or `None` for a
/// top-level token.
pub fn parent_id(id: &str) -> Option<&str> {
    id.rsplit_once(SEPARATOR).map(|(parent, _)| parent)
}

/// Whether `id` lies inside the group `group`, matching whole segments only.
///
/// `color.brand` contains `color.brand.primary` but not `color.brandish`.
pub fn is_descendant(id: &str, group: &str) -> bool {
    if group.is_empty() {
        return true;
    }
    id.len() > group.len()
        && id.starts_with(group)
        && id[group.len()..].starts_with(SEPARATOR)
}

/// An alias occurrence inside a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRef<'a> {
    /// Byte range of the whole `{…}` occurrence
    pub range: Range<usize>,
    /// The referenced token id
    pub target: &'a str,
}

/// Find every `{token.id}` occurrence inside `input`, in order.
///
/// Braces that never close, or that enclose nothing, are ignored.
pub fn find_aliases(input: &str) -> Vec<AliasRef<'_>> {
    let mut aliases = Vec::new();
    let mut offset = 0;
    while let Some(open) = input[offset..].find('{') {
        let start = offset + open;
        let Some(len) = input[start + 1..].find(['{', '}']) else {
            break;
        };
        let end = start + 1 + len;
        if input[end..].starts_with('{') {
            offset = end;
            continue;
        }
        let target = input[start + 1..end].trim();
        if !target.is_empty() {
            aliases.push(AliasRef {
                range: start..end + 1,
                target,
            });
        }
        offset = end + 1;
    }
    aliases
}

/// If the whole of `input` is a single alias, returns its target id.
///
/// # Examples
///
/// ```
/// use swatch_core::identifier::alias_target;
///
/// assert_eq!(alias_target("{spacing.md}"), Some("spacing.md"));
/// assert_eq!(alias_target("calc({spacing.md} * 2)"), None);
/// ```
pub fn alias_target(input: &str) -> Option<&str> {
    match find_aliases(input).as_slice() {
        [alias] if alias.range == (0..input.len()) => Some(alias.target),
        _ => None,
    }
}

/// Whether `input` is exactly one alias.
pub fn is_alias(input: &str) -> bool {
    alias_target(input).is_some()
}

/// Match a token id against a wildcard pattern.
///
/// `*` matches within one segment and `**` matches any number of whole
/// segments. A pattern without wildcards must equal the id.
///
/// # Arguments
///
/// * `pattern` - Dot-separated pattern, e.g. `color.*.500` or `typography.**`
/// * `id` - Token id to test
pub fn matches(pattern: &str, id: &str) -> bool {
    let pattern: Vec<&str> = split_id(pattern).collect();
    let id: Vec<&str> = split_id(id).collect();
    match_segments(&pattern, &id)
}

fn match_segments(pattern: &[&str], id: &[&str]) -> bool {
    match (pattern.split_first(), id.split_first()) {
        (None, None) => true,
        (Some((&"**", rest)), _) => {
            (0..=id.len()).any(|skip| match_segments(rest, &id[skip..]))
        }
        (Some((head, rest)), Some((segment, id_rest))) => {
            match_segment(head, segment) && match_segments(rest, id_rest)
        }
        _ => false,
    }
}

fn match_segment(pattern: &str, segment: &str) -> bool {
    let Some((prefix, rest)) = pattern.split_once('*') else {
        return pattern == segment;
    };
    let Some(remaining) = segment.strip_prefix(prefix) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    (0..=remaining.len())
        .filter(|i| remaining.is_char_boundary(*i))
        .any(|i| match_segment(rest, &remaining[i..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_id() {
        assert_eq!(parent_id("color.brand.primary"), Some("color.brand"));
        assert_eq!(parent_id("spacing"), None);
    }

    #[test]
    fn test_is_descendant_is_segment_aware() {
        assert!(is_descendant("color.brand.primary", "color.brand"));
        assert!(is_descendant("color.brand.primary", "color"));
        assert!(!is_descendant("color.brandish", "color.brand"));
        assert!(!is_descendant("color.brand", "color.brand"));
        assert!(is_descendant("color", ""));
    }

    #[test]
    fn test_find_aliases() {
        let aliases = find_aliases("{space.sm} {space.md}");
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases[0].target, "space.sm");
        assert_eq!(aliases[0].range, 0..10);
        assert_eq!(aliases[1].target, "space.md");
    }

    #[test]
    fn test_find_aliases_ignores_unbalanced() {
        assert!(find_aliases("{ not closed").is_empty());
        assert!(find_aliases("{}").is_empty());
        let nested = find_aliases("{{a.b}");
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].target, "a.b");
    }

    #[test]
    fn test_is_alias() {
        assert!(is_alias("{color.black}"));
        assert!(!is_alias("#000000"));
        assert!(!is_alias("{a} {b}"));
    }

    #[test]
    fn test_matches() {
        assert!(matches("color.brand", "color.brand"));
        assert!(!matches("color.brand", "color.brand.primary"));
        assert!(matches("color.*", "color.brand"));
        assert!(!matches("color.*", "color.brand.primary"));
        assert!(matches("color.**", "color.brand.primary"));
        assert!(matches("**.500", "color.blue.500"));
        assert!(matches("color.b*e", "color.blue"));
        assert!(!matches("color.b*e", "color.black"));
    }
}
