//! Textual alias (`{token.id}`) resolution over the merged token set.
//!
//! Aliases form a dependency graph between tokens. Strongly connected
//! components are circular aliases; everything else is resolved in DFS
//! post-order, so a token is only processed once every token it aliases has
//! its final raw value. Tokens that depend on a failed token fail silently.
//!
//! Group membership is derived afterwards from the sorted list of ids, so the
//! result does not depend on the order tokens were declared in.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use indexmap::IndexMap;
use log::{debug, trace};
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
    visit::DfsPostOrder,
};
use serde_json::Value;

use swatch_core::identifier::{SEPARATOR, alias_target, find_aliases, join_id};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    token::{DEFAULT_MODE, Token, TokenSet},
};

/// The new raw value of one mode.
#[derive(Debug)]
struct ModeUpdate {
    name: String,
    raw: Value,
    /// Target when the whole mode value was an alias
    alias: Option<(String, Vec<String>)>,
}

#[derive(Debug, Default)]
struct Resolution {
    modes: Vec<ModeUpdate>,
    partial_alias_of: IndexMap<String, String>,
}

fn located(token: &Token, diagnostic: Diagnostic) -> Diagnostic {
    diagnostic.with_source(token.source.locator.as_ref(), Arc::clone(&token.source.text))
}

/// Every alias target mentioned anywhere in `value`.
fn collect_targets<'v>(value: &'v Value, targets: &mut Vec<&'v str>) {
    match value {
        Value::String(s) => targets.extend(find_aliases(s).into_iter().map(|alias| alias.target)),
        Value::Array(items) => items.iter().for_each(|item| collect_targets(item, targets)),
        Value::Object(map) => map.values().for_each(|item| collect_targets(item, targets)),
        _ => {}
    }
}

/// Resolved raw value of `target` under `mode`, falling back to its default.
fn target_raw<'t>(target: &'t Token, mode: &str) -> Option<&'t Value> {
    target
        .mode
        .get(mode)
        .or_else(|| target.mode.get(DEFAULT_MODE))
        .map(|mode| &mode.raw)
}

/// Text spliced in for an alias embedded in a longer string.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace aliases below the top level of a value.
///
/// Strings that are entirely an alias take the target's value and are
/// recorded in `partial` by field path; embedded aliases are spliced in as
/// text.
fn substitute(
    value: &Value,
    tokens: &TokenSet,
    mode: &str,
    path: &mut Vec<String>,
    partial: &mut IndexMap<String, String>,
) -> Value {
    match value {
        Value::String(s) => {
            if let Some(target) = alias_target(s) {
                if let Some(raw) = tokens.get(target).and_then(|t| target_raw(t, mode)) {
                    if !path.is_empty() {
                        partial.insert(join_id(path.iter()), target.to_string());
                    }
                    return raw.clone();
                }
            }
            let mut text = String::with_capacity(s.len());
            let mut last = 0;
            for alias in find_aliases(s) {
                let Some(raw) = tokens.get(alias.target).and_then(|t| target_raw(t, mode)) else {
                    continue;
                };
                text.push_str(&s[last..alias.range.start]);
                text.push_str(&render(raw));
                last = alias.range.end;
            }
            text.push_str(&s[last..]);
            Value::String(text)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    path.push(index.to_string());
                    let item = substitute(item, tokens, mode, path, partial);
                    path.pop();
                    item
                })
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    path.push(key.clone());
                    let item = substitute(item, tokens, mode, path, partial);
                    path.pop();
                    (key.clone(), item)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Compute the alias-free raw values of `token`, whose targets are all
/// resolved already.
fn resolve_token(token: &Token, tokens: &TokenSet) -> Result<Resolution, Diagnostic> {
    let mut resolution = Resolution::default();

    for (name, mode) in &token.mode {
        let whole = mode.raw.as_str().and_then(alias_target);
        let Some(target_id) = whole else {
            let mut partial = IndexMap::new();
            let raw = substitute(&mode.raw, tokens, name, &mut Vec::new(), &mut partial);
            if name == DEFAULT_MODE {
                resolution.partial_alias_of = partial;
            }
            resolution.modes.push(ModeUpdate {
                name: name.clone(),
                raw,
                alias: None,
            });
            continue;
        };

        let target = tokens.get(target_id);
        let Some((target, raw)) = target.and_then(|t| target_raw(t, name).map(|raw| (t, raw))) else {
            return Err(unresolved(token, target_id, mode.span));
        };
        if target.ty != token.ty {
            return Err(Diagnostic::error(format!(
                "alias type mismatch: `{}` is {} but `{target_id}` is {}",
                token.id, token.ty, target.ty
            ))
            .with_code(ErrorCode::E302)
            .with_label(mode.span, ErrorCode::E302.description())
            .with_help(format!("change the $type of `{}` or alias a {} token", token.id, token.ty)));
        }

        resolution.modes.push(ModeUpdate {
            name: name.clone(),
            raw: raw.clone(),
            alias: Some((target_id.to_string(), target.alias_chain.clone())),
        });
    }
    Ok(resolution)
}

fn unresolved(token: &Token, target: &str, span: Span) -> Diagnostic {
    Diagnostic::error(format!(
        "unresolved alias {{{target}}} in `{}`: no such token",
        token.id
    ))
    .with_code(ErrorCode::E301)
    .with_label(span, ErrorCode::E301.description())
}

fn apply(token: &mut Token, resolution: Resolution) {
    for update in resolution.modes {
        let Some(mode) = token.mode.get_mut(&update.name) else {
            continue;
        };
        mode.raw = update.raw;
        if let Some((target, chain)) = update.alias {
            mode.alias_of = Some(target.clone());
            if update.name == DEFAULT_MODE {
                if token.alias_of.is_none() {
                    token.alias_of = Some(target.clone());
                }
                token.alias_chain.push(target);
                token.alias_chain.extend(chain);
            }
        }
    }
    token.partial_alias_of = resolution.partial_alias_of;
    if let Some(default) = token.mode.get(DEFAULT_MODE) {
        token.raw = default.raw.clone();
    }
}

/// Shortest cycle through `start` within one strongly connected component,
/// closed by repeating `start`.
fn cycle_path(graph: &DiGraph<usize, ()>, component: &[NodeIndex], start: NodeIndex) -> Vec<NodeIndex> {
    let members: HashSet<NodeIndex> = component.iter().copied().collect();
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        let mut next: Vec<NodeIndex> = graph
            .neighbors(node)
            .filter(|n| members.contains(n))
            .collect();
        next.sort();
        for succ in next {
            if succ == start {
                let mut path = vec![node];
                let mut current = node;
                while current != start {
                    current = parent[&current];
                    path.push(current);
                }
                path.reverse();
                path.push(start);
                return path;
            }
            if parent.contains_key(&succ) {
                continue;
            }
            parent.insert(succ, node);
            queue.push_back(succ);
        }
    }
    vec![start, start]
}

/// Resolve every alias in `tokens` in place and populate group membership.
///
/// Returns the ids of tokens that could not be resolved; their raw values
/// are left untouched and they must not be normalized.
pub(crate) fn resolve_aliases(
    tokens: &mut TokenSet,
    collector: &DiagnosticCollector,
) -> Result<HashSet<String>, ParseError> {
    let ids: Vec<String> = tokens.ids().map(str::to_string).collect();
    let index: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let mut failed = vec![false; ids.len()];

    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(ids.len(), 0);
    for i in 0..ids.len() {
        graph.add_node(i);
    }

    for (i, token) in tokens.iter().enumerate() {
        let mut unknown = HashSet::new();
        for mode in token.mode.values() {
            let mut targets = Vec::new();
            collect_targets(&mode.raw, &mut targets);
            for target in targets {
                match index.get(target) {
                    Some(&j) => {
                        graph.update_edge(NodeIndex::new(i), NodeIndex::new(j), ());
                    }
                    None => {
                        if unknown.insert(target) {
                            collector.emit(located(token, unresolved(token, target, mode.span)))?;
                        }
                        failed[i] = true;
                    }
                }
            }
        }
    }

    for component in tarjan_scc(&graph) {
        let Some(&start) = component.iter().min() else {
            continue;
        };
        if component.len() == 1 && !graph.contains_edge(start, start) {
            continue;
        }
        let chain: Vec<&str> = cycle_path(&graph, &component, start)
            .iter()
            .map(|node| ids[node.index()].as_str())
            .collect();
        if let Some(token) = tokens.get(&ids[start.index()]) {
            collector.emit(located(
                token,
                Diagnostic::error(format!("circular alias: {}", chain.join(" → ")))
                    .with_code(ErrorCode::E300)
                    .with_label(token.source.value_span, ErrorCode::E300.description()),
            ))?;
        }
        for node in component {
            failed[node.index()] = true;
        }
    }

    let mut order = Vec::with_capacity(ids.len());
    let mut dfs = DfsPostOrder::empty(&graph);
    for start in graph.node_indices() {
        dfs.move_to(start);
        while let Some(node) = dfs.next(&graph) {
            order.push(node);
        }
    }

    let mut resolved = 0;
    for node in order {
        let i = node.index();
        if failed[i] {
            continue;
        }
        if graph.neighbors(node).any(|dep| failed[dep.index()]) {
            trace!(token = ids[i].as_str(); "Alias target failed");
            failed[i] = true;
            continue;
        }
        if graph.neighbors(node).next().is_none() {
            continue;
        }

        let Some(token) = tokens.get(&ids[i]) else {
            continue;
        };
        match resolve_token(token, tokens) {
            Ok(resolution) => {
                if let Some(token) = tokens.get_mut(&ids[i]) {
                    apply(token, resolution);
                    resolved += 1;
                }
            }
            Err(diagnostic) => {
                collector.emit(located(token, diagnostic))?;
                failed[i] = true;
            }
        }
    }

    populate_groups(tokens);
    debug!(tokens = ids.len(), resolved = resolved; "Resolved aliases");

    Ok(ids
        .into_iter()
        .zip(failed)
        .filter_map(|(id, failed)| failed.then_some(id))
        .collect())
}

/// Fill every token's group with the sorted ids of all tokens nested under
/// that group.
fn populate_groups(tokens: &mut TokenSet) {
    let mut sorted: Vec<String> = tokens.ids().map(str::to_string).collect();
    sorted.sort();

    let mut members: HashMap<String, Vec<String>> = HashMap::new();
    for token in tokens.iter_mut() {
        let group = token.group.id.clone();
        let list = members.entry(group).or_insert_with_key(|group| {
            if group.is_empty() {
                return sorted.clone();
            }
            let prefix = format!("{group}{SEPARATOR}");
            let start = sorted.partition_point(|id| id.as_str() < prefix.as_str());
            sorted[start..]
                .iter()
                .take_while(|id| id.starts_with(&prefix))
                .cloned()
                .collect()
        });
        token.group.tokens = list.clone();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        builder::{self, Content},
        validate::validate,
    };

    fn token_set(text: &str) -> TokenSet {
        let collector = DiagnosticCollector::new(false);
        let mut source = builder::build(Content::from(text), None, None, &collector)
            .unwrap()
            .unwrap();
        let mut tokens = TokenSet::new();
        for token in validate(&mut source, &collector).unwrap() {
            tokens.insert(token);
        }
        tokens
    }

    fn codes(collector: &DiagnosticCollector) -> Vec<ErrorCode> {
        collector.diagnostics().iter().filter_map(Diagnostic::code).collect()
    }

    #[test]
    fn test_whole_alias() {
        let mut tokens = token_set(
            r#"{"spacing": {"$type": "dimension",
                "sm": {"$value": "0.5rem"},
                "md": {"$value": "{spacing.sm}"},
                "lg": {"$value": "{spacing.md}"}}}"#,
        );
        let collector = DiagnosticCollector::new(false);
        let failed = resolve_aliases(&mut tokens, &collector).unwrap();
        assert!(failed.is_empty());

        let lg = tokens.get("spacing.lg").unwrap();
        assert_eq!(lg.raw, json!("0.5rem"));
        assert_eq!(lg.alias_of.as_deref(), Some("spacing.md"));
        assert_eq!(lg.alias_chain, vec!["spacing.md", "spacing.sm"]);
        assert_eq!(lg.mode[DEFAULT_MODE].alias_of.as_deref(), Some("spacing.md"));
    }

    #[test]
    fn test_embedded_alias() {
        let mut tokens = token_set(
            r#"{"$type": "string", "name": {"$value": "swatch"}, "title": {"$value": "Hello {name}!"}}"#,
        );
        resolve_aliases(&mut tokens, &DiagnosticCollector::new(false)).unwrap();
        let title = tokens.get("title").unwrap();
        assert_eq!(title.raw, json!("Hello swatch!"));
        assert!(title.alias_of.is_none());
    }

    #[test]
    fn test_nested_alias_is_partial() {
        let mut tokens = token_set(
            r##"{
                "brand": {"$type": "color", "$value": "#663399"},
                "frame": {"$type": "border", "$value": {"color": "{brand}", "width": "1px", "style": "solid"}}
            }"##,
        );
        resolve_aliases(&mut tokens, &DiagnosticCollector::new(false)).unwrap();
        let frame = tokens.get("frame").unwrap();
        assert_eq!(frame.raw["color"], json!("#663399"));
        assert_eq!(frame.partial_alias_of.get("color").map(String::as_str), Some("brand"));
        assert!(frame.alias_of.is_none());
    }

    #[test]
    fn test_circular_alias() {
        let mut tokens = token_set(
            r#"{"$type": "number",
                "a": {"$value": "{b}"},
                "b": {"$value": "{a}"},
                "c": {"$value": "{a}"},
                "d": {"$value": 1}}"#,
        );
        let collector = DiagnosticCollector::new(true);
        let failed = resolve_aliases(&mut tokens, &collector).unwrap();

        let diagnostics = collector.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E300));
        assert_eq!(diagnostics[0].message(), "circular alias: a → b → a");
        let mut failed: Vec<&str> = failed.iter().map(String::as_str).collect();
        failed.sort();
        assert_eq!(failed, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_self_alias() {
        let mut tokens = token_set(r#"{"a": {"$type": "number", "$value": "{a}"}}"#);
        let collector = DiagnosticCollector::new(false);
        let err = resolve_aliases(&mut tokens, &collector).unwrap_err();
        assert_eq!(err.diagnostics()[0].message(), "circular alias: a → a");
    }

    #[test]
    fn test_unresolved_alias() {
        let mut tokens = token_set(r#"{"a": {"$type": "number", "$value": "{missing}"}}"#);
        let collector = DiagnosticCollector::new(true);
        let failed = resolve_aliases(&mut tokens, &collector).unwrap();
        assert!(failed.contains("a"));
        assert_eq!(codes(&collector), vec![ErrorCode::E301]);
    }

    #[test]
    fn test_alias_type_mismatch() {
        let mut tokens = token_set(
            r##"{"c": {"$type": "color", "$value": "#000"}, "n": {"$type": "number", "$value": "{c}"}}"##,
        );
        let collector = DiagnosticCollector::new(true);
        let failed = resolve_aliases(&mut tokens, &collector).unwrap();
        assert!(failed.contains("n"));
        assert_eq!(codes(&collector), vec![ErrorCode::E302]);
    }

    #[test]
    fn test_mode_alias_prefers_same_mode() {
        let mut tokens = token_set(
            r##"{"$type": "color",
                "base": {"$value": "#fff", "$extensions": {"mode": {"dark": "#000"}}},
                "bg": {"$value": "{base}", "$extensions": {"mode": {"dark": "{base}", "hc": "{base}"}}}}"##,
        );
        resolve_aliases(&mut tokens, &DiagnosticCollector::new(false)).unwrap();
        let bg = tokens.get("bg").unwrap();
        assert_eq!(bg.mode["dark"].raw, json!("#000"));
        assert_eq!(bg.mode["hc"].raw, json!("#fff"));
        assert_eq!(bg.mode[DEFAULT_MODE].raw, json!("#fff"));
    }

    #[test]
    fn test_groups_list_descendants_sorted() {
        let mut tokens = token_set(
            r#"{"$type": "number",
                "size": {"z": {"$value": 3}, "a": {"$value": 1}, "inner": {"m": {"$value": 2}}},
                "sizeish": {"$value": 4}}"#,
        );
        resolve_aliases(&mut tokens, &DiagnosticCollector::new(false)).unwrap();

        assert_eq!(tokens.get("size.z").unwrap().group.tokens, vec!["size.a", "size.inner.m", "size.z"]);
        assert_eq!(tokens.get("size.inner.m").unwrap().group.tokens, vec!["size.inner.m"]);
        assert_eq!(tokens.get("sizeish").unwrap().group.tokens.len(), 4);
    }
}
