//! Structural reference (`$ref`) resolution.
//!
//! Each pass walks one tree, collects every object carrying a `$ref` member,
//! resolves all of them concurrently, and only then substitutes the results,
//! deepest first. A resolved target is itself fully resolved before it is
//! substituted, so no `$ref` survives except where an error was reported.
//!
//! Documents other than the current one come from a per-invocation cache
//! keyed by absolute locator. The first resolution to miss a locator fetches
//! it; concurrent resolutions of the same locator await that fetch.

use std::{
    collections::HashMap,
    iter,
    sync::{Arc, Mutex, PoisonError},
};

use futures::future::{BoxFuture, FutureExt as _, join_all};
use indexmap::IndexSet;
use log::{debug, trace};
use tokio::sync::OnceCell;
use url::Url;

use crate::{
    builder::{self, Content, GrammarAdapter, Source},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    pointer::Pointer,
    retrieve::Retrieve,
    span::Span,
    tree::{NodeId, NodeKind, Provenance, Tree},
    walk::{Flow, Visitor, traverse},
};

/// The member holding a structural reference.
pub const REF_KEY: &str = "$ref";

/// Member names with special meaning in a token document.
pub const RESERVED_KEYS: [&str; 5] = [
    "$value",
    "$type",
    "$description",
    "$extensions",
    "$deprecated",
];

/// Outcome of loading one locator, shared by every `$ref` into it.
#[derive(Debug, Clone)]
enum Loaded {
    Document(Arc<Source>),
    /// Why the document is unavailable, reported again at each site
    Failed(Arc<str>),
}

type Slot = Arc<OnceCell<Result<Loaded, ParseError>>>;

/// Parsed documents of one `parse` invocation, by absolute locator.
#[derive(Debug, Default)]
pub(crate) struct SourceCache {
    slots: Mutex<HashMap<Url, Slot>>,
}

impl SourceCache {
    /// Register an already-built document.
    pub(crate) fn seed(&self, url: Url, source: Arc<Source>) {
        let slot = Arc::new(OnceCell::new_with(Some(Ok(Loaded::Document(source)))));
        self.lock().insert(url, slot);
    }

    /// The slot for `url`, created empty on first request.
    fn slot(&self, url: &Url) -> Slot {
        Arc::clone(self.lock().entry(url.clone()).or_default())
    }

    /// Every successfully built document, in no particular order.
    pub(crate) fn sources(&self) -> Vec<(Url, Arc<Source>)> {
        self.lock()
            .iter()
            .filter_map(|(url, slot)| match slot.get() {
                Some(Ok(Loaded::Document(source))) => Some((url.clone(), Arc::clone(source))),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Url, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The document a tree's spans point into, and the locator relative
/// references resolve against.
#[derive(Debug, Clone)]
pub(crate) struct Origin {
    base: Url,
    locator: Option<Url>,
    text: Arc<str>,
}

impl Origin {
    pub(crate) fn new(base: Url, source: &Source) -> Self {
        Self {
            base,
            locator: source.locator().cloned(),
            text: Arc::clone(source.text()),
        }
    }

    fn attach(&self, diagnostic: Diagnostic) -> Diagnostic {
        diagnostic.with_source(self.locator.as_ref(), Arc::clone(&self.text))
    }
}

/// A `$ref` found in a tree.
#[derive(Debug)]
struct RefSite {
    /// Object containing the `$ref` member
    object: NodeId,
    /// Node whose last child is `object`
    holder: NodeId,
    /// Member name when the holder is a member
    slot: Option<String>,
    expr: String,
    /// Span of the `$ref` member
    span: Span,
    /// Whether `$ref` is the object's only member
    sole: bool,
}

/// Collects `$ref` sites in pre-order.
struct SiteCollector<'a> {
    origin: &'a Origin,
    collector: &'a DiagnosticCollector,
    sites: Vec<RefSite>,
}

impl Visitor for SiteCollector<'_> {
    fn enter(
        &mut self,
        tree: &mut Tree,
        node: NodeId,
        _parent: Option<NodeId>,
        path: &[String],
    ) -> Result<Flow, ParseError> {
        let slot = match tree.kind(node) {
            NodeKind::Member => path.last().cloned(),
            NodeKind::Document | NodeKind::Element => None,
            _ => return Ok(Flow::Continue),
        };
        let object = tree.member_value(node);
        let Some(member) = tree.find_member(object, REF_KEY) else {
            return Ok(Flow::Continue);
        };

        let span = tree.span(member);
        let value = tree.member_value(member);
        let Some(expr) = tree.as_str(value) else {
            self.collector.emit(
                self.origin.attach(
                    Diagnostic::error(format!(
                        "invalid $ref: expected a pointer string, found {}",
                        tree.kind(value).name()
                    ))
                    .with_code(ErrorCode::E100)
                    .with_label(tree.span(value), ErrorCode::E100.description())
                    .with_help("write the reference as `\"$ref\": \"<file>#/path/to/node\"`"),
                ),
            )?;
            return Ok(Flow::Continue);
        };

        self.sites.push(RefSite {
            object,
            holder: node,
            slot,
            expr: expr.to_string(),
            span,
            sole: tree.children(object).len() == 1,
        });
        Ok(Flow::Continue)
    }
}

/// A fully resolved `$ref` target.
#[derive(Debug)]
struct Resolved {
    tree: Tree,
    /// Token ids of every hop, nearest first
    hops: Vec<String>,
}

/// Resolves structural references for one `parse` invocation.
#[derive(Debug)]
pub(crate) struct Resolver {
    cache: SourceCache,
    retriever: Arc<dyn Retrieve>,
    adapter: Option<Arc<dyn GrammarAdapter>>,
    collector: DiagnosticCollector,
}

impl Resolver {
    pub(crate) fn new(
        retriever: Arc<dyn Retrieve>,
        adapter: Option<Arc<dyn GrammarAdapter>>,
        collector: DiagnosticCollector,
    ) -> Self {
        Self {
            cache: SourceCache::default(),
            retriever,
            adapter,
            collector,
        }
    }

    pub(crate) fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// Resolve every `$ref` in `source` in place.
    pub(crate) async fn resolve_source(&self, source: &mut Source, base: Url) -> Result<(), ParseError> {
        let origin = Origin::new(base, source);
        self.resolve_tree(source.tree_mut(), &origin, &IndexSet::new())
            .await
    }

    fn resolve_tree<'a>(
        &'a self,
        tree: &'a mut Tree,
        origin: &'a Origin,
        chain: &'a IndexSet<String>,
    ) -> BoxFuture<'a, Result<(), ParseError>> {
        async move {
            let sites = {
                let mut sites = SiteCollector {
                    origin,
                    collector: &self.collector,
                    sites: Vec::new(),
                };
                traverse(tree, &mut sites)?;
                sites.sites
            };
            if sites.is_empty() {
                return Ok(());
            }
            trace!(base = origin.base.as_str(), refs = sites.len(); "Resolving references");

            let results = join_all(sites.iter().map(|site| {
                self.trace(
                    origin.base.clone(),
                    site.expr.clone(),
                    chain.clone(),
                    Vec::new(),
                    origin,
                    site.span,
                )
            }))
            .await;

            // Deepest first, so holders of earlier sites stay valid
            for (site, result) in sites.iter().zip(results).rev() {
                if let Some(resolved) = result? {
                    self.substitute(tree, site, resolved, origin)?;
                }
            }
            Ok(())
        }
        .boxed()
    }

    /// Follow `expr` to its target, transitively.
    ///
    /// `chain` holds the `locator#path` keys already being resolved; seeing
    /// one again is a circular reference. Errors are reported at `span` in
    /// `site` and yield `Ok(None)` unless they halt the run.
    fn trace<'a>(
        &'a self,
        base: Url,
        expr: String,
        mut chain: IndexSet<String>,
        mut hops: Vec<String>,
        site: &'a Origin,
        span: Span,
    ) -> BoxFuture<'a, Result<Option<Resolved>, ParseError>> {
        async move {
            let target = Pointer::parse(&expr)
                .and_then(|pointer| pointer.target(&base).map(|url| (pointer, url)));
            let (pointer, url) = match target {
                Ok(target) => target,
                Err(err) => {
                    self.report(site, span, ErrorCode::E100, err.to_string())?;
                    return Ok(None);
                }
            };

            let key = format!("{url}#{}", pointer.path().join("/"));
            if chain.contains(&key) {
                let cycle: Vec<&str> = chain
                    .iter()
                    .map(String::as_str)
                    .chain(iter::once(key.as_str()))
                    .collect();
                self.report(
                    site,
                    span,
                    ErrorCode::E101,
                    format!("circular $ref: {}", cycle.join(" → ")),
                )?;
                return Ok(None);
            }
            chain.insert(key);
            hops.push(match pointer.path() {
                [] => url.to_string(),
                _ => pointer.token_id(),
            });

            let Some(document) = self.load(&url, site, span).await? else {
                return Ok(None);
            };
            let tree = document.tree();
            let node = match pointer.path() {
                [] => Some(tree.body()),
                path => tree.find(path),
            };
            let Some(node) = node else {
                self.report(
                    site,
                    span,
                    ErrorCode::E102,
                    format!("unresolved $ref \"{expr}\": no such node in {url}"),
                )?;
                return Ok(None);
            };

            if let Some(next) = sole_ref(tree, node) {
                let next = next.to_string();
                return self.trace(url, next, chain, hops, site, span).await;
            }

            let mut fragment = Tree::fragment(tree, node);
            let origin = Origin::new(url, &document);
            self.resolve_tree(&mut fragment, &origin, &chain).await?;
            Ok(Some(Resolved {
                tree: fragment,
                hops,
            }))
        }
        .boxed()
    }

    /// Fetch and build `url`, or wait for the resolution that already is.
    ///
    /// A locator that cannot be loaded is reported at every site reading it.
    async fn load(&self, url: &Url, site: &Origin, span: Span) -> Result<Option<Arc<Source>>, ParseError> {
        let slot = self.cache.slot(url);
        let loaded = slot
            .get_or_init(|| async {
                debug!(url = url.as_str(); "Source cache miss");
                let text = match self.retriever.retrieve(url).await {
                    Ok(text) => text,
                    Err(err) => return Ok(Loaded::Failed(Arc::from(err.to_string()))),
                };
                let source = builder::build(
                    Content::Text(text),
                    Some(url),
                    self.adapter.as_deref(),
                    &self.collector,
                )?;
                Ok(match source {
                    Some(source) => Loaded::Document(Arc::new(source)),
                    None => Loaded::Failed(Arc::from(format!("{url} is not a valid token document"))),
                })
            })
            .await
            .clone()?;

        match loaded {
            Loaded::Document(source) => Ok(Some(source)),
            Loaded::Failed(reason) => {
                self.report(site, span, ErrorCode::E104, reason.to_string())?;
                Ok(None)
            }
        }
    }

    /// Put a resolved target in place of its `$ref` site.
    fn substitute(
        &self,
        tree: &mut Tree,
        site: &RefSite,
        resolved: Resolved,
        origin: &Origin,
    ) -> Result<(), ParseError> {
        let Resolved {
            tree: fragment,
            hops,
        } = resolved;
        let body = fragment.body();
        let Some(index) = tree.children(site.holder).len().checked_sub(1) else {
            return Ok(());
        };

        if site.sole {
            let mut node = tree.graft(&fragment, body);
            if site.slot.as_deref() == Some("$value") {
                // A whole token was referenced: take its value
                if let Some(value) = tree.get(node, "$value") {
                    node = value;
                }
                let alias_of = hops.first().cloned().unwrap_or_default();
                tree.set_provenance(
                    node,
                    Provenance {
                        alias_of,
                        chain: hops,
                    },
                );
            }
            tree.replace_child(site.holder, index, node);
            return Ok(());
        }

        if !matches!(fragment.kind(body), NodeKind::Object) {
            return self.report_with(
                origin,
                Diagnostic::error(format!(
                    "cannot merge $ref \"{}\" into an object: its target is {}",
                    site.expr,
                    fragment.kind(body).name()
                ))
                .with_code(ErrorCode::E103)
                .with_label(site.span, ErrorCode::E103.description())
                .with_secondary_label(tree.span(site.object), "object with local members")
                .with_help("a reference to an array or primitive must be the only member of its object"),
            );
        }

        let kept: Vec<NodeId> = tree
            .children(site.object)
            .iter()
            .copied()
            .filter(|&member| tree.member_name(member) != REF_KEY)
            .collect();
        tree.set_children(site.object, kept);

        let incoming: Vec<(String, NodeId)> = fragment
            .members(body)
            .map(|(name, member)| (name.to_string(), fragment.member_value(member)))
            .collect();
        for (name, value) in incoming {
            // Local members override referenced ones
            if tree.find_member(site.object, &name).is_none() {
                let value = tree.graft(&fragment, value);
                tree.push_member(site.object, &name, value);
            }
        }
        Ok(())
    }

    fn report(&self, origin: &Origin, span: Span, code: ErrorCode, message: String) -> Result<(), ParseError> {
        self.report_with(
            origin,
            Diagnostic::error(message)
                .with_code(code)
                .with_label(span, code.description()),
        )
    }

    fn report_with(&self, origin: &Origin, diagnostic: Diagnostic) -> Result<(), ParseError> {
        self.collector.emit(origin.attach(diagnostic))
    }
}

/// The pointer of an object whose only member is a string `$ref`.
fn sole_ref(tree: &Tree, node: NodeId) -> Option<&str> {
    if !matches!(tree.kind(node), NodeKind::Object) || tree.children(node).len() != 1 {
        return None;
    }
    tree.get(node, REF_KEY).and_then(|value| tree.as_str(value))
}

/// Whether the subtree at `node` still carries a `$ref` member.
pub(crate) fn contains_ref(tree: &Tree, node: NodeId) -> bool {
    match tree.kind(node) {
        NodeKind::Object => tree
            .members(node)
            .any(|(name, member)| name == REF_KEY || contains_ref(tree, tree.member_value(member))),
        NodeKind::Array => tree
            .children(node)
            .iter()
            .any(|&element| contains_ref(tree, tree.member_value(element))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::retrieve::RetrieveError;

    /// Serves documents from memory and counts fetches.
    #[derive(Debug, Default)]
    struct MemoryRetriever {
        documents: HashMap<String, String>,
        fetches: AtomicUsize,
    }

    impl MemoryRetriever {
        fn with(mut self, url: &str, text: &str) -> Self {
            self.documents.insert(url.to_string(), text.to_string());
            self
        }
    }

    #[async_trait]
    impl Retrieve for MemoryRetriever {
        async fn retrieve(&self, url: &Url) -> Result<String, RetrieveError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.documents
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| RetrieveError::Unsupported(url.clone()))
        }
    }

    const BASE: &str = "file:///tokens/a.json";

    async fn resolve_with(
        text: &str,
        retriever: Arc<MemoryRetriever>,
        collector: &DiagnosticCollector,
    ) -> Result<Source, ParseError> {
        let base = Url::parse(BASE).unwrap();
        let mut source = builder::build(Content::from(text), Some(&base), None, collector)?
            .expect("document builds");
        let resolver = Resolver::new(retriever, None, collector.clone());
        resolver
            .cache()
            .seed(base.clone(), Arc::new(source.clone()));
        resolver.resolve_source(&mut source, base).await?;
        Ok(source)
    }

    fn value_of(source: &Source) -> serde_json::Value {
        source.tree().to_value(source.tree().root())
    }

    #[tokio::test]
    async fn test_remote_token_value_is_hoisted() {
        let retriever = Arc::new(MemoryRetriever::default().with(
            "file:///tokens/b.json",
            r##"{"color": {"brand": {"$type": "color", "$value": "#663399"}}}"##,
        ));
        let collector = DiagnosticCollector::new(false);
        let source = resolve_with(
            r#"{"brand": {"$type": "color", "$value": {"$ref": "./b.json#/color/brand"}}}"#,
            retriever,
            &collector,
        )
        .await
        .unwrap();

        assert_eq!(
            value_of(&source),
            json!({"brand": {"$type": "color", "$value": "#663399"}})
        );
        let tree = source.tree();
        let brand = tree.get(tree.body(), "brand").unwrap();
        let value = tree.get(brand, "$value").unwrap();
        let provenance = tree.provenance(value).unwrap();
        assert_eq!(provenance.alias_of, "color.brand");
        assert_eq!(provenance.chain, vec!["color.brand".to_string()]);
    }

    #[tokio::test]
    async fn test_local_transitive_chain() {
        let collector = DiagnosticCollector::new(false);
        let source = resolve_with(
            r##"{
                "a": {"$value": {"$ref": "#/b/$value"}},
                "b": {"$value": {"$ref": "#/c/$value"}},
                "c": {"$value": "4px"}
            }"##,
            Arc::default(),
            &collector,
        )
        .await
        .unwrap();

        let tree = source.tree();
        let a = tree.get(tree.body(), "a").unwrap();
        let value = tree.get(a, "$value").unwrap();
        assert_eq!(tree.to_value(value), json!("4px"));
        assert_eq!(
            tree.provenance(value).unwrap().chain,
            vec!["b".to_string(), "c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_self_embedding_is_invalid() {
        let collector = DiagnosticCollector::new(false);
        let err = resolve_with(
            r##"{"a": {"$value": {"$ref": "#"}}}"##,
            Arc::default(),
            &collector,
        )
        .await
        .unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E100));
    }

    #[tokio::test]
    async fn test_cycle_is_reported_and_terminates() {
        let collector = DiagnosticCollector::new(true);
        let source = resolve_with(
            r##"{"a": {"$ref": "#/b"}, "b": {"$ref": "#/a"}, "c": {"x": {"$ref": "#/c"}}}"##,
            Arc::default(),
            &collector,
        )
        .await
        .unwrap();

        let circular: Vec<Diagnostic> = collector
            .diagnostics()
            .into_iter()
            .filter(|d| d.code() == Some(ErrorCode::E101))
            .collect();
        assert_eq!(circular.len(), 3);
        assert!(circular[0].message().contains(" → "));
        // Unresolvable sites are left as they were
        assert!(contains_ref(source.tree(), source.tree().body()));
    }

    #[tokio::test]
    async fn test_merge_keeps_local_members() {
        let collector = DiagnosticCollector::new(false);
        let source = resolve_with(
            r##"{
                "base": {"$type": "dimension", "$value": "4px", "$description": "base"},
                "alt": {"$ref": "#/base", "$description": "local"}
            }"##,
            Arc::default(),
            &collector,
        )
        .await
        .unwrap();

        assert_eq!(
            value_of(&source)["alt"],
            json!({"$description": "local", "$type": "dimension", "$value": "4px"})
        );
    }

    #[tokio::test]
    async fn test_merge_of_primitive_is_type_mismatch() {
        let collector = DiagnosticCollector::new(false);
        let err = resolve_with(
            r##"{"n": {"$value": 1}, "x": {"$ref": "#/n/$value", "$type": "number"}}"##,
            Arc::default(),
            &collector,
        )
        .await
        .unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E103));
    }

    #[tokio::test]
    async fn test_missing_target() {
        let collector = DiagnosticCollector::new(true);
        resolve_with(
            r##"{"a": {"$value": {"$ref": "#/nowhere"}}}"##,
            Arc::default(),
            &collector,
        )
        .await
        .unwrap();
        assert_eq!(collector.diagnostics()[0].code(), Some(ErrorCode::E102));
    }

    #[tokio::test]
    async fn test_concurrent_refs_fetch_once() {
        let retriever = Arc::new(MemoryRetriever::default().with(
            "file:///tokens/shared.json",
            r#"{"one": {"$value": 1}, "two": {"$value": 2}, "three": {"$value": 3}}"#,
        ));
        let collector = DiagnosticCollector::new(false);
        let source = resolve_with(
            r#"{
                "a": {"$value": {"$ref": "shared.json#/one"}},
                "b": {"$value": {"$ref": "shared.json#/two"}},
                "c": {"$value": {"$ref": "./shared.json#/three"}}
            }"#,
            Arc::clone(&retriever),
            &collector,
        )
        .await
        .unwrap();

        assert_eq!(retriever.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(
            value_of(&source),
            json!({"a": {"$value": 1}, "b": {"$value": 2}, "c": {"$value": 3}})
        );
    }

    #[tokio::test]
    async fn test_nested_refs_inside_remote_target() {
        let retriever = Arc::new(
            MemoryRetriever::default()
                .with(
                    "file:///tokens/theme/b.json",
                    r#"{"group": {"$type": "number", "n": {"$ref": "../c.json#/n"}}}"#,
                )
                .with("file:///tokens/c.json", r#"{"n": {"$value": 7}}"#),
        );
        let collector = DiagnosticCollector::new(false);
        let source = resolve_with(
            r#"{"imported": {"$ref": "theme/b.json#/group"}}"#,
            retriever,
            &collector,
        )
        .await
        .unwrap();

        assert_eq!(
            value_of(&source),
            json!({"imported": {"$type": "number", "n": {"$value": 7}}})
        );
    }

    #[tokio::test]
    async fn test_retrieval_failure() {
        let collector = DiagnosticCollector::new(true);
        resolve_with(
            r#"{"a": {"$value": {"$ref": "missing.json#/x"}}}"#,
            Arc::default(),
            &collector,
        )
        .await
        .unwrap();
        assert_eq!(collector.diagnostics()[0].code(), Some(ErrorCode::E104));
    }

    #[tokio::test]
    async fn test_retrieval_failure_reported_at_every_site() {
        let retriever = Arc::new(MemoryRetriever::default());
        let collector = DiagnosticCollector::new(true);
        resolve_with(
            r#"{
                "a": {"$value": {"$ref": "missing.json#/x"}},
                "b": {"$value": {"$ref": "missing.json#/y"}}
            }"#,
            Arc::clone(&retriever),
            &collector,
        )
        .await
        .unwrap();

        let failures: Vec<Diagnostic> = collector
            .diagnostics()
            .into_iter()
            .filter(|d| d.code() == Some(ErrorCode::E104))
            .collect();
        assert_eq!(failures.len(), 2);
        assert_eq!(retriever.fetches.load(Ordering::SeqCst), 1);
        assert_ne!(failures[0].labels()[0].span(), failures[1].labels()[0].span());
    }

    #[tokio::test]
    async fn test_unparsable_target_reported_at_every_site() {
        let retriever =
            Arc::new(MemoryRetriever::default().with("file:///tokens/bad.json", r#"{"x": }"#));
        let collector = DiagnosticCollector::new(true);
        resolve_with(
            r#"{
                "a": {"$value": {"$ref": "bad.json#/x"}},
                "b": {"$value": {"$ref": "bad.json#/y"}}
            }"#,
            retriever,
            &collector,
        )
        .await
        .unwrap();

        let failures = collector
            .diagnostics()
            .into_iter()
            .filter(|d| d.code() == Some(ErrorCode::E104))
            .count();
        assert_eq!(failures, 2);
    }

    #[tokio::test]
    async fn test_explicit_self_locator_is_invalid() {
        let collector = DiagnosticCollector::new(true);
        resolve_with(
            r#"{"a": {"$value": {"$ref": "./a.json#"}}}"#,
            Arc::default(),
            &collector,
        )
        .await
        .unwrap();

        let codes: Vec<_> = collector.diagnostics().iter().map(Diagnostic::code).collect();
        assert_eq!(codes, vec![Some(ErrorCode::E100)]);
    }
}
