//! # Swatch Parser
//!
//! Compiles design token documents into a validated, normalized token set.
//!
//! ## Usage
//!
//! ```
//! # use swatch_parser::{Input, ParseError, ParseOptions, parse};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ParseError> {
//! let input = Input::new(
//!     r#"{
//!         "spacing": {
//!             "$type": "dimension",
//!             "md": { "$value": "1rem" },
//!             "lg": { "$value": "{spacing.md}" }
//!         }
//!     }"#,
//! );
//!
//! let result = parse(vec![input], ParseOptions::default()).await?;
//! let lg = result.tokens.get("spacing.lg").unwrap();
//! assert_eq!(lg.alias_of.as_deref(), Some("spacing.md"));
//! # Ok(())
//! # }
//! ```

mod alias;
mod builder;
pub mod error;
mod lexer;
mod lint;
mod normalize;
mod parser;
pub mod pointer;
mod resolve;
mod retrieve;
mod span;
mod token;
mod tokens;
pub mod tree;
mod validate;
pub mod walk;
#[cfg(feature = "yaml")]
mod yaml;

pub use builder::{Content, GrammarAdapter, Source, looks_structural};
pub use error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError, Severity};
pub use lint::{LintContext, LintNotice, LintPlugin, RuleSeverity};
pub use resolve::{REF_KEY, RESERVED_KEYS};
pub use retrieve::{DefaultRetriever, Retrieve, RetrieveError};
pub use span::{Span, Spanned};
pub use token::{DEFAULT_MODE, Group, ModeValue, Token, TokenSet, TokenSource};
#[cfg(feature = "yaml")]
pub use yaml::YamlGrammar;

use std::{sync::Arc, time::Instant};

use futures::future::join_all;
use indexmap::{IndexMap, IndexSet};
use log::{debug, info};
use url::Url;

use resolve::Resolver;

/// One document to parse.
#[derive(Debug, Clone)]
pub struct Input {
    /// Absolute locator; relative `$ref`s resolve against it
    pub locator: Option<Url>,
    pub content: Content,
}

impl Input {
    pub fn new(content: impl Into<Content>) -> Self {
        Self {
            locator: None,
            content: content.into(),
        }
    }

    pub fn with_locator(mut self, locator: Url) -> Self {
        self.locator = Some(locator);
        self
    }
}

/// Runtime knobs of one [`parse`] invocation.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Count errors instead of halting at the first one
    pub continue_on_error: bool,
    pub skip_lint: bool,
    /// Converter for inputs that are not JSON
    pub grammar: Option<Arc<dyn GrammarAdapter>>,
    /// Fetches referenced documents; [`DefaultRetriever`] when unset
    pub retriever: Option<Arc<dyn Retrieve>>,
    pub plugins: Vec<Arc<dyn LintPlugin>>,
    pub rules: IndexMap<String, RuleSeverity>,
}

/// Output of a successful [`parse`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub tokens: TokenSet,
    /// Parsed inputs, in input order, with `$ref`s resolved
    pub sources: Vec<Source>,
    /// Warnings and notices of the run
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse, resolve, validate and normalize a set of token documents.
///
/// The pipeline:
///
/// 1. **Build** - Lex and parse every input into a syntax tree
/// 2. **Resolve** - Substitute `$ref`s, fetching other documents as needed
/// 3. **Validate** - Classify tokens and groups, check types and shapes
/// 4. **Alias** - Resolve `{token.id}` aliases across all inputs
/// 5. **Normalize** - Canonicalize every value and mode value
/// 6. **Lint** - Run lint plugins, unless skipped or none are configured
///
/// # Errors
///
/// Without `continue_on_error`, the first error ends the run. With it, the
/// run completes and fails afterwards with an `E009` summary followed by
/// every error that was recorded.
pub async fn parse(inputs: Vec<Input>, options: ParseOptions) -> Result<ParseResult, ParseError> {
    let collector = DiagnosticCollector::new(options.continue_on_error);
    let result = parse_with_collector(inputs, &options, &collector).await?;
    let diagnostics = collector.finish()?;
    Ok(ParseResult {
        diagnostics,
        ..result
    })
}

/// Run the [`parse`] pipeline, reporting into `collector`.
///
/// Whether errors halt is decided by `collector`, not by
/// `options.continue_on_error`. Nothing is summarized at the end: with a
/// collector that continues on error, the result holds every token that
/// survived, and the caller decides what the recorded errors mean.
pub async fn parse_with_collector(
    inputs: Vec<Input>,
    options: &ParseOptions,
    collector: &DiagnosticCollector,
) -> Result<ParseResult, ParseError> {
    if inputs.is_empty() {
        return Err(collector.fatal(
            Diagnostic::error("no inputs to parse")
                .with_code(ErrorCode::E001)
                .with_help("pass at least one token document"),
        ));
    }
    info!(inputs = inputs.len(); "Parsing token sources");

    let start = Instant::now();
    let mut seen = IndexSet::new();
    let mut sources = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.into_iter().enumerate() {
        if let Some(locator) = &input.locator {
            if !seen.insert(locator.clone()) {
                debug!(locator = locator.as_str(); "Skipping duplicate input");
                continue;
            }
        }
        let base = match &input.locator {
            Some(locator) => locator.clone(),
            None => synthetic_locator(index, collector)?,
        };
        let built = builder::build(
            input.content,
            input.locator.as_ref(),
            options.grammar.as_deref(),
            collector,
        )?;
        if let Some(source) = built {
            sources.push((base, source));
        }
    }
    debug!(elapsed_ms = elapsed_ms(start); "Finish JSON parsing");

    let start = Instant::now();
    let retriever = options
        .retriever
        .clone()
        .unwrap_or_else(|| Arc::new(DefaultRetriever::new()));
    let resolver = Resolver::new(retriever, options.grammar.clone(), collector.clone());
    for (base, source) in &sources {
        resolver.cache().seed(base.clone(), Arc::new(source.clone()));
    }
    let resolutions = join_all(
        sources
            .iter_mut()
            .map(|(base, source)| resolver.resolve_source(source, base.clone())),
    )
    .await;
    for resolution in resolutions {
        resolution?;
    }
    debug!(elapsed_ms = elapsed_ms(start); "Finish tokens resolving");

    let start = Instant::now();
    let mut tokens = TokenSet::new();
    for (_, source) in &mut sources {
        for token in validate::validate(source, collector)? {
            merge(&mut tokens, token, collector)?;
        }
    }
    debug!(elapsed_ms = elapsed_ms(start), tokens = tokens.len(); "Finish token validation");

    let start = Instant::now();
    let failed = alias::resolve_aliases(&mut tokens, collector)?;
    debug!(elapsed_ms = elapsed_ms(start); "Finish alias resolution");

    let start = Instant::now();
    normalize::normalize_tokens(&mut tokens, &failed, collector)?;
    debug!(elapsed_ms = elapsed_ms(start); "Finish token normalization");

    let sources: Vec<Source> = sources.into_iter().map(|(_, source)| source).collect();

    if !options.skip_lint && !options.plugins.is_empty() {
        let start = Instant::now();
        let context = LintContext {
            tokens: &tokens,
            sources: &sources,
            rules: &options.rules,
        };
        lint::run(&options.plugins, &context, collector).await?;
        debug!(elapsed_ms = elapsed_ms(start); "Finish linting");
    } else {
        debug!("Linting skipped");
    }

    info!(tokens = tokens.len(); "Token set ready");
    Ok(ParseResult {
        tokens,
        sources,
        diagnostics: collector.diagnostics(),
    })
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Locator for an input that has none, so local `$ref`s have a base.
fn synthetic_locator(index: usize, collector: &DiagnosticCollector) -> Result<Url, ParseError> {
    Url::parse(&format!("memory:///input-{index}.json")).map_err(|err| {
        collector.fatal(Diagnostic::error(format!("cannot name input {index}: {err}")).with_code(ErrorCode::E001))
    })
}

/// Add a validated token, warning when it shadows an earlier definition.
fn merge(tokens: &mut TokenSet, token: Token, collector: &DiagnosticCollector) -> Result<(), ParseError> {
    if let Some(previous) = tokens.get(&token.id) {
        let first = previous
            .source
            .locator
            .as_ref()
            .map_or_else(|| "an inline input".to_string(), Url::to_string);
        collector.emit(
            Diagnostic::warning(format!("token `{}` is defined more than once", token.id))
                .with_code(ErrorCode::E203)
                .with_label(token.source.span, "this definition wins")
                .with_help(format!("first defined in {first}"))
                .with_source(token.source.locator.as_ref(), Arc::clone(&token.source.text)),
        )?;
    }
    tokens.insert(token);
    Ok(())
}
