//! Swatch - A design token compiler.
//!
//! Reads design token documents, resolves `$ref` pointers and `{alias}`
//! references across them, validates every token against its `$type`, and
//! produces a set of canonical values ready for code generation.

pub mod config;

mod error;
mod query;

pub use swatch_core::{TokenType, TokenValue, color, dimension, identifier, stroke, value};
pub use swatch_parser::{
    DEFAULT_MODE, Diagnostic, GrammarAdapter, Input, LintContext, LintNotice, LintPlugin,
    ParseResult, Retrieve, RuleSeverity, Severity, Token, TokenSet,
};

pub use error::SwatchError;
pub use query::Query;

use std::{fmt, io, path::Path, sync::Arc};

use log::{debug, info, trace};
use url::Url;

use swatch_parser::ParseOptions;

use config::AppConfig;

/// Builder for compiling token documents.
///
/// Holds the [`AppConfig`] and the collaborators a run needs: lint plugins,
/// a custom retriever, and an alternate grammar.
///
/// # Examples
///
/// ```rust,no_run
/// use swatch::{TokenSetBuilder, config::AppConfig};
///
/// # async fn run() -> Result<(), swatch::SwatchError> {
/// let builder = TokenSetBuilder::new(AppConfig::default());
///
/// // Compile files from disk
/// let result = builder.parse_files(&["tokens/base.json", "tokens/theme.json"]).await?;
/// println!("{} tokens", result.tokens.len());
///
/// // Or use default config
/// let builder = TokenSetBuilder::default();
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct TokenSetBuilder {
    config: AppConfig,
    plugins: Vec<Arc<dyn LintPlugin>>,
    retriever: Option<Arc<dyn Retrieve>>,
    grammar: Option<Arc<dyn GrammarAdapter>>,
}

impl fmt::Debug for TokenSetBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSetBuilder")
            .field("config", &self.config)
            .field("plugins", &self.plugins.len())
            .field("retriever", &self.retriever.is_some())
            .field("grammar", &self.grammar.as_ref().map(|g| g.name().to_string()))
            .finish()
    }
}

impl TokenSetBuilder {
    /// Create a new builder with the given configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swatch::{TokenSetBuilder, config::AppConfig};
    ///
    /// let builder = TokenSetBuilder::new(AppConfig::default());
    /// ```
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Register a lint plugin.
    pub fn with_plugin(mut self, plugin: Arc<dyn LintPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Fetch referenced documents with `retriever` instead of the default.
    pub fn with_retriever(mut self, retriever: Arc<dyn Retrieve>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Accept inputs that are not JSON through `grammar`.
    pub fn with_grammar(mut self, grammar: Arc<dyn GrammarAdapter>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn options(&self) -> ParseOptions {
        let parser = self.config.parser();
        ParseOptions {
            continue_on_error: parser.continue_on_error(),
            skip_lint: parser.skip_lint(),
            grammar: self.grammar.clone(),
            retriever: self.retriever.clone(),
            plugins: self.plugins.clone(),
            rules: self.config.lint().rules().clone(),
        }
    }

    /// Compile in-memory inputs into a token set.
    ///
    /// # Errors
    ///
    /// Returns [`SwatchError::Parse`] carrying every diagnostic of a failed
    /// run.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use swatch::{Input, TokenSetBuilder};
    ///
    /// # async fn run() -> Result<(), swatch::SwatchError> {
    /// let input = Input::new(r#"{"gap": {"$type": "dimension", "$value": "4px"}}"#);
    /// let result = TokenSetBuilder::default().parse(vec![input]).await?;
    /// assert!(result.tokens.contains("gap"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn parse(&self, inputs: Vec<Input>) -> Result<ParseResult, SwatchError> {
        info!(inputs = inputs.len(); "Compiling token set");

        let result = swatch_parser::parse(inputs, self.options()).await?;

        debug!(
            tokens = result.tokens.len(),
            diagnostics = result.diagnostics.len();
            "Token set compiled"
        );
        trace!(tokens:? = result.tokens.ids().collect::<Vec<_>>(); "Compiled token ids");

        Ok(result)
    }

    /// Read token documents from disk and compile them.
    ///
    /// Each file gets a `file:` locator, so relative `$ref`s resolve
    /// against its directory.
    ///
    /// # Errors
    ///
    /// Returns [`SwatchError::Io`] when a file cannot be read, and
    /// [`SwatchError::Parse`] when compilation fails.
    pub async fn parse_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ParseResult, SwatchError> {
        let mut inputs = Vec::with_capacity(paths.len());
        for path in paths {
            let path = tokio::fs::canonicalize(path.as_ref()).await?;
            debug!(path = path.display().to_string(); "Reading token file");

            let text = tokio::fs::read_to_string(&path).await?;
            let locator = Url::from_file_path(&path).map_err(|()| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("cannot address {} as a file URL", path.display()),
                )
            })?;
            inputs.push(Input::new(text).with_locator(locator));
        }
        self.parse(inputs).await
    }
}
