//! Retrieval of referenced documents.
//!
//! [`Retrieve`] is the capability the resolver uses to fetch the raw text of
//! a document that is not one of the parse inputs. [`DefaultRetriever`] reads
//! `file:` locators from disk and, with the `http` feature, fetches `http:`
//! and `https:` locators over the network.

use std::fmt;

use async_trait::async_trait;
use log::debug;
use thiserror::Error;
use url::Url;

/// Errors raised while retrieving a document.
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("cannot read {url}: {source}")]
    Io {
        url: Url,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot retrieve {0}: unsupported locator scheme")]
    Unsupported(Url),

    #[cfg(feature = "http")]
    #[error("cannot fetch {url}: {source}")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetches the raw content of a document by absolute locator.
#[async_trait]
pub trait Retrieve: Send + Sync + fmt::Debug {
    async fn retrieve(&self, url: &Url) -> Result<String, RetrieveError>;
}

/// Reads local files, and remote documents when built with `http`.
#[derive(Debug, Clone, Default)]
pub struct DefaultRetriever {
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl DefaultRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_file(url: &Url) -> Result<String, RetrieveError> {
        let path = url
            .to_file_path()
            .map_err(|()| RetrieveError::Unsupported(url.clone()))?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| RetrieveError::Io {
                url: url.clone(),
                source,
            })
    }

    #[cfg(feature = "http")]
    async fn fetch(&self, url: &Url) -> Result<String, RetrieveError> {
        let wrap = |source| RetrieveError::Http {
            url: url.clone(),
            source,
        };
        self.client
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(wrap)?
            .text()
            .await
            .map_err(wrap)
    }
}

#[async_trait]
impl Retrieve for DefaultRetriever {
    async fn retrieve(&self, url: &Url) -> Result<String, RetrieveError> {
        debug!(url = url.as_str(); "Retrieving document");
        match url.scheme() {
            "file" => Self::read_file(url).await,
            #[cfg(feature = "http")]
            "http" | "https" => self.fetch(url).await,
            _ => Err(RetrieveError::Unsupported(url.clone())),
        }
    }
}
