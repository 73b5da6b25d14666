//! Conversion service
//!
//! Request-layer facade over the parser and generator. Batch-level failures
//! are reported as [`ConvertError`] values; the publish store is injected,
//! never global.

pub mod cache;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::generator::{Generator, RuleMode, Variant};
use crate::parser::ProxyParser;
use crate::parser::detection::split_links;

pub use cache::{PublishCache, PublishError, PublishReceipt, PublishStore};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no valid links")]
    NoValidLinks,
    #[error("no valid nodes")]
    NoValidNodes,
    #[error("failed to render config: {0}")]
    Render(#[from] serde_yaml::Error),
    #[error("publishing is not configured")]
    PublishUnavailable,
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// A rendered document plus batch counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub text: String,
    pub node_count: usize,
    pub invalid_count: usize,
}

pub struct ConversionService {
    parser: ProxyParser,
    generator: Generator,
    store: Option<Arc<dyn PublishStore>>,
}

impl ConversionService {
    pub fn new(generator: Generator) -> Self {
        Self {
            parser: ProxyParser::new(),
            generator,
            store: None,
        }
    }

    /// Enables `publish`/`fetch` through `store`
    pub fn with_store(mut self, store: Arc<dyn PublishStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Converts link lines into a Mihomo document
    pub fn convert<S: AsRef<str>>(
        &self,
        raw_links: &[S],
        variant: Variant,
        mode: RuleMode,
    ) -> Result<Conversion, ConvertError> {
        let outcome = self.parser.parse(raw_links);
        if outcome.link_count == 0 {
            return Err(ConvertError::NoValidLinks);
        }
        if outcome.nodes.is_empty() {
            return Err(ConvertError::NoValidNodes);
        }

        let node_count = outcome.nodes.len();
        let document = self.generator.generate(outcome.nodes, variant, mode);
        let text = document.to_text()?;

        info!(
            "Converted {} nodes, skipped {} invalid links",
            node_count, outcome.invalid_count
        );
        Ok(Conversion {
            text,
            node_count,
            invalid_count: outcome.invalid_count,
        })
    }

    /// Converts pasted or uploaded content, plain or Base64-wrapped
    pub fn convert_content(
        &self,
        content: &str,
        variant: Variant,
        mode: RuleMode,
    ) -> Result<Conversion, ConvertError> {
        let links = split_links(content);
        debug!("Extracted {} link lines from content", links.len());
        self.convert(links.as_slice(), variant, mode)
    }

    /// Stores a conversion under `id`
    pub fn publish(
        &self,
        id: &str,
        conversion: &Conversion,
    ) -> Result<PublishReceipt, ConvertError> {
        let store = self.store.as_ref().ok_or(ConvertError::PublishUnavailable)?;
        Ok(store.put(id, &conversion.text)?)
    }

    /// Published text, `None` when unknown, expired or evicted
    pub fn fetch(&self, id: &str) -> Option<String> {
        self.store.as_ref()?.get(id)
    }
}
