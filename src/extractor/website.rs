//! Website extraction via a reader proxy.

use super::{ExtractionRequest, Extractor, RawContent, SourceKind};
use crate::config::WebsiteExtractorSettings;
use crate::error::{KastError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Fetches a page as markdown through the configured Jina reader endpoint.
pub struct WebsiteExtractor {
    client: reqwest::Client,
    jina_api_url: String,
    timeout_secs: u64,
}

impl WebsiteExtractor {
    pub fn new(settings: &WebsiteExtractorSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout))
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| KastError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            jina_api_url: settings.jina_api_url.trim_end_matches('/').to_string(),
            timeout_secs: settings.timeout,
        })
    }

    /// Build the reader-proxy URL for a page.
    fn reader_url(&self, page_url: &str) -> String {
        format!("{}/{}", self.jina_api_url, page_url)
    }
}

#[async_trait]
impl Extractor for WebsiteExtractor {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Website
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<RawContent> {
        if request.source_kind != SourceKind::Website {
            return Err(KastError::InvalidInput(format!(
                "website extractor received a {} request",
                request.source_kind
            )));
        }

        let url = self.reader_url(&request.source_url);
        debug!("Fetching {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                KastError::Extraction(format!(
                    "fetching {} timed out after {}s",
                    request.source_url, self.timeout_secs
                ))
            } else {
                KastError::Extraction(format!("fetching {} failed: {}", request.source_url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(KastError::Extraction(format!(
                "fetching {} returned {}",
                request.source_url, status
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| KastError::Extraction(format!("reading response body: {}", e)))?;

        if text.trim().is_empty() {
            return Err(KastError::Extraction(format!(
                "no content extracted from {}",
                request.source_url
            )));
        }

        Ok(RawContent::new(text, request.clone()))
    }
}
