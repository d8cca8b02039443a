//! Content extraction for Kast.
//!
//! Provides a trait-based interface over the supported sources (websites
//! via a reader proxy, YouTube via caption tracks). A URL is routed to the
//! YouTube extractor when it contains any of the configured
//! `youtube_url_patterns` substrings; everything else is a website.

mod website;
mod youtube;

pub use website::WebsiteExtractor;
pub use youtube::YoutubeExtractor;

use crate::error::{KastError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Website,
    Youtube,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Website => write!(f, "website"),
            SourceKind::Youtube => write!(f, "youtube"),
        }
    }
}

impl SourceKind {
    /// Classify a URL by the configured YouTube substring patterns.
    pub fn classify(url: &str, youtube_url_patterns: &[String]) -> Self {
        if youtube_url_patterns.iter().any(|p| url.contains(p.as_str())) {
            SourceKind::Youtube
        } else {
            SourceKind::Website
        }
    }
}

/// A validated, classified extraction request. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub source_url: String,
    pub source_kind: SourceKind,
}

impl ExtractionRequest {
    /// Validate the URL and classify it against the configured patterns.
    pub fn new(source_url: &str, youtube_url_patterns: &[String]) -> Result<Self> {
        let parsed = url::Url::parse(source_url.trim())
            .map_err(|e| KastError::InvalidInput(format!("invalid URL '{}': {}", source_url, e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(KastError::InvalidInput(format!(
                "unsupported URL scheme '{}' in '{}'",
                parsed.scheme(),
                source_url
            )));
        }

        Ok(Self {
            source_kind: SourceKind::classify(parsed.as_str(), youtube_url_patterns),
            source_url: parsed.to_string(),
        })
    }
}

/// Raw text retrieved from a source, before cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawContent {
    pub text: String,
    pub origin: ExtractionRequest,
    pub fetched_at: DateTime<Utc>,
}

impl RawContent {
    pub fn new(text: String, origin: ExtractionRequest) -> Self {
        Self {
            text,
            origin,
            fetched_at: Utc::now(),
        }
    }
}

/// Trait for content extractors.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// The kind of source this extractor handles.
    fn source_kind(&self) -> SourceKind;

    /// Retrieve raw content for the request. One outbound call per
    /// invocation; failures surface as extraction errors, never as empty
    /// content.
    async fn extract(&self, request: &ExtractionRequest) -> Result<RawContent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<String> {
        vec!["youtube.com".to_string(), "youtu.be".to_string()]
    }

    #[test]
    fn test_classify_youtube_patterns() {
        assert_eq!(
            SourceKind::classify("https://www.youtube.com/watch?v=dQw4w9WgXcQ", &patterns()),
            SourceKind::Youtube
        );
        assert_eq!(
            SourceKind::classify("https://youtu.be/dQw4w9WgXcQ", &patterns()),
            SourceKind::Youtube
        );
        assert_eq!(
            SourceKind::classify("https://example.com/article", &patterns()),
            SourceKind::Website
        );
    }

    #[test]
    fn test_request_classifies_and_keeps_url() {
        let req =
            ExtractionRequest::new("https://youtu.be/dQw4w9WgXcQ", &patterns()).unwrap();
        assert_eq!(req.source_kind, SourceKind::Youtube);
        assert_eq!(req.source_url, "https://youtu.be/dQw4w9WgXcQ");

        let req = ExtractionRequest::new("https://example.com/post", &patterns()).unwrap();
        assert_eq!(req.source_kind, SourceKind::Website);
    }

    #[test]
    fn test_request_rejects_garbage() {
        assert!(ExtractionRequest::new("not a url", &patterns()).is_err());
        assert!(ExtractionRequest::new("ftp://example.com/file", &patterns()).is_err());
    }

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::Website.to_string(), "website");
        assert_eq!(SourceKind::Youtube.to_string(), "youtube");
    }
}
