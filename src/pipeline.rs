//! Pipeline coordination for Kast.
//!
//! Wires the extractors, cleaner, and generator into the sequential
//! extract -> clean -> generate flow. All configuration is validated and
//! compiled at construction; a pipeline holds no mutable state after that.

use crate::cleaner::{CleanedContent, CleaningRuleSet};
use crate::config::Settings;
use crate::error::{KastError, Result};
use crate::extractor::{
    ExtractionRequest, Extractor, RawContent, SourceKind, WebsiteExtractor, YoutubeExtractor,
};
use crate::generator::{ContentGenerator, GeneratedContent, GenerationConfig};
use tracing::{info, instrument};

/// Separator placed between cleaned documents when generating over
/// multiple sources at once.
const SOURCE_SEPARATOR: &str = "\n\n---------\n\n";

/// The Kast content pipeline.
pub struct Pipeline {
    settings: Settings,
    rules: CleaningRuleSet,
    website: WebsiteExtractor,
    youtube: YoutubeExtractor,
    generator: ContentGenerator,
}

impl Pipeline {
    /// Build a pipeline from settings.
    ///
    /// Compiles every cleaning rule up front, so malformed configuration
    /// fails here and never during a request.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let rules = CleaningRuleSet::compile(&settings.website_extractor)?;
        let website = WebsiteExtractor::new(&settings.website_extractor)?;
        let youtube = YoutubeExtractor::new(&settings.youtube_transcriber)?;
        let generator = ContentGenerator::new(GenerationConfig::from(&settings.content_generator));

        Ok(Self {
            settings,
            rules,
            website,
            youtube,
            generator,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn extractor_for(&self, kind: SourceKind) -> &dyn Extractor {
        match kind {
            SourceKind::Website => &self.website,
            SourceKind::Youtube => &self.youtube,
        }
    }

    /// Retrieve raw content for a URL.
    pub async fn extract(&self, url: &str) -> Result<RawContent> {
        let request = ExtractionRequest::new(
            url,
            &self.settings.content_extractor.youtube_url_patterns,
        )?;
        info!(url = %request.source_url, kind = %request.source_kind, "Extracting");
        self.extractor_for(request.source_kind).extract(&request).await
    }

    /// Apply the compiled cleaning rules to raw content.
    pub fn clean(&self, raw: &RawContent) -> CleanedContent {
        CleanedContent::new(self.rules.apply(&raw.text))
    }

    /// Extract a URL and clean the result.
    pub async fn extract_and_clean(&self, url: &str) -> Result<CleanedContent> {
        let raw = self.extract(url).await?;
        Ok(self.clean(&raw))
    }

    /// Run the full pipeline for a single URL.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn run(&self, url: &str) -> Result<PipelineResult> {
        let urls = [url.to_string()];
        self.run_many(&urls).await
    }

    /// Run the full pipeline over several URLs.
    ///
    /// Each source is extracted and cleaned in turn, the cleaned texts are
    /// joined with a separator, and generation happens once over the
    /// combined document.
    #[instrument(skip(self), fields(count = urls.len()))]
    pub async fn run_many(&self, urls: &[String]) -> Result<PipelineResult> {
        self.run_inputs(urls, &[]).await
    }

    /// Run the pipeline over URLs plus caller-provided text.
    ///
    /// Text inputs skip extraction and cleaning and are appended to the
    /// combined document after the URL sources, in input order.
    #[instrument(skip(self, texts), fields(urls = urls.len(), texts = texts.len()))]
    pub async fn run_inputs(&self, urls: &[String], texts: &[String]) -> Result<PipelineResult> {
        if urls.is_empty() && texts.iter().all(|t| t.trim().is_empty()) {
            return Err(KastError::InvalidInput(
                "at least one source URL or text input is required".to_string(),
            ));
        }

        let mut sources = Vec::with_capacity(urls.len());
        let mut cleaned_texts = Vec::with_capacity(urls.len() + texts.len());

        for url in urls {
            let raw = self.extract(url).await?;
            let cleaned = self.clean(&raw);
            info!(
                url = %raw.origin.source_url,
                raw_chars = raw.text.len(),
                cleaned_chars = cleaned.text.len(),
                "Cleaned source"
            );
            sources.push(raw.origin);
            cleaned_texts.push(cleaned.text);
        }

        for text in texts {
            if !text.trim().is_empty() {
                cleaned_texts.push(text.clone());
            }
        }

        let combined = CleanedContent::new(cleaned_texts.join(SOURCE_SEPARATOR));
        let content = self.generator.generate(&combined).await?;

        info!(token_count = content.token_count, "Pipeline complete");

        Ok(PipelineResult { sources, content })
    }

    /// Summarize already-cleaned content with the meta model.
    pub async fn summarize(&self, content: &CleanedContent) -> Result<GeneratedContent> {
        self.generator.summarize(&content.text).await
    }
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct PipelineResult {
    /// The extraction requests that fed the generation, in input order.
    pub sources: Vec<ExtractionRequest>,
    /// The generated content.
    pub content: GeneratedContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_fails_fast_on_bad_pattern() {
        let mut settings = Settings::default();
        settings
            .website_extractor
            .markdown_cleaning
            .remove_patterns
            .push("(broken".to_string());

        assert!(matches!(Pipeline::new(settings), Err(KastError::Config(_))));
    }

    #[test]
    fn test_clean_applies_configured_rules() {
        let pipeline = Pipeline::new(Settings::default()).unwrap();

        let request = ExtractionRequest::new(
            "https://example.com/post",
            &pipeline.settings.content_extractor.youtube_url_patterns,
        )
        .unwrap();
        let raw = RawContent::new(
            "Read [the docs](https://docs.rs) now<script>x()</script>".to_string(),
            request,
        );

        let cleaned = pipeline.clean(&raw);
        assert_eq!(cleaned.text, "Read  now");
    }

    #[test]
    fn test_clean_is_deterministic() {
        let pipeline = Pipeline::new(Settings::default()).unwrap();
        let request = ExtractionRequest::new(
            "https://example.com",
            &pipeline.settings.content_extractor.youtube_url_patterns,
        )
        .unwrap();
        let raw = RawContent::new("![logo](a.png) body --- text".to_string(), request);

        assert_eq!(pipeline.clean(&raw).text, pipeline.clean(&raw).text);
    }

    #[tokio::test]
    async fn test_run_many_rejects_empty_input() {
        let pipeline = Pipeline::new(Settings::default()).unwrap();
        let err = pipeline.run_many(&[]).await.unwrap_err();
        assert!(matches!(err, KastError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_run_inputs_rejects_blank_text_only() {
        let pipeline = Pipeline::new(Settings::default()).unwrap();
        let err = pipeline
            .run_inputs(&[], &["   ".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, KastError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_extract_rejects_invalid_url() {
        let pipeline = Pipeline::new(Settings::default()).unwrap();
        let err = pipeline.extract("not a url").await.unwrap_err();
        assert!(matches!(err, KastError::InvalidInput(_)));
    }
}
