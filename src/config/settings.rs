//! Configuration settings for Kast.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub content_generator: ContentGeneratorSettings,
    pub content_extractor: ContentExtractorSettings,
    pub website_extractor: WebsiteExtractorSettings,
    pub youtube_transcriber: YoutubeTranscriberSettings,
    pub logging: LoggingSettings,
    pub server: ServerSettings,
}

/// LLM content generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentGeneratorSettings {
    /// Primary model for script generation.
    pub llm_model: String,
    /// Secondary model for auxiliary processing (summarization).
    pub meta_llm_model: String,
    /// Hard cap on generated output length, in tokens.
    pub max_output_tokens: u32,
}

impl Default for ContentGeneratorSettings {
    fn default() -> Self {
        Self {
            llm_model: "gpt-4o".to_string(),
            meta_llm_model: "gpt-4o-mini".to_string(),
            max_output_tokens: 8192,
        }
    }
}

/// Source routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentExtractorSettings {
    /// Substrings that classify a URL as a YouTube source.
    pub youtube_url_patterns: Vec<String>,
}

impl Default for ContentExtractorSettings {
    fn default() -> Self {
        Self {
            youtube_url_patterns: vec!["youtube.com".to_string(), "youtu.be".to_string()],
        }
    }
}

/// Website extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiteExtractorSettings {
    /// Reader-proxy endpoint that converts a page to markdown.
    pub jina_api_url: String,
    /// User-Agent header sent with every fetch.
    pub user_agent: String,
    /// Fetch timeout in seconds.
    pub timeout: u64,
    /// Ordered regex cleaning rules applied to extracted markdown.
    pub markdown_cleaning: MarkdownCleaningSettings,
    /// HTML tags whose entire subtree is dropped.
    pub unwanted_tags: Vec<String>,
}

impl Default for WebsiteExtractorSettings {
    fn default() -> Self {
        Self {
            jina_api_url: "https://r.jina.ai".to_string(),
            user_agent: "Mozilla/5.0 (compatible; kast/0.1; +https://github.com/smebbs/kast)"
                .to_string(),
            timeout: 10,
            markdown_cleaning: MarkdownCleaningSettings::default(),
            unwanted_tags: vec![
                "script".to_string(),
                "style".to_string(),
                "nav".to_string(),
                "header".to_string(),
                "footer".to_string(),
                "aside".to_string(),
                "form".to_string(),
            ],
        }
    }
}

/// Ordered markdown cleaning rules. Application order is significant:
/// later patterns operate on the output of earlier ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownCleaningSettings {
    pub remove_patterns: Vec<String>,
}

impl Default for MarkdownCleaningSettings {
    fn default() -> Self {
        Self {
            remove_patterns: vec![
                // Markdown images before links: image syntax is a superset
                r"!\[([^\]]*)\]\([^\)]*\)".to_string(),
                r"\[([^\]]+)\]\([^\)]+\)".to_string(),
                // HTML comments
                r"(?s)<!--.*?-->".to_string(),
                // Horizontal rules and leftover markdown emphasis markers
                r"(?m)^[-*_]{3,}\s*$".to_string(),
            ],
        }
    }
}

/// YouTube transcript cleanup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeTranscriberSettings {
    /// Literal phrases stripped from fetched transcripts.
    pub remove_phrases: Vec<String>,
    /// Preferred caption languages, in priority order.
    pub languages: Vec<String>,
}

impl Default for YoutubeTranscriberSettings {
    fn default() -> Self {
        Self {
            remove_phrases: vec![
                "[music]".to_string(),
                "[Music]".to_string(),
                "[applause]".to_string(),
                "[Applause]".to_string(),
                "[laughter]".to_string(),
            ],
            languages: vec!["en".to_string()],
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log line format ("full" or "compact").
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Validation runs on the loaded settings so malformed regex patterns
    /// fail here, not on the first request.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration.
    ///
    /// Compiles every cleaning pattern and checks numeric bounds.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::KastError;

        for pattern in &self.website_extractor.markdown_cleaning.remove_patterns {
            Regex::new(pattern).map_err(|e| {
                KastError::Config(format!("invalid remove_pattern '{}': {}", pattern, e))
            })?;
        }

        for tag in &self.website_extractor.unwanted_tags {
            if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(KastError::Config(format!(
                    "invalid unwanted_tag '{}': tag names must be alphanumeric",
                    tag
                )));
            }
        }

        if self.content_generator.max_output_tokens == 0 {
            return Err(KastError::Config(
                "content_generator.max_output_tokens must be greater than 0".to_string(),
            ));
        }

        if self.website_extractor.timeout == 0 {
            return Err(KastError::Config(
                "website_extractor.timeout must be greater than 0".to_string(),
            ));
        }

        if self.content_extractor.youtube_url_patterns.is_empty() {
            return Err(KastError::Config(
                "content_extractor.youtube_url_patterns must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::KastError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kast")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.content_generator.max_output_tokens, 8192);
        assert_eq!(settings.website_extractor.timeout, 10);
    }

    #[test]
    fn test_invalid_regex_rejected_at_load_time() {
        let mut settings = Settings::default();
        settings
            .website_extractor
            .markdown_cleaning
            .remove_patterns
            .push("[unclosed".to_string());

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("remove_pattern"));
    }

    #[test]
    fn test_zero_token_budget_rejected() {
        let mut settings = Settings::default();
        settings.content_generator.max_output_tokens = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_tag_name_rejected() {
        let mut settings = Settings::default();
        settings
            .website_extractor
            .unwanted_tags
            .push("div class".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.content_generator.llm_model = "gpt-4.1".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.content_generator.llm_model, "gpt-4.1");
        assert_eq!(
            loaded.website_extractor.jina_api_url,
            settings.website_extractor.jina_api_url
        );
    }

    #[test]
    fn test_duplicate_section_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[website_extractor]
jina_api_url = "https://r.jina.ai"

[website_extractor]
timeout = 5
"#,
        )
        .unwrap();

        // No silent last-key-wins: duplicate tables are rejected outright.
        assert!(Settings::load_from(Some(&path)).is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = PathBuf::from("/nonexistent/kast-config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.content_generator.llm_model, "gpt-4o");
    }
}
