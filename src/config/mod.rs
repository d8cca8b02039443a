//! Configuration module for Kast.
//!
//! Handles loading and validating application settings. All regex cleaning
//! rules are checked when the configuration is loaded, so a malformed
//! pattern never reaches request processing.

mod settings;

pub use settings::{
    ContentExtractorSettings, ContentGeneratorSettings, LoggingSettings,
    MarkdownCleaningSettings, ServerSettings, Settings, WebsiteExtractorSettings,
    YoutubeTranscriberSettings,
};
