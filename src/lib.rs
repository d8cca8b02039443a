//! Kast - Podcast Content Pipeline
//!
//! A configuration-driven pipeline for turning web pages and YouTube videos
//! into podcast-ready scripts.
//!
//! The name "Kast" comes from the Norwegian word for "cast," as in podkast.
//!
//! # Overview
//!
//! Kast takes one or more source URLs and:
//! - Extracts raw text (web pages through a markdown reader proxy, YouTube
//!   videos through their caption tracks)
//! - Cleans the text with an ordered, configuration-owned set of regex
//!   rules and HTML tag removals
//! - Submits the cleaned text to an LLM and returns the generated script,
//!   bounded by a configured token budget
//!
//! Data flows strictly in one direction: raw source -> extracted text ->
//! cleaned text -> generated content.
//!
//! # Architecture
//!
//! - `config` - Configuration loading and validation
//! - `extractor` - Content source abstraction (website, YouTube)
//! - `cleaner` - Regex and tag-removal cleaning rules
//! - `generator` - LLM content generation
//! - `pipeline` - Sequential pipeline coordination
//! - `server` - HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use kast::config::Settings;
//! use kast::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     let result = pipeline.run("https://example.com/article").await?;
//!     println!("{}", result.content.text);
//!
//!     Ok(())
//! }
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod pipeline;
pub mod server;

pub use error::{KastError, Result};
