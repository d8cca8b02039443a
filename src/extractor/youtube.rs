//! YouTube transcript extraction.
//!
//! Uses yt-dlp to locate a caption track for the video, fetches the track
//! in json3 format over HTTP, and flattens it to plain text. Manually
//! uploaded subtitles are preferred over automatic captions.

use super::{ExtractionRequest, Extractor, RawContent, SourceKind};
use crate::cleaner::strip_phrases;
use crate::config::YoutubeTranscriberSettings;
use crate::error::{KastError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Fetches video transcripts as raw text.
pub struct YoutubeExtractor {
    client: reqwest::Client,
    video_id_regex: Regex,
    remove_phrases: Vec<String>,
    languages: Vec<String>,
}

impl YoutubeExtractor {
    pub fn new(settings: &YoutubeTranscriberSettings) -> Result<Self> {
        // Matches the common YouTube URL shapes
        let video_id_regex = Regex::new(
            r"(?x)
            (?:https?://)?
            (?:www\.)?
            (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
            ([a-zA-Z0-9_-]{11})
        ",
        )
        .map_err(|e| KastError::Config(e.to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            video_id_regex,
            remove_phrases: settings.remove_phrases.clone(),
            languages: settings.languages.clone(),
        })
    }

    /// Extract the 11-character video ID from a URL.
    fn extract_video_id(&self, url: &str) -> Option<String> {
        self.video_id_regex
            .captures(url.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Fetch video metadata with yt-dlp and pick a caption track URL.
    async fn find_caption_url(&self, video_id: &str) -> Result<String> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = tokio::process::Command::new("yt-dlp")
            .args(["--dump-json", "--no-download", "--no-warnings", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    KastError::ToolNotFound("yt-dlp".to_string())
                } else {
                    KastError::Extraction(format!("failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KastError::Extraction(format!(
                "video {} not found or unavailable: {}",
                video_id, stderr
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| KastError::Extraction(format!("failed to parse yt-dlp output: {}", e)))?;

        select_caption_track(&json, &self.languages).ok_or_else(|| {
            KastError::Extraction(format!("no captions available for video {}", video_id))
        })
    }
}

/// Pick a json3 caption track URL, preferring uploaded subtitles over
/// automatic captions and earlier languages over later ones.
fn select_caption_track(metadata: &serde_json::Value, languages: &[String]) -> Option<String> {
    for field in ["subtitles", "automatic_captions"] {
        let tracks = match metadata[field].as_object() {
            Some(t) => t,
            None => continue,
        };

        for lang in languages {
            // Exact match first, then regional variants like "en-US"
            let entries = tracks
                .get(lang.as_str())
                .or_else(|| {
                    tracks
                        .iter()
                        .find(|(key, _)| key.starts_with(&format!("{}-", lang)))
                        .map(|(_, v)| v)
                })
                .and_then(|v| v.as_array());

            if let Some(entries) = entries {
                if let Some(url) = entries
                    .iter()
                    .find(|e| e["ext"].as_str() == Some("json3"))
                    .and_then(|e| e["url"].as_str())
                {
                    return Some(url.to_string());
                }
            }
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct Json3Track {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Flatten a json3 caption document to one line per caption event.
fn parse_json3(body: &str) -> Result<String> {
    let track: Json3Track = serde_json::from_str(body)
        .map_err(|e| KastError::Extraction(format!("failed to parse caption track: {}", e)))?;

    let lines: Vec<String> = track
        .events
        .iter()
        .map(|event| {
            event
                .segs
                .iter()
                .map(|seg| seg.utf8.as_str())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(KastError::Extraction(
            "caption track contained no text".to_string(),
        ));
    }

    Ok(lines.join("\n"))
}

#[async_trait]
impl Extractor for YoutubeExtractor {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Youtube
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<RawContent> {
        if request.source_kind != SourceKind::Youtube {
            return Err(KastError::InvalidInput(format!(
                "youtube extractor received a {} request",
                request.source_kind
            )));
        }

        let video_id = self.extract_video_id(&request.source_url).ok_or_else(|| {
            KastError::Extraction(format!(
                "unrecognized YouTube URL: {}",
                request.source_url
            ))
        })?;

        debug!("Locating caption track for {}", video_id);
        let caption_url = self.find_caption_url(&video_id).await?;

        let body = self
            .client
            .get(&caption_url)
            .send()
            .await
            .map_err(|e| KastError::Extraction(format!("fetching captions: {}", e)))?
            .error_for_status()
            .map_err(|e| KastError::Extraction(format!("fetching captions: {}", e)))?
            .text()
            .await
            .map_err(|e| KastError::Extraction(format!("reading captions: {}", e)))?;

        let transcript = parse_json3(&body)?;
        let transcript = strip_phrases(&transcript, &self.remove_phrases);

        if transcript.is_empty() {
            return Err(KastError::Extraction(format!(
                "transcript for video {} was empty after cleanup",
                video_id
            )));
        }

        Ok(RawContent::new(transcript, request.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> YoutubeExtractor {
        YoutubeExtractor::new(&YoutubeTranscriberSettings::default()).unwrap()
    }

    #[test]
    fn test_extract_video_id() {
        let yt = extractor();

        assert_eq!(
            yt.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            yt.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            yt.extract_video_id("https://youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(yt.extract_video_id("https://example.com/watch"), None);
        assert_eq!(yt.extract_video_id(""), None);
    }

    #[test]
    fn test_select_caption_track_prefers_subtitles() {
        let metadata = serde_json::json!({
            "subtitles": {
                "en": [
                    {"ext": "vtt", "url": "https://example.com/sub.vtt"},
                    {"ext": "json3", "url": "https://example.com/sub.json3"}
                ]
            },
            "automatic_captions": {
                "en": [
                    {"ext": "json3", "url": "https://example.com/auto.json3"}
                ]
            }
        });

        let url = select_caption_track(&metadata, &["en".to_string()]);
        assert_eq!(url, Some("https://example.com/sub.json3".to_string()));
    }

    #[test]
    fn test_select_caption_track_falls_back_to_auto() {
        let metadata = serde_json::json!({
            "automatic_captions": {
                "en-US": [
                    {"ext": "json3", "url": "https://example.com/auto.json3"}
                ]
            }
        });

        let url = select_caption_track(&metadata, &["en".to_string()]);
        assert_eq!(url, Some("https://example.com/auto.json3".to_string()));
    }

    #[test]
    fn test_select_caption_track_none_available() {
        let metadata = serde_json::json!({"subtitles": {}});
        assert_eq!(select_caption_track(&metadata, &["en".to_string()]), None);
    }

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "events": [
                {"segs": [{"utf8": "Hello "}, {"utf8": "world"}]},
                {"segs": [{"utf8": "\n"}]},
                {"segs": [{"utf8": "second line"}]}
            ]
        }"#;

        assert_eq!(parse_json3(body).unwrap(), "Hello world\nsecond line");
    }

    #[test]
    fn test_parse_json3_empty_track_is_an_error() {
        assert!(parse_json3(r#"{"events": []}"#).is_err());
        assert!(parse_json3("not json").is_err());
    }
}
