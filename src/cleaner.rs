//! Markdown and transcript cleaning.
//!
//! A [`CleaningRuleSet`] is compiled once from configuration and applied as
//! a pure function: regex substitutions run in declared order (later
//! patterns see the output of earlier ones), then unwanted HTML tag
//! subtrees are dropped wholesale.

use crate::config::WebsiteExtractorSettings;
use crate::error::{KastError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Text derived deterministically from raw content and a rule set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanedContent {
    pub text: String,
}

impl CleanedContent {
    pub fn new(text: String) -> Self {
        Self { text }
    }
}

/// A single compiled cleaning rule.
#[derive(Debug, Clone)]
pub struct CleaningRule {
    regex: Regex,
    replacement: String,
}

impl CleaningRule {
    /// A rule that removes every match.
    pub fn remove(pattern: &str) -> Result<Self> {
        Self::replace(pattern, "")
    }

    /// A rule that replaces every match with the given text.
    pub fn replace(pattern: &str, replacement: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| KastError::Config(format!("invalid pattern '{}': {}", pattern, e)))?;
        Ok(Self {
            regex,
            replacement: replacement.to_string(),
        })
    }
}

/// Ordered, read-only set of cleaning rules plus tag-removal patterns.
#[derive(Debug, Clone)]
pub struct CleaningRuleSet {
    rules: Vec<CleaningRule>,
    // One pattern per unwanted tag: the whole subtree, then any stray
    // open/close tag left unmatched.
    tag_subtrees: Vec<Regex>,
    tag_strays: Vec<Regex>,
}

impl CleaningRuleSet {
    /// Compile a rule set from website extractor settings.
    ///
    /// Fails on the first malformed pattern; callers run this at
    /// configuration-load time so per-request application cannot fail.
    pub fn compile(settings: &WebsiteExtractorSettings) -> Result<Self> {
        let rules = settings
            .markdown_cleaning
            .remove_patterns
            .iter()
            .map(|p| CleaningRule::remove(p))
            .collect::<Result<Vec<_>>>()?;

        Self::with_rules(rules, &settings.unwanted_tags)
    }

    /// Build a rule set from explicit rules and tag names.
    pub fn with_rules(rules: Vec<CleaningRule>, unwanted_tags: &[String]) -> Result<Self> {
        let mut tag_subtrees = Vec::with_capacity(unwanted_tags.len());
        let mut tag_strays = Vec::with_capacity(unwanted_tags.len());

        for tag in unwanted_tags {
            if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(KastError::Config(format!(
                    "invalid unwanted_tag '{}': tag names must be alphanumeric",
                    tag
                )));
            }
            let tag = regex::escape(tag);
            let subtree = Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</\s*{tag}\s*>"))
                .map_err(|e| KastError::Config(e.to_string()))?;
            let stray = Regex::new(&format!(r"(?i)</?{tag}\b[^>]*/?>"))
                .map_err(|e| KastError::Config(e.to_string()))?;
            tag_subtrees.push(subtree);
            tag_strays.push(stray);
        }

        Ok(Self {
            rules,
            tag_subtrees,
            tag_strays,
        })
    }

    /// An empty rule set that leaves text unchanged.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            tag_subtrees: Vec::new(),
            tag_strays: Vec::new(),
        }
    }

    /// Apply every rule in declared order, then strip unwanted tags.
    ///
    /// Pure: the same input always yields the same output.
    pub fn apply(&self, text: &str) -> String {
        let mut result = text.to_string();

        for rule in &self.rules {
            result = rule
                .regex
                .replace_all(&result, rule.replacement.as_str())
                .into_owned();
        }

        for subtree in &self.tag_subtrees {
            result = subtree.replace_all(&result, "").into_owned();
        }
        for stray in &self.tag_strays {
            result = stray.replace_all(&result, "").into_owned();
        }

        result
    }

    /// Number of compiled regex rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Remove literal phrases from a transcript, trimming the remains.
///
/// Each phrase is matched verbatim (no regex semantics). Lines are trimmed
/// after removal and blank lines are dropped.
pub fn strip_phrases(text: &str, phrases: &[String]) -> String {
    let mut result = text.to_string();
    for phrase in phrases {
        if phrase.is_empty() {
            continue;
        }
        result = result.replace(phrase.as_str(), "");
    }

    result
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
