//! Keyword selection for child calendars.

use regex::{Regex, RegexBuilder};

use crate::error::{MirrorError, MirrorResult};

/// Case-insensitive whole-word match against any configured keyword.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    pattern: Option<Regex>,
}

impl KeywordMatcher {
    /// Blank keywords are dropped; with none left the matcher never matches.
    pub fn new(keywords: &[String]) -> MirrorResult<Self> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();

        if keywords.is_empty() {
            return Ok(KeywordMatcher {
                keywords,
                pattern: None,
            });
        }

        let alternatives: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| MirrorError::Config(format!("Invalid keywords: {}", e)))?;

        Ok(KeywordMatcher {
            keywords,
            pattern: Some(pattern),
        })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn has_keywords(&self) -> bool {
        self.pattern.is_some()
    }

    pub fn is_match(&self, title: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(title))
    }
}
