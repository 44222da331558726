//! Wake phrase detection
//!
//! Detection runs on normalized transcripts in two passes: an exact pass over
//! an ordered phrase list, then a token pass that tolerates small
//! transcription errors in the assistant's name.

use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

use crate::config::WakeConfig;
use crate::text::{Levenshtein, Similarity, Utterance, normalize};
use crate::{Error, Result};

/// A detected wake phrase and the command that followed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WakeMatch {
    /// Phrase (or token) that triggered detection
    pub matched_phrase: String,
    /// Trailing command text, `None` when nothing followed
    pub remainder: Option<String>,
}

impl WakeMatch {
    fn new(matched_phrase: impl Into<String>, remainder: &str) -> Self {
        let remainder = normalize(remainder);
        Self {
            matched_phrase: matched_phrase.into(),
            remainder: (!remainder.is_empty()).then_some(remainder),
        }
    }

    /// Command that followed the wake phrase in `heard`
    ///
    /// Keeps the raw wording (case, punctuation) when it can be recovered
    /// unambiguously, otherwise falls back to the normalized remainder.
    #[must_use]
    pub fn command(&self, heard: &Utterance) -> Option<Utterance> {
        let remainder = self.remainder.as_ref()?;
        let agrees = |raw: &String| normalize(raw) == *remainder;
        let raw = strip_raw(heard.raw(), &self.matched_phrase)
            .filter(agrees)
            .or_else(|| raw_tail(heard.raw(), &self.matched_phrase).filter(agrees))
            .unwrap_or_else(|| remainder.clone());
        Some(Utterance::at(raw, heard.heard_at()))
    }
}

struct WakePhrase {
    text: String,
    pattern: Regex,
}

/// Detects wake phrases in normalized transcripts
pub struct WakeDetector {
    phrases: Vec<WakePhrase>,
    name: String,
    initial: Option<char>,
    prefixes: Vec<String>,
    strict_ratio: f64,
    prefixed_ratio: f64,
    similarity: Arc<dyn Similarity>,
}

impl std::fmt::Debug for WakeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeDetector")
            .field("phrases", &self.phrases())
            .field("name", &self.name)
            .field("prefixes", &self.prefixes)
            .field("strict_ratio", &self.strict_ratio)
            .field("prefixed_ratio", &self.prefixed_ratio)
            .finish_non_exhaustive()
    }
}

impl WakeDetector {
    /// Create a detector using edit-distance similarity
    ///
    /// # Errors
    ///
    /// Returns error if a wake phrase cannot be compiled or the name is empty
    pub fn new(config: &WakeConfig) -> Result<Self> {
        Self::with_similarity(config, Arc::new(Levenshtein))
    }

    /// Create a detector with a custom similarity function
    ///
    /// # Errors
    ///
    /// Returns error if a wake phrase cannot be compiled or the name is empty
    pub fn with_similarity(config: &WakeConfig, similarity: Arc<dyn Similarity>) -> Result<Self> {
        let name = normalize(&config.name);
        if name.is_empty() {
            return Err(Error::WakeWord("assistant name is empty".to_string()));
        }

        let phrase_texts: Vec<String> = config
            .phrases
            .iter()
            .map(|p| normalize(p))
            .filter(|p| !p.is_empty())
            .collect();

        warn_on_shadowing(&phrase_texts);

        let phrases = phrase_texts
            .into_iter()
            .map(|text| {
                let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&text)))
                    .map_err(|e| Error::WakeWord(format!("{text}: {e}")))?;
                Ok(WakePhrase { text, pattern })
            })
            .collect::<Result<Vec<_>>>()?;

        let prefixes = config
            .prefixes
            .iter()
            .map(|p| normalize(p))
            .filter(|p| !p.is_empty())
            .collect();

        tracing::debug!(
            name = %name,
            phrases = phrases.len(),
            "wake detector initialized"
        );

        Ok(Self {
            phrases,
            initial: name.chars().next(),
            name,
            prefixes,
            strict_ratio: config.strict_ratio,
            prefixed_ratio: config.prefixed_ratio,
            similarity,
        })
    }

    /// Look for a wake phrase in normalized text
    #[must_use]
    pub fn detect(&self, normalized: &str) -> Option<WakeMatch> {
        if normalized.is_empty() {
            return None;
        }

        let found = self
            .detect_exact(normalized)
            .or_else(|| self.detect_token(normalized));

        if let Some(m) = &found {
            tracing::info!(
                phrase = %m.matched_phrase,
                remainder = ?m.remainder,
                "wake phrase detected"
            );
        }

        found
    }

    fn detect_exact(&self, text: &str) -> Option<WakeMatch> {
        self.phrases.iter().find_map(|phrase| {
            if phrase.text.chars().count() == 1 {
                return self.detect_letter(phrase, text);
            }
            phrase.pattern.is_match(text).then(|| {
                let remaining = phrase.pattern.replacen(text, 1, "");
                WakeMatch::new(phrase.text.clone(), &remaining)
            })
        })
    }

    /// A single-letter phrase counts only at the start or after a prefix word
    fn detect_letter(&self, phrase: &WakePhrase, text: &str) -> Option<WakeMatch> {
        phrase.pattern.find_iter(text).find_map(|m| {
            let before = text[..m.start()].trim_end();
            let lead = if before.is_empty() {
                ""
            } else {
                let (lead, last) = before.rsplit_once(' ').unwrap_or(("", before));
                if !self.is_prefix(last) {
                    return None;
                }
                lead
            };
            let remaining = format!("{lead} {}", &text[m.end()..]);
            Some(WakeMatch::new(phrase.text.clone(), &remaining))
        })
    }

    fn detect_token(&self, text: &str) -> Option<WakeMatch> {
        let tokens: Vec<&str> = text.split_whitespace().collect();

        for (i, token) in tokens.iter().enumerate() {
            let prefixed = i > 0 && self.is_prefix(tokens[i - 1]);
            let remainder = || tokens[i + 1..].join(" ");

            if *token == self.name {
                return Some(WakeMatch::new(*token, &remainder()));
            }

            // Bare initials collide with ordinary speech unless they open the
            // utterance or follow a greeting
            let mut chars = token.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if Some(c) == self.initial && (i == 0 || prefixed) {
                    return Some(WakeMatch::new(*token, &remainder()));
                }
                continue;
            }

            let ratio = self.similarity.similarity(token, &self.name);
            if ratio >= self.strict_ratio || (prefixed && ratio >= self.prefixed_ratio) {
                tracing::debug!(token, ratio, prefixed, "fuzzy wake token accepted");
                return Some(WakeMatch::new(*token, &remainder()));
            }
        }

        None
    }

    fn is_prefix(&self, token: &str) -> bool {
        self.prefixes.iter().any(|p| p == token)
    }

    /// Configured wake phrases in evaluation order
    #[must_use]
    pub fn phrases(&self) -> Vec<&str> {
        self.phrases.iter().map(|p| p.text.as_str()).collect()
    }

    /// Canonical assistant name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Case-insensitive pattern for a normalized phrase inside raw text
///
/// Words of the phrase may be separated by any punctuation in the raw text.
fn raw_phrase_pattern(matched_phrase: &str) -> Option<Regex> {
    let words: Vec<String> = matched_phrase
        .split_whitespace()
        .map(regex::escape)
        .collect();
    if words.is_empty() {
        return None;
    }

    Regex::new(&format!(r"(?i)\b{}\b", words.join(r"[^a-zA-Z0-9]+"))).ok()
}

/// Trim separators left around a command cut out of a raw transcript
fn tidy_command(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end();

    (!normalize(trimmed).is_empty()).then(|| trimmed.to_string())
}

/// Remove the first occurrence of a matched phrase from a raw transcript
///
/// Returns `None` when the phrase is not found or nothing matchable remains.
#[must_use]
pub fn strip_raw(raw: &str, matched_phrase: &str) -> Option<String> {
    let pattern = raw_phrase_pattern(matched_phrase)?;
    if !pattern.is_match(raw) {
        return None;
    }

    tidy_command(&pattern.replacen(raw, 1, " "))
}

/// Raw text following the first occurrence of a matched phrase
fn raw_tail(raw: &str, matched_phrase: &str) -> Option<String> {
    let found = raw_phrase_pattern(matched_phrase)?.find(raw)?;
    tidy_command(&raw[found.end()..])
}

/// Warn when a phrase can never win because an earlier one is contained in it
fn warn_on_shadowing(phrases: &[String]) {
    for (i, earlier) in phrases.iter().enumerate() {
        for later in &phrases[i + 1..] {
            let padded = format!(" {later} ");
            if later != earlier && padded.contains(&format!(" {earlier} ")) {
                tracing::warn!(
                    earlier = %earlier,
                    later = %later,
                    "wake phrase is shadowed by a shorter phrase listed before it"
                );
            }
        }
    }
}
