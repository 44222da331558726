//! Transcript normalization and string similarity
//!
//! Every matcher in the crate works on normalized text: lowercase ASCII
//! letters and digits separated by single spaces.

use chrono::{DateTime, Local};

/// Canonicalize a transcript for matching
///
/// Lowercases, replaces every character outside `[a-z0-9\s]` with a space,
/// collapses whitespace runs and trims. Total and idempotent.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A single recognized transcript
///
/// The normalized form is computed once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    raw: String,
    normalized: String,
    heard_at: DateTime<Local>,
}

impl Utterance {
    /// Create an utterance stamped with the current local time
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self::at(raw, Local::now())
    }

    /// Create an utterance with an explicit timestamp
    #[must_use]
    pub fn at(raw: impl Into<String>, heard_at: DateTime<Local>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self {
            raw,
            normalized,
            heard_at,
        }
    }

    /// Transcript exactly as the recognizer returned it
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalized transcript
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// When the transcript was produced
    #[must_use]
    pub const fn heard_at(&self) -> DateTime<Local> {
        self.heard_at
    }

    /// True when nothing matchable was heard
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// String similarity in `[0, 1]`, where `1.0` means identical
pub trait Similarity: Send + Sync {
    /// Score how alike two strings are
    fn similarity(&self, a: &str, b: &str) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn similarity(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// Edit-distance ratio: `1 - levenshtein / max_len`
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl Similarity for Levenshtein {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }
}
