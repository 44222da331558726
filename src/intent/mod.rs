//! Ordered intent matching
//!
//! An [`IntentTable`] is a priority-ordered list of [`IntentGroup`]s, each
//! paired with a handler. Resolution walks the table in order and stops at
//! the first group with a matching trigger phrase.

use std::fmt;

use serde::Serialize;

use crate::text::{Utterance, normalize};

/// Well-known websites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Site {
    Google,
    YouTube,
    GitHub,
    Reddit,
    Twitter,
}

impl Site {
    /// Spoken name
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::YouTube => "YouTube",
            Self::GitHub => "GitHub",
            Self::Reddit => "Reddit",
            Self::Twitter => "Twitter",
        }
    }

    /// Home page
    #[must_use]
    pub const fn url(self) -> &'static str {
        match self {
            Self::Google => "https://www.google.com",
            Self::YouTube => "https://www.youtube.com",
            Self::GitHub => "https://www.github.com",
            Self::Reddit => "https://www.reddit.com",
            Self::Twitter => "https://www.twitter.com",
        }
    }
}

/// Desktop applications the assistant can launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum App {
    Notepad,
    Calculator,
    FileExplorer,
    Terminal,
}

impl App {
    /// Spoken name
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Notepad => "Notepad",
            Self::Calculator => "the calculator",
            Self::FileExplorer => "the file explorer",
            Self::Terminal => "a terminal",
        }
    }

    /// Executables to try, in order of preference
    #[must_use]
    pub const fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::Notepad => &["notepad.exe", "gedit", "gnome-text-editor", "kate", "mousepad"],
            Self::Calculator => &["calc.exe", "gnome-calculator", "kcalc", "galculator"],
            Self::FileExplorer => &["explorer.exe", "nautilus", "dolphin", "thunar", "nemo"],
            Self::Terminal => &[
                "cmd.exe",
                "x-terminal-emulator",
                "gnome-terminal",
                "konsole",
                "xterm",
            ],
        }
    }
}

/// Machine power operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerAction {
    Shutdown,
    Restart,
}

impl PowerAction {
    /// Verb used in prompts ("shut down", "restart")
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Shutdown => "shut down",
            Self::Restart => "restart",
        }
    }
}

/// Identifier of an intent group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "target")]
pub enum Intent {
    Help,
    DateTime,
    PlaySpotify,
    OpenSpotify,
    Exit,
    Greeting,
    Thanks,
    HowAreYou,
    Capabilities,
    Joke,
    Time,
    Date,
    OpenSite(Site),
    Search,
    LaunchApp(App),
    Power(PowerAction),
    Identity,
    PlayMusic,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => write!(f, "Help"),
            Self::DateTime => write!(f, "Date and time"),
            Self::PlaySpotify => write!(f, "Spotify (play)"),
            Self::OpenSpotify => write!(f, "Spotify (open)"),
            Self::Exit => write!(f, "Exit"),
            Self::Greeting => write!(f, "Greeting"),
            Self::Thanks => write!(f, "Thanks"),
            Self::HowAreYou => write!(f, "How are you"),
            Self::Capabilities => write!(f, "Capabilities"),
            Self::Joke => write!(f, "Joke"),
            Self::Time => write!(f, "Time queries"),
            Self::Date => write!(f, "Date queries"),
            Self::OpenSite(site) => write!(f, "{}", site.label()),
            Self::Search => write!(f, "Search"),
            Self::LaunchApp(app) => write!(f, "Launch {}", app.label()),
            Self::Power(action) => write!(f, "Power ({})", action.verb()),
            Self::Identity => write!(f, "Identity"),
            Self::PlayMusic => write!(f, "Play music"),
        }
    }
}

/// How a group's phrases are compared against an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Substring of the normalized transcript
    #[default]
    Normalized,
    /// Substring of the lowercased raw transcript
    Raw,
    /// Whole-word sequence within the normalized transcript
    Words,
}

impl MatchMode {
    fn prepare_phrase(self, phrase: &str) -> String {
        match self {
            Self::Normalized | Self::Words => normalize(phrase),
            Self::Raw => phrase.trim().to_lowercase(),
        }
    }

    fn contains(self, haystack: &str, phrase: &str) -> bool {
        match self {
            Self::Normalized | Self::Raw => haystack.contains(phrase),
            Self::Words => format!(" {haystack} ").contains(&format!(" {phrase} ")),
        }
    }

    fn strip(self, haystack: &str, phrase: &str) -> String {
        match self {
            Self::Normalized | Self::Raw => haystack.replace(phrase, " "),
            Self::Words => format!(" {haystack} ").replace(&format!(" {phrase} "), "  "),
        }
    }
}

/// A set of trigger phrases that all map to one intent
#[derive(Debug, Clone)]
pub struct IntentGroup {
    intent: Intent,
    mode: MatchMode,
    sources: (Vec<String>, Vec<String>),
    triggers: Vec<String>,
    requires: Vec<String>,
    fillers: Vec<Vec<String>>,
}

impl IntentGroup {
    /// Create a group matched against normalized text
    ///
    /// Empty phrases (after normalization) are dropped.
    #[must_use]
    pub fn new(intent: Intent, triggers: &[&str]) -> Self {
        Self {
            intent,
            mode: MatchMode::Normalized,
            sources: (triggers.iter().map(|t| (*t).to_string()).collect(), Vec::new()),
            triggers: Vec::new(),
            requires: Vec::new(),
            fillers: Vec::new(),
        }
        .prepared()
    }

    /// Set the match mode, re-preparing phrases for it
    #[must_use]
    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self.prepared()
    }

    /// Additionally require one of `phrases` to be present
    #[must_use]
    pub fn requires(mut self, phrases: &[&str]) -> Self {
        self.sources.1 = phrases.iter().map(|p| (*p).to_string()).collect();
        self.prepared()
    }

    /// Phrases removed when extracting the argument
    ///
    /// Each phrase only matches whole words, and longer phrases win over
    /// shorter ones starting at the same word.
    #[must_use]
    pub fn fillers(mut self, phrases: &[&str]) -> Self {
        let mut fillers: Vec<Vec<String>> = phrases
            .iter()
            .map(|p| normalize(p).split(' ').map(str::to_string).collect())
            .filter(|words: &Vec<String>| words.iter().all(|w| !w.is_empty()))
            .collect();
        fillers.sort_by_key(|words| std::cmp::Reverse(words.len()));
        self.fillers = fillers;
        self
    }

    /// Rebuild match phrases from the registered sources for the current mode
    fn prepared(mut self) -> Self {
        let mode = self.mode;
        let prepare = |phrases: &[String]| -> Vec<String> {
            phrases
                .iter()
                .map(|p| mode.prepare_phrase(p))
                .filter(|p| !p.is_empty())
                .collect()
        };
        self.triggers = prepare(&self.sources.0);
        self.requires = prepare(&self.sources.1);
        self
    }

    /// Intent this group resolves to
    #[must_use]
    pub const fn intent(&self) -> Intent {
        self.intent
    }

    /// Trigger phrases as registered
    #[must_use]
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    /// Match mode
    #[must_use]
    pub const fn match_mode(&self) -> MatchMode {
        self.mode
    }

    fn try_match(&self, normalized: &str, raw_lower: &str) -> Option<IntentMatch> {
        let text = match self.mode {
            MatchMode::Normalized | MatchMode::Words => normalized,
            MatchMode::Raw => raw_lower,
        };

        let trigger = self
            .triggers
            .iter()
            .find(|t| self.mode.contains(text, t))?;

        if !self.requires.is_empty() && !self.requires.iter().any(|r| self.mode.contains(text, r)) {
            return None;
        }

        Some(IntentMatch {
            intent: self.intent,
            matched_phrase: trigger.clone(),
            argument: self.extract_argument(text),
        })
    }

    /// Drop filler phrases, then strip triggers (longest first)
    fn extract_argument(&self, text: &str) -> String {
        let mut rest = self.drop_fillers(text);

        let mut triggers: Vec<&String> = self.triggers.iter().collect();
        triggers.sort_by_key(|t| std::cmp::Reverse(t.len()));
        for trigger in triggers {
            rest = self.mode.strip(&rest, trigger);
        }

        rest.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_matches(|c: char| matches!(c, '.' | ',' | '?' | '!'))
            .trim()
            .to_string()
    }

    fn drop_fillers(&self, text: &str) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        let bare: Vec<&str> = words
            .iter()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .collect();

        let mut kept = Vec::with_capacity(words.len());
        let mut i = 0;
        while i < words.len() {
            let filler = self.fillers.iter().find(|phrase| {
                bare.get(i..i + phrase.len())
                    .is_some_and(|run| run.iter().zip(phrase.iter()).all(|(w, p)| w == p))
            });
            match filler {
                Some(phrase) => i += phrase.len(),
                None => {
                    kept.push(words[i]);
                    i += 1;
                }
            }
        }
        kept.join(" ")
    }
}

/// Result of resolving an utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentMatch {
    /// Resolved intent
    pub intent: Intent,
    /// Trigger phrase that matched
    pub matched_phrase: String,
    /// Text left after removing fillers and triggers, possibly empty
    pub argument: String,
}

impl IntentMatch {
    /// Argument, if any text remained
    #[must_use]
    pub fn argument(&self) -> Option<&str> {
        (!self.argument.is_empty()).then_some(self.argument.as_str())
    }
}

/// Priority-ordered table of intent groups and their handlers
#[derive(Debug)]
pub struct IntentTable<H> {
    entries: Vec<(IntentGroup, H)>,
}

impl<H> IntentTable<H> {
    /// Start building a table
    #[must_use]
    pub const fn builder() -> IntentTableBuilder<H> {
        IntentTableBuilder {
            entries: Vec::new(),
        }
    }

    /// Resolve an utterance to the first matching group's handler
    #[must_use]
    pub fn resolve(&self, utterance: &Utterance) -> Option<(IntentMatch, &H)> {
        let raw_lower = utterance.raw().to_lowercase();
        let found = self.entries.iter().find_map(|(group, handler)| {
            group
                .try_match(utterance.normalized(), &raw_lower)
                .map(|m| (m, handler))
        });

        match &found {
            Some((m, _)) => tracing::debug!(
                intent = %m.intent,
                phrase = %m.matched_phrase,
                argument = %m.argument,
                "intent matched"
            ),
            None => tracing::debug!(text = %utterance.normalized(), "no intent matched"),
        }

        found
    }

    /// Resolve without returning a handler
    #[must_use]
    pub fn match_text(&self, normalized: &str, raw: &str) -> Option<IntentMatch> {
        let raw_lower = raw.to_lowercase();
        self.entries
            .iter()
            .find_map(|(group, _)| group.try_match(normalized, &raw_lower))
    }

    /// Groups in evaluation order
    pub fn groups(&self) -> impl Iterator<Item = &IntentGroup> {
        self.entries.iter().map(|(group, _)| group)
    }

    /// Number of groups
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no groups are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for [`IntentTable`]; registration order is evaluation order
#[derive(Debug)]
pub struct IntentTableBuilder<H> {
    entries: Vec<(IntentGroup, H)>,
}

impl<H> IntentTableBuilder<H> {
    /// Append a group with its handler
    #[must_use]
    pub fn register(mut self, group: IntentGroup, handler: H) -> Self {
        if group.triggers.is_empty() {
            tracing::warn!(intent = %group.intent, "intent group has no triggers, it will never match");
        }
        self.entries.push((group, handler));
        self
    }

    /// Finish the table
    #[must_use]
    pub fn build(self) -> IntentTable<H> {
        tracing::debug!(groups = self.entries.len(), "intent table built");
        IntentTable {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> IntentTable<&'static str> {
        IntentTable::builder()
            .register(
                IntentGroup::new(Intent::DateTime, &["date", "day", "today"])
                    .mode(MatchMode::Words)
                    .requires(&["time"]),
                "datetime",
            )
            .register(IntentGroup::new(Intent::Exit, &["bye", "end"]).mode(MatchMode::Words), "exit")
            .register(IntentGroup::new(Intent::Time, &["what time", "the time"]), "time")
            .register(IntentGroup::new(Intent::Date, &["what day", "the date"]), "date")
            .register(
                IntentGroup::new(Intent::Search, &["search for", "look up", "search"])
                    .mode(MatchMode::Raw)
                    .fillers(&["please"]),
                "search",
            )
            .build()
    }

    fn resolve(text: &str) -> Option<IntentMatch> {
        let t = table();
        t.resolve(&Utterance::new(text)).map(|(m, _)| m)
    }

    #[test]
    fn test_first_match_wins() {
        let t = table();
        let (m, handler) = t.resolve(&Utterance::new("What is the date and time?")).unwrap();
        assert_eq!(m.intent, Intent::DateTime);
        assert_eq!(*handler, "datetime");
    }

    #[test]
    fn test_requires_both_phrases() {
        assert_eq!(resolve("what day is it").unwrap().intent, Intent::Date);
        assert_eq!(resolve("what time is it").unwrap().intent, Intent::Time);
    }

    #[test]
    fn test_words_mode_avoids_partial_words() {
        // "end" inside "weekend" and "bye" inside "byes" must not exit
        assert!(resolve("the weekend").is_none());
        assert!(resolve("byes").is_none());
        assert_eq!(resolve("ok bye now").unwrap().intent, Intent::Exit);
    }

    #[test]
    fn test_raw_mode_keeps_punctuation() {
        let m = resolve("Search for C++ tutorials, please.").unwrap();
        assert_eq!(m.intent, Intent::Search);
        assert_eq!(m.matched_phrase, "search for");
        assert_eq!(m.argument(), Some("c++ tutorials"));
    }

    #[test]
    fn test_longest_trigger_stripped_first() {
        let m = resolve("look up rust lifetimes").unwrap();
        assert_eq!(m.argument, "rust lifetimes");

        let m = resolve("search for cats").unwrap();
        // "search" alone would have left "for" behind
        assert_eq!(m.argument, "cats");
    }

    #[test]
    fn test_filler_phrases_only_match_whole_runs() {
        let group = IntentGroup::new(Intent::PlaySpotify, &["play"])
            .mode(MatchMode::Words)
            .fillers(&["play on spotify", "on spotify", "play", "some"]);

        let m = group
            .try_match("play the sound of silence on spotify", "")
            .unwrap();
        assert_eq!(m.argument, "the sound of silence");

        // a lone "on" is not a filler, and "some" inside "somewhere" is kept
        let m = group.try_match("play somewhere on the radio", "").unwrap();
        assert_eq!(m.argument, "somewhere on the radio");

        let m = group.try_match("play on spotify", "").unwrap();
        assert_eq!(m.argument(), None);
    }

    #[test]
    fn test_empty_argument() {
        let m = resolve("search please").unwrap();
        assert_eq!(m.argument(), None);
    }

    #[test]
    fn test_unrecognized() {
        assert!(resolve("purple elephant sandwich").is_none());
        assert!(resolve("").is_none());
    }

    #[test]
    fn test_match_text_matches_resolve() {
        let t = table();
        let m = t.match_text("see you bye", "see you bye").unwrap();
        assert_eq!(m.intent, Intent::Exit);
        assert_eq!(m.matched_phrase, "bye");
    }

    #[test]
    fn test_triggers_normalized_at_registration() {
        let group = IntentGroup::new(Intent::HowAreYou, &["What's up?", "  ", "How's it going"]);
        assert_eq!(group.triggers(), ["what s up", "how s it going"]);
    }

    #[test]
    fn test_groups_in_order() {
        let intents: Vec<Intent> = table().groups().map(IntentGroup::intent).collect();
        assert_eq!(
            intents,
            vec![
                Intent::DateTime,
                Intent::Exit,
                Intent::Time,
                Intent::Date,
                Intent::Search
            ]
        );
    }
}
