//! Response pools and conversational phrasing

use std::sync::LazyLock;

use chrono::{DateTime, Local, Timelike};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::{Captures, Regex};

pub const GREETINGS: &[&str] = &[
    "Hey! What can I do for you?",
    "Hi there, how can I help?",
    "Good to hear from you. What do you need?",
    "At your service. What would you like me to do?",
    "Hey there! What's up?",
    "Hello! Ready when you are.",
    "Hiya! Need something?",
    "Hey, I'm listening.",
    "Hi! What would you like me to do today?",
    "Hello! What's on the agenda?",
    "Hi! Need a hand?",
    "Hello! How can I be useful?",
];

pub const ACKNOWLEDGMENTS: &[&str] = &[
    "Got it.",
    "On it.",
    "Consider it done.",
    "Absolutely.",
    "Sure thing.",
    "Right away.",
    "I'll take care of that.",
    "Doing that now.",
    "Alright, will do.",
    "Copy that.",
    "Understood.",
    "Working on it.",
    "Roger that.",
    "Consider it handled.",
    "Will do.",
];

/// Short replies to a bare wake phrase
pub const WAKE_ACKNOWLEDGMENTS: &[&str] = &["Yes?", "You called?", "I'm here.", "Yeah?"];

pub const CONFUSION: &[&str] = &[
    "Sorry, I didn't catch that. Could you say it again?",
    "I'm not quite sure I followed that. Can you rephrase?",
    "Hmm, I didn't understand. What would you like me to do?",
    "Could you give me a little more detail please?",
    "I didn't get that. Mind repeating it?",
    "That didn't come through clearly. Try again?",
    "Not sure I understand. Can you explain differently?",
    "Apologies, I didn't understand. Can you try again?",
    "Could you clarify what you meant?",
    "Sorry, can you say that again?",
];

pub const THANKS: &[&str] = &[
    "You're welcome!",
    "No problem!",
    "Anytime!",
    "Happy to help!",
    "My pleasure!",
    "Glad I could help.",
    "Don't mention it.",
    "No worries!",
    "You got it.",
    "Always happy to help.",
];

pub const FAREWELLS: &[&str] = &[
    "Goodbye!",
    "See you later!",
    "Signing off. Bye!",
    "Alright, take care.",
    "I'll be here when you need me again. Bye!",
    "Farewell!",
    "See ya!",
    "Okay, logging off.",
    "Bye! Reach out when you need me.",
];

pub const HOW_ARE_YOU: &[&str] = &[
    "I'm functioning optimally, thanks for asking!",
    "All systems are running smoothly.",
    "Doing well! Ready to help.",
    "I'm fine, thanks. How can I assist?",
    "Feeling helpful today!",
    "Couldn't be better. What do you need?",
    "Working perfectly. What can I do?",
    "All good here!",
];

pub const CAPABILITIES: &[&str] = &[
    "I can tell you the time and date, open websites, search the web, open applications, and chat with you.",
    "I can help with time, date, opening apps and websites, searching, and light conversation.",
    "I can look things up, open programs, tell the time and date, and more.",
    "Ask me to open websites, search for things, run apps, or just have a chat.",
];

pub const JOKES: &[&str] = &[
    "Why do programmers prefer dark mode? Because light attracts bugs!",
    "Why did the developer go broke? Because he used up all his cache!",
    "There are only 10 types of people in the world: those who understand binary and those who don't.",
    "A SQL query walks into a bar, walks up to two tables and asks, can I join you?",
];

/// `{time}` is replaced with the formatted time
pub const TIME_TEMPLATES: &[&str] = &[
    "It's currently {time}.",
    "Right now it's {time}.",
    "The time is {time}.",
    "Looking at the clock, it's {time}.",
    "It's {time} right now.",
    "According to my clock, {time}.",
    "Time check: {time}.",
    "The current time is {time}.",
];

/// `{date}` is replaced with the formatted date
pub const DATE_TEMPLATES: &[&str] = &[
    "Today is {date}.",
    "It's {date} today.",
    "The date is {date}.",
    "According to my calendar, it's {date}.",
    "Today's date is {date}.",
    "It's {date} on the calendar.",
];

const INTERJECTIONS: &[&str] = &["Alright, ", "Okay, ", "Sure, ", "Gotcha, "];

const INTERJECTION_CHANCE: f64 = 0.2;

const CONTRACTIONS: &[(&str, &str)] = &[
    ("do not", "don't"),
    ("does not", "doesn't"),
    ("can not", "can't"),
    ("cannot", "can't"),
    ("i am", "I'm"),
    ("i will", "I'll"),
    ("i have", "I've"),
    ("you are", "you're"),
    ("it is", "it's"),
    ("what is", "what's"),
    ("that is", "that's"),
    ("let us", "let's"),
];

static CONTRACTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = CONTRACTIONS
        .iter()
        .map(|(long, _)| regex::escape(long))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b({alternatives})\b")).expect("valid regex")
});

/// `"Good morning"`, `"Good afternoon"` or `"Good evening"` for an hour of the day
#[must_use]
pub const fn time_of_day_greeting(hour: u32) -> &'static str {
    match hour {
        0..12 => "Good morning",
        12..17 => "Good afternoon",
        _ => "Good evening",
    }
}

/// Spoken form of a time, e.g. `3:05 PM`
#[must_use]
pub fn format_time(now: DateTime<Local>) -> String {
    now.format("%-I:%M %p").to_string()
}

/// Spoken form of a date, e.g. `Friday, October 17, 2025`
#[must_use]
pub fn format_date(now: DateTime<Local>) -> String {
    now.format("%A, %B %d, %Y").to_string()
}

/// Random response selection and humanized phrasing
#[derive(Debug)]
pub struct Responses {
    rng: StdRng,
    humanize: bool,
}

impl Responses {
    /// Entropy-seeded responses
    #[must_use]
    pub fn new(humanize: bool) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            humanize,
        }
    }

    /// Deterministic responses for tests and replays
    #[must_use]
    pub fn seeded(seed: u64, humanize: bool) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            humanize,
        }
    }

    /// Pick one entry from a pool
    pub fn pick(&mut self, pool: &[&'static str]) -> &'static str {
        pool.choose(&mut self.rng).copied().unwrap_or_default()
    }

    /// A time response for `now`
    pub fn time(&mut self, now: DateTime<Local>) -> String {
        self.pick(TIME_TEMPLATES)
            .replace("{time}", &format_time(now))
    }

    /// A date response for `now`
    pub fn date(&mut self, now: DateTime<Local>) -> String {
        self.pick(DATE_TEMPLATES)
            .replace("{date}", &format_date(now))
    }

    /// Greeting that opens with the time of day
    pub fn greeting(&mut self, now: DateTime<Local>) -> String {
        format!("{}! {}", time_of_day_greeting(now.hour()), self.pick(GREETINGS))
    }

    /// Make a response sound conversational
    ///
    /// Applies contractions and occasionally prepends an interjection. Returns
    /// the text unchanged when humanizing is disabled.
    pub fn humanize(&mut self, text: &str) -> String {
        let text = text.trim();
        if !self.humanize || text.is_empty() {
            return text.to_string();
        }

        let contracted = contract(text);

        if self.rng.gen_bool(INTERJECTION_CHANCE) {
            let prefix = self.pick(INTERJECTIONS);
            return format!("{prefix}{}", lower_first(&contracted));
        }

        contracted
    }
}

/// Replace long forms with contractions, keeping a leading capital
fn contract(text: &str) -> String {
    CONTRACTION_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            let found = &caps[0];
            let short = CONTRACTIONS
                .iter()
                .find(|(long, _)| long.eq_ignore_ascii_case(found))
                .map_or(found, |(_, short)| *short);

            if found.starts_with(char::is_uppercase) {
                capitalize(short)
            } else {
                short.to_string()
            }
        })
        .into_owned()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Lowercase the first letter unless the text opens with the pronoun "I"
fn lower_first(text: &str) -> String {
    let first_word = text.split([' ', '\'']).next().unwrap_or_default();
    if first_word == "I" {
        return text.to_string();
    }

    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 10, 17, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_time_of_day_greeting() {
        assert_eq!(time_of_day_greeting(0), "Good morning");
        assert_eq!(time_of_day_greeting(11), "Good morning");
        assert_eq!(time_of_day_greeting(12), "Good afternoon");
        assert_eq!(time_of_day_greeting(16), "Good afternoon");
        assert_eq!(time_of_day_greeting(17), "Good evening");
        assert_eq!(time_of_day_greeting(23), "Good evening");
    }

    #[test]
    fn test_format_time_and_date() {
        assert_eq!(format_time(at(15, 5)), "3:05 PM");
        assert_eq!(format_time(at(9, 30)), "9:30 AM");
        assert_eq!(format_date(at(9, 30)), "Friday, October 17, 2025");
    }

    #[test]
    fn test_templates_filled() {
        let mut r = Responses::seeded(7, false);
        for _ in 0..10 {
            let time = r.time(at(15, 5));
            assert!(time.contains("3:05 PM"), "{time}");
            assert!(!time.contains('{'));

            let date = r.date(at(15, 5));
            assert!(date.contains("October 17, 2025"), "{date}");
        }
    }

    #[test]
    fn test_pick_from_pool() {
        let mut r = Responses::seeded(1, false);
        for _ in 0..20 {
            assert!(CONFUSION.contains(&r.pick(CONFUSION)));
        }
        assert_eq!(r.pick(&[]), "");
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let mut a = Responses::seeded(42, true);
        let mut b = Responses::seeded(42, true);
        for _ in 0..10 {
            assert_eq!(a.pick(JOKES), b.pick(JOKES));
            assert_eq!(a.humanize("It is done."), b.humanize("It is done."));
        }
    }

    #[test]
    fn test_contractions() {
        assert_eq!(contract("I am here and it is late."), "I'm here and it's late.");
        assert_eq!(contract("What is that? Do not worry."), "What's that? Don't worry.");
        // Whole words only
        assert_eq!(contract("Bit isn't mine"), "Bit isn't mine");
    }

    #[test]
    fn test_humanize_disabled_is_identity() {
        let mut r = Responses::seeded(3, false);
        assert_eq!(r.humanize("I am on it."), "I am on it.");
    }

    #[test]
    fn test_humanize_enabled() {
        let mut r = Responses::seeded(3, true);
        for _ in 0..50 {
            let out = r.humanize("It is done.");
            assert!(
                out == "It's done."
                    || INTERJECTIONS.iter().any(|i| out == format!("{i}it's done.")),
                "{out}"
            );
        }
    }

    #[test]
    fn test_lower_first_keeps_pronoun() {
        assert_eq!(lower_first("I'm on it."), "I'm on it.");
        assert_eq!(lower_first("Opening Google."), "opening Google.");
    }
}
