//! The default intent table
//!
//! Groups are evaluated top to bottom and the first match wins, so order
//! resolves overlaps:
//!
//! 1. help
//! 2. combined date and time
//! 3. play on Spotify
//! 4. open Spotify
//! 5. exit
//! 6. greeting
//! 7. thanks
//! 8. how are you
//! 9. capabilities
//! 10. joke
//! 11. time
//! 12. date
//! 13. websites
//! 14. web search
//! 15. applications
//! 16. shutdown and restart
//! 17. identity
//! 18. play music

use crate::intent::{App, Intent, IntentGroup, IntentTable, MatchMode, PowerAction, Site};

use super::{self as handlers, Handler};

const HELP: &[&str] = &[
    "how do i tell you",
    "how to tell you",
    "how to ask",
    "show commands",
    "what can i say",
    "list commands",
    "examples",
    "help me use you",
    "how to use",
    "commands list",
    "how do i",
    "example commands",
];

const DATE_WORDS: &[&str] = &["date", "day", "today"];
const TIME_WORDS: &[&str] = &["time", "clock"];

const PLAY_SPOTIFY: &[&str] = &["play", "listen to", "listen on", "put on", "queue"];
const SPOTIFY: &[&str] = &["spotify"];
const SPOTIFY_FILLERS: &[&str] = &[
    "play on spotify",
    "play spotify",
    "spotify play",
    "on spotify",
    "play",
    "please",
    "some",
    "music",
    "song",
    "listen to",
    "put on",
    "play from",
    "via spotify",
    "jarvis",
];

const OPEN_SPOTIFY: &[&str] = &[
    "open spotify",
    "launch spotify",
    "start spotify",
    "spotify open",
    "spotify please",
    "open the spotify app",
    "spotify web player",
    "start the spotify app",
    "launch the spotify app",
];

const EXIT: &[&str] = &[
    "exit",
    "quit",
    "goodbye",
    "bye",
    "stop",
    "shut up",
    "go away",
    "see ya",
    "see you later",
    "i'm done",
    "close",
    "terminate",
    "shutdown assistant",
    "log off",
    "sign off",
    "end",
    "that's all",
    "stop listening",
    "sleep",
    "power down",
];

const GREETING: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "hiya",
    "yo",
    "good morning",
    "good afternoon",
    "good evening",
    "greetings",
    "sup",
    "what's up",
    "howdy",
    "morning",
    "evening",
    "afternoon",
    "wake up",
    "are you there",
    "come online",
    "good to see you",
    "nice to see you",
];

const THANKS: &[&str] = &[
    "thank you",
    "thanks",
    "thx",
    "appreciate it",
    "much appreciated",
    "cheers",
    "i appreciate that",
    "thankyou",
];

const HOW_ARE_YOU: &[&str] = &[
    "how are you",
    "how do you feel",
    "how's it going",
    "how is it going",
    "are you okay",
    "are you fine",
    "how you doing",
];

const CAPABILITIES: &[&str] = &[
    "what can you do",
    "your capabilities",
    "help me",
    "what are your functions",
    "what do you do",
    "what can you help with",
    "what are you able to do",
    "how can you help me",
];

const JOKE: &[&str] = &["joke", "make me laugh", "say something funny"];

const TIME: &[&str] = &[
    "what time",
    "the time",
    "time please",
    "current time",
    "time now",
    "tell time",
    "clock",
    "time check",
];

const DATE: &[&str] = &[
    "what date",
    "the date",
    "date please",
    "current date",
    "what day",
    "today's date",
    "date now",
    "which day",
];

const GOOGLE: &[&str] = &["open google", "go to google", "launch google", "google page", "open google.com"];
const YOUTUBE: &[&str] = &["open youtube", "go to youtube", "launch youtube", "youtube please", "open youtube.com"];
const GITHUB: &[&str] = &["open github", "go to github", "launch github", "open github.com"];
const REDDIT: &[&str] = &["open reddit", "go to reddit", "launch reddit", "open reddit.com"];
const TWITTER: &[&str] = &["open twitter", "open x", "go to twitter", "launch twitter", "open twitter.com"];

const SEARCH: &[&str] = &["search for", "look up", "google", "find", "search"];

const NOTEPAD: &[&str] = &["open notepad", "launch notepad", "start notepad", "open text editor"];
const CALCULATOR: &[&str] = &["open calculator", "launch calculator", "open the calculator", "open calc"];
const FILE_EXPLORER: &[&str] = &["open file explorer", "open explorer", "open files", "open file manager"];
const TERMINAL: &[&str] = &["open command prompt", "open cmd", "open terminal", "open a terminal"];

const SHUTDOWN: &[&str] = &["shutdown", "shut down", "power off"];
const RESTART: &[&str] = &["restart", "reboot"];

const IDENTITY: &[&str] = &["who are you", "your name", "what are you"];

const PLAY_MUSIC: &[&str] = &["play music", "play some music"];

/// Build the default command table
#[must_use]
pub fn default_table() -> IntentTable<Handler> {
    IntentTable::<Handler>::builder()
        .register(IntentGroup::new(Intent::Help, HELP), handlers::help)
        .register(
            IntentGroup::new(Intent::DateTime, DATE_WORDS)
                .mode(MatchMode::Words)
                .requires(TIME_WORDS),
            handlers::date_time,
        )
        .register(
            IntentGroup::new(Intent::PlaySpotify, PLAY_SPOTIFY)
                .mode(MatchMode::Words)
                .requires(SPOTIFY)
                .fillers(SPOTIFY_FILLERS),
            handlers::play_spotify,
        )
        .register(
            IntentGroup::new(Intent::OpenSpotify, OPEN_SPOTIFY),
            handlers::open_spotify,
        )
        .register(
            IntentGroup::new(Intent::Exit, EXIT).mode(MatchMode::Words),
            handlers::exit,
        )
        .register(
            IntentGroup::new(Intent::Greeting, GREETING).mode(MatchMode::Words),
            handlers::greeting,
        )
        .register(IntentGroup::new(Intent::Thanks, THANKS), handlers::thanks)
        .register(
            IntentGroup::new(Intent::HowAreYou, HOW_ARE_YOU),
            handlers::how_are_you,
        )
        .register(
            IntentGroup::new(Intent::Capabilities, CAPABILITIES),
            handlers::capabilities,
        )
        .register(IntentGroup::new(Intent::Joke, JOKE), handlers::joke)
        .register(IntentGroup::new(Intent::Time, TIME), handlers::time)
        .register(IntentGroup::new(Intent::Date, DATE), handlers::date)
        .register(site(Site::Google, GOOGLE), handlers::open_site)
        .register(site(Site::YouTube, YOUTUBE), handlers::open_site)
        .register(site(Site::GitHub, GITHUB), handlers::open_site)
        .register(site(Site::Reddit, REDDIT), handlers::open_site)
        .register(site(Site::Twitter, TWITTER), handlers::open_site)
        .register(
            IntentGroup::new(Intent::Search, SEARCH)
                .mode(MatchMode::Raw)
                .fillers(&["please"]),
            handlers::search,
        )
        .register(app(App::Notepad, NOTEPAD), handlers::launch_app)
        .register(app(App::Calculator, CALCULATOR), handlers::launch_app)
        .register(app(App::FileExplorer, FILE_EXPLORER), handlers::launch_app)
        .register(app(App::Terminal, TERMINAL), handlers::launch_app)
        .register(
            IntentGroup::new(Intent::Power(PowerAction::Shutdown), SHUTDOWN),
            handlers::power,
        )
        .register(
            IntentGroup::new(Intent::Power(PowerAction::Restart), RESTART),
            handlers::power,
        )
        .register(IntentGroup::new(Intent::Identity, IDENTITY), handlers::identity)
        .register(
            IntentGroup::new(Intent::PlayMusic, PLAY_MUSIC),
            handlers::play_music,
        )
        .build()
}

fn site(site: Site, triggers: &[&str]) -> IntentGroup {
    IntentGroup::new(Intent::OpenSite(site), triggers).mode(MatchMode::Words)
}

fn app(app: App, triggers: &[&str]) -> IntentGroup {
    IntentGroup::new(Intent::LaunchApp(app), triggers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentMatch;
    use crate::text::normalize;

    fn resolve(text: &str) -> Option<IntentMatch> {
        default_table().match_text(&normalize(text), text)
    }

    fn intent(text: &str) -> Option<Intent> {
        resolve(text).map(|m| m.intent)
    }

    #[test]
    fn test_documented_order() {
        let table = default_table();
        let order: Vec<Intent> = table.groups().map(IntentGroup::intent).collect();

        assert_eq!(order[0], Intent::Help);
        assert_eq!(order[1], Intent::DateTime);
        assert_eq!(order[2], Intent::PlaySpotify);
        assert_eq!(order[3], Intent::OpenSpotify);
        assert_eq!(order[4], Intent::Exit);
        assert_eq!(order[5], Intent::Greeting);
        assert_eq!(order.last(), Some(&Intent::PlayMusic));
        assert_eq!(table.len(), 26);
    }

    #[test]
    fn test_date_and_time_combined() {
        assert_eq!(intent("what's the date and time"), Some(Intent::DateTime));
        assert_eq!(intent("tell me the time and day"), Some(Intent::DateTime));
        assert_eq!(intent("what time is it"), Some(Intent::Time));
        assert_eq!(intent("what's the date"), Some(Intent::Date));
        assert_eq!(intent("what day is it"), Some(Intent::Date));
    }

    #[test]
    fn test_goodbye_exits() {
        assert_eq!(intent("goodbye"), Some(Intent::Exit));
        assert_eq!(intent("that's all"), Some(Intent::Exit));
        assert_eq!(intent("see you later"), Some(Intent::Exit));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(intent("purple elephant sandwich"), None);
        assert_eq!(intent(""), None);
    }

    #[test]
    fn test_short_triggers_need_whole_words() {
        // "hi" in "this", "end" in "weekend"
        assert_eq!(intent("this weekend"), None);
        assert_eq!(intent("hi there"), Some(Intent::Greeting));
    }

    #[test]
    fn test_spotify_play_before_open() {
        let m = resolve("play blinding lights on spotify").unwrap();
        assert_eq!(m.intent, Intent::PlaySpotify);
        assert_eq!(m.argument(), Some("blinding lights"));

        let m = resolve("play spotify").unwrap();
        assert_eq!(m.intent, Intent::PlaySpotify);
        assert_eq!(m.argument(), None);

        assert_eq!(intent("open spotify"), Some(Intent::OpenSpotify));
    }

    #[test]
    fn test_spotify_titles_keep_their_words() {
        let m = resolve("play the sound of silence on spotify").unwrap();
        assert_eq!(m.argument(), Some("the sound of silence"));

        let m = resolve("play my heart will go on on spotify").unwrap();
        assert_eq!(m.argument(), Some("my heart will go on"));

        let m = resolve("play rock and roll all nite on spotify please").unwrap();
        assert_eq!(m.argument(), Some("rock and roll all nite"));
    }

    #[test]
    fn test_play_music_without_spotify() {
        assert_eq!(intent("play some music"), Some(Intent::PlayMusic));
    }

    #[test]
    fn test_sites() {
        assert_eq!(intent("open google"), Some(Intent::OpenSite(Site::Google)));
        assert_eq!(intent("Open YouTube."), Some(Intent::OpenSite(Site::YouTube)));
        assert_eq!(intent("open x"), Some(Intent::OpenSite(Site::Twitter)));
        assert_ne!(intent("open xbox"), Some(Intent::OpenSite(Site::Twitter)));
    }

    #[test]
    fn test_search_argument() {
        let m = resolve("search for rust borrow checker").unwrap();
        assert_eq!(m.intent, Intent::Search);
        assert_eq!(m.argument(), Some("rust borrow checker"));

        let m = resolve("google C++ templates").unwrap();
        assert_eq!(m.argument(), Some("c++ templates"));

        let m = resolve("search").unwrap();
        assert_eq!(m.argument(), None);
    }

    #[test]
    fn test_apps_and_power() {
        assert_eq!(
            intent("open calculator"),
            Some(Intent::LaunchApp(App::Calculator))
        );
        assert_eq!(
            intent("open a terminal"),
            Some(Intent::LaunchApp(App::Terminal))
        );
        assert_eq!(
            intent("shut down the computer"),
            Some(Intent::Power(PowerAction::Shutdown))
        );
        assert_eq!(
            intent("reboot"),
            Some(Intent::Power(PowerAction::Restart))
        );
    }

    #[test]
    fn test_conversation() {
        assert_eq!(intent("thank you"), Some(Intent::Thanks));
        assert_eq!(intent("how are you doing"), Some(Intent::HowAreYou));
        assert_eq!(intent("what can you do"), Some(Intent::Capabilities));
        assert_eq!(intent("tell me a joke"), Some(Intent::Joke));
        assert_eq!(intent("who are you"), Some(Intent::Identity));
        assert_eq!(intent("show commands"), Some(Intent::Help));
    }
}
