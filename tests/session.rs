//! Session loop integration tests
//!
//! Drives full sessions with scripted transcripts, a recording speaker and
//! recorded system actions.

use jarvis_dispatch::commands::APOLOGY;
use jarvis_dispatch::commands::responses::{CONFUSION, FAREWELLS, WAKE_ACKNOWLEDGMENTS};
use jarvis_dispatch::intent::{Intent, IntentGroup, IntentMatch, IntentTable};
use jarvis_dispatch::listen::SERVICE_UNAVAILABLE;
use jarvis_dispatch::{Capture, Context, DispatchResult, Error, Handler, SessionState, Utterance};

mod common;
use common::{Harness, ScriptedRecognizer, entries};

#[test]
fn test_goodbye_terminates_session() {
    let mut h = Harness::heard(&["Jarvis, goodbye.", "jarvis open google"]);
    let spoken = h.run();

    assert_eq!(h.session.state(), &SessionState::Terminated);
    assert!(spoken[0].contains("I'm Jarvis"));
    assert!(FAREWELLS.contains(&spoken.last().unwrap().as_str()));
    // Nothing after the farewell was consumed
    assert!(entries(&h.actions).is_empty());
}

#[test]
fn test_name_spoken_before_microphone_reopens() {
    let (mut h, seen) = Harness::heard_observed(&["jarvis who are you", "jarvis goodbye"]);
    h.run();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    // greeting finished before the first capture
    assert_eq!(seen[0].len(), 1);
    assert!(seen[0][0].contains("I'm Jarvis"));
    // identity answer finished before the next capture
    assert_eq!(seen[1].len(), 2);
    assert!(seen[1][1].starts_with("I am Jarvis"));
}

#[test]
fn test_unrecognized_command_keeps_listening() {
    let mut h = Harness::heard(&["jarvis purple elephant", "jarvis goodbye"]);
    let spoken = h.run();

    assert_eq!(spoken.len(), 3);
    assert!(CONFUSION.contains(&spoken[1].as_str()));
    assert!(FAREWELLS.contains(&spoken[2].as_str()));
}

#[test]
fn test_wake_alone_acknowledges_then_captures() {
    let mut h = Harness::heard(&["Jarvis?", "open google"]);
    let spoken = h.run();

    assert!(WAKE_ACKNOWLEDGMENTS.contains(&spoken[1].as_str()));
    assert_eq!(entries(&h.actions), ["url https://www.google.com"]);
}

#[test]
fn test_speech_without_wake_is_ignored() {
    let mut h = Harness::heard(&["open google", "the weather is nice"]);
    let spoken = h.run();

    // Greeting only
    assert_eq!(spoken.len(), 1);
    assert!(entries(&h.actions).is_empty());
    assert_eq!(h.session.state(), &SessionState::Terminated);
}

#[test]
fn test_search_keeps_raw_query() {
    let mut h = Harness::heard(&["Hey Jarvis, search for C++ tutorials"]);
    let spoken = h.run();

    assert_eq!(
        entries(&h.actions),
        ["url https://www.google.com/search?q=c%2B%2B%20tutorials"]
    );
    assert!(spoken.iter().any(|s| s == "Searching for c++ tutorials."));
}

#[test]
fn test_misheard_name_keeps_raw_query() {
    let mut h = Harness::heard(&["Hey Jarviss, search for C++"]);
    h.run();

    assert_eq!(
        entries(&h.actions),
        ["url https://www.google.com/search?q=c%2B%2B"]
    );
}

#[test]
fn test_search_asks_for_missing_query() {
    let mut h = Harness::heard(&["jarvis search", "Rust lifetimes"]);
    let spoken = h.run();

    assert!(spoken.iter().any(|s| s == "What would you like me to search for?"));
    assert_eq!(
        entries(&h.actions),
        ["url https://www.google.com/search?q=Rust%20lifetimes"]
    );
}

#[test]
fn test_service_error_during_command_capture() {
    let mut h = Harness::new(ScriptedRecognizer::new([
        Capture::Heard("jarvis".to_string()),
        Capture::ServiceError("connection refused".to_string()),
        Capture::Heard("jarvis goodbye".to_string()),
    ]));
    let spoken = h.run();

    assert!(spoken.iter().any(|s| s == SERVICE_UNAVAILABLE));
    assert!(FAREWELLS.contains(&spoken.last().unwrap().as_str()));
}

#[test]
fn test_service_error_while_idle_is_silent() {
    let mut h = Harness::new(ScriptedRecognizer::new([
        Capture::ServiceError("timeout".to_string()),
        Capture::Heard("jarvis goodbye".to_string()),
    ]));
    let spoken = h.run();

    assert!(!spoken.iter().any(|s| s == SERVICE_UNAVAILABLE));
    assert_eq!(spoken.len(), 2);
}

#[test]
fn test_unintelligible_command_retries() {
    let mut h = Harness::new(ScriptedRecognizer::new([
        Capture::Heard("jarvis".to_string()),
        Capture::Unintelligible,
        Capture::Unintelligible,
        Capture::Heard("open youtube".to_string()),
    ]));
    h.run();

    assert_eq!(entries(&h.actions), ["url https://www.youtube.com"]);
}

#[test]
fn test_command_timeout_returns_to_idle() {
    let mut h = Harness::new(ScriptedRecognizer::new([
        Capture::Heard("jarvis".to_string()),
        Capture::TimedOut,
        Capture::Heard("open github".to_string()),
        Capture::Heard("jarvis open reddit".to_string()),
    ]));
    h.run();

    // "open github" arrived while idle, without a wake phrase
    assert_eq!(entries(&h.actions), ["url https://www.reddit.com"]);
}

fn broken(_: &mut Context<'_>, _: &IntentMatch) -> jarvis_dispatch::Result<DispatchResult> {
    Err(Error::Action("boom".to_string()))
}

#[test]
fn test_failing_handler_apologizes_and_continues() {
    let table = IntentTable::<Handler>::builder()
        .register(IntentGroup::new(Intent::Joke, &["tell me a joke"]), broken)
        .build();

    let mut h =
        Harness::heard(&["jarvis tell me a joke", "jarvis tell me a joke"]).with_table(table);
    let spoken = h.run();

    assert_eq!(spoken.iter().filter(|s| *s == APOLOGY).count(), 2);
    assert_eq!(h.session.state(), &SessionState::Terminated);
}

#[test]
fn test_power_requires_confirmation() {
    let mut h = Harness::heard(&["jarvis shut down the computer", "no thanks"]);
    let spoken = h.run();

    assert!(spoken.iter().any(|s| s == "Are you sure you want to shut down the computer?"));
    assert!(spoken.iter().any(|s| s == "Shutdown cancelled."));
    assert!(entries(&h.actions).is_empty());

    let mut h = Harness::heard(&["jarvis restart", "yes do it"]);
    h.run();
    assert_eq!(entries(&h.actions), ["power restart"]);
}

#[test]
fn test_combined_date_and_time() {
    let mut h = Harness::heard(&["jarvis what's the date and time"]);
    let spoken = h.run();

    let reply = &spoken[1];
    assert!(reply.starts_with("It's "));
    assert!(reply.contains(" on "));
}

#[test]
fn test_spotify_query() {
    let mut h = Harness::heard(&["Jarvis, play Blinding Lights on Spotify"]);
    h.run();

    assert_eq!(
        entries(&h.actions),
        ["url spotify:search:blinding%20lights"]
    );
}

#[test]
fn test_spotify_query_keeps_title_words() {
    let mut h = Harness::heard(&["Jarvis, play the sound of silence on Spotify"]);
    h.run();

    assert_eq!(
        entries(&h.actions),
        ["url spotify:search:the%20sound%20of%20silence"]
    );
}

#[test]
fn test_step_through_states() {
    let mut h = Harness::heard(&["jarvis", "thank you"]);

    assert_eq!(h.session.state(), &SessionState::IdleListening);
    assert_eq!(h.session.step(), &SessionState::Acknowledging);
    assert_eq!(h.session.step(), &SessionState::CapturingCommand);
    assert!(matches!(
        h.session.step(),
        SessionState::Dispatching(u) if u.normalized() == "thank you"
    ));
    assert_eq!(h.session.step(), &SessionState::IdleListening);
    assert_eq!(h.session.step(), &SessionState::Terminated);

    h.session.speech().shutdown();
}

#[test]
fn test_direct_dispatch() {
    let mut h = Harness::heard(&[]);
    let result = h.session.dispatch(&Utterance::new("bye"));
    assert!(!result.continue_session);

    let result = h.session.dispatch(&Utterance::new("open calculator"));
    assert!(result.continue_session);
    assert_eq!(entries(&h.actions), ["launch the calculator"]);

    h.session.speech().shutdown();
}
