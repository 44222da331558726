//! Command handlers bound to intents
//!
//! Each handler receives a [`Context`] with the session's collaborators and
//! the resolved [`IntentMatch`], speaks its response and reports whether the
//! session should keep running.

pub mod responses;
pub mod table;

use std::path::Path;

use chrono::Local;

use crate::Result;
use crate::actions::Actions;
use crate::intent::{App, Intent, IntentMatch, IntentTable, PowerAction, Site};
use crate::listen::Listener;
use crate::speech::SpeechQueue;
use crate::text::{Utterance, normalize};

pub use responses::Responses;
pub use table::default_table;

use responses::{
    ACKNOWLEDGMENTS, CAPABILITIES, CONFUSION, FAREWELLS, HOW_ARE_YOU, JOKES, THANKS,
};

/// Spoken when a handler fails
pub const APOLOGY: &str = "Sorry, something went wrong while doing that.";

/// Words that confirm a shutdown or restart
pub const YES_WORDS: &[&str] = &["yes", "yeah", "sure", "do it", "confirm"];

/// Handler signature shared by every intent
pub type Handler = fn(&mut Context<'_>, &IntentMatch) -> Result<DispatchResult>;

/// Whether the session keeps running after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    pub continue_session: bool,
}

impl DispatchResult {
    /// Keep listening
    #[must_use]
    pub const fn proceed() -> Self {
        Self {
            continue_session: true,
        }
    }

    /// End the session
    #[must_use]
    pub const fn stop() -> Self {
        Self {
            continue_session: false,
        }
    }
}

/// Everything a handler may touch
pub struct Context<'a> {
    pub speech: &'a SpeechQueue,
    pub listener: &'a mut Listener,
    pub actions: &'a dyn Actions,
    pub responses: &'a mut Responses,
    pub table: &'a IntentTable<Handler>,
    /// Display name used in self-references ("I'm Jarvis")
    pub assistant_name: &'a str,
    pub music_dir: Option<&'a Path>,
}

impl Context<'_> {
    /// Humanize and queue a response without waiting
    pub fn say(&mut self, text: &str) {
        let text = self.responses.humanize(text);
        self.speech.say(text);
    }

    /// Humanize a response and wait until it has been spoken
    pub fn say_and_wait(&mut self, text: &str) {
        let text = self.responses.humanize(text);
        self.speech.say_and_wait(text);
    }

    /// Random acknowledgment followed by `detail`
    fn acknowledge(&mut self, detail: &str) {
        let ack = self.responses.pick(ACKNOWLEDGMENTS);
        self.say(&format!("{ack} {detail}"));
    }
}

/// Resolve an utterance and run its handler
///
/// Unrecognized input gets a confusion response; a failing handler gets an
/// apology. Both keep the session alive.
pub fn dispatch(ctx: &mut Context<'_>, utterance: &Utterance) -> DispatchResult {
    let table = ctx.table;

    let Some((matched, handler)) = table.resolve(utterance) else {
        tracing::info!(text = %utterance.normalized(), "unrecognized command");
        let reply = ctx.responses.pick(CONFUSION);
        ctx.say(reply);
        return DispatchResult::proceed();
    };

    tracing::info!(
        intent = %matched.intent,
        argument = %matched.argument,
        "dispatching command"
    );

    match handler(ctx, &matched) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(intent = %matched.intent, error = %e, "command failed");
            ctx.say(APOLOGY);
            DispatchResult::proceed()
        }
    }
}

/// True when a confirmation answer contains a yes-word
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    let padded = format!(" {} ", normalize(answer));
    YES_WORDS.iter().any(|w| padded.contains(&format!(" {w} ")))
}

pub fn help(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    ctx.say("I'll list example phrases in the console so you can copy or test them.");

    println!("\n=== Example command phrases ===");
    for group in ctx.table.groups() {
        if matches!(group.intent(), Intent::Help | Intent::Exit) {
            continue;
        }
        println!("\n{}:", group.intent());
        for phrase in group.triggers().iter().take(8) {
            println!("  - {phrase}");
        }
    }
    println!(
        "\nYou can say e.g. '{name}, play blinding lights on Spotify' or '{name}, open Spotify'.",
        name = ctx.assistant_name
    );

    Ok(DispatchResult::proceed())
}

pub fn greeting(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    let reply = ctx.responses.greeting(Local::now());
    ctx.say(&reply);
    Ok(DispatchResult::proceed())
}

pub fn thanks(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    let reply = ctx.responses.pick(THANKS);
    ctx.say(reply);
    Ok(DispatchResult::proceed())
}

pub fn how_are_you(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    let reply = ctx.responses.pick(HOW_ARE_YOU);
    ctx.say(reply);
    Ok(DispatchResult::proceed())
}

pub fn capabilities(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    let reply = ctx.responses.pick(CAPABILITIES);
    ctx.say(reply);
    Ok(DispatchResult::proceed())
}

pub fn joke(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    let reply = ctx.responses.pick(JOKES);
    ctx.say(reply);
    Ok(DispatchResult::proceed())
}

pub fn time(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    let reply = ctx.responses.time(Local::now());
    ctx.say(&reply);
    Ok(DispatchResult::proceed())
}

pub fn date(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    let reply = ctx.responses.date(Local::now());
    ctx.say(&reply);
    Ok(DispatchResult::proceed())
}

pub fn date_time(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    let now = Local::now();
    let reply = format!(
        "It's {} on {}.",
        responses::format_time(now),
        responses::format_date(now)
    );
    ctx.say(&reply);
    Ok(DispatchResult::proceed())
}

pub fn exit(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    let reply = ctx.responses.pick(FAREWELLS);
    ctx.say(reply);
    Ok(DispatchResult::stop())
}

pub fn identity(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    let reply = format!(
        "I am {}, your personal assistant. I'm here to help you with various tasks and make your life a bit easier.",
        ctx.assistant_name
    );
    ctx.say_and_wait(&reply);
    Ok(DispatchResult::proceed())
}

pub fn open_site(ctx: &mut Context<'_>, m: &IntentMatch) -> Result<DispatchResult> {
    let Intent::OpenSite(site) = m.intent else {
        return Err(crate::Error::Action(format!("{} is not a site", m.intent)));
    };

    open_known_site(ctx, site);
    Ok(DispatchResult::proceed())
}

fn open_known_site(ctx: &mut Context<'_>, site: Site) {
    ctx.acknowledge(&format!("Opening {}.", site.label()));
    if !ctx.actions.open_url(site.url()) {
        ctx.say(&format!("I couldn't open {}.", site.label()));
    }
}

pub fn search(ctx: &mut Context<'_>, m: &IntentMatch) -> Result<DispatchResult> {
    let query = match m.argument() {
        Some(query) => query.to_string(),
        None => {
            ctx.say_and_wait("What would you like me to search for?");
            let Some(answer) = ctx.listener.listen_command(ctx.speech) else {
                return Ok(DispatchResult::proceed());
            };
            answer.raw().trim().to_string()
        }
    };

    ctx.say(&format!("Searching for {query}."));
    let url = format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(&query)
    );
    if !ctx.actions.open_url(&url) {
        ctx.say("I couldn't open the browser.");
    }

    Ok(DispatchResult::proceed())
}

pub fn launch_app(ctx: &mut Context<'_>, m: &IntentMatch) -> Result<DispatchResult> {
    let Intent::LaunchApp(app) = m.intent else {
        return Err(crate::Error::Action(format!("{} is not an app", m.intent)));
    };

    launch_known_app(ctx, app);
    Ok(DispatchResult::proceed())
}

fn launch_known_app(ctx: &mut Context<'_>, app: App) {
    ctx.acknowledge(&format!("Opening {}.", app.label()));
    if !ctx.actions.launch(app) {
        ctx.say(&format!("I couldn't find {} on this machine.", app.label()));
    }
}

pub fn power(ctx: &mut Context<'_>, m: &IntentMatch) -> Result<DispatchResult> {
    let Intent::Power(action) = m.intent else {
        return Err(crate::Error::Action(format!("{} is not a power action", m.intent)));
    };

    ctx.say_and_wait(&format!(
        "Are you sure you want to {} the computer?",
        action.verb()
    ));

    let confirmed = ctx
        .listener
        .listen_confirmation(ctx.speech)
        .is_some_and(|answer| is_affirmative(answer.raw()));

    if !confirmed {
        tracing::info!(action = action.verb(), "power action cancelled");
        ctx.say(match action {
            PowerAction::Shutdown => "Shutdown cancelled.",
            PowerAction::Restart => "Restart cancelled.",
        });
        return Ok(DispatchResult::proceed());
    }

    ctx.say_and_wait(match action {
        PowerAction::Shutdown => "Shutting down.",
        PowerAction::Restart => "Restarting.",
    });
    if !ctx.actions.power(action) {
        ctx.say(&format!("I couldn't {} the computer.", action.verb()));
    }

    Ok(DispatchResult::proceed())
}

pub fn open_spotify(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    ctx.acknowledge("Opening Spotify.");
    launch_spotify(ctx, None);
    Ok(DispatchResult::proceed())
}

pub fn play_spotify(ctx: &mut Context<'_>, m: &IntentMatch) -> Result<DispatchResult> {
    match m.argument() {
        Some(query) => {
            ctx.acknowledge(&format!("Playing {query} on Spotify."));
            launch_spotify(ctx, Some(query));
        }
        None => {
            ctx.acknowledge("Opening Spotify.");
            launch_spotify(ctx, None);
        }
    }
    Ok(DispatchResult::proceed())
}

/// Try the desktop app's URI scheme first, then the web player
fn launch_spotify(ctx: &mut Context<'_>, query: Option<&str>) {
    let (uri, web) = match query {
        Some(query) => {
            let encoded = urlencoding::encode(query);
            (
                format!("spotify:search:{encoded}"),
                format!("https://open.spotify.com/search/{encoded}"),
            )
        }
        None => (
            "spotify:".to_string(),
            "https://open.spotify.com".to_string(),
        ),
    };

    if !ctx.actions.open_url(&uri) && !ctx.actions.open_url(&web) {
        ctx.say("I couldn't open Spotify.");
    }
}

pub fn play_music(ctx: &mut Context<'_>, _: &IntentMatch) -> Result<DispatchResult> {
    match ctx.music_dir.filter(|dir| dir.is_dir()) {
        Some(dir) => {
            ctx.say("Opening your music folder.");
            if !ctx.actions.open_path(dir) {
                ctx.say("I couldn't open your music folder.");
            }
        }
        None => ctx.say("I couldn't find your music folder."),
    }
    Ok(DispatchResult::proceed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("Yes"));
        assert!(is_affirmative("yeah go ahead"));
        assert!(is_affirmative("Sure!"));
        assert!(is_affirmative("please do it"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("yesterday"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn test_dispatch_result() {
        assert!(DispatchResult::proceed().continue_session);
        assert!(!DispatchResult::stop().continue_session);
    }
}
