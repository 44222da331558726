//! The listen, wake, dispatch loop
//!
//! A [`Session`] is an explicit state machine. [`Session::step`] performs one
//! transition and [`Session::run`] drives it until [`SessionState::Terminated`].

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, Timelike};

use crate::Result;
use crate::actions::{self, Actions};
use crate::commands::responses::{WAKE_ACKNOWLEDGMENTS, time_of_day_greeting};
use crate::commands::{self, Context, DispatchResult, Handler, Responses};
use crate::config::Config;
use crate::intent::IntentTable;
use crate::listen::{Capture, Listener};
use crate::speech::SpeechQueue;
use crate::text::Utterance;
use crate::wake::WakeDetector;

/// Where the session is in its cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the wake phrase
    IdleListening,
    /// Woken without a command; about to answer
    Acknowledging,
    /// Waiting for the command that follows an acknowledgment
    CapturingCommand,
    /// A command is ready to run
    Dispatching(Utterance),
    /// The session is over
    Terminated,
}

/// A running assistant
pub struct Session {
    detector: WakeDetector,
    table: IntentTable<Handler>,
    listener: Listener,
    speech: SpeechQueue,
    actions: Box<dyn Actions>,
    responses: Responses,
    assistant_name: String,
    music_dir: Option<PathBuf>,
    service_backoff: Duration,
    state: SessionState,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("assistant_name", &self.assistant_name)
            .field("state", &self.state)
            .field("detector", &self.detector)
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session using the default command table
    ///
    /// # Errors
    ///
    /// Returns error if the wake detector cannot be built from `config`
    pub fn new(
        config: &Config,
        listener: Listener,
        speech: SpeechQueue,
        actions: Box<dyn Actions>,
    ) -> Result<Self> {
        Ok(Self {
            detector: WakeDetector::new(&config.wake)?,
            table: commands::default_table(),
            listener,
            speech,
            actions,
            responses: Responses::new(config.humanize),
            assistant_name: display_name(&config.wake.name),
            music_dir: actions::music_dir(),
            service_backoff: config.listen.service_backoff,
            state: SessionState::IdleListening,
        })
    }

    /// Replace the command table
    #[must_use]
    pub fn with_table(mut self, table: IntentTable<Handler>) -> Self {
        self.table = table;
        self
    }

    /// Replace the response generator (e.g. with a seeded one)
    #[must_use]
    pub fn with_responses(mut self, responses: Responses) -> Self {
        self.responses = responses;
        self
    }

    /// Override the music directory opened by "play music"
    #[must_use]
    pub fn with_music_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.music_dir = dir;
        self
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Speech queue owned by the session
    #[must_use]
    pub const fn speech(&self) -> &SpeechQueue {
        &self.speech
    }

    /// Startup greeting, spoken before the first capture starts
    pub fn greet(&self) {
        let greeting = format!(
            "{}, I'm {}. Say my name when you need me.",
            time_of_day_greeting(Local::now().hour()),
            self.assistant_name
        );
        // Says the wake name, so it must finish before the microphone opens
        self.speech.say_and_wait(greeting);
    }

    /// Greet, then step until terminated and drain pending speech
    pub fn run(&mut self) {
        tracing::info!(name = %self.assistant_name, "session started");
        self.greet();

        while !matches!(self.step(), SessionState::Terminated) {}

        self.speech.shutdown();
        tracing::info!("session ended");
    }

    /// Perform one state transition
    pub fn step(&mut self) -> &SessionState {
        let current = std::mem::replace(&mut self.state, SessionState::Terminated);

        let next = match current {
            SessionState::IdleListening => self.wait_for_wake(),
            SessionState::Acknowledging => {
                let ack = self.responses.pick(WAKE_ACKNOWLEDGMENTS);
                self.speech.say_and_wait(ack);
                SessionState::CapturingCommand
            }
            SessionState::CapturingCommand => match self.listener.listen_command(&self.speech) {
                Some(utterance) => SessionState::Dispatching(utterance),
                None if self.listener.is_closed() => SessionState::Terminated,
                None => SessionState::IdleListening,
            },
            SessionState::Dispatching(utterance) => {
                if self.dispatch(&utterance).continue_session {
                    SessionState::IdleListening
                } else {
                    SessionState::Terminated
                }
            }
            SessionState::Terminated => SessionState::Terminated,
        };

        tracing::debug!(state = ?next, "session transition");
        self.state = next;
        &self.state
    }

    /// Resolve and run one command
    pub fn dispatch(&mut self, utterance: &Utterance) -> DispatchResult {
        let mut ctx = Context {
            speech: &self.speech,
            listener: &mut self.listener,
            actions: self.actions.as_ref(),
            responses: &mut self.responses,
            table: &self.table,
            assistant_name: &self.assistant_name,
            music_dir: self.music_dir.as_deref(),
        };
        commands::dispatch(&mut ctx, utterance)
    }

    fn wait_for_wake(&mut self) -> SessionState {
        match self.listener.listen_for_wake() {
            Capture::Heard(text) => {
                let heard = Utterance::new(text);
                tracing::debug!(text = %heard.normalized(), "heard while idle");

                match self.detector.detect(heard.normalized()) {
                    Some(wake) => wake
                        .command(&heard)
                        .map_or(SessionState::Acknowledging, SessionState::Dispatching),
                    None => SessionState::IdleListening,
                }
            }
            Capture::TimedOut | Capture::Unintelligible => SessionState::IdleListening,
            Capture::ServiceError(e) => {
                tracing::warn!(
                    error = %e,
                    backoff = ?self.service_backoff,
                    "speech service error while idle"
                );
                std::thread::sleep(self.service_backoff);
                SessionState::IdleListening
            }
            Capture::Closed => {
                tracing::info!("input closed");
                SessionState::Terminated
            }
        }
    }
}

/// "jarvis" -> "Jarvis"
fn display_name(name: &str) -> String {
    let mut chars = name.trim().chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
