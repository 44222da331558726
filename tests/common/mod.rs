//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jarvis_dispatch::intent::{App, IntentTable, PowerAction};
use jarvis_dispatch::{
    Actions, Capture, Config, Error, Handler, Listener, Recognizer, Responses, Session, Speaker,
    SpeechQueue,
};

pub type Log = Arc<Mutex<Vec<String>>>;

/// What had been spoken when each capture started
pub type Snapshots = Arc<Mutex<Vec<Vec<String>>>>;

/// Snapshot of a shared log
#[must_use]
pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Replays a fixed list of captures, then reports the source closed
pub struct ScriptedRecognizer {
    captures: VecDeque<Capture>,
    observer: Option<(Log, Snapshots)>,
}

impl ScriptedRecognizer {
    pub fn new(captures: impl IntoIterator<Item = Capture>) -> Self {
        Self {
            captures: captures.into_iter().collect(),
            observer: None,
        }
    }

    /// Snapshot `spoken` into `seen` at the start of every capture
    #[must_use]
    pub fn observing(mut self, spoken: Log, seen: Snapshots) -> Self {
        self.observer = Some((spoken, seen));
        self
    }

    /// Every line becomes a `Capture::Heard`
    pub fn heard(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| Capture::Heard((*l).to_string())))
    }
}

impl Recognizer for ScriptedRecognizer {
    fn capture(&mut self, _timeout: Option<Duration>, _phrase_limit: Duration) -> Capture {
        if let Some((spoken, seen)) = &self.observer {
            seen.lock().unwrap().push(entries(spoken));
        }
        self.captures.pop_front().unwrap_or(Capture::Closed)
    }
}

/// Records every utterance it is asked to speak
pub struct RecordingSpeaker {
    spoken: Log,
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, text: &str) -> jarvis_dispatch::Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Fails on any text containing `marker`, records the rest
pub struct FailingSpeaker {
    marker: String,
    spoken: Log,
}

impl Speaker for FailingSpeaker {
    fn speak(&mut self, text: &str) -> jarvis_dispatch::Result<()> {
        if text.contains(&self.marker) {
            return Err(Error::Tts(format!("cannot say {text}")));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Speech queue backed by a [`RecordingSpeaker`]
#[must_use]
pub fn recording_queue() -> (SpeechQueue, Log) {
    let spoken = Log::default();
    let log = Arc::clone(&spoken);
    let queue = SpeechQueue::new(move || {
        Ok(Box::new(RecordingSpeaker {
            spoken: Arc::clone(&log),
        }) as Box<dyn Speaker>)
    });
    (queue, spoken)
}

/// Speech queue backed by a [`FailingSpeaker`]
#[must_use]
pub fn failing_queue(marker: &str) -> (SpeechQueue, Log) {
    let spoken = Log::default();
    let log = Arc::clone(&spoken);
    let marker = marker.to_string();
    let queue = SpeechQueue::new(move || {
        Ok(Box::new(FailingSpeaker {
            marker: marker.clone(),
            spoken: Arc::clone(&log),
        }) as Box<dyn Speaker>)
    });
    (queue, spoken)
}

/// Records requested system actions instead of running them
#[derive(Default)]
pub struct RecordingActions {
    pub log: Log,
}

impl RecordingActions {
    fn record(&self, entry: String) -> bool {
        self.log.lock().unwrap().push(entry);
        true
    }
}

impl Actions for RecordingActions {
    fn open_url(&self, url: &str) -> bool {
        self.record(format!("url {url}"))
    }

    fn launch(&self, app: App) -> bool {
        self.record(format!("launch {}", app.label()))
    }

    fn open_path(&self, path: &Path) -> bool {
        self.record(format!("path {}", path.display()))
    }

    fn power(&self, action: PowerAction) -> bool {
        self.record(format!("power {}", action.verb()))
    }
}

/// Default config with plain responses and no backoff delay
#[must_use]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.humanize = false;
    config.listen.service_backoff = Duration::from_millis(1);
    config
}

/// A session fed from `recognizer`
pub struct Harness {
    pub session: Session,
    pub spoken: Log,
    pub actions: Log,
}

impl Harness {
    pub fn new(recognizer: ScriptedRecognizer) -> Self {
        let (speech, spoken) = recording_queue();
        Self::with_speech(recognizer, speech, spoken)
    }

    /// Like [`Harness::heard`], also recording what was spoken before each capture
    pub fn heard_observed(lines: &[&str]) -> (Self, Snapshots) {
        let (speech, spoken) = recording_queue();
        let seen = Snapshots::default();
        let recognizer =
            ScriptedRecognizer::heard(lines).observing(Arc::clone(&spoken), Arc::clone(&seen));
        (Self::with_speech(recognizer, speech, spoken), seen)
    }

    fn with_speech(recognizer: ScriptedRecognizer, speech: SpeechQueue, spoken: Log) -> Self {
        let config = test_config();
        let actions = RecordingActions::default();
        let action_log = Arc::clone(&actions.log);

        let listener = Listener::new(Box::new(recognizer), config.listen.clone());
        let session = Session::new(&config, listener, speech, Box::new(actions))
            .unwrap()
            .with_responses(Responses::seeded(7, false))
            .with_music_dir(None);

        Self {
            session,
            spoken,
            actions: action_log,
        }
    }

    pub fn heard(lines: &[&str]) -> Self {
        Self::new(ScriptedRecognizer::heard(lines))
    }

    /// Swap in a custom command table
    #[must_use]
    pub fn with_table(self, table: IntentTable<Handler>) -> Self {
        Self {
            session: self.session.with_table(table),
            ..self
        }
    }

    /// Run to termination and return everything spoken, greeting first
    pub fn run(&mut self) -> Vec<String> {
        self.session.run();
        entries(&self.spoken)
    }
}
