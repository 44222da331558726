//! Speech capture with retry policy
//!
//! A [`Recognizer`] turns one stretch of audio into a [`Capture`]. The
//! [`Listener`] layers the retry and service-unavailable handling on top.

use std::io::BufRead;
use std::time::Duration;

use crate::config::ListenConfig;
use crate::speech::SpeechQueue;
use crate::text::Utterance;

/// Spoken when the transcription service cannot be reached
pub const SERVICE_UNAVAILABLE: &str = "Sorry, the speech service is currently unavailable.";

/// Outcome of a single capture attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// A transcript was produced
    Heard(String),
    /// No speech started within the timeout
    TimedOut,
    /// Speech was captured but could not be transcribed
    Unintelligible,
    /// The transcription service failed
    ServiceError(String),
    /// The input source has ended and will produce nothing more
    Closed,
}

/// Speech-to-text source
pub trait Recognizer {
    /// Capture and transcribe one phrase
    ///
    /// `timeout` bounds the wait for speech to begin (`None` waits forever);
    /// `phrase_limit` bounds the phrase itself.
    fn capture(&mut self, timeout: Option<Duration>, phrase_limit: Duration) -> Capture;
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn capture(&mut self, timeout: Option<Duration>, phrase_limit: Duration) -> Capture {
        (**self).capture(timeout, phrase_limit)
    }
}

/// Wraps a recognizer with the session's listening policy
pub struct Listener {
    recognizer: Box<dyn Recognizer>,
    config: ListenConfig,
    closed: bool,
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("config", &self.config)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Listener {
    #[must_use]
    pub fn new(recognizer: Box<dyn Recognizer>, config: ListenConfig) -> Self {
        Self {
            recognizer,
            config,
            closed: false,
        }
    }

    /// Single unbounded capture used while waiting for the wake phrase
    pub fn listen_for_wake(&mut self) -> Capture {
        let capture = self
            .recognizer
            .capture(None, self.config.wake_phrase_limit);
        if capture == Capture::Closed {
            self.closed = true;
        }
        capture
    }

    /// Capture a command, retrying unintelligible audio
    ///
    /// Returns `None` on timeout, after the retries are exhausted, on
    /// service failure (after apologising once), or when the source closed.
    pub fn listen(&mut self, timeout: Duration, speech: &SpeechQueue) -> Option<Utterance> {
        let attempts = self.config.retries.saturating_add(1);

        for attempt in 1..=attempts {
            tracing::debug!(attempt, timeout_secs = timeout.as_secs(), "listening");

            match self
                .recognizer
                .capture(Some(timeout), self.config.phrase_limit)
            {
                Capture::Heard(text) if !text.trim().is_empty() => {
                    tracing::info!(text = %text, "heard");
                    return Some(Utterance::new(text));
                }
                Capture::Heard(_) | Capture::Unintelligible => {
                    tracing::debug!(attempt, "could not understand, retrying");
                }
                Capture::TimedOut => {
                    tracing::debug!("wait timeout");
                    return None;
                }
                Capture::ServiceError(e) => {
                    tracing::warn!(error = %e, "speech service error");
                    speech.say(SERVICE_UNAVAILABLE);
                    return None;
                }
                Capture::Closed => {
                    self.closed = true;
                    return None;
                }
            }
        }

        tracing::debug!(attempts, "all listen attempts failed");
        None
    }

    /// Capture a command with the default command timeout
    pub fn listen_command(&mut self, speech: &SpeechQueue) -> Option<Utterance> {
        self.listen(self.config.command_timeout, speech)
    }

    /// Capture a short yes/no answer
    pub fn listen_confirmation(&mut self, speech: &SpeechQueue) -> Option<Utterance> {
        self.listen(self.config.confirm_timeout, speech)
    }

    /// True once the recognizer has reported [`Capture::Closed`]
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Listening configuration
    #[must_use]
    pub const fn config(&self) -> &ListenConfig {
        &self.config
    }
}

/// Reads typed lines as transcripts
///
/// A blank line counts as unintelligible and end of input closes the source.
/// Timeouts are not applied.
pub struct TextRecognizer<R> {
    input: R,
    prompt: bool,
}

impl<R: BufRead> TextRecognizer<R> {
    #[must_use]
    pub const fn new(input: R) -> Self {
        Self {
            input,
            prompt: false,
        }
    }

    /// Print a `> ` prompt before each read
    #[must_use]
    pub const fn with_prompt(mut self) -> Self {
        self.prompt = true;
        self
    }
}

impl TextRecognizer<std::io::StdinLock<'static>> {
    /// Read from standard input
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(std::io::stdin().lock()).with_prompt()
    }
}

impl<R: BufRead> Recognizer for TextRecognizer<R> {
    fn capture(&mut self, _timeout: Option<Duration>, _phrase_limit: Duration) -> Capture {
        if self.prompt {
            use std::io::Write;
            print!("> ");
            let _ = std::io::stdout().flush();
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Capture::Closed,
            Ok(_) if line.trim().is_empty() => Capture::Unintelligible,
            Ok(_) => Capture::Heard(line.trim().to_string()),
            Err(e) => {
                tracing::error!(error = %e, "failed to read input");
                Capture::Closed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::speech::Speaker;

    struct Scripted(VecDeque<Capture>);

    impl Recognizer for Scripted {
        fn capture(&mut self, _: Option<Duration>, _: Duration) -> Capture {
            self.0.pop_front().unwrap_or(Capture::Closed)
        }
    }

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Speaker for Recorder {
        fn speak(&mut self, text: &str) -> crate::Result<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn listener(script: Vec<Capture>) -> Listener {
        Listener::new(
            Box::new(Scripted(script.into())),
            ListenConfig::default(),
        )
    }

    fn queue() -> (SpeechQueue, Arc<Mutex<Vec<String>>>) {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&spoken);
        let queue =
            SpeechQueue::new(move || Ok(Box::new(Recorder(Arc::clone(&log))) as Box<dyn Speaker>));
        (queue, spoken)
    }

    #[test]
    fn test_retries_unintelligible() {
        let (speech, _) = queue();
        let mut l = listener(vec![
            Capture::Unintelligible,
            Capture::Heard("  ".to_string()),
            Capture::Heard("open google".to_string()),
        ]);

        let heard = l.listen_command(&speech).unwrap();
        assert_eq!(heard.normalized(), "open google");
    }

    #[test]
    fn test_gives_up_after_retries() {
        let (speech, _) = queue();
        let mut l = listener(vec![
            Capture::Unintelligible,
            Capture::Unintelligible,
            Capture::Unintelligible,
            Capture::Heard("too late".to_string()),
        ]);

        assert!(l.listen_command(&speech).is_none());
        assert!(!l.is_closed());
    }

    #[test]
    fn test_timeout_returns_immediately() {
        let (speech, _) = queue();
        let mut l = listener(vec![Capture::TimedOut, Capture::Heard("hi".to_string())]);
        assert!(l.listen_command(&speech).is_none());
    }

    #[test]
    fn test_service_error_apologises_once() {
        let (speech, spoken) = queue();
        let mut l = listener(vec![Capture::ServiceError("503".to_string())]);

        assert!(l.listen_command(&speech).is_none());
        speech.shutdown();

        assert_eq!(*spoken.lock().unwrap(), vec![SERVICE_UNAVAILABLE]);
    }

    #[test]
    fn test_closed_is_sticky() {
        let (speech, _) = queue();
        let mut l = listener(vec![]);
        assert!(l.listen_command(&speech).is_none());
        assert!(l.is_closed());
    }

    #[test]
    fn test_text_recognizer() {
        let mut r = TextRecognizer::new(Cursor::new("hey jarvis\n\n  what time is it  \n"));
        let limit = Duration::from_secs(1);

        assert_eq!(r.capture(None, limit), Capture::Heard("hey jarvis".to_string()));
        assert_eq!(r.capture(None, limit), Capture::Unintelligible);
        assert_eq!(
            r.capture(None, limit),
            Capture::Heard("what time is it".to_string())
        );
        assert_eq!(r.capture(None, limit), Capture::Closed);
    }
}
