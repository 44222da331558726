//! Serialized speech output
//!
//! All spoken output goes through one long-lived worker thread that owns the
//! TTS engine for its whole lifetime. Requests play in FIFO order across all
//! callers; a caller can wait until its own request has finished playing.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};

use crate::{Error, Result};

/// A text-to-speech engine
///
/// Engines are driven from a single thread and never concurrently.
pub trait Speaker {
    /// Synthesize and play `text`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Prints responses instead of speaking them
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSpeaker;

impl Speaker for ConsoleSpeaker {
    fn speak(&mut self, text: &str) -> Result<()> {
        println!("jarvis: {text}");
        Ok(())
    }
}

/// Builds the engine on the worker thread
///
/// Audio handles are often not `Send`, so the engine is constructed where it
/// is used.
pub type SpeakerFactory = Arc<dyn Fn() -> Result<Box<dyn Speaker>> + Send + Sync>;

/// How `enqueue` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Return as soon as the request is queued
    Background,
    /// Return once the request has been spoken (or failed)
    WaitForCompletion,
}

/// A queued piece of speech
#[derive(Debug)]
pub struct SpeechRequest {
    /// Text to speak
    pub text: String,
    /// Signalled once the text has been handled
    pub completion: Option<oneshot::Sender<()>>,
}

/// Worker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// No worker has been started yet
    NotStarted,
    /// Worker is alive and consuming requests
    Running,
    /// Worker has exited (sentinel received or engine panic)
    Stopped,
}

struct Worker {
    tx: mpsc::UnboundedSender<Option<SpeechRequest>>,
    handle: JoinHandle<()>,
}

/// Handle to the speech worker
///
/// Construct once at startup and pass by reference. The worker starts lazily
/// on the first enqueue and is restarted if it is found dead.
pub struct SpeechQueue {
    factory: SpeakerFactory,
    worker: Mutex<Option<Worker>>,
}

impl std::fmt::Debug for SpeechQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechQueue")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SpeechQueue {
    /// Create a queue whose worker builds its engine with `factory`
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Speaker>> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            worker: Mutex::new(None),
        }
    }

    /// Create a queue that prints to the console
    #[must_use]
    pub fn console() -> Self {
        Self::new(|| Ok(Box::new(ConsoleSpeaker)))
    }

    /// Queue `text` for speaking
    ///
    /// With [`Delivery::WaitForCompletion`] this blocks until the worker has
    /// finished with the request, including when speaking it failed. Empty
    /// text is ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the worker thread cannot be spawned
    pub fn enqueue(&self, text: impl Into<String>, delivery: Delivery) -> Result<()> {
        let text = text.into();
        if text.trim().is_empty() {
            return Ok(());
        }

        let (completion, done) = match delivery {
            Delivery::Background => (None, None),
            Delivery::WaitForCompletion => {
                let (tx, rx) = oneshot::channel();
                (Some(tx), Some(rx))
            }
        };

        self.send(Some(SpeechRequest { text, completion }))?;

        if let Some(done) = done {
            // A dropped sender (worker died mid-request) also releases us
            if done.blocking_recv().is_err() {
                tracing::warn!("speech worker exited before completing request");
            }
        }

        Ok(())
    }

    /// Queue `text` and return immediately
    ///
    /// Failures are logged; speech is never worth aborting a command for.
    pub fn say(&self, text: impl Into<String>) {
        if let Err(e) = self.enqueue(text, Delivery::Background) {
            tracing::error!(error = %e, "failed to queue speech");
        }
    }

    /// Queue `text` and wait until it has been spoken
    pub fn say_and_wait(&self, text: impl Into<String>) {
        if let Err(e) = self.enqueue(text, Delivery::WaitForCompletion) {
            tracing::error!(error = %e, "failed to queue speech");
        }
    }

    /// Current worker state
    #[must_use]
    pub fn state(&self) -> QueueState {
        let guard = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            None => QueueState::NotStarted,
            Some(w) if w.handle.is_finished() => QueueState::Stopped,
            Some(_) => QueueState::Running,
        }
    }

    /// Stop the worker after everything queued so far has been spoken
    ///
    /// Blocks until the worker exits. A later enqueue starts a new worker.
    pub fn shutdown(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(worker) = worker else {
            return;
        };

        if worker.tx.send(None).is_err() {
            tracing::debug!("speech worker already stopped");
        }

        if worker.handle.join().is_err() {
            tracing::error!("speech worker panicked");
        }
    }

    fn send(&self, message: Option<SpeechRequest>) -> Result<()> {
        let mut guard = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        let alive = guard
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished() && !w.tx.is_closed());
        if !alive {
            if guard.is_some() {
                tracing::warn!("speech worker not alive, restarting");
            }
            *guard = Some(self.spawn()?);
        }

        let worker = guard
            .as_ref()
            .ok_or_else(|| Error::Speech("speech worker unavailable".to_string()))?;

        worker
            .tx
            .send(message)
            .map_err(|_| Error::Speech("speech worker stopped".to_string()))
    }

    fn spawn(&self) -> Result<Worker> {
        let (tx, rx) = mpsc::unbounded_channel();
        let factory = Arc::clone(&self.factory);

        let handle = std::thread::Builder::new()
            .name("speech-worker".to_string())
            .spawn(move || run_worker(&*factory, rx))?;

        tracing::debug!("speech worker started");
        Ok(Worker { tx, handle })
    }
}

/// Worker loop: one request at a time until the sentinel arrives
fn run_worker(
    factory: &(dyn Fn() -> Result<Box<dyn Speaker>> + Send + Sync),
    mut rx: mpsc::UnboundedReceiver<Option<SpeechRequest>>,
) {
    let mut engine: Box<dyn Speaker> = match factory() {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "TTS engine init failed, printing responses instead");
            Box::new(ConsoleSpeaker)
        }
    };

    while let Some(message) = rx.blocking_recv() {
        let Some(request) = message else {
            tracing::debug!("speech worker received stop request");
            break;
        };

        tracing::debug!(text = %request.text, "speaking");
        if let Err(e) = engine.speak(&request.text) {
            tracing::warn!(error = %e, text = %request.text, "speech failed, printing instead");
            println!("{}", request.text);
        }

        if let Some(completion) = request.completion {
            // Caller may have given up waiting; nothing to do then
            let _ = completion.send(());
        }
    }

    tracing::debug!("speech worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    struct Recorder {
        spoken: Arc<Mutex<Vec<String>>>,
        delay: Duration,
    }

    impl Speaker for Recorder {
        fn speak(&mut self, text: &str) -> Result<()> {
            std::thread::sleep(self.delay);
            if text == "fail" {
                return Err(Error::Tts("simulated failure".to_string()));
            }
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn recording_queue(delay: Duration) -> (SpeechQueue, Arc<Mutex<Vec<String>>>) {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&spoken);
        let queue = SpeechQueue::new(move || {
            Ok(Box::new(Recorder {
                spoken: Arc::clone(&log),
                delay,
            }) as Box<dyn Speaker>)
        });
        (queue, spoken)
    }

    #[test]
    fn test_lazy_start() {
        let (queue, _) = recording_queue(Duration::ZERO);
        assert_eq!(queue.state(), QueueState::NotStarted);

        queue.say_and_wait("hello");
        assert_eq!(queue.state(), QueueState::Running);

        queue.shutdown();
        assert_eq!(queue.state(), QueueState::NotStarted);
    }

    #[test]
    fn test_blocking_returns_after_playback() {
        let (queue, spoken) = recording_queue(Duration::from_millis(50));

        queue.say_and_wait("prompt");
        assert_eq!(*spoken.lock().unwrap(), vec!["prompt"]);

        queue.shutdown();
    }

    #[test]
    fn test_background_is_fifo() {
        let (queue, spoken) = recording_queue(Duration::from_millis(5));

        for i in 0..5 {
            queue.say(format!("line {i}"));
        }
        queue.shutdown();

        let expected: Vec<String> = (0..5).map(|i| format!("line {i}")).collect();
        assert_eq!(*spoken.lock().unwrap(), expected);
    }

    #[test]
    fn test_failure_still_signals_completion() {
        let (queue, spoken) = recording_queue(Duration::ZERO);

        queue.say_and_wait("fail");
        queue.say_and_wait("after");

        assert_eq!(*spoken.lock().unwrap(), vec!["after"]);
        queue.shutdown();
    }

    #[test]
    fn test_empty_text_ignored() {
        let (queue, _) = recording_queue(Duration::ZERO);
        queue.say_and_wait("   ");
        assert_eq!(queue.state(), QueueState::NotStarted);
    }

    #[test]
    fn test_factory_failure_falls_back() {
        let queue = SpeechQueue::new(|| Err(Error::Tts("no engine".to_string())));
        // Must not hang even though the engine never came up
        queue.say_and_wait("still answered");
        queue.shutdown();
    }

    #[test]
    fn test_restart_after_shutdown() {
        let (queue, spoken) = recording_queue(Duration::ZERO);

        queue.say_and_wait("first");
        queue.shutdown();
        queue.say_and_wait("second");
        queue.shutdown();

        assert_eq!(*spoken.lock().unwrap(), vec!["first", "second"]);
    }
}
