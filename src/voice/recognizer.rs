//! Microphone-backed recognizer
//!
//! Each capture opens the input stream, measures ambient noise, segments a
//! single phrase and sends it to Whisper. The stream is released again before
//! returning so the speaker never hears itself.

use std::time::{Duration, Instant};

use crate::config::ListenConfig;
use crate::listen::{Capture, Recognizer};
use crate::voice::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use crate::voice::segmenter::{Segment, Segmenter, SegmenterConfig, calibrate_threshold};
use crate::voice::stt::SpeechToText;
use crate::Result;

/// How often the capture buffer is drained into the segmenter
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Extra time allowed past the phrase limit before giving up on a stream
const STALL_GRACE: Duration = Duration::from_secs(2);

/// Listens on a microphone and transcribes with Whisper
pub struct MicrophoneRecognizer {
    capture: AudioCapture,
    stt: SpeechToText,
    config: ListenConfig,
}

impl std::fmt::Debug for MicrophoneRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicrophoneRecognizer")
            .field("capture", &self.capture)
            .field("stt", &self.stt)
            .finish_non_exhaustive()
    }
}

impl MicrophoneRecognizer {
    /// Open the configured input device
    ///
    /// # Errors
    ///
    /// Returns error if no usable input device is found
    pub fn new(stt: SpeechToText, config: ListenConfig) -> Result<Self> {
        let capture = AudioCapture::open(config.input_device.as_deref())?;
        tracing::info!(device = %capture.device_name(), "microphone ready");

        Ok(Self {
            capture,
            stt,
            config,
        })
    }

    fn record_phrase(
        &mut self,
        timeout: Option<Duration>,
        phrase_limit: Duration,
    ) -> Result<Option<Vec<f32>>> {
        self.capture.start()?;

        std::thread::sleep(self.config.calibration);
        let ambient = self.capture.take_buffer();
        let threshold = calibrate_threshold(&ambient, self.config.energy_floor);
        tracing::debug!(threshold, ambient_samples = ambient.len(), "calibrated");

        let mut segmenter = Segmenter::new(SegmenterConfig {
            sample_rate: SAMPLE_RATE,
            threshold,
            pause: self.config.pause,
            min_phrase: self.config.min_phrase,
            timeout,
            phrase_limit,
        });

        let deadline = timeout.map(|t| Instant::now() + t + phrase_limit + STALL_GRACE);

        let outcome = loop {
            std::thread::sleep(POLL_INTERVAL);

            match segmenter.push(&self.capture.take_buffer()) {
                Segment::Pending => {}
                Segment::Complete(samples) => break Some(samples),
                Segment::TimedOut => break None,
            }

            // A stalled device delivers no samples, so the segmenter never times out
            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                tracing::warn!("input stream stalled");
                break None;
            }
        };

        self.capture.stop();
        Ok(outcome)
    }
}

impl Recognizer for MicrophoneRecognizer {
    fn capture(&mut self, timeout: Option<Duration>, phrase_limit: Duration) -> Capture {
        let samples = match self.record_phrase(timeout, phrase_limit) {
            Ok(Some(samples)) => samples,
            Ok(None) => return Capture::TimedOut,
            Err(e) => {
                self.capture.stop();
                tracing::error!(error = %e, "audio capture failed");
                return Capture::ServiceError(e.to_string());
            }
        };

        tracing::debug!(samples = samples.len(), "transcribing phrase");

        let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode phrase");
                return Capture::Unintelligible;
            }
        };

        match self.stt.transcribe(&wav) {
            Ok(text) if text.trim().is_empty() => Capture::Unintelligible,
            Ok(text) => Capture::Heard(text),
            Err(e) => Capture::ServiceError(e.to_string()),
        }
    }
}
