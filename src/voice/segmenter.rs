//! Energy-based phrase segmentation
//!
//! Splits a live sample stream into single phrases: speech starts when RMS
//! energy rises above the threshold and ends after a pause of silence.

use std::time::Duration;

/// Ambient energy is scaled by this factor to get the speech threshold
const CALIBRATION_HEADROOM: f32 = 1.5;

/// Timing and level parameters for one capture
#[derive(Debug, Clone, Copy)]
pub struct SegmenterConfig {
    pub sample_rate: u32,
    /// RMS level that counts as speech
    pub threshold: f32,
    /// Silence that ends a phrase
    pub pause: Duration,
    /// Voiced audio required before a phrase counts
    pub min_phrase: Duration,
    /// Wait for speech to begin; `None` waits forever
    pub timeout: Option<Duration>,
    /// Longest phrase before it is cut off
    pub phrase_limit: Duration,
}

/// Segmenter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// No speech yet
    Waiting,
    /// Inside a phrase, accumulating
    InPhrase,
}

/// Result of feeding a chunk of samples
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Keep feeding
    Pending,
    /// A full phrase, including its trailing pause
    Complete(Vec<f32>),
    /// No speech began within the timeout
    TimedOut,
}

/// Streaming phrase detector
#[derive(Debug)]
pub struct Segmenter {
    config: SegmenterConfig,
    state: SegmenterState,
    phrase: Vec<f32>,
    silence: usize,
    waited: usize,
}

impl Segmenter {
    #[must_use]
    pub const fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            state: SegmenterState::Waiting,
            phrase: Vec::new(),
            silence: 0,
            waited: 0,
        }
    }

    /// Feed the next chunk of mono samples
    pub fn push(&mut self, samples: &[f32]) -> Segment {
        if samples.is_empty() {
            return Segment::Pending;
        }

        let energy = calculate_energy(samples);
        let is_speech = energy > self.config.threshold;

        match self.state {
            SegmenterState::Waiting => {
                if is_speech {
                    self.state = SegmenterState::InPhrase;
                    self.phrase.clear();
                    self.phrase.extend_from_slice(samples);
                    self.silence = 0;
                    tracing::trace!(energy, "speech started");
                    return Segment::Pending;
                }

                self.waited += samples.len();
                if let Some(timeout) = self.config.timeout
                    && self.waited >= self.samples_for(timeout)
                {
                    tracing::debug!("no speech before timeout");
                    return Segment::TimedOut;
                }
            }
            SegmenterState::InPhrase => {
                self.phrase.extend_from_slice(samples);

                if is_speech {
                    self.silence = 0;
                } else {
                    self.silence += samples.len();
                }

                tracing::trace!(
                    phrase_len = self.phrase.len(),
                    silence = self.silence,
                    is_speech,
                    energy,
                    "in phrase"
                );

                if self.phrase.len() >= self.samples_for(self.config.phrase_limit) {
                    tracing::debug!(samples = self.phrase.len(), "phrase limit reached");
                    return self.finish();
                }

                if self.silence >= self.samples_for(self.config.pause) {
                    let voiced = self.phrase.len() - self.silence;
                    if voiced >= self.samples_for(self.config.min_phrase) {
                        tracing::debug!(samples = self.phrase.len(), "phrase complete");
                        return self.finish();
                    }

                    // Too short to be speech, count it as waiting time
                    tracing::trace!(voiced, "discarding noise burst");
                    self.waited += self.phrase.len();
                    self.reset();
                }
            }
        }

        Segment::Pending
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }

    /// Return to waiting, dropping any partial phrase
    pub fn reset(&mut self) {
        self.state = SegmenterState::Waiting;
        self.phrase.clear();
        self.silence = 0;
    }

    fn finish(&mut self) -> Segment {
        let phrase = std::mem::take(&mut self.phrase);
        self.reset();
        Segment::Complete(phrase)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn samples_for(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * f64::from(self.config.sample_rate)) as usize
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Speech threshold from a window of ambient noise, never below `floor`
#[must_use]
pub fn calibrate_threshold(ambient: &[f32], floor: f32) -> f32 {
    (calculate_energy(ambient) * CALIBRATION_HEADROOM).max(floor)
}
