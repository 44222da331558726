//! Configuration management for the Jarvis dispatcher
//!
//! Values resolve as environment > TOML file > defaults and are passed into
//! constructors explicitly; nothing reads configuration from globals.

pub mod file;

use std::path::Path;
use std::time::Duration;

use self::file::JarvisConfigFile;
use crate::{Error, Result};

/// Default canonical assistant name
pub const DEFAULT_NAME: &str = "jarvis";

/// Words that may directly precede the name in a wake phrase
pub const DEFAULT_WAKE_PREFIXES: &[&str] = &[
    "hey", "yo", "ok", "okay", "hi", "hello", "excuse", "oi", "mr", "mister", "dear",
];

/// Token similarity accepted without a preceding prefix word
pub const DEFAULT_STRICT_RATIO: f64 = 0.8;

/// Token similarity accepted directly after a prefix word
pub const DEFAULT_PREFIXED_RATIO: f64 = 0.65;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Wake phrase detection
    pub wake: WakeConfig,

    /// Capture timing and microphone settings
    pub listen: ListenConfig,

    /// STT/TTS model selection
    pub voice: VoiceConfig,

    /// Humanize spoken responses (contractions, interjections)
    pub humanize: bool,

    /// API keys
    pub api_keys: ApiKeys,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wake: WakeConfig::default(),
            listen: ListenConfig::default(),
            voice: VoiceConfig::default(),
            humanize: true,
            api_keys: ApiKeys::default(),
        }
    }
}

/// Wake phrase configuration
#[derive(Debug, Clone)]
pub struct WakeConfig {
    /// Canonical assistant name
    pub name: String,

    /// Ordered wake phrases, most specific first
    pub phrases: Vec<String>,

    /// Words that may precede the name
    pub prefixes: Vec<String>,

    /// Similarity accepted unconditionally in the token pass
    pub strict_ratio: f64,

    /// Similarity accepted after a prefix word in the token pass
    pub prefixed_ratio: f64,
}

impl Default for WakeConfig {
    fn default() -> Self {
        let prefixes: Vec<String> = DEFAULT_WAKE_PREFIXES
            .iter()
            .map(ToString::to_string)
            .collect();

        Self {
            phrases: default_wake_phrases(DEFAULT_NAME, &prefixes),
            name: DEFAULT_NAME.to_string(),
            prefixes,
            strict_ratio: DEFAULT_STRICT_RATIO,
            prefixed_ratio: DEFAULT_PREFIXED_RATIO,
        }
    }
}

/// Build the default ordered wake phrase list for a name
///
/// Multi-word phrases come first so the bare name and its initial never
/// shadow them.
#[must_use]
pub fn default_wake_phrases(name: &str, prefixes: &[String]) -> Vec<String> {
    let name = name.trim().to_lowercase();
    let mut phrases = vec![format!("excuse me {name}")];
    phrases.extend(prefixes.iter().map(|p| format!("{p} {name}")));
    phrases.push(name.clone());

    if let Some(initial) = name.chars().next() {
        phrases.push(format!("hey {initial}"));
        phrases.push(initial.to_string());
    }

    phrases
}

/// Listening configuration
#[derive(Debug, Clone)]
pub struct ListenConfig {
    /// Timeout for the command capture after an acknowledgment
    pub command_timeout: Duration,

    /// Timeout for yes/no answers and follow-up questions
    pub confirm_timeout: Duration,

    /// Longest phrase captured in the command phase
    pub phrase_limit: Duration,

    /// Longest phrase captured while idle
    pub wake_phrase_limit: Duration,

    /// Extra attempts after an unintelligible capture
    pub retries: u32,

    /// Pause after the ASR service fails during idle listening
    pub service_backoff: Duration,

    /// Substring of the preferred input device name
    pub input_device: Option<String>,

    /// Minimum RMS energy that counts as speech
    pub energy_floor: f32,

    /// Ambient noise sampled before each capture
    pub calibration: Duration,

    /// Silence that ends a phrase
    pub pause: Duration,

    /// Speech shorter than this is discarded as noise
    pub min_phrase: Duration,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(10),
            confirm_timeout: Duration::from_secs(5),
            phrase_limit: Duration::from_secs(10),
            wake_phrase_limit: Duration::from_secs(6),
            retries: 2,
            service_backoff: Duration::from_secs(1),
            input_device: None,
            energy_floor: 0.015,
            calibration: Duration::from_millis(600),
            pause: Duration::from_millis(600),
            min_phrase: Duration::from_millis(300),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
        }
    }
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (for Whisper and TTS)
    pub openai: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("openai", &self.openai.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Load configuration from the environment and a TOML file
    ///
    /// With no explicit path, the standard config path is used when present
    /// and a broken file falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit file cannot be read or values are invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(path) => file::read_config_file(path)?,
            None => file::load_config_file(),
        };

        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with environment lookups
    ///
    /// # Errors
    ///
    /// Returns error if the merged values are invalid
    pub fn from_sources<F>(fc: JarvisConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let name = env("JARVIS_NAME")
            .or(fc.assistant.name)
            .map_or(defaults.wake.name, |n| n.trim().to_lowercase());

        let prefixes = fc.assistant.wake_prefixes.unwrap_or(defaults.wake.prefixes);
        let phrases = fc
            .assistant
            .wake_phrases
            .unwrap_or_else(|| default_wake_phrases(&name, &prefixes));

        let wake = WakeConfig {
            name,
            phrases,
            prefixes,
            strict_ratio: fc
                .assistant
                .strict_ratio
                .unwrap_or(defaults.wake.strict_ratio),
            prefixed_ratio: fc
                .assistant
                .prefixed_ratio
                .unwrap_or(defaults.wake.prefixed_ratio),
        };

        let fl = fc.listen;
        let dl = defaults.listen;
        let listen = ListenConfig {
            command_timeout: fl
                .command_timeout_secs
                .map_or(dl.command_timeout, Duration::from_secs),
            confirm_timeout: fl
                .confirm_timeout_secs
                .map_or(dl.confirm_timeout, Duration::from_secs),
            phrase_limit: fl
                .phrase_limit_secs
                .map_or(dl.phrase_limit, Duration::from_secs),
            wake_phrase_limit: fl
                .wake_phrase_limit_secs
                .map_or(dl.wake_phrase_limit, Duration::from_secs),
            retries: fl.retries.unwrap_or(dl.retries),
            service_backoff: fl
                .service_backoff_ms
                .map_or(dl.service_backoff, Duration::from_millis),
            input_device: env("JARVIS_INPUT_DEVICE").or(fl.input_device),
            energy_floor: fl.energy_floor.unwrap_or(dl.energy_floor),
            calibration: fl
                .calibration_ms
                .map_or(dl.calibration, Duration::from_millis),
            pause: fl.pause_ms.map_or(dl.pause, Duration::from_millis),
            min_phrase: fl
                .min_phrase_ms
                .map_or(dl.min_phrase, Duration::from_millis),
        };

        let dv = defaults.voice;
        let voice = VoiceConfig {
            stt_model: env("JARVIS_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(dv.stt_model),
            tts_model: env("JARVIS_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or(dv.tts_model),
            tts_voice: env("JARVIS_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or(dv.tts_voice),
            tts_speed: fc.voice.tts_speed.unwrap_or(dv.tts_speed),
        };

        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .filter(|k| !k.is_empty()),
        };

        let config = Self {
            wake,
            listen,
            voice,
            humanize: fc.assistant.humanize.unwrap_or(defaults.humanize),
            api_keys,
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.wake.name.is_empty() {
            return Err(Error::Config("assistant name must not be empty".to_string()));
        }

        for (label, ratio) in [
            ("strict_ratio", self.wake.strict_ratio),
            ("prefixed_ratio", self.wake.prefixed_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(Error::Config(format!("{label} must be within 0..=1, got {ratio}")));
            }
        }

        if self.wake.prefixed_ratio > self.wake.strict_ratio {
            return Err(Error::Config(
                "prefixed_ratio must not exceed strict_ratio".to_string(),
            ));
        }

        if !(0.25..=4.0).contains(&self.voice.tts_speed) {
            return Err(Error::Config(format!(
                "tts_speed must be within 0.25..=4.0, got {}",
                self.voice.tts_speed
            )));
        }

        Ok(())
    }
}
