//! Spoken output through OpenAI TTS

use crate::config::VoiceConfig;
use crate::speech::Speaker;
use crate::voice::playback::AudioPlayback;
use crate::voice::tts::TextToSpeech;
use crate::Result;

/// Synthesizes each utterance and plays it to completion
#[derive(Debug)]
pub struct OpenAiSpeaker {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl OpenAiSpeaker {
    /// # Errors
    ///
    /// Returns error if the TTS client or output device cannot be set up
    pub fn new(api_key: String, voice: &VoiceConfig) -> Result<Self> {
        Ok(Self {
            tts: TextToSpeech::new_openai(api_key, voice)?,
            playback: AudioPlayback::new()?,
        })
    }

    /// Factory that builds the speaker on the speech worker thread
    ///
    /// The output stream is not `Send`, so it has to be created where it is
    /// used.
    #[must_use]
    pub fn factory(
        api_key: String,
        voice: VoiceConfig,
    ) -> impl Fn() -> Result<Box<dyn Speaker>> + Send + Sync + 'static {
        move || {
            let speaker = Self::new(api_key.clone(), &voice)?;
            Ok(Box::new(speaker) as Box<dyn Speaker>)
        }
    }
}

impl Speaker for OpenAiSpeaker {
    fn speak(&mut self, text: &str) -> Result<()> {
        tracing::info!(text, "speaking");
        let audio = self.tts.synthesize(text)?;
        self.playback.play_mp3(&audio)
    }
}
