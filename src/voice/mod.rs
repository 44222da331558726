//! Voice input and output
//!
//! Microphone capture with phrase segmentation feeding Whisper, and OpenAI
//! TTS played through the default output device.

mod capture;
mod playback;
mod recognizer;
mod segmenter;
mod speaker;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, list_input_devices, samples_to_wav};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_mp3};
pub use recognizer::MicrophoneRecognizer;
pub use segmenter::{
    Segment, Segmenter, SegmenterConfig, SegmenterState, calculate_energy, calibrate_threshold,
};
pub use speaker::OpenAiSpeaker;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
