//! Jarvis - a voice-driven command dispatcher
//!
//! Listens for a wake phrase, captures a spoken command, matches it against
//! an ordered table of intents and runs the first handler that applies.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Recognizer  │──▶│   Listener   │──▶│   Session    │
//! │ mic / stdin  │   │ retry policy │   │  wake, ack,  │
//! └──────────────┘   └──────────────┘   │   dispatch   │
//!                                       └──────┬───────┘
//!                    ┌─────────────────────────┼─────────────────┐
//!                    ▼                         ▼                 ▼
//!             ┌──────────────┐        ┌──────────────┐   ┌──────────────┐
//!             │ WakeDetector │        │ IntentTable  │   │ SpeechQueue  │
//!             └──────────────┘        │  + handlers  │   │ TTS worker   │
//!                                     └──────────────┘   └──────────────┘
//! ```

pub mod actions;
pub mod commands;
pub mod config;
pub mod error;
pub mod intent;
pub mod listen;
pub mod session;
pub mod speech;
pub mod text;
pub mod voice;
pub mod wake;

pub use actions::{Actions, DryRunActions, SystemActions};
pub use commands::{Context, DispatchResult, Handler, Responses, default_table, dispatch};
pub use config::Config;
pub use error::{Error, Result};
pub use intent::{Intent, IntentGroup, IntentMatch, IntentTable, MatchMode};
pub use listen::{Capture, Listener, Recognizer, TextRecognizer};
pub use session::{Session, SessionState};
pub use speech::{Delivery, QueueState, SpeechQueue, Speaker};
pub use text::{Utterance, normalize};
pub use wake::{WakeDetector, WakeMatch};
