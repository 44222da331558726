use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jarvis_dispatch::voice::{
    AudioCapture, AudioPlayback, MicrophoneRecognizer, OpenAiSpeaker, PLAYBACK_SAMPLE_RATE,
    SpeechToText, TextToSpeech, calculate_energy, list_input_devices,
};
use jarvis_dispatch::{
    Actions, Config, DryRunActions, Listener, Session, SpeechQueue, SystemActions,
    TextRecognizer, Utterance, WakeDetector, default_table,
};

/// Jarvis - voice-driven command dispatcher
#[derive(Parser)]
#[command(name = "jarvis", version, about)]
struct Cli {
    /// Type commands on stdin and print responses instead of using audio
    #[arg(long, env = "JARVIS_TEXT_MODE")]
    text: bool,

    /// Log system actions instead of executing them
    #[arg(long, env = "JARVIS_DRY_RUN")]
    dry_run: bool,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, env = "JARVIS_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// List audio input devices
    Devices,
    /// Show how a transcript would be handled, without running anything
    Inspect {
        /// Transcript to analyze
        text: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,jarvis_dispatch=info,jarvis=info",
        1 => "info,jarvis_dispatch=debug,jarvis=debug",
        2 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so typed-mode output stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(&config, duration),
            Command::TestSpeaker => test_speaker(),
            Command::TestTts { text } => test_tts(&config, &text),
            Command::Devices => devices(),
            Command::Inspect { text, json } => inspect(&config, &text, json),
        };
    }

    let (listener, speech) = if cli.text {
        let listener = Listener::new(Box::new(TextRecognizer::stdin()), config.listen.clone());
        (listener, SpeechQueue::console())
    } else {
        let api_key = openai_key(&config)?;
        let stt = SpeechToText::new_whisper(api_key.clone(), config.voice.stt_model.clone())?;
        let recognizer = MicrophoneRecognizer::new(stt, config.listen.clone())?;
        let listener = Listener::new(Box::new(recognizer), config.listen.clone());
        let speech = SpeechQueue::new(OpenAiSpeaker::factory(api_key, config.voice.clone()));
        (listener, speech)
    };

    let actions: Box<dyn Actions> = if cli.dry_run {
        Box::new(DryRunActions)
    } else {
        Box::new(SystemActions)
    };

    tracing::info!(
        name = %config.wake.name,
        text_mode = cli.text,
        dry_run = cli.dry_run,
        "starting jarvis"
    );

    let mut session = Session::new(&config, listener, speech, actions)?;
    session.run();

    Ok(())
}

fn openai_key(config: &Config) -> anyhow::Result<String> {
    config
        .api_keys
        .openai
        .clone()
        .context("OPENAI_API_KEY is required for voice mode (use --text for typed mode)")
}

/// Test microphone input
fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::open(config.listen.input_device.as_deref())?;
    println!("Device: {}", capture.device_name());
    println!("Energy floor: {:.4}", config.listen.energy_floor);
    println!("---");

    capture.start()?;

    for i in 0..duration {
        std::thread::sleep(Duration::from_secs(1));

        let samples = capture.take_buffer();
        let energy = calculate_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);
        let marker = if energy > config.listen.energy_floor {
            "speech"
        } else {
            ""
        };

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}] {}",
            i + 1,
            energy,
            peak,
            meter,
            marker
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: jarvis devices (and set JARVIS_INPUT_DEVICE)");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let frequency = 440.0_f32;
    let num_samples = PLAYBACK_SAMPLE_RATE as usize * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!(
        "Playing {} samples at {} Hz...",
        samples.len(),
        PLAYBACK_SAMPLE_RATE
    );

    playback.play(samples)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Test TTS output
fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::new_openai(openai_key(config)?, &config.voice)?;

    println!("Synthesizing speech...");
    let mp3_data = tts.synthesize(text).context("TTS synthesis failed")?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    AudioPlayback::new()?.play_mp3(&mp3_data)?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

fn devices() -> anyhow::Result<()> {
    let names = list_input_devices()?;
    if names.is_empty() {
        println!("No input devices found");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Print the normalized text, wake match and intent match for a transcript
fn inspect(config: &Config, text: &str, json: bool) -> anyhow::Result<()> {
    let detector = WakeDetector::new(&config.wake)?;
    let table = default_table();

    let heard = Utterance::new(text);
    let wake = detector.detect(heard.normalized());

    // Without a wake phrase the whole transcript is treated as the command
    let command = match &wake {
        Some(w) => w.command(&heard),
        None => Some(heard.clone()),
    };
    let intent = command
        .as_ref()
        .and_then(|c| table.match_text(c.normalized(), c.raw()));

    if json {
        let report = serde_json::json!({
            "raw": heard.raw(),
            "normalized": heard.normalized(),
            "wake": wake,
            "command": command.as_ref().map(Utterance::raw),
            "intent": intent,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("normalized: {}", heard.normalized());
    match &wake {
        Some(w) => println!("wake:       {}", w.matched_phrase),
        None => println!("wake:       (none)"),
    }
    match &command {
        Some(c) => println!("command:    {}", c.raw()),
        None => println!("command:    (none, would acknowledge)"),
    }
    match &intent {
        Some(m) => {
            println!("intent:     {}", m.intent);
            println!("trigger:    {}", m.matched_phrase);
            println!("argument:   {}", m.argument().unwrap_or("(none)"));
        }
        None => println!("intent:     (none)"),
    }

    Ok(())
}
