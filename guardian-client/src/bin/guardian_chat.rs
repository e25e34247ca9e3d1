//! Terminal front end for the First Aid Guardian assistant.
//!
//! Usage:
//!   cargo run --bin guardian_chat -- --base-url http://127.0.0.1:5000
//!
//! Type a message and press enter to send it. Lines starting with `/` are commands; `/help`
//! lists them.

use async_trait::async_trait;
use clap::Parser;
use guardian_client::capture::{CameraDevice, CameraModal, CameraStream, CapturedImage};
use guardian_client::prefs::{FilePreferences, PreferenceStore};
use guardian_client::view::{BubbleKind, Transcript};
use guardian_client::voice::{SpeechSynthesizer, VoiceInput, VoiceOutput};
use guardian_client::{
    ClientConfig, Gender, GuardianError, HttpBackend, InventoryClient, InventoryView, Session,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "guardian_chat")]
#[command(about = "Chat with the First Aid Guardian from a terminal")]
struct Args {
    /// Base URL of the guardian service
    #[arg(long, env = "GUARDIAN_BASE_URL", default_value = guardian_client::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Preference file (theme and API key); defaults to the platform config directory
    #[arg(long, env = "GUARDIAN_PREFS_PATH")]
    prefs: Option<PathBuf>,

    /// Delay before an interpreted reply is shown, in milliseconds
    #[arg(long, env = "GUARDIAN_REVEAL_DELAY_MS", default_value = "600")]
    reveal_delay_ms: u64,

    /// Response language (English, Hindi, Bengali, Marathi, Telugu, Tamil, Gujarati, Kannada, Malayalam)
    #[arg(long, default_value = "English")]
    language: String,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        ClientConfig {
            base_url: args.base_url,
            prefs_path: args.prefs,
            reveal_delay: Duration::from_millis(args.reveal_delay_ms),
            language: args.language,
        }
    }
}

fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "guardian_client=warn".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Reads replies aloud by printing them; terminals have no speech engine.
struct ConsoleSynthesizer;

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn speak(&mut self, text: &str, locale: &str) {
        println!("🔊 [{}] {}", locale, text);
    }

    fn cancel(&mut self) {}
}

/// Terminals have no video device.
struct NoCamera;

#[async_trait]
impl CameraDevice for NoCamera {
    async fn open(&self) -> guardian_client::Result<Box<dyn CameraStream>> {
        Err(GuardianError::Camera(
            "no video device available in a terminal".to_string(),
        ))
    }
}

const HELP: &str = "\
Commands:
  /image <path>         attach an image to the next message
  /remove-image         drop the pending image
  /camera               take a photo with the camera
  /profile key=value..  set age, gender, location, duration
  /confirm              confirm the patient profile and unlock the body view
  /inventory            show the inventory
  /add <item>           add an item to the inventory
  /remove <index>       remove an inventory item by index
  /lang <language>      change the response language
  /key <api key>        store a Gemini API key (empty clears it)
  /speaker              toggle reading replies aloud
  /theme                toggle light/dark theme
  /new                  start a new case
  /status               show the body indicator and action panel
  /quit                 exit";

/// Tracks which transcript bubbles have already been printed.
struct Printer {
    seen: usize,
}

impl Printer {
    /// Start over after the transcript was reset.
    fn rewind(&mut self) {
        self.seen = 0;
    }

    fn unseen_lines(&mut self, transcript: &Transcript) -> Vec<String> {
        let bubbles = transcript.bubbles();
        if bubbles.len() < self.seen {
            self.seen = 0;
        }
        let lines = bubbles[self.seen..]
            .iter()
            .filter_map(|bubble| match bubble.kind {
                BubbleKind::User => Some(format!("👤 {}", bubble.text)),
                BubbleKind::Assistant => Some(format!("🩺 {}", bubble.text)),
                BubbleKind::Loading => None,
            })
            .collect();
        self.seen = bubbles.len();
        lines
    }

    fn flush(&mut self, transcript: &Transcript) {
        for line in self.unseen_lines(transcript) {
            println!("{}", line);
        }
    }
}

fn print_inventory(view: &InventoryView) {
    match view {
        InventoryView::Empty(message) => println!("  {}", message),
        InventoryView::Items(rows) => {
            for row in rows {
                println!("  [{}] {}", row.index, row.name);
            }
        }
    }
}

fn print_status(session: &Session) {
    let indicator = session.indicator();
    if indicator.visible {
        println!("🎯 {} at ({}, {})", indicator.label, indicator.x, indicator.y);
    } else {
        println!("🎯 {}", indicator.label);
    }
    println!("Actions:");
    for line in session.actions().lines() {
        println!("  - {}", line);
    }
    println!("Discovery:");
    for line in session.discovery().lines() {
        println!("  - {}", line);
    }
    let display = session.profile_display();
    let lock = if session.is_visualization_unlocked() {
        "unlocked"
    } else {
        "locked"
    };
    println!("{} | {} | body view {}", display.age, display.gender, lock);
}

fn apply_profile(session: &mut Session, args: &str) {
    for pair in args.split_whitespace() {
        let Some((key, value)) = pair.split_once('=') else {
            println!("⚠️ expected key=value, got '{}'", pair);
            continue;
        };
        let value = value.replace('_', " ");
        match key {
            "age" => session.profile.age = value.parse().ok(),
            "gender" => session.profile.gender = Gender::parse(&value),
            "location" => session.profile.location = Some(value),
            "duration" => session.profile.duration = Some(value),
            other => println!("⚠️ unknown profile field '{}'", other),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config: ClientConfig = Args::parse().into();
    let prefs_path = match config.prefs_path.clone() {
        Some(path) => path,
        None => FilePreferences::default_path()?,
    };
    let prefs: Box<dyn PreferenceStore> = Box::new(FilePreferences::open(&prefs_path)?);

    let backend = Arc::new(HttpBackend::new(config.base_url.clone()));
    let mut inventory = InventoryClient::new(backend.clone());
    let mut session = Session::new(prefs).with_voice(
        VoiceInput::unavailable(),
        VoiceOutput::new(Box::new(ConsoleSynthesizer)),
    );
    session.language = config.language.clone();

    info!(base_url = %config.base_url, "Guardian chat starting");
    println!("🚑 First Aid Guardian ({} theme). /help for commands.", session.theme().as_str());

    let mut printer = Printer { seen: 0 };
    printer.flush(session.transcript());

    match inventory.load().await {
        Ok(view) => print_inventory(view),
        Err(e) => error!(error = %e, "Failed to load inventory"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/image" => match CapturedImage::from_path(&PathBuf::from(rest)).await {
                Ok(image) => {
                    if session.attach_files(vec![image]) {
                        println!("📎 image attached");
                    } else {
                        println!("📎 that image is already attached");
                    }
                }
                Err(e) => println!("⚠️ {}", e),
            },
            "/remove-image" => {
                session.remove_image();
                println!("📎 image removed");
            }
            "/camera" => {
                let mut modal = CameraModal::default();
                match modal.open(&NoCamera).await {
                    Ok(()) => match session.capture_from_camera(&mut modal) {
                        Ok(()) => println!("📷 photo captured"),
                        Err(e) => println!("⚠️ {}", e),
                    },
                    Err(e) => println!("⚠️ {}", e),
                }
            }
            "/profile" => {
                apply_profile(&mut session, rest);
                print_status(&session);
            }
            "/confirm" => match session.confirm_profile() {
                Ok(()) => println!("✅ Profile Confirmed"),
                Err(e) => println!("⚠️ {}", e),
            },
            "/inventory" => match inventory.load().await {
                Ok(view) => print_inventory(view),
                Err(e) => println!("⚠️ {}", e),
            },
            "/add" => match inventory.add(rest).await {
                Ok(view) => print_inventory(view),
                Err(e) => println!("⚠️ {}", e),
            },
            "/remove" => match rest.parse::<usize>() {
                Ok(index) => match inventory.remove(index).await {
                    Ok(view) => print_inventory(view),
                    Err(e) => println!("⚠️ {}", e),
                },
                Err(_) => println!("⚠️ /remove takes a numeric index"),
            },
            "/lang" => {
                session.language = rest.to_string();
                println!("🌐 language set to {}", session.language);
            }
            "/key" => match session.set_api_key(rest) {
                Ok(()) => println!("🔑 API key updated"),
                Err(e) => println!("⚠️ {}", e),
            },
            "/speaker" => {
                session.toggle_speaker();
                println!("{}", session.voice_output().icon());
            }
            "/theme" => match session.toggle_theme() {
                Ok(theme) => println!("{} {} theme", theme.icon(), theme.as_str()),
                Err(e) => println!("⚠️ {}", e),
            },
            "/new" => {
                session.new_case();
                printer.rewind();
                print_status(&session);
            }
            "/status" => print_status(&session),
            _ if command.starts_with('/') => println!("⚠️ unknown command, try /help"),
            _ => {
                session.input = line.to_string();
                session
                    .send_message(backend.as_ref(), config.reveal_delay)
                    .await;
            }
        }
        printer.flush(session.transcript());
    }

    Ok(())
}
