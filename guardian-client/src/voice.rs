//! Speech-to-text and text-to-speech adapters.

use tracing::{debug, warn};

use crate::error::Result;

pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_LOCALE: &str = "en-US";

/// Display names offered in the language selector, with their speech locales.
pub const LANGUAGE_LOCALES: [(&str, &str); 9] = [
    ("English", "en-US"),
    ("Hindi", "hi-IN"),
    ("Bengali", "bn-IN"),
    ("Marathi", "mr-IN"),
    ("Telugu", "te-IN"),
    ("Tamil", "ta-IN"),
    ("Gujarati", "gu-IN"),
    ("Kannada", "kn-IN"),
    ("Malayalam", "ml-IN"),
];

pub fn locale_for(language: &str) -> &'static str {
    LANGUAGE_LOCALES
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, locale)| *locale)
        .unwrap_or(DEFAULT_LOCALE)
}

/// Single-shot recognition engine. Results are delivered back as [`RecognitionEvent`]s.
pub trait SpeechRecognizer: Send {
    fn start(&mut self, locale: &str) -> Result<()>;
    fn stop(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    Result(String),
    Error(String),
    Ended,
}

pub trait SpeechSynthesizer: Send {
    fn speak(&mut self, text: &str, locale: &str);
    fn cancel(&mut self);
}

/// Microphone control. Without a recognizer the control is hidden, never shown disabled.
pub struct VoiceInput {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    listening: bool,
}

impl VoiceInput {
    pub fn new(recognizer: Option<Box<dyn SpeechRecognizer>>) -> Self {
        Self {
            recognizer,
            listening: false,
        }
    }

    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn is_visible(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn toggle(&mut self, language: &str) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            return;
        };
        if self.listening {
            recognizer.stop();
        } else if let Err(e) = recognizer.start(locale_for(language)) {
            warn!(error = %e, "Speech recognition failed to start");
            self.listening = false;
        }
    }

    /// Apply an engine event. A recognized transcript overwrites `input`.
    pub fn handle_event(&mut self, event: RecognitionEvent, input: &mut String) {
        match event {
            RecognitionEvent::Started => self.listening = true,
            RecognitionEvent::Ended => self.listening = false,
            RecognitionEvent::Result(transcript) => {
                debug!(chars = transcript.len(), "Speech recognized");
                *input = transcript;
            }
            RecognitionEvent::Error(reason) => {
                warn!(reason = %reason, "Speech recognition error");
                self.listening = false;
            }
        }
    }
}

/// Read-aloud output, off until toggled on. At most one utterance is audible at a time.
pub struct VoiceOutput {
    synthesizer: Box<dyn SpeechSynthesizer>,
    enabled: bool,
}

impl VoiceOutput {
    pub fn new(synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn icon(&self) -> &'static str {
        if self.enabled { "🔊" } else { "🔇" }
    }

    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.synthesizer.cancel();
        }
        self.enabled
    }

    pub fn speak(&mut self, text: &str, language: &str) {
        if !self.enabled {
            return;
        }
        self.synthesizer.cancel();
        self.synthesizer.speak(text, locale_for(language));
    }
}

/// Synthesizer for platforms without speech output.
pub struct SilentSynthesizer;

impl SpeechSynthesizer for SilentSynthesizer {
    fn speak(&mut self, _text: &str, _locale: &str) {}
    fn cancel(&mut self) {}
}
