//! The session-scoped state object every handler works on.

use tracing::{info, warn};

use crate::body_map;
use crate::capture::{CameraModal, CaptureState, CapturedImage};
use crate::error::{GuardianError, Result};
use crate::models::{ChatMessage, PatientProfile};
use crate::prefs::{self, API_KEY_KEY, PreferenceStore, THEME_KEY, Theme};
use crate::view::{
    ActionPanel, DiscoveryPanel, Indicator, NEW_CASE_TEXT, Transcript, WELCOME_TEXT,
};
use crate::voice::{
    DEFAULT_LANGUAGE, RecognitionEvent, SilentSynthesizer, VoiceInput, VoiceOutput,
};

/// Age and gender labels shown above the body diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDisplay {
    pub age: String,
    pub gender: String,
}

impl ProfileDisplay {
    pub fn from_profile(profile: &PatientProfile) -> Self {
        Self {
            age: format!("Age: {}", profile.age_field()),
            gender: format!("Gender: {}", profile.gender_field()),
        }
    }
}

pub struct Session {
    /// Current contents of the message box.
    pub input: String,
    pub language: String,
    pub profile: PatientProfile,
    pub(crate) history: Vec<ChatMessage>,
    pub(crate) capture: CaptureState,
    pub(crate) transcript: Transcript,
    pub(crate) indicator: Indicator,
    pub(crate) actions: ActionPanel,
    pub(crate) discovery: DiscoveryPanel,
    pub(crate) voice_in: VoiceInput,
    pub(crate) voice_out: VoiceOutput,
    profile_display: ProfileDisplay,
    visualization_unlocked: bool,
    api_key: Option<String>,
    theme: Theme,
    prefs: Box<dyn PreferenceStore>,
}

impl Session {
    pub fn new(prefs: Box<dyn PreferenceStore>) -> Self {
        let theme = prefs::load_theme(prefs.as_ref());
        let api_key = prefs::load_api_key(prefs.as_ref());
        let profile = PatientProfile::default();
        Self {
            input: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            profile_display: ProfileDisplay::from_profile(&profile),
            profile,
            history: Vec::new(),
            capture: CaptureState::default(),
            transcript: Transcript::seeded(WELCOME_TEXT),
            indicator: Indicator::default(),
            actions: ActionPanel::default(),
            discovery: DiscoveryPanel::default(),
            voice_in: VoiceInput::unavailable(),
            voice_out: VoiceOutput::new(Box::new(SilentSynthesizer)),
            visualization_unlocked: false,
            api_key,
            theme,
            prefs,
        }
    }

    pub fn with_voice(mut self, input: VoiceInput, output: VoiceOutput) -> Self {
        self.voice_in = input;
        self.voice_out = output;
        self
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn indicator(&self) -> &Indicator {
        &self.indicator
    }

    pub fn actions(&self) -> &ActionPanel {
        &self.actions
    }

    pub fn discovery(&self) -> &DiscoveryPanel {
        &self.discovery
    }

    pub fn capture(&self) -> &CaptureState {
        &self.capture
    }

    pub fn profile_display(&self) -> &ProfileDisplay {
        &self.profile_display
    }

    pub fn is_visualization_unlocked(&self) -> bool {
        self.visualization_unlocked
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn voice_input(&self) -> &VoiceInput {
        &self.voice_in
    }

    pub fn voice_output(&self) -> &VoiceOutput {
        &self.voice_out
    }

    /// Clear the current case: one seeded greeting, empty history, hidden indicator and
    /// reset panels.
    pub fn new_case(&mut self) {
        self.transcript.reset(NEW_CASE_TEXT);
        self.history.clear();
        self.actions = ActionPanel::default();
        self.discovery = DiscoveryPanel::default();
        self.indicator.reset();
        info!("New case started");
    }

    /// Unlock the body visualization. Requires age and gender; nothing changes otherwise.
    pub fn confirm_profile(&mut self) -> Result<()> {
        if !self.profile.is_complete_for_unlock() {
            return Err(GuardianError::MissingPatientFields);
        }
        self.visualization_unlocked = true;
        self.profile_display = ProfileDisplay::from_profile(&self.profile);
        info!("Patient profile confirmed");
        Ok(())
    }

    pub(crate) fn refresh_profile_display(&mut self) {
        self.profile_display = ProfileDisplay::from_profile(&self.profile);
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        self.theme = self.theme.toggled();
        self.prefs.set(THEME_KEY, self.theme.as_str())?;
        Ok(self.theme)
    }

    pub fn set_api_key(&mut self, key: &str) -> Result<()> {
        let key = key.trim();
        self.prefs.set(API_KEY_KEY, key)?;
        self.api_key = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
        Ok(())
    }

    pub fn toggle_speaker(&mut self) -> bool {
        self.voice_out.toggle()
    }

    pub fn speak_text(&mut self, text: &str) {
        self.voice_out.speak(text, &self.language);
    }

    pub fn toggle_microphone(&mut self) {
        self.voice_in.toggle(&self.language);
    }

    pub fn handle_recognition(&mut self, event: RecognitionEvent) {
        self.voice_in.handle_event(event, &mut self.input);
    }

    pub fn attach_files(&mut self, files: Vec<CapturedImage>) -> bool {
        self.capture.attach_from_picker(files)
    }

    pub fn capture_from_camera(&mut self, modal: &mut CameraModal) -> Result<()> {
        let image = modal.capture()?;
        self.capture.attach_captured(image);
        Ok(())
    }

    pub fn remove_image(&mut self) {
        self.capture.remove();
    }

    /// Point the indicator at a spot, or hide it. An id missing from the diagram hides the
    /// indicator too, so a stale marker never survives a new reply.
    pub fn sync_visualization(&mut self, spot_id: Option<u32>) {
        match spot_id.map(|id| (id, body_map::lookup(id))) {
            Some((_, Some(spot))) => self.indicator.show(spot),
            Some((id, None)) => {
                warn!(spot_id = id, "Reply referenced an unknown body spot");
                self.indicator.reset();
            }
            None => self.indicator.hide(),
        }
    }
}
