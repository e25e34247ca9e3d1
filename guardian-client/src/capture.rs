//! Image capture: file picker, camera modal and the single pending capture.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{GuardianError, Result};

pub const CAMERA_FILE_NAME: &str = "capture.jpg";

/// An image held in memory, ready to be attached to the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl CapturedImage {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime_type = mime_for(&file_name).to_string();
        Ok(Self::new(file_name, mime_type, bytes))
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Stand-in for a browser object URL pointing at the preview of a pending image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewHandle(Uuid);

/// Tracks preview handles that are still alive so leaks are observable.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: HashSet<Uuid>,
}

impl PreviewRegistry {
    pub fn create(&mut self) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.live.insert(id);
        PreviewHandle(id)
    }

    pub fn revoke(&mut self, handle: PreviewHandle) {
        self.live.remove(&handle.0);
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

/// The file-input control. A selection only fires a change when it differs from the current
/// value, so the value has to be reset for the same file to be picked twice.
#[derive(Debug, Default)]
pub struct FilePicker {
    value: Option<String>,
}

impl FilePicker {
    pub fn select(&mut self, file_name: &str) -> bool {
        if self.value.as_deref() == Some(file_name) {
            return false;
        }
        self.value = Some(file_name.to_string());
        true
    }

    pub fn reset(&mut self) {
        self.value = None;
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

#[derive(Debug)]
pub struct PendingCapture {
    pub image: CapturedImage,
    pub preview: PreviewHandle,
}

/// Holds at most one pending image plus the preview resources that go with it.
#[derive(Debug, Default)]
pub struct CaptureState {
    pending: Option<PendingCapture>,
    previews: PreviewRegistry,
    picker: FilePicker,
}

impl CaptureState {
    /// Use the first selected file. Returns false when nothing changed.
    pub fn attach_from_picker(&mut self, mut files: Vec<CapturedImage>) -> bool {
        if files.is_empty() {
            return false;
        }
        let file = files.swap_remove(0);
        if self.pending.is_none() {
            self.picker.reset();
        }
        if !self.picker.select(&file.file_name) {
            debug!(file = %file.file_name, "File picker value unchanged, no change event");
            return false;
        }
        self.replace(file);
        true
    }

    pub fn attach_captured(&mut self, image: CapturedImage) {
        self.picker.reset();
        self.replace(image);
    }

    fn replace(&mut self, image: CapturedImage) {
        if let Some(previous) = self.pending.take() {
            self.previews.revoke(previous.preview);
        }
        info!(file = %image.file_name, bytes = image.bytes.len(), "Image attached");
        let preview = self.previews.create();
        self.pending = Some(PendingCapture { image, preview });
    }

    pub fn remove(&mut self) {
        if let Some(previous) = self.pending.take() {
            self.previews.revoke(previous.preview);
        }
        self.picker.reset();
    }

    /// Hand the pending image to an outgoing message.
    pub fn take_for_send(&mut self) -> Option<CapturedImage> {
        let pending = self.pending.take()?;
        self.previews.revoke(pending.preview);
        self.picker.reset();
        Some(pending.image)
    }

    pub fn pending(&self) -> Option<&PendingCapture> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    pub fn picker(&self) -> &FilePicker {
        &self.picker
    }
}

/// A still frame grabbed from a live stream, already encoded as JPEG.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

pub trait CameraStream: Send {
    fn grab_frame(&mut self) -> Result<Frame>;
    /// Stop every track of the stream and release the device.
    fn stop(&mut self);
}

#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self) -> Result<Box<dyn CameraStream>>;
}

/// Camera modal. The stream is released on every way out: capture, close, a click outside
/// the modal, or the modal being dropped.
#[derive(Default)]
pub struct CameraModal {
    stream: Option<Box<dyn CameraStream>>,
    visible: bool,
}

impl CameraModal {
    pub async fn open(&mut self, device: &dyn CameraDevice) -> Result<()> {
        self.stop_camera();
        self.visible = true;
        match device.open().await {
            Ok(stream) => {
                info!("Camera stream acquired");
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Camera access failed");
                self.visible = false;
                let reason = match e {
                    GuardianError::Camera(reason) => reason,
                    other => other.to_string(),
                };
                Err(GuardianError::Camera(reason))
            }
        }
    }

    pub fn capture(&mut self) -> Result<CapturedImage> {
        let result = match self.stream.as_mut() {
            Some(stream) => stream.grab_frame(),
            None => Err(GuardianError::Capture("camera is not open".to_string())),
        };
        self.stop_camera();
        let frame = result?;
        debug!(width = frame.width, height = frame.height, "Frame captured");
        Ok(CapturedImage::new(CAMERA_FILE_NAME, "image/jpeg", frame.jpeg))
    }

    pub fn close(&mut self) {
        self.stop_camera();
    }

    pub fn dismiss_outside(&mut self) {
        self.stop_camera();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    fn stop_camera(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("Camera stream released");
        }
        self.visible = false;
    }
}

impl Drop for CameraModal {
    fn drop(&mut self) {
        self.stop_camera();
    }
}
