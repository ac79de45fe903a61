//! Uploader side of the bridge: file selection, validation, encoding and the
//! single POST, modelled as one session object with explicit UI states.

use base64::{engine::general_purpose, Engine};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RecipeError, Result, ANALYSIS_FAILED};
use crate::formatter::format_recipe;
use crate::models::{data_url, AnalysisRequest};

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
enum FileSource {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// A file the user picked: name, declared MIME type and size, plus where to read it from.
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    source: FileSource,
}

impl PickedFile {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            source: FileSource::Memory(bytes),
        }
    }

    /// Stat a file on disk. Contents are read lazily, like a browser `File`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            mime_type: mime_type_for(path).to_string(),
            size: metadata.len(),
            source: FileSource::Disk(path.to_path_buf()),
        })
    }

    async fn read(&self) -> Result<Vec<u8>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Disk(path) => Ok(tokio::fs::read(path).await?),
        }
    }

    async fn read_as_data_url(&self) -> Result<String> {
        let bytes = self.read().await?;
        Ok(data_url(&self.mime_type, &general_purpose::STANDARD.encode(&bytes)))
    }
}

/// MIME type from the file extension; unknown extensions are not images.
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Check type and size before anything is read.
pub fn validate(file: &PickedFile) -> Result<()> {
    if !file.mime_type.starts_with("image/") {
        return Err(RecipeError::NotAnImage {
            mime_type: file.mime_type.clone(),
        });
    }
    if file.size > MAX_IMAGE_BYTES {
        return Err(RecipeError::TooLarge { size: file.size });
    }
    Ok(())
}

/// Base64 payload of the file, i.e. its data URL without the `data:<mime>;base64,` prefix.
pub async fn encode_for_transmission(file: &PickedFile) -> Result<String> {
    let bytes = file.read().await?;
    Ok(general_purpose::STANDARD.encode(&bytes))
}

/// The selected file and its preview.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file: PickedFile,
    pub preview: String,
}

/// What a successful analysis shows.
#[derive(Debug, Clone)]
pub struct RecipeView {
    pub image_preview: String,
    pub recipe: String,
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Empty,
    Preview,
    Loading,
    Result,
}

#[derive(Debug, Deserialize)]
struct BridgeBody {
    recipe: Option<String>,
    error: Option<String>,
}

/// HTTP client for the bridge endpoint.
pub struct BridgeClient {
    endpoint: String,
    client: reqwest::Client,
}

impl BridgeClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecipeError::BridgeUnreachable(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// POST one request and return the recipe text.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<String> {
        log::info!("📤 Posting image to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| RecipeError::BridgeUnreachable(e.to_string()))?;

        let status = response.status();
        log::debug!("📥 Bridge response status: {}", status);

        let body: Option<BridgeBody> = response.json().await.ok();

        if !status.is_success() {
            let message = body
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| ANALYSIS_FAILED.to_string());
            return Err(RecipeError::Rejected(message));
        }

        body.and_then(|b| b.recipe)
            .ok_or_else(|| RecipeError::Rejected(ANALYSIS_FAILED.to_string()))
    }
}

async fn request_recipe(bridge: &BridgeClient, file: &PickedFile) -> Result<String> {
    let image = encode_for_transmission(file).await?;
    let request = AnalysisRequest::new(image, file.mime_type.clone());
    bridge.analyze(&request).await
}

/// Holds the session in `Loading` with submission disabled. On drop, which
/// also covers a cancelled submission, it re-enables submission and falls
/// back to `Preview`.
struct LoadingGuard<'a> {
    state: &'a mut UiState,
    submit_enabled: &'a mut bool,
}

impl<'a> LoadingGuard<'a> {
    fn enter(state: &'a mut UiState, submit_enabled: &'a mut bool) -> Self {
        *state = UiState::Loading;
        *submit_enabled = false;
        Self {
            state,
            submit_enabled,
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.submit_enabled = true;
        if *self.state == UiState::Loading {
            *self.state = UiState::Preview;
        }
    }
}

/// One user's upload session.
pub struct UploadSession {
    bridge: BridgeClient,
    state: UiState,
    selected: Option<UploadedImage>,
    result: Option<RecipeView>,
    error: Option<String>,
    submit_enabled: bool,
}

impl UploadSession {
    pub fn new(bridge: BridgeClient) -> Self {
        Self {
            bridge,
            state: UiState::Empty,
            selected: None,
            result: None,
            error: None,
            submit_enabled: true,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn selected(&self) -> Option<&UploadedImage> {
        self.selected.as_ref()
    }

    pub fn result(&self) -> Option<&RecipeView> {
        self.result.as_ref()
    }

    /// Message currently displayed to the user, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        self.submit_enabled && self.selected.is_some()
    }

    /// Validate and select `file`. On failure the current selection is left as it was.
    pub async fn accept_file(&mut self, file: PickedFile) -> Result<()> {
        if let Err(err) = validate(&file) {
            log::warn!("⚠️ Rejected {} ({}, {} bytes): {:?}", file.name, file.mime_type, file.size, err);
            self.error = Some(err.to_string());
            return Err(err);
        }

        let preview = match file.read_as_data_url().await {
            Ok(preview) => preview,
            Err(err) => {
                log::error!("❌ Failed to read {}: {:?}", file.name, err);
                self.error = Some(err.to_string());
                return Err(err);
            }
        };

        log::info!("🖼️ Selected {} ({} bytes)", file.name, file.size);
        self.selected = Some(UploadedImage { file, preview });
        self.error = None;
        self.state = UiState::Preview;
        Ok(())
    }

    /// Send the selected image for analysis. Does nothing without a selection
    /// or while another submission is running.
    pub async fn submit_for_analysis(&mut self) -> Result<()> {
        if !self.can_submit() {
            return Ok(());
        }
        let Some(selected) = self.selected.clone() else {
            return Ok(());
        };

        self.result = None;
        self.error = None;

        let outcome = {
            let _loading = LoadingGuard::enter(&mut self.state, &mut self.submit_enabled);
            request_recipe(&self.bridge, &selected.file).await
        };

        match outcome {
            Ok(recipe) => {
                let html = format_recipe(&recipe);
                self.result = Some(RecipeView {
                    image_preview: selected.preview,
                    recipe,
                    html,
                });
                self.state = UiState::Result;
                Ok(())
            }
            Err(err) => {
                log::error!("❌ Analysis failed: {}", err);
                let message = err.to_string();
                self.error = Some(if message.is_empty() {
                    ANALYSIS_FAILED.to_string()
                } else {
                    message
                });
                self.state = UiState::Preview;
                Err(err)
            }
        }
    }

    /// Back to the empty upload state.
    pub fn reset(&mut self) {
        self.selected = None;
        self.result = None;
        self.error = None;
        self.state = UiState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    // 1x1 transparent PNG.
    const PIXEL_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    fn offline_session() -> UploadSession {
        let bridge = BridgeClient::new("http://127.0.0.1:1/api/analyze-recipe", Duration::from_secs(2)).unwrap();
        UploadSession::new(bridge)
    }

    /// A file that claims `size` bytes without allocating them.
    fn sized_file(mime_type: &str, size: u64) -> PickedFile {
        PickedFile {
            name: "dish".to_string(),
            mime_type: mime_type.to_string(),
            size,
            source: FileSource::Memory(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_non_image_rejected_and_nothing_selected() {
        let mut session = offline_session();

        for mime in ["text/plain", "application/pdf", "", "video/mp4", "IMAGE/png"] {
            let err = session.accept_file(sized_file(mime, 10)).await.unwrap_err();
            assert!(matches!(err, RecipeError::NotAnImage { .. }), "mime: {}", mime);
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        assert!(session.selected().is_none());
        assert_eq!(session.state(), UiState::Empty);
        assert_eq!(session.error(), Some("אנא בחר קובץ תמונה"));
    }

    #[tokio::test]
    async fn test_oversized_rejected_regardless_of_type() {
        let mut session = offline_session();

        for mime in ["image/png", "image/jpeg", "image/webp"] {
            let err = session
                .accept_file(sized_file(mime, MAX_IMAGE_BYTES + 1))
                .await
                .unwrap_err();
            assert!(matches!(err, RecipeError::TooLarge { size } if size == 4_194_305));
        }
        assert!(session.selected().is_none());

        session.accept_file(sized_file("image/png", MAX_IMAGE_BYTES)).await.unwrap();
        assert!(session.selected().is_some());
    }

    #[tokio::test]
    async fn test_accept_builds_preview_and_clears_error() {
        let mut session = offline_session();
        let _ = session.accept_file(sized_file("text/plain", 1)).await;
        assert!(session.error().is_some());

        session
            .accept_file(PickedFile::from_bytes("pixel.png", "image/png", PIXEL_PNG.to_vec()))
            .await
            .unwrap();

        assert_eq!(session.state(), UiState::Preview);
        assert!(session.error().is_none());
        let selected = session.selected().unwrap();
        assert!(selected.preview.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[tokio::test]
    async fn test_invalid_pick_keeps_previous_selection() {
        let mut session = offline_session();
        session
            .accept_file(PickedFile::from_bytes("pixel.png", "image/png", PIXEL_PNG.to_vec()))
            .await
            .unwrap();

        let _ = session.accept_file(sized_file("text/plain", 1)).await;

        assert_eq!(session.selected().unwrap().file.name, "pixel.png");
        assert_eq!(session.state(), UiState::Preview);
    }

    #[tokio::test]
    async fn test_encode_round_trips() {
        let file = PickedFile::from_bytes("pixel.png", "image/png", PIXEL_PNG.to_vec());

        let encoded = encode_for_transmission(&file).await.unwrap();
        let preview = file.read_as_data_url().await.unwrap();

        assert_eq!(format!("data:image/png;base64,{}", encoded), preview);
        assert_eq!(preview.split_once(',').map(|(_, payload)| payload), Some(encoded.as_str()));
        assert_eq!(general_purpose::STANDARD.decode(&encoded).unwrap(), PIXEL_PNG);
    }

    #[tokio::test]
    async fn test_open_from_disk_and_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Dish.JPG");
        std::fs::write(&path, PIXEL_PNG).unwrap();

        let file = PickedFile::open(&path).await.unwrap();
        assert_eq!(file.mime_type, "image/jpeg");
        assert_eq!(file.size, PIXEL_PNG.len() as u64);
        assert_eq!(file.name, "Dish.JPG");

        std::fs::remove_file(&path).unwrap();
        let err = encode_for_transmission(&file).await.unwrap_err();
        assert!(matches!(err, RecipeError::Read(_)));
        assert_eq!(err.to_string(), "לא ניתן לקרוא את קובץ התמונה");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_mime_type_for_extensions() {
        assert_eq!(mime_type_for(Path::new("a.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.txt")), "application/octet-stream");
        assert_eq!(mime_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_submit_without_selection_is_noop() {
        let mut session = offline_session();
        session.submit_for_analysis().await.unwrap();
        assert_eq!(session.state(), UiState::Empty);
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_bridge_returns_to_preview() {
        let mut session = offline_session();
        session
            .accept_file(PickedFile::from_bytes("pixel.png", "image/png", PIXEL_PNG.to_vec()))
            .await
            .unwrap();

        let err = session.submit_for_analysis().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(session.state(), UiState::Preview);
        assert!(session.selected().is_some());
        assert!(session.result().is_none());
        assert!(session.error().is_some());
        assert!(session.can_submit());
    }

    #[tokio::test]
    async fn test_unreadable_file_shows_hebrew_error_and_selects_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");
        std::fs::write(&path, PIXEL_PNG).unwrap();
        let file = PickedFile::open(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let mut session = offline_session();
        assert!(session.accept_file(file).await.is_err());

        assert!(session.selected().is_none());
        assert_eq!(session.state(), UiState::Empty);
        assert_eq!(session.error(), Some("לא ניתן לקרוא את קובץ התמונה"));
    }

    #[tokio::test]
    async fn test_cancelled_submission_leaves_loading() {
        // Accepts connections into its backlog but never answers.
        let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/api/analyze-recipe", silent.local_addr().unwrap());
        let bridge = BridgeClient::new(endpoint, Duration::from_secs(30)).unwrap();
        let mut session = UploadSession::new(bridge);
        session
            .accept_file(PickedFile::from_bytes("pixel.png", "image/png", PIXEL_PNG.to_vec()))
            .await
            .unwrap();

        let cancelled =
            tokio::time::timeout(Duration::from_millis(200), session.submit_for_analysis()).await;

        assert!(cancelled.is_err());
        assert_eq!(session.state(), UiState::Preview);
        assert!(session.can_submit());
        assert!(session.selected().is_some());
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let mut session = offline_session();
        session
            .accept_file(PickedFile::from_bytes("pixel.png", "image/png", PIXEL_PNG.to_vec()))
            .await
            .unwrap();
        let _ = session.submit_for_analysis().await;

        session.reset();

        assert_eq!(session.state(), UiState::Empty);
        assert!(session.selected().is_none());
        assert!(session.error().is_none());
        assert!(session.result().is_none());
        assert!(!session.can_submit());
    }
}
