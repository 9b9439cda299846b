use crate::models::{CameraAck, DetectionStatus, ExtractionRequest, ExtractionResult};
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Scanner location used when neither the caller nor the environment sets one
pub const DEFAULT_SERVICE_URL: &str = "http://mrz-service:5000";

/// Environment variable overriding the scanner location
pub const SERVICE_URL_ENV: &str = "MRZ_SERVICE_URL";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Health probes never wait longer than this, whatever the client timeout
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_UPLOAD_FILENAME: &str = "passport.jpg";

const UPLOAD_FIELD: &str = "image";
const UPLOAD_CONTENT_TYPE: &str = "image/jpeg";

/// Errors that can occur when talking to the MRZ service
#[derive(Debug, Error)]
pub enum MrzApiError {
    /// Connection failure, timeout or non-2xx status
    #[error("Failed to {action}: {source}")]
    Transport {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered, but not with the JSON we expect
    #[error("Failed to {action}: invalid response: {source}")]
    MalformedResponse {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The service reported `success: false`
    #[error("{message}")]
    Domain {
        message: String,
        error_code: Option<String>,
        details: Map<String, Value>,
    },

    #[error("Failed to read image {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MrzApiError {
    /// Network level failure, including undecodable responses
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MrzApiError::Transport { .. } | MrzApiError::MalformedResponse { .. }
        )
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, MrzApiError::Domain { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, MrzApiError::Io { .. })
    }

    /// Machine readable code supplied by the service, if any
    pub fn error_code(&self) -> Option<&str> {
        match self {
            MrzApiError::Domain { error_code, .. } => error_code.as_deref(),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&Map<String, Value>> {
        match self {
            MrzApiError::Domain { details, .. } => Some(details),
            _ => None,
        }
    }
}

/// Connection settings for [`MrzApiClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrzClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl MrzClientConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Base URL from `MRZ_SERVICE_URL`, falling back to the default location
    pub fn from_env() -> Self {
        let base_url = std::env::var(SERVICE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        Self::new(base_url, DEFAULT_TIMEOUT)
    }
}

impl Default for MrzClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT)
    }
}

/// MRZ service API client
///
/// Handles all communication with the passport scanning service:
/// - Camera control and detection status
/// - Live capture with MRZ extraction
/// - Extraction from uploaded images
///
/// The underlying connection pool is shared by every call, so one instance
/// can be wrapped in an `Arc` and used from many tasks at once.
#[derive(Debug)]
pub struct MrzApiClient {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl MrzApiClient {
    /// Create a new MRZ client
    pub fn new(config: MrzClientConfig) -> Result<Self, MrzApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| MrzApiError::Transport {
                action: "create HTTP client",
                source,
            })?;

        tracing::info!("MRZ API client initialized with base URL: {}", config.base_url);

        Ok(Self {
            base_url: config.base_url,
            timeout: config.timeout,
            client,
        })
    }

    /// Client for the location named by `MRZ_SERVICE_URL`
    pub fn from_env() -> Result<Self, MrzApiError> {
        Self::new(MrzClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if the MRZ service is reachable and healthy
    ///
    /// Never fails: timeouts, refused connections and non-200 answers all
    /// count as unhealthy.
    pub async fn health_check(&self) -> bool {
        let url = self.url("/health");
        tracing::debug!("Probing MRZ service health at: {}", url);

        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                tracing::warn!("MRZ service health check returned {}", response.status());
                false
            }
            Err(e) => {
                tracing::warn!("MRZ service health check failed: {}", e);
                false
            }
        }
    }

    /// Initialize the camera on the MRZ service
    pub async fn start_camera(&self) -> Result<CameraAck, MrzApiError> {
        let request = self.client.post(self.url("/start_camera"));
        self.send_json(request, "start camera").await
    }

    /// Stop the camera on the MRZ service
    pub async fn stop_camera(&self) -> Result<CameraAck, MrzApiError> {
        let request = self.client.post(self.url("/stop_camera"));
        self.send_json(request, "stop camera").await
    }

    /// URL of the MJPEG stream, for embedding in the kiosk page
    pub fn video_feed_url(&self) -> String {
        self.url("/video_feed")
    }

    /// Current document detection state
    pub async fn detection_status(&self) -> Result<DetectionStatus, MrzApiError> {
        let request = self.client.get(self.url("/detection_status"));
        self.send_json(request, "get detection status").await
    }

    /// Capture a frame from the running camera and extract its MRZ
    pub async fn capture_and_extract(&self) -> Result<ExtractionResult, MrzApiError> {
        self.extract(ExtractionRequest::Capture).await
    }

    /// Extract MRZ data from image bytes
    pub async fn extract_from_bytes(
        &self,
        image: impl Into<Vec<u8>>,
        filename: &str,
    ) -> Result<ExtractionResult, MrzApiError> {
        self.extract(ExtractionRequest::upload(image, filename)).await
    }

    /// Extract MRZ data from an image on local disk
    ///
    /// The file is read completely before anything is sent, so a missing
    /// file fails without touching the network.
    pub async fn extract_from_path(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<ExtractionResult, MrzApiError> {
        let path = path.as_ref();
        let image = tokio::fs::read(path).await.map_err(|source| MrzApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_UPLOAD_FILENAME);

        tracing::debug!("Read {} bytes from {}", image.len(), path.display());

        self.extract_from_bytes(image, filename).await
    }

    /// Run an extraction request and validate the returned envelope
    pub async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionResult, MrzApiError> {
        let (builder, action) = match request {
            ExtractionRequest::Capture => {
                (self.client.post(self.url("/capture")), "capture and extract")
            }
            ExtractionRequest::Upload { bytes, filename } => {
                let action = "extract from image";
                let part = multipart::Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str(UPLOAD_CONTENT_TYPE)
                    .map_err(|source| MrzApiError::Transport { action, source })?;
                let form = multipart::Form::new().part(UPLOAD_FIELD, part);

                (self.client.post(self.url("/api/extract")).multipart(form), action)
            }
        };

        let envelope: Map<String, Value> = self.send_json(builder, action).await?;
        parse_extraction(action, envelope)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &'static str,
    ) -> Result<T, MrzApiError> {
        let response = request
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|source| {
                tracing::error!("Failed to {}: {}", action, source);
                MrzApiError::Transport { action, source }
            })?;

        let body = response
            .bytes()
            .await
            .map_err(|source| {
                tracing::error!("Failed to {}: could not read response body: {}", action, source);
                MrzApiError::Transport { action, source }
            })?;

        serde_json::from_slice(&body).map_err(|source| {
            tracing::error!("Failed to {}: invalid JSON response: {}", action, source);
            MrzApiError::MalformedResponse { action, source }
        })
    }
}

/// Split a decoded envelope into a result or a service reported failure
fn parse_extraction(
    action: &'static str,
    envelope: Map<String, Value>,
) -> Result<ExtractionResult, MrzApiError> {
    let succeeded = envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if !succeeded {
        let message = envelope
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        let error_code = envelope
            .get("error_code")
            .and_then(Value::as_str)
            .map(str::to_string);
        let details = envelope
            .get("details")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        tracing::warn!("MRZ service could not {}: {} (code: {:?})", action, message, error_code);

        return Err(MrzApiError::Domain {
            message,
            error_code,
            details,
        });
    }

    serde_json::from_value(Value::Object(envelope))
        .map_err(|source| MrzApiError::MalformedResponse { action, source })
}

static SHARED_CLIENT: OnceLock<MrzApiClient> = OnceLock::new();

/// Process wide client built from the environment on first use
///
/// Optional: everything else in the crate takes a client explicitly.
pub fn shared_client() -> Result<&'static MrzApiClient, MrzApiError> {
    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client);
    }

    let client = MrzApiClient::from_env()?;
    Ok(SHARED_CLIENT.get_or_init(|| client))
}
