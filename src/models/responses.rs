use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::models::domain::{NormalizedGuestIdentity, RawMrzRecord};

/// Response of the kiosk capture and upload endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub success: bool,
    pub guest: NormalizedGuestIdentity,
    pub raw: RawMrzRecord,
    pub image_path: Option<String>,
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_document: Option<Value>,
}

/// Scanner service health as seen by the kiosk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service_url: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoFeedResponse {
    pub video_feed_url: String,
}

/// The service understood the request but could not read the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFailureResponse {
    pub success: bool,
    pub error: String,
    pub error_code: Option<String>,
    pub details: Map<String, Value>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
