use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What to send to the MRZ service for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionRequest {
    /// Trigger a capture on the already running camera
    Capture,
    /// Submit an image that was scanned or uploaded elsewhere
    Upload { bytes: Vec<u8>, filename: String },
}

impl ExtractionRequest {
    pub fn upload(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        ExtractionRequest::Upload {
            bytes: bytes.into(),
            filename: filename.into(),
        }
    }
}

/// MRZ fields as returned by the scanning service
///
/// The service gives no guarantees about which keys are present, so every
/// known field is optional and unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMrzRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    /// `YYMMDD`, or empty when the service could not read it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_document: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Guest identity in the shape the kiosk check-in form expects
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedGuestIdentity {
    pub first_name: String,
    pub last_name: String,
    pub passport_number: String,
    /// `YYYY-MM-DD`, or the raw value when it was not a six character date
    pub date_of_birth: String,
    pub nationality: String,
    pub gender: String,
}

/// Successful envelope of `/capture` and `/api/extract`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    #[serde(default)]
    pub data: RawMrzRecord,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_document: Option<Value>,
}

/// Acknowledgment from `/start_camera` and `/stop_camera`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Document detection state reported by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionStatus {
    #[serde(default)]
    pub detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_percentage: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
