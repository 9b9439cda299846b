// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{CameraAck, DetectionStatus, ExtractionRequest, ExtractionResult, NormalizedGuestIdentity, RawMrzRecord};
pub use requests::ExtractImageQuery;
pub use responses::{ErrorResponse, HealthResponse, ScanFailureResponse, ScanResponse, VideoFeedResponse};
