use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::Normalizer;
use crate::models::{ErrorResponse, ExtractImageQuery, ExtractionResult, HealthResponse, ScanFailureResponse, ScanResponse, VideoFeedResponse};
use crate::services::{MrzApiClient, MrzApiError};
use std::sync::Arc;

/// Largest image accepted by the upload endpoint
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub mrz: Arc<MrzApiClient>,
    pub normalizer: Normalizer,
}

/// Configure the MRZ proxy routes used by the kiosk front-end
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(mrz_health))
        .route("/video-feed-url", web::get().to(video_feed_url))
        .route("/start-camera", web::post().to(start_camera))
        .route("/stop-camera", web::post().to(stop_camera))
        .route("/detection-status", web::get().to(detection_status))
        .route("/capture", web::post().to(capture))
        .route("/extract", web::post().to(extract_upload));
}

/// Scanner health endpoint
///
/// Always answers 200, the body says whether the scanner is usable.
async fn mrz_health(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.mrz.health_check().await;

    HttpResponse::Ok().json(HealthResponse {
        healthy,
        service_url: state.mrz.base_url().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

async fn video_feed_url(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(VideoFeedResponse {
        video_feed_url: state.mrz.video_feed_url(),
    })
}

async fn start_camera(state: web::Data<AppState>) -> impl Responder {
    match state.mrz.start_camera().await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => error_response(&e),
    }
}

async fn stop_camera(state: web::Data<AppState>) -> impl Responder {
    match state.mrz.stop_camera().await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => error_response(&e),
    }
}

async fn detection_status(state: web::Data<AppState>) -> impl Responder {
    match state.mrz.detection_status().await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => error_response(&e),
    }
}

/// Capture from the live camera and return the guest identity
///
/// POST /api/mrz/capture
async fn capture(state: web::Data<AppState>) -> impl Responder {
    tracing::info!("Capturing passport from kiosk camera");

    match state.mrz.capture_and_extract().await {
        Ok(result) => scan_response(&state.normalizer, result),
        Err(e) => error_response(&e),
    }
}

/// Extract from an uploaded image
///
/// POST /api/mrz/extract?filename=scan.jpg
///
/// The request body is the raw JPEG.
async fn extract_upload(
    state: web::Data<AppState>,
    query: web::Query<ExtractImageQuery>,
    body: web::Bytes,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    if body.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Missing image".to_string(),
            message: "Request body must contain the image bytes".to_string(),
            status_code: 400,
        });
    }

    tracing::info!("Extracting MRZ from uploaded image {} ({} bytes)", query.filename, body.len());

    match state.mrz.extract_from_bytes(body.to_vec(), &query.filename).await {
        Ok(result) => scan_response(&state.normalizer, result),
        Err(e) => error_response(&e),
    }
}

fn scan_response(normalizer: &Normalizer, result: ExtractionResult) -> HttpResponse {
    let guest = normalizer.normalize(&result.data);

    let response = ScanResponse {
        success: true,
        guest,
        raw: result.data,
        image_path: result.image_path,
        timestamp: result.timestamp,
        filled_document: result.filled_document,
    };

    tracing::info!("Passport extraction succeeded: {}", scan_log_summary(&response));

    HttpResponse::Ok().json(response)
}

/// Log line for a successful scan, without the guest's identity fields
fn scan_log_summary(response: &ScanResponse) -> String {
    format!(
        "image={} timestamp={} date_of_birth_present={}",
        response.image_path.as_deref().unwrap_or("-"),
        response.timestamp.as_deref().unwrap_or("-"),
        !response.guest.date_of_birth.is_empty()
    )
}

/// Map client errors to kiosk responses
///
/// Domain failures are shown to the guest ("hold the passport still"),
/// transport failures mean the scanner itself is down.
fn error_response(err: &MrzApiError) -> HttpResponse {
    match err {
        MrzApiError::Domain { message, error_code, details } => {
            HttpResponse::UnprocessableEntity().json(ScanFailureResponse {
                success: false,
                error: message.clone(),
                error_code: error_code.clone(),
                details: details.clone(),
            })
        }
        MrzApiError::Transport { .. } | MrzApiError::MalformedResponse { .. } => {
            tracing::error!("MRZ service call failed: {}", err);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "MRZ service unavailable".to_string(),
                message: err.to_string(),
                status_code: 502,
            })
        }
        MrzApiError::Io { .. } => HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Failed to read image".to_string(),
            message: err.to_string(),
            status_code: 500,
        }),
    }
}
