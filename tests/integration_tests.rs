// Integration tests for the MRZ client, notifications and kiosk routes

use actix_web::{http::StatusCode, test, web, App};
use kiosk_mrz::core::Normalizer;
use kiosk_mrz::routes::{configure_routes, kiosk::AppState};
use kiosk_mrz::services::{MrzApiClient, MrzApiError, MrzClientConfig, NotificationError, NotificationSink, TelegramSink};
use mockito::Matcher;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Nothing listens on port 1
const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

fn create_client(base_url: &str) -> MrzApiClient {
    MrzApiClient::new(MrzClientConfig::new(base_url, Duration::from_secs(5))).unwrap()
}

fn create_state(base_url: &str) -> AppState {
    AppState {
        mrz: Arc::new(create_client(base_url)),
        normalizer: Normalizer::with_default_pivot(),
    }
}

fn success_envelope() -> Value {
    json!({
        "success": true,
        "data": {
            "given_name": "JOHN<PAUL<<",
            "surname": "SMITH",
            "document_number": "L898902C3",
            "birth_date": "050615",
            "nationality_code": "UTO",
            "sex": "M"
        },
        "image_path": "/captures/passport_001.jpg",
        "timestamp": "2024-05-01T10:00:00",
        "filled_document": {"pdf": "/docs/dw_rc_001.pdf"}
    })
}

fn failure_envelope() -> Value {
    json!({
        "success": false,
        "error": "MRZ not readable",
        "error_code": "MRZ_UNREADABLE",
        "details": {"detected_lines": 1}
    })
}

#[tokio::test]
async fn test_health_check_ok() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(r#"{"status": "ok"}"#)
        .create_async()
        .await;

    assert!(create_client(&server.url()).health_check().await);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_health_check_non_200_is_unhealthy() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/health")
        .with_status(503)
        .create_async()
        .await;

    assert!(!create_client(&server.url()).health_check().await);
}

#[tokio::test]
async fn test_health_check_unreachable_is_unhealthy() {
    assert!(!create_client(UNREACHABLE_URL).health_check().await);
}

#[tokio::test]
async fn test_health_check_times_out_on_silent_service() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept connections and never answer them
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = MrzApiClient::new(MrzClientConfig::new(
        format!("http://{}", addr),
        Duration::from_secs(60),
    ))
    .unwrap();

    let started = Instant::now();
    assert!(!client.health_check().await);
    assert!(started.elapsed() < Duration::from_secs(7), "took {:?}", started.elapsed());
}

#[tokio::test]
async fn test_start_and_stop_camera() {
    let mut server = mockito::Server::new_async().await;
    let start = server
        .mock("POST", "/start_camera")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "message": "Camera started", "resolution": "1920x1080"}"#)
        .create_async()
        .await;
    let stop = server
        .mock("POST", "/stop_camera")
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;

    let client = create_client(&server.url());

    let ack = client.start_camera().await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.message.as_deref(), Some("Camera started"));
    assert_eq!(ack.extra["resolution"], json!("1920x1080"));

    assert!(client.stop_camera().await.unwrap().success);

    start.assert_async().await;
    stop.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_transport_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/start_camera")
        .with_status(500)
        .with_body("camera busy")
        .create_async()
        .await;

    let err = create_client(&server.url()).start_camera().await.unwrap_err();

    assert!(matches!(err, MrzApiError::Transport { .. }));
    assert!(err.is_transport());
    assert!(err.to_string().starts_with("Failed to start camera"));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let err = create_client(UNREACHABLE_URL).capture_and_extract().await.unwrap_err();

    assert!(err.is_transport());
    assert!(!err.is_domain());
}

#[tokio::test]
async fn test_non_json_body_is_malformed_response() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/detection_status")
        .with_status(200)
        .with_body("<html>proxy error</html>")
        .create_async()
        .await;

    let err = create_client(&server.url()).detection_status().await.unwrap_err();

    assert!(matches!(err, MrzApiError::MalformedResponse { .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_truncated_body_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Promise 100 bytes, send a few, then hang up
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"detected\"")
                .await;
            let _ = socket.shutdown().await;
        }
    });

    let err = create_client(&format!("http://{}", addr))
        .detection_status()
        .await
        .unwrap_err();

    assert!(matches!(err, MrzApiError::Transport { action: "get detection status", .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_detection_status_passthrough() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/detection_status")
        .with_status(200)
        .with_body(r#"{"detected": true, "area_percentage": 61.5, "stable": true}"#)
        .create_async()
        .await;

    let status = create_client(&server.url()).detection_status().await.unwrap();

    assert!(status.detected);
    assert_eq!(status.area_percentage, Some(61.5));
    assert_eq!(status.extra["stable"], json!(true));
}

#[tokio::test]
async fn test_capture_and_extract_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/capture")
        .with_status(200)
        .with_body(success_envelope().to_string())
        .create_async()
        .await;

    let result = create_client(&server.url()).capture_and_extract().await.unwrap();

    assert!(result.success);
    assert_eq!(result.data.document_number.as_deref(), Some("L898902C3"));
    assert_eq!(result.image_path.as_deref(), Some("/captures/passport_001.jpg"));
    assert_eq!(result.filled_document, Some(json!({"pdf": "/docs/dw_rc_001.pdf"})));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_capture_and_extract_domain_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/capture")
        .with_status(200)
        .with_body(failure_envelope().to_string())
        .create_async()
        .await;

    let err = create_client(&server.url()).capture_and_extract().await.unwrap_err();

    match &err {
        MrzApiError::Domain { message, error_code, details } => {
            assert_eq!(message, "MRZ not readable");
            assert_eq!(error_code.as_deref(), Some("MRZ_UNREADABLE"));
            assert_eq!(details["detected_lines"], json!(1));
        }
        other => panic!("expected domain error, got {:?}", other),
    }
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_extract_from_bytes_sends_multipart_image() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/extract")
        .match_header("content-type", Matcher::Regex("^multipart/form-data; boundary=".to_string()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="image"; filename="scan_01.jpg""#.to_string()),
            Matcher::Regex("(?i)content-type: image/jpeg".to_string()),
            Matcher::Regex("FAKEJPEGDATA".to_string()),
        ]))
        .with_status(200)
        .with_body(success_envelope().to_string())
        .create_async()
        .await;

    let result = create_client(&server.url())
        .extract_from_bytes(b"FAKEJPEGDATA".to_vec(), "scan_01.jpg")
        .await
        .unwrap();

    assert_eq!(result.data.surname.as_deref(), Some("SMITH"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_extract_from_bytes_domain_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/extract")
        .with_status(200)
        .with_body(r#"{"success": false}"#)
        .create_async()
        .await;

    let err = create_client(&server.url())
        .extract_from_bytes(b"FAKEJPEGDATA".to_vec(), "scan.jpg")
        .await
        .unwrap_err();

    assert!(err.is_domain());
    assert_eq!(err.to_string(), "Unknown error");
    assert!(err.details().unwrap().is_empty());
}

#[tokio::test]
async fn test_extract_from_path_uses_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guest_passport.jpg");
    std::fs::write(&path, b"FAKEJPEGDATA").unwrap();

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/extract")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"filename="guest_passport.jpg""#.to_string()),
            Matcher::Regex("FAKEJPEGDATA".to_string()),
        ]))
        .with_status(200)
        .with_body(success_envelope().to_string())
        .create_async()
        .await;

    let result = create_client(&server.url()).extract_from_path(&path).await.unwrap();

    assert!(result.success);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_extract_from_missing_path_never_calls_service() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/extract")
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does_not_exist.jpg");

    let err = create_client(&server.url()).extract_from_path(&missing).await.unwrap_err();

    match &err {
        MrzApiError::Io { path, source } => {
            assert_eq!(path, &missing);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected io error, got {:?}", other),
    }
    assert!(err.is_io());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_shared_client_is_reused() {
    let first = kiosk_mrz::services::shared_client().unwrap();
    let second = kiosk_mrz::services::shared_client().unwrap();

    assert!(std::ptr::eq(first, second));
    assert_eq!(first.video_feed_url(), format!("{}/video_feed", first.base_url()));
}

#[tokio::test]
async fn test_telegram_sink_delivers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/bot123:abc/sendMessage")
        .match_body(Matcher::PartialJson(json!({
            "chat_id": "-1001",
            "text": "<b>Smart Hotel - Password Changed</b>",
            "parse_mode": "HTML"
        })))
        .with_status(200)
        .with_body(r#"{"ok": true, "result": {"message_id": 7}}"#)
        .create_async()
        .await;

    let sink = TelegramSink::with_api_base(server.url(), "123:abc".to_string(), "-1001".to_string()).unwrap();

    sink.send("<b>Smart Hotel - Password Changed</b>").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_telegram_sink_reports_rejection() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/bot123:abc/sendMessage")
        .with_status(400)
        .with_body(r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#)
        .create_async()
        .await;

    let sink = TelegramSink::with_api_base(server.url(), "123:abc".to_string(), "-1".to_string()).unwrap();

    match sink.send("hello").await {
        Err(NotificationError::Rejected(reason)) => assert_eq!(reason, "Bad Request: chat not found"),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_telegram_sink_reports_ok_false_on_success_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/bot123:abc/sendMessage")
        .with_status(200)
        .with_body(r#"{"ok": false, "description": "Forbidden: bot was blocked by the user"}"#)
        .create_async()
        .await;

    let sink = TelegramSink::with_api_base(server.url(), "123:abc".to_string(), "-1".to_string()).unwrap();

    match sink.send("hello").await {
        Err(NotificationError::Rejected(reason)) => {
            assert_eq!(reason, "Forbidden: bot was blocked by the user")
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    mock.assert_async().await;
}

#[actix_web::test]
async fn test_health_route_reports_unreachable_scanner() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_state(UNREACHABLE_URL)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/mrz/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["healthy"], json!(false));
    assert_eq!(body["service_url"], json!(UNREACHABLE_URL));
}

#[actix_web::test]
async fn test_video_feed_route() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_state("http://scanner:5000")))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/mrz/video-feed-url").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["video_feed_url"], json!("http://scanner:5000/video_feed"));
}

#[actix_web::test]
async fn test_capture_route_returns_normalized_guest() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/capture")
        .with_status(200)
        .with_body(success_envelope().to_string())
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_state(&server.url())))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/mrz/capture").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], json!(true));
    assert_eq!(body["guest"]["first_name"], json!("JOHN PAUL"));
    assert_eq!(body["guest"]["date_of_birth"], json!("2005-06-15"));
    assert_eq!(body["raw"]["given_name"], json!("JOHN<PAUL<<"));
    assert_eq!(body["image_path"], json!("/captures/passport_001.jpg"));
}

#[actix_web::test]
async fn test_capture_route_domain_failure_is_422() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/capture")
        .with_status(200)
        .with_body(failure_envelope().to_string())
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_state(&server.url())))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/mrz/capture").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error_code"], json!("MRZ_UNREADABLE"));
}

#[actix_web::test]
async fn test_start_camera_route_scanner_down_is_502() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_state(UNREACHABLE_URL)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/mrz/start-camera").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn test_extract_route_forwards_upload() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/extract")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"filename="front_desk.jpg""#.to_string()),
            Matcher::Regex("FAKEJPEGDATA".to_string()),
        ]))
        .with_status(200)
        .with_body(success_envelope().to_string())
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_state(&server.url())))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/mrz/extract?filename=front_desk.jpg")
        .set_payload("FAKEJPEGDATA")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["guest"]["last_name"], json!("SMITH"));
    mock.assert_async().await;
}

#[actix_web::test]
async fn test_extract_route_rejects_empty_body() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_state(UNREACHABLE_URL)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/mrz/extract").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
