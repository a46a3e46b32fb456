use std::io::Cursor;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use tower::ServiceExt;

use face_backend::error::DetectError;
use face_backend::features::detect::{FaceVerifier, ScoreModel, create_detect_router};
use face_backend::state::AppState;

/// 返回固定分值的打分模型，替代真实 ONNX 计划。
struct FixedScore(f32);

impl ScoreModel for FixedScore {
    fn raw_score(&self, _tensor_data: Vec<f32>) -> Result<f32, DetectError> {
        Ok(self.0)
    }
}

/// 推理阶段必然失败的打分模型。
struct FailingModel;

impl ScoreModel for FailingModel {
    fn raw_score(&self, _tensor_data: Vec<f32>) -> Result<f32, DetectError> {
        Err(DetectError::Inference("engine fault".to_string()))
    }
}

fn build_app(model: Box<dyn ScoreModel>) -> Router {
    let state = AppState {
        verifier: Arc::new(FaceVerifier::with_model(model)),
    };
    Router::new()
        .nest("/api", create_detect_router())
        .with_state(state)
}

const BOUNDARY: &str = "face-backend-test-boundary";

fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.png\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

async fn post_detect(app: Router, body: Vec<u8>) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/detect")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, String::from_utf8_lossy(&bytes).to_string())
}

#[tokio::test]
async fn detect_reports_face_for_high_logit() {
    let app = build_app(Box::new(FixedScore(5.0)));
    let body = multipart_body("img", &png_bytes(120, 80, [180, 140, 100]));

    let (status, text) = post_detect(app, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "Face detected: true");
}

#[tokio::test]
async fn detect_reports_no_face_for_low_probability() {
    let app = build_app(Box::new(FixedScore(0.2)));
    let body = multipart_body("img", &png_bytes(64, 64, [10, 10, 10]));

    let (status, text) = post_detect(app, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "Face detected: false");
}

#[tokio::test]
async fn detect_treats_exact_half_probability_as_face() {
    let app = build_app(Box::new(FixedScore(0.5)));
    let body = multipart_body("img", &png_bytes(64, 64, [128, 128, 128]));

    let (status, text) = post_detect(app, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "Face detected: true");
}

#[tokio::test]
async fn corrupt_upload_returns_plain_error() {
    let app = build_app(Box::new(FixedScore(5.0)));
    let body = multipart_body("img", b"these bytes are not an image");

    let (status, text) = post_detect(app, body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text.starts_with("Error:"), "unexpected body: {text}");
    assert!(text.contains("invalid image format"));
}

#[tokio::test]
async fn missing_img_field_returns_plain_error() {
    let app = build_app(Box::new(FixedScore(5.0)));
    // 字段名错误：服务端应当报缺少 img 字段，而不是读取其他字段。
    let body = multipart_body("file", &png_bytes(64, 64, [1, 2, 3]));

    let (status, text) = post_detect(app, body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text.starts_with("Error:"), "unexpected body: {text}");
    assert!(text.contains("img"));
}

#[tokio::test]
async fn inference_failure_returns_plain_error() {
    let app = build_app(Box::new(FailingModel));
    let body = multipart_body("img", &png_bytes(64, 64, [90, 90, 90]));

    let (status, text) = post_detect(app, body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text.starts_with("Error:"), "unexpected body: {text}");
    assert!(text.contains("inference failed"));
}

#[tokio::test]
async fn detect_is_deterministic_for_identical_bytes() {
    let payload = png_bytes(100, 60, [33, 66, 99]);

    let (status_a, text_a) =
        post_detect(build_app(Box::new(FixedScore(0.7))), multipart_body("img", &payload)).await;
    let (status_b, text_b) =
        post_detect(build_app(Box::new(FixedScore(0.7))), multipart_body("img", &payload)).await;

    assert_eq!(status_a, status_b);
    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(text_a, text_b);
}
