use std::time::Instant;

use axum::{
    Router,
    extract::{Multipart, State},
    routing::post,
};

use crate::error::AppError;
use crate::state::AppState;

/// multipart 表单中携带图片内容的字段名
const IMAGE_FIELD: &str = "img";

#[utoipa::path(
    post,
    path = "/detect",
    summary = "人脸判定",
    description = "上传一张图片（multipart 表单字段 `img`，任意常见编码格式），\
        返回是否检测到人脸的文本结果。",
    responses(
        (status = 200, description = "判定结果文本：`Face detected: true` 或 `Face detected: false`", body = String),
        (status = 500, description = "失败统一返回 `Error: <message>` 文本", body = String)
    ),
    tag = "Detect"
)]
pub async fn detect_face(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<String, AppError> {
    let t_total = Instant::now();

    let mut image_bytes = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            image_bytes = Some(field.bytes().await?);
            break;
        }
    }
    let image_bytes = image_bytes.ok_or(AppError::MissingImage)?;
    let upload_len = image_bytes.len();

    // 解码与推理都是 CPU 密集操作，放到阻塞线程池执行，避免占用异步 worker。
    let verifier = state.verifier.clone();
    let verdict = tokio::task::spawn_blocking(move || verifier.is_face(&image_bytes))
        .await
        .map_err(|e| AppError::Internal(format!("detect task failed: {e}")))??;

    tracing::info!(
        "detect 完成: verdict={}, 上传 {} 字节, 耗时: {}ms",
        verdict,
        upload_len,
        t_total.elapsed().as_millis()
    );

    Ok(format!("Face detected: {verdict}"))
}

/// 构建人脸判定路由
pub fn create_detect_router() -> Router<AppState> {
    Router::new().route("/detect", post(detect_face))
}
