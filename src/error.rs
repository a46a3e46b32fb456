use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// 应用统一错误类型
///
/// 对外契约固定：任何请求期失败都返回 `500` + 纯文本 `Error: <message>`，
/// 不在 HTTP 层区分错误种类（区分只体现在 message 文本里）。
#[derive(Error, Debug)]
pub enum AppError {
    /// multipart 表单中缺少图片字段
    #[error("no image uploaded (expected multipart field 'img')")]
    MissingImage,

    /// multipart 表单解析错误
    #[error("invalid multipart request: {0}")]
    Multipart(String),

    /// 判定流水线错误（解码 / 推理）
    #[error(transparent)]
    Detect(#[from] DetectError),

    /// 内部错误
    #[error("internal error: {0}")]
    Internal(String),
}

/// 人脸判定流水线错误类型
#[derive(Error, Debug)]
pub enum DetectError {
    /// 图片字节无法解码为位图
    #[error("invalid image format")]
    InvalidImage,

    /// 模型加载失败（仅启动期出现，致命）
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// 推理引擎错误
    #[error("inference failed: {0}")]
    Inference(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 对外统一折叠为同一种纯文本错误形态，无重试、无部分结果。
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {self}")).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Multipart(err.to_string())
    }
}
