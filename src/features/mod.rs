/// 人脸判定功能模块
pub mod detect;

/// 健康检查功能模块
pub mod health;
