use crate::config::AppConfig;
use crate::error::AppError;
use std::fs;

/// 执行启动检查
///
/// 1. 检查并创建 resources 文件夹
/// 2. 检查模型文件是否存在（缺失则启动失败）
pub fn run_startup_checks(config: &AppConfig) -> Result<(), AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    ensure_resources_folder(config)?;
    ensure_model_file(config)?;

    tracing::info!("✅ 启动检查完成");
    Ok(())
}

/// 确保 resources 文件夹存在
fn ensure_resources_folder(config: &AppConfig) -> Result<(), AppError> {
    let resources_path = config.resources_path();

    if !resources_path.exists() {
        tracing::warn!("📁 未找到 resources 文件夹，正在创建: {:?}", resources_path);
        fs::create_dir_all(&resources_path)
            .map_err(|e| AppError::Internal(format!("创建 resources 文件夹失败: {e}")))?;
        tracing::info!("✅ resources 文件夹创建成功");
    } else {
        tracing::info!("✅ resources 文件夹已存在");
    }

    Ok(())
}

/// 确保模型文件存在
///
/// 模型是进程的硬依赖，缺失时直接让启动失败，而不是等第一个请求再报错。
fn ensure_model_file(config: &AppConfig) -> Result<(), AppError> {
    let model_path = config.model_path();

    if !model_path.is_file() {
        return Err(AppError::Internal(format!(
            "模型文件不存在: {model_path:?}，请将 ONNX 模型放到该路径后重启"
        )));
    }

    tracing::info!("✅ 模型文件就绪: {:?}", model_path);
    Ok(())
}
