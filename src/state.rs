use std::sync::Arc;

use crate::features::detect::FaceVerifier;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 进程级只读模型句柄（启动时构建一次，所有请求共享，不加锁）
    pub verifier: Arc<FaceVerifier>,
}
