//! 优雅退出管理模块
//!
//! 跨平台信号处理与退出协调：Unix 下监听 SIGINT/SIGTERM，
//! 其他平台监听 Ctrl+C。退出只触发一次，后续触发被忽略。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tracing::{debug, info};

/// 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C / SIGINT)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
    /// 应用请求退出
    Application,
}

/// 优雅退出管理器
#[derive(Debug, Clone)]
pub struct ShutdownManager {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug)]
struct ShutdownInner {
    /// 退出信号通知器
    notify: Notify,
    /// 首次触发的退出原因
    reason: std::sync::Mutex<Option<ShutdownReason>>,
    /// 是否已经开始退出
    triggered: AtomicBool,
}

impl ShutdownManager {
    /// 创建新的优雅退出管理器
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ShutdownInner {
                notify: Notify::new(),
                reason: std::sync::Mutex::new(None),
                triggered: AtomicBool::new(false),
            }),
        }
    }

    /// 启动后台信号监听任务
    pub fn start_signal_handler(&self) -> std::io::Result<()> {
        let manager = self.clone();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm = signal(SignalKind::terminate())?;
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        manager.trigger_shutdown(ShutdownReason::Interrupt);
                    }
                    _ = sigterm.recv() => {
                        manager.trigger_shutdown(ShutdownReason::Terminate);
                    }
                }
            });
        }

        #[cfg(not(unix))]
        {
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    manager.trigger_shutdown(ShutdownReason::Interrupt);
                }
            });
        }

        Ok(())
    }

    /// 触发优雅退出（仅首次触发生效）
    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        let first = self
            .inner
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();

        if !first {
            debug!("已处于退出流程，忽略重复触发: {:?}", reason);
            return;
        }

        if let Ok(mut guard) = self.inner.reason.lock() {
            *guard = Some(reason);
        }
        info!("触发优雅退出: {:?}", reason);
        self.inner.notify.notify_waiters();
    }

    /// 等待退出信号，返回退出原因
    pub async fn wait_for_shutdown(&self) -> ShutdownReason {
        // 先注册等待者再检查标志，避免触发发生在两步之间时丢失通知。
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if !self.is_shutting_down() {
            notified.await;
        }

        self.inner
            .reason
            .lock()
            .ok()
            .and_then(|guard| *guard)
            .unwrap_or(ShutdownReason::Application)
    }

    /// 是否已经开始退出
    pub fn is_shutting_down(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}
