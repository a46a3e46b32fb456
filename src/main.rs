use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{Router, routing::get};
use face_backend::ShutdownManager;
use face_backend::config::AppConfig;
use face_backend::cors::build_cors_layer;
use face_backend::features::detect::{FaceVerifier, create_detect_router};
use face_backend::features::health::handler::health_check;
use face_backend::request_id::request_id_middleware;
use face_backend::startup::run_startup_checks;
use face_backend::state::AppState;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        face_backend::features::detect::handler::detect_face,
        face_backend::features::health::handler::health_check,
    ),
    components(schemas(face_backend::features::health::handler::HealthResponse)),
    tags(
        (name = "Detect", description = "Detect APIs"),
        (name = "Health", description = "Health APIs"),
    ),
    info(
        title = "Face Backend API",
        version = "0.1.0",
        description = "Face verification backend service (Axum)"
    )
)]
pub struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load config
    if let Err(e) = AppConfig::init_global() {
        eprintln!("Config init failed: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::global();

    // 日志初始化：环境变量优先，缺省回退到配置文件里的级别
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "face_backend={},tower_http=info",
            config.logging.level
        ))
    });
    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);
    match config.logging.format.as_str() {
        "compact" => subscriber.compact().init(),
        _ => subscriber.init(),
    }

    // 创建优雅退出管理器并启动信号处理器
    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    // Run startup checks
    if let Err(e) = run_startup_checks(config) {
        tracing::error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    // 加载模型：进程级一次，失败直接中止启动
    let model_path = config.model_path();
    let verifier = match FaceVerifier::load(&model_path) {
        Ok(v) => Arc::new(v),
        Err(e) => {
            tracing::error!("模型加载失败 {:?}: {}", model_path, e);
            std::process::exit(1);
        }
    };
    tracing::info!("模型加载完成: {:?}", model_path);

    // Shared state
    let app_state = AppState { verifier };

    // Routes
    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest(&config.api.prefix, create_detect_router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // 全局 request_id 中间件 + 上传大小限制
    app = app.layer(axum::middleware::from_fn(request_id_middleware));
    app = app.layer(DefaultBodyLimit::max(config.detect.max_upload_bytes));

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Detect API: http://{}{}/detect", addr, config.api.prefix);

    // 启动服务器并等待优雅退出信号
    let shutdown_config = config.shutdown.clone();
    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = shutdown_manager.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅退出...", reason);

        if shutdown_config.force_quit {
            // 超时兜底：在途连接迟迟不结束时强制退出进程。
            tokio::spawn(async move {
                tokio::time::sleep(shutdown_config.timeout_duration()).await;
                tracing::warn!("优雅退出超时（{}秒），强制退出", shutdown_config.timeout_secs);
                std::process::exit(1);
            });
        }
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
