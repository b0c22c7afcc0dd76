use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use exam_question_import::api::{create_router, AppState};
use exam_question_import::config::Config;
use exam_question_import::infrastructure::SqliteQuestionStore;
use exam_question_import::logger;
use exam_question_import::utils::logging::log_startup;
use exam_question_import::workflow::ImportFlow;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logger::init_with_verbose(config.verbose_logging);
    log_startup("HTTP 上传服务", &config.database_path);

    let store = Arc::new(
        SqliteQuestionStore::connect(&config.database_path)
            .with_context(|| format!("无法打开数据库: {}", config.database_path))?,
    );
    let flow = ImportFlow::new(store.clone(), &config)?;
    let state = AppState::new(flow, store.clone(), &config.uploads_dir);
    let app = create_router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("无法监听地址: {}", config.bind_addr))?;
    info!("🌐 服务已启动: http://{}", config.bind_addr);
    info!("📂 上传目录: {}", config.uploads_dir);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    info!("🛑 服务已停止");
    match Arc::try_unwrap(store) {
        Ok(store) => store.close()?,
        Err(_) => warn!("⚠️ 数据库连接仍被占用，跳过显式关闭"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ 无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
}
