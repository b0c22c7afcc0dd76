//! HTTP 接口
//!
//! 上传试卷 PDF 并查询导入的题目。处理逻辑全部委托给编排层和存储层。

pub mod pdf_routes;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::infrastructure::QuestionStore;
use crate::workflow::ImportFlow;

/// 所有处理函数共享的状态
#[derive(Clone)]
pub struct AppState {
    pub flow: ImportFlow,
    pub store: Arc<dyn QuestionStore>,
    pub uploads_dir: PathBuf,
}

impl AppState {
    pub fn new(flow: ImportFlow, store: Arc<dyn QuestionStore>, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            flow,
            store,
            uploads_dir: uploads_dir.into(),
        }
    }
}

/// 构建路由
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(pdf_routes::health))
        .route("/api/pdf/upload", post(pdf_routes::upload_pdf))
        .route("/api/pdf/questions", get(pdf_routes::list_questions))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// 失败响应：`{success:false, error, message?}`
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            success: false,
            error: error.into(),
            message: None,
        }
    }

    pub fn with_status(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            ..Self::bad_request(error)
        }
    }

    pub fn internal(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            success: false,
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
