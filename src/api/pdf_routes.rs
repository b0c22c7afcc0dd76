use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::{ApiError, AppState};
use crate::infrastructure::QuestionFilter;
use crate::models::PersistedQuestion;
use crate::orchestrator::{process_upload, PdfUpload, UploadSummary};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        success: true,
        status: "ok".to_string(),
    })
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub data: UploadSummary,
}

/// `POST /api/pdf/upload`
///
/// multipart 字段：`pdf`（文件）、`exam`、`year`、`topic`（可选）
pub async fn upload_pdf(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let upload = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("⚠️ 无法读取上传内容: {}", e);
            return ApiError::with_status(e.status(), format!("Failed to read multipart: {}", e))
                .into_response();
        }
    };

    match process_upload(&state.flow, &state.uploads_dir, upload).await {
        Ok(summary) => {
            info!("✅ 上传导入完成: {} ({} 道题目)", summary.filename, summary.questions_count);
            (
                StatusCode::OK,
                Json(UploadResponse {
                    success: true,
                    data: summary,
                }),
            )
                .into_response()
        }
        Err(e) if e.is_client_error() => {
            warn!("⚠️ 上传请求无效: {}", e);
            ApiError::bad_request(e.to_string()).into_response()
        }
        Err(e) => {
            error!("❌ PDF 处理失败: {}", e);
            ApiError::internal("Error processing PDF", e.to_string()).into_response()
        }
    }
}

async fn read_upload(multipart: &mut Multipart) -> Result<PdfUpload, MultipartError> {
    let mut upload = PdfUpload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf" => {
                upload.original_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                upload.bytes = Some(field.bytes().await?.to_vec());
            }
            "exam" => upload.exam = Some(field.text().await?),
            "year" => upload.year = Some(field.text().await?),
            "topic" => upload.topic = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(upload)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub exam: Option<String>,
    pub year: Option<String>,
    pub topic: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub total: usize,
    pub data: Vec<PersistedQuestion>,
    pub pagination: Pagination,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `GET /api/pdf/questions`
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let filter = QuestionFilter {
        exam: non_empty(params.exam),
        year: non_empty(params.year),
        topic: non_empty(params.topic),
    };

    let store = state.store.clone();
    let listing = tokio::task::spawn_blocking(move || store.find(&filter, page, limit))
        .await
        .map_err(|e| ApiError::internal("Error getting PDF questions", e.to_string()))?
        .map_err(|e| {
            error!("❌ 查询题目失败: {}", e);
            ApiError::internal("Error getting PDF questions", e.to_string())
        })?;

    Ok(Json(ListResponse {
        success: true,
        count: listing.items.len(),
        total: listing.total,
        data: listing.items,
        pagination: Pagination {
            page,
            limit,
            pages: listing.total.div_ceil(limit),
        },
    }))
}
