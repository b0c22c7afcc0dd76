//! 上传处理器 - 编排层
//!
//! 负责单个上传文件的完整生命周期：
//!
//! 1. 校验请求（文件、MIME 类型、exam / year）
//! 2. 把文件暂存到上传目录（文件名每个请求唯一）
//! 3. 委托 `ImportFlow` 解析并入库
//! 4. 任何一步失败都删除暂存文件，成功时保留

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ImportError;
use crate::models::Metadata;
use crate::workflow::{ImportCtx, ImportFlow};

/// 唯一接受的 MIME 类型
pub const PDF_MIME: &str = "application/pdf";

/// 一次上传请求的内容
#[derive(Debug, Clone, Default)]
pub struct PdfUpload {
    /// 客户端提供的原始文件名
    pub original_name: Option<String>,
    pub content_type: Option<String>,
    /// `None` 表示请求中没有文件
    pub bytes: Option<Vec<u8>>,
    pub exam: Option<String>,
    pub year: Option<String>,
    pub topic: Option<String>,
}

/// 上传成功的摘要
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub filename: String,
    pub questions_count: usize,
    pub message: String,
}

/// 上传错误
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload a PDF file")]
    MissingFile,

    #[error("File must be a PDF")]
    NotPdf,

    #[error("Please provide exam and year information")]
    MissingMetadata,

    /// 暂存文件失败
    #[error("无法暂存上传文件 ({path}): {source}")]
    Staging {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Import(#[from] ImportError),
}

impl UploadError {
    /// 是否是请求本身的问题（对应 400）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            UploadError::MissingFile | UploadError::NotPdf | UploadError::MissingMetadata
        )
    }
}

/// 暂存文件守卫：除非调用 `keep()`，否则在离开作用域时删除文件
struct StagedFile {
    path: PathBuf,
    keep: bool,
}

impl StagedFile {
    fn keep(mut self) {
        self.keep = true;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("🗑️ 已清理暂存文件: {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("⚠️ 无法删除暂存文件 {}: {}", self.path.display(), e),
        }
    }
}

/// 文件名中只保留字母、数字、`-` 和 `_`
fn sanitize_component(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// 暂存文件名：`{exam}_{year}_{毫秒}_{uuid}.pdf`，每个请求唯一
fn staged_file_name(metadata: &Metadata) -> String {
    format!(
        "{}_{}_{}_{}.pdf",
        sanitize_component(&metadata.exam),
        sanitize_component(&metadata.year),
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// 处理单个上传
///
/// # 参数
/// - `flow`: 导入流程
/// - `uploads_dir`: 暂存目录（不存在时自动创建）
/// - `upload`: 上传内容
pub async fn process_upload(
    flow: &ImportFlow,
    uploads_dir: &Path,
    upload: PdfUpload,
) -> Result<UploadSummary, UploadError> {
    let bytes = upload.bytes.ok_or(UploadError::MissingFile)?;
    if upload.content_type.as_deref() != Some(PDF_MIME) {
        return Err(UploadError::NotPdf);
    }
    let (Some(exam), Some(year)) = (required(upload.exam), required(upload.year)) else {
        return Err(UploadError::MissingMetadata);
    };
    let metadata = Metadata::new(exam, year, upload.topic);

    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(|source| UploadError::Staging {
            path: uploads_dir.display().to_string(),
            source,
        })?;

    let filename = staged_file_name(&metadata);
    let path = uploads_dir.join(&filename);

    debug!(
        "暂存上传文件: {} ({} 字节, 原始文件名: {:?})",
        path.display(),
        bytes.len(),
        upload.original_name
    );
    // create_new：同名文件已存在时失败，不会覆盖其他请求的暂存文件
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|source| UploadError::Staging {
            path: path.display().to_string(),
            source,
        })?;
    let staged = StagedFile { path, keep: false };

    let written = match file.write_all(&bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    written.map_err(|source| UploadError::Staging {
        path: staged.path.display().to_string(),
        source,
    })?;
    drop(file);

    let ctx = ImportCtx::new(staged.path.clone(), metadata);
    let report = flow.run(&ctx).await?;
    staged.keep();

    let questions_count = report.questions_count();
    Ok(UploadSummary {
        filename,
        questions_count,
        message: format!(
            "Successfully extracted {} questions from the PDF",
            questions_count
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{StorageError, StorageResult};
    use crate::infrastructure::{
        PlainTextExtractor, QuestionFilter, QuestionListing, QuestionStore, SqliteQuestionStore,
    };
    use crate::models::{PersistedQuestion, QuestionRecord};
    use std::sync::Arc;

    /// 总是拒绝写入的存储
    struct RejectingStore;

    impl QuestionStore for RejectingStore {
        fn insert_many(&self, _: &[QuestionRecord]) -> StorageResult<Vec<PersistedQuestion>> {
            Err(StorageError::SchemaViolation {
                index: 0,
                reason: "rejected".into(),
            })
        }

        fn find(&self, _: &QuestionFilter, _: usize, _: usize) -> StorageResult<QuestionListing> {
            Ok(QuestionListing {
                total: 0,
                items: Vec::new(),
            })
        }

        fn count(&self, _: &QuestionFilter) -> StorageResult<usize> {
            Ok(0)
        }
    }

    fn flow_with(store: Arc<dyn QuestionStore>, dir: &Path) -> ImportFlow {
        let config = Config {
            warn_file_path: dir.join("warn.txt").to_string_lossy().to_string(),
            ..Config::default()
        };
        ImportFlow::new(store, &config)
            .unwrap()
            .with_extractor(Arc::new(PlainTextExtractor))
    }

    fn upload(body: &str) -> PdfUpload {
        PdfUpload {
            original_name: Some("paper.pdf".into()),
            content_type: Some(PDF_MIME.into()),
            bytes: Some(body.as_bytes().to_vec()),
            exam: Some("CV".into()),
            year: Some("2023".into()),
            topic: None,
        }
    }

    fn staged_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_successful_upload_keeps_file() {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        let store = Arc::new(SqliteQuestionStore::in_memory().unwrap());
        let flow = flow_with(store.clone(), root.path());

        let summary = process_upload(&flow, &uploads, upload("1. Q\nA. a\nB. b"))
            .await
            .unwrap();

        assert_eq!(summary.questions_count, 1);
        assert!(summary.filename.starts_with("CV_2023_"));
        assert!(summary.filename.ends_with(".pdf"));
        assert!(uploads.join(&summary.filename).exists());
        assert_eq!(store.count(&QuestionFilter::default()).unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_uploads_stage_separate_files() {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        let store = Arc::new(SqliteQuestionStore::in_memory().unwrap());
        let flow = flow_with(store.clone(), root.path());
        let rounds = 20;

        for _ in 0..rounds {
            let (alpha, beta) = tokio::join!(
                process_upload(&flow, &uploads, upload("1. Alpha\nA. a")),
                process_upload(&flow, &uploads, upload("1. Beta\nA. b\n2. Gamma\nA. c")),
            );
            let (alpha, beta) = (alpha.unwrap(), beta.unwrap());

            assert_ne!(alpha.filename, beta.filename);
            assert_eq!(alpha.questions_count, 1);
            assert_eq!(beta.questions_count, 2);
        }

        let listing = store.find(&QuestionFilter::default(), 1, 1000).unwrap();
        let alpha_rows = listing
            .items
            .iter()
            .filter(|q| q.record.question_text == "Alpha")
            .count();
        assert_eq!(alpha_rows, rounds);
        assert_eq!(listing.total, rounds * 3);
        assert_eq!(staged_files(&uploads), rounds * 2);
    }

    #[tokio::test]
    async fn test_storage_failure_removes_staged_file() {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        let flow = flow_with(Arc::new(RejectingStore), root.path());

        let err = process_upload(&flow, &uploads, upload("1. Q\nA. a"))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Import(ImportError::Storage(_))));
        assert!(!err.is_client_error());
        assert_eq!(staged_files(&uploads), 0);
    }

    #[tokio::test]
    async fn test_request_validation() {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        let flow = flow_with(Arc::new(RejectingStore), root.path());

        let missing_file = PdfUpload {
            bytes: None,
            ..upload("")
        };
        let wrong_type = PdfUpload {
            content_type: Some("text/plain".into()),
            ..upload("")
        };
        let missing_year = PdfUpload {
            year: Some("  ".into()),
            ..upload("")
        };

        assert!(matches!(
            process_upload(&flow, &uploads, missing_file).await,
            Err(UploadError::MissingFile)
        ));
        assert!(matches!(
            process_upload(&flow, &uploads, wrong_type).await,
            Err(UploadError::NotPdf)
        ));
        assert!(matches!(
            process_upload(&flow, &uploads, missing_year).await,
            Err(UploadError::MissingMetadata)
        ));
        assert!(!uploads.exists());
    }

    #[test]
    fn test_sanitize_component_blocks_path_traversal() {
        assert_eq!(sanitize_component("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_component("CV-2023_a"), "CV-2023_a");
    }
}
