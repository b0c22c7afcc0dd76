//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责"多个文件"和"一次上传"的调度，不做具体解析。
//!
//! ## 模块划分
//!
//! ### `batch_importer` - 目录批量导入
//! - 扫描目录中的 `.pdf` / `.txt`
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `upload_processor` - 单个上传处理
//! - 校验上传请求
//! - 暂存文件，失败时清理
//!
//! ## 层次关系
//!
//! ```text
//! main / api (CLI 与 HTTP 入口)
//!     ↓
//! batch_importer / upload_processor
//!     ↓
//! workflow::ImportFlow (处理单个文件)
//!     ↓
//! services (能力层：parser / normalizer / persister / warn)
//!     ↓
//! infrastructure (基础设施：TextExtractor / QuestionStore)
//! ```

pub mod batch_importer;
pub mod upload_processor;

// 重新导出主要类型
pub use batch_importer::{collect_sources, BatchImporter, BatchStats};
pub use upload_processor::{process_upload, PdfUpload, UploadError, UploadSummary, PDF_MIME};
