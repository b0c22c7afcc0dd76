//! # Exam Question Import
//!
//! 从试卷 PDF 中提取选择题，规范化后整批写入题库
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（数据库连接、文件字节），只暴露能力
//! - `TextExtractor` - PDF / 纯文本 → 文本
//! - `QuestionStore` - 整批原子写入与分页查询（SQLite）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuestionParser` - 按行分类的状态机解析器
//! - `normalizer` - 补齐选项、校验记录
//! - `BulkPersister` - 校验后整批入库
//! - `WarnWriter` - 写 warn.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整导入流程
//! - `ImportCtx` - 上下文封装（源文件 + 元数据）
//! - `ImportFlow` - 流程编排（read → extract → parse → validate → persist）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_importer` - 目录批量导入，控制并发
//! - `orchestrator/upload_processor` - 单个上传的暂存与清理
//!
//! 入口：`import_questions`（CLI）和 `question_server`（HTTP，见 `api/`）
//!
//! ## 模块结构

pub mod api;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{ImportError, ImportResult, StorageError, StorageResult};
pub use infrastructure::{QuestionStore, SqliteQuestionStore};
pub use models::{ExamPaper, Metadata, PersistedQuestion, QuestionRecord};
pub use orchestrator::{BatchImporter, BatchStats};
pub use services::QuestionParser;
pub use workflow::{ImportCtx, ImportFlow, ImportReport};
