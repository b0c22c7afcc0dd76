//! 导入流程 - 流程层
//!
//! 核心职责：定义"一个文件"的完整导入流程
//!
//! 流程顺序：
//! 1. 读取源文件（不存在即失败，不进入解析）
//! 2. 提取文本 → 切行 → 状态机解析
//! 3. 被丢弃的题目块写入 warn.txt
//! 4. 整批校验并入库
//!
//! 入库前不会产生任何存储副作用，解析中途失败不会留下半批数据。

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ImportError, ImportResult};
use crate::infrastructure::{extractor_for, split_lines, QuestionStore, TextExtractor};
use crate::models::{ExamPaper, Metadata, PersistedQuestion, QuestionRecord};
use crate::services::{BulkPersister, DroppedBlock, ParseReport, QuestionParser, WarnWriter};
use crate::utils::logging::truncate_text;
use crate::workflow::import_ctx::ImportCtx;

/// 单个文件的导入结果
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// 源文件名
    pub source: String,
    /// 解析出的题目（按文档顺序）
    pub questions: Vec<QuestionRecord>,
    /// 已入库的题目（dry run 时为空）
    pub persisted: Vec<PersistedQuestion>,
    /// 因没有选项而被丢弃的题目块
    pub dropped: Vec<DroppedBlock>,
}

impl ImportReport {
    pub fn questions_count(&self) -> usize {
        self.questions.len()
    }
}

/// 导入流程
///
/// - 编排 提取 → 解析 → 校验 → 入库
/// - 不持有数据库连接的生命周期（由调用方打开和关闭）
/// - 每次调用使用独立的解析状态，可以并发运行
#[derive(Clone)]
pub struct ImportFlow {
    parser: Arc<QuestionParser>,
    persister: Arc<BulkPersister>,
    warn_writer: Arc<WarnWriter>,
    extractor: Option<Arc<dyn TextExtractor>>,
    verbose_logging: bool,
}

impl ImportFlow {
    /// 创建新的导入流程
    pub fn new(store: Arc<dyn QuestionStore>, config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            parser: Arc::new(QuestionParser::new()?),
            persister: Arc::new(BulkPersister::new(store)),
            warn_writer: Arc::new(WarnWriter::with_path(config.warn_file_path.clone())),
            extractor: None,
            verbose_logging: config.verbose_logging,
        })
    }

    /// 固定使用指定的提取器（默认按扩展名选择）
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// 完整导入：解析并整批入库
    pub async fn run(&self, ctx: &ImportCtx) -> ImportResult<ImportReport> {
        let report = self.parse_source(ctx).await?;
        self.report_dropped(ctx, &report.dropped).await;

        info!("{} 💾 正在入库 {} 道题目...", ctx, report.records.len());
        let (questions, persisted) = self.persist_blocking(report.records).await?;
        info!("{} ✓ 入库完成: {} 道题目", ctx, persisted.len());

        Ok(ImportReport {
            source: ctx.file_name(),
            questions,
            persisted,
            dropped: report.dropped,
        })
    }

    /// 只解析不入库
    pub async fn dry_run(&self, ctx: &ImportCtx) -> ImportResult<ImportReport> {
        let report = self.parse_source(ctx).await?;
        self.report_dropped(ctx, &report.dropped).await;

        Ok(ImportReport {
            source: ctx.file_name(),
            questions: report.records,
            persisted: Vec::new(),
            dropped: report.dropped,
        })
    }

    /// 导入人工复核过的 TOML 试卷，调用方的元数据覆盖文件中的元数据
    pub async fn import_reviewed(&self, paper: ExamPaper, ctx: &ImportCtx) -> ImportResult<ImportReport> {
        let records: Vec<QuestionRecord> = paper
            .questions
            .into_iter()
            .map(|record| record.with_metadata(&ctx.metadata))
            .collect();

        info!("{} 💾 正在入库复核后的 {} 道题目...", ctx, records.len());
        let (questions, persisted) = self.persist_blocking(records).await?;

        Ok(ImportReport {
            source: ctx.file_name(),
            questions,
            persisted,
            dropped: Vec::new(),
        })
    }

    /// 读取源文件并解析
    pub async fn parse_source(&self, ctx: &ImportCtx) -> ImportResult<ParseReport> {
        info!("{} 📄 正在读取文件...", ctx);

        let bytes = tokio::fs::read(&ctx.source)
            .await
            .map_err(|e| ImportError::source_unavailable(ctx.source.display().to_string(), e))?;

        let extractor = self
            .extractor
            .clone()
            .unwrap_or_else(|| extractor_for(&ctx.source));
        let parser = self.parser.clone();
        let metadata = ctx.metadata.clone();

        let (line_count, report) = tokio::task::spawn_blocking(move || {
            parse_bytes(extractor.as_ref(), &parser, &bytes, &metadata)
        })
        .await
        .map_err(|e| ImportError::TaskFailed(e.to_string()))??;

        info!(
            "{} ✓ 解析完成: {} 行文本, {} 道题目, 丢弃 {} 个题目块",
            ctx,
            line_count,
            report.records.len(),
            report.dropped.len()
        );

        if line_count > 0 && report.records.is_empty() {
            warn!(
                "{} ⚠️ 未识别到任何题目，文档格式可能不受支持（需要 `N.` / `A.`-`D.` / `Answer:` 格式）",
                ctx
            );
        }

        if self.verbose_logging {
            for (i, record) in report.records.iter().enumerate() {
                debug!(
                    "{}   {}. {} [答案: {}]",
                    ctx,
                    i + 1,
                    truncate_text(&record.question_text, 80),
                    record.correct_index
                );
            }
        }

        Ok(report)
    }

    async fn persist_blocking(
        &self,
        records: Vec<QuestionRecord>,
    ) -> ImportResult<(Vec<QuestionRecord>, Vec<PersistedQuestion>)> {
        let persister = self.persister.clone();
        tokio::task::spawn_blocking(move || -> ImportResult<_> {
            let persisted = persister.persist(&records)?;
            Ok((records, persisted))
        })
        .await
        .map_err(|e| ImportError::TaskFailed(e.to_string()))?
    }

    async fn report_dropped(&self, ctx: &ImportCtx, dropped: &[DroppedBlock]) {
        if dropped.is_empty() {
            return;
        }

        warn!("{} ⚠️ {} 个题目块没有识别到选项，已写入警告文件", ctx, dropped.len());
        if let Err(e) = self.warn_writer.write(&ctx.file_name(), dropped).await {
            warn!("{} ⚠️ 写入警告文件失败: {}", ctx, e);
        }
    }
}

/// 提取文本并解析，返回 (行数, 解析结果)
fn parse_bytes(
    extractor: &dyn TextExtractor,
    parser: &QuestionParser,
    bytes: &[u8],
    metadata: &Metadata,
) -> ImportResult<(usize, ParseReport)> {
    let text = extractor.extract_text(bytes)?;
    let lines = split_lines(&text);
    let report = parser.parse_with_report(&lines, metadata);
    Ok((lines.len(), report))
}
