//! 批量导入器 - 编排层
//!
//! ## 职责
//!
//! 把一个目录下的所有试卷文件（`.pdf` / `.txt`）导入题库。
//!
//! ## 核心功能
//!
//! 1. **扫描**：按文件名排序列出待导入文件
//! 2. **并发控制**：使用 Semaphore 限制同时导入的文件数
//! 3. **隔离失败**：单个文件失败不影响其他文件，每个文件独立成批入库
//! 4. **全局统计**：汇总成功、失败和题目数量
//!
//! 单个文件的细节完全委托给 `ImportFlow`。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::models::Metadata;
use crate::utils::logging::{log_batch_summary, log_files_found};
use crate::workflow::{ImportCtx, ImportFlow};

/// 目录导入支持的扩展名
const SUPPORTED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

/// 批量导入统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// 解析出的题目总数（dry run 时也统计）
    pub questions: usize,
}

/// 批量导入器
pub struct BatchImporter {
    flow: ImportFlow,
    max_concurrent: usize,
    dry_run: bool,
}

impl BatchImporter {
    pub fn new(flow: ImportFlow, max_concurrent: usize) -> Self {
        Self {
            flow,
            max_concurrent: max_concurrent.max(1),
            dry_run: false,
        }
    }

    /// 只解析不入库
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 导入目录中的全部文件，所有文件使用同一份元数据
    pub async fn import_dir(&self, dir: &Path, metadata: &Metadata) -> Result<BatchStats> {
        info!("\n📁 正在扫描待导入的文件: {}", dir.display());
        let sources = collect_sources(dir).await?;

        if sources.is_empty() {
            warn!("⚠️ 目录中没有 .pdf 或 .txt 文件: {}", dir.display());
            return Ok(BatchStats::default());
        }

        log_files_found(sources.len(), self.max_concurrent);

        let stats = self.import_all(sources, metadata).await?;
        log_batch_summary(stats.success, stats.failed, stats.questions);

        Ok(stats)
    }

    async fn import_all(&self, sources: Vec<PathBuf>, metadata: &Metadata) -> Result<BatchStats> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(sources.len());

        for (idx, source) in sources.into_iter().enumerate() {
            let file_index = idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let flow = self.flow.clone();
            let ctx = ImportCtx::new(source, metadata.clone()).with_index(file_index);
            let dry_run = self.dry_run;

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let result = if dry_run {
                    flow.dry_run(&ctx).await
                } else {
                    flow.run(&ctx).await
                };
                if let Err(e) = &result {
                    error!("{} ❌ 导入失败: {}", ctx, e);
                }
                result
            });
            handles.push((file_index, handle));
        }

        let mut stats = BatchStats {
            total: handles.len(),
            ..Default::default()
        };

        for (file_index, handle) in handles {
            match handle.await {
                Ok(Ok(report)) => {
                    stats.success += 1;
                    stats.questions += report.questions_count();
                }
                Ok(Err(_)) => {
                    stats.failed += 1;
                }
                Err(e) => {
                    error!("[文件 #{}] 任务执行失败: {}", file_index, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}

/// 列出目录中可导入的文件（不递归，按路径排序）
pub async fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("无法读取目录: {}", dir.display()))?;

    let mut sources = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|s| ext.eq_ignore_ascii_case(s))
            });
        if supported {
            sources.push(path);
        }
    }

    sources.sort();
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::infrastructure::{QuestionFilter, QuestionStore, SqliteQuestionStore};

    fn importer(root: &Path, store: Arc<SqliteQuestionStore>) -> BatchImporter {
        let config = Config {
            warn_file_path: root.join("warn.txt").to_string_lossy().to_string(),
            ..Config::default()
        };
        let flow = ImportFlow::new(store, &config).unwrap();
        BatchImporter::new(flow, 2)
    }

    #[tokio::test]
    async fn test_collect_sources_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.PDF", "notes.md", "c.toml"] {
            tokio::fs::write(dir.path().join(name), "").await.unwrap();
        }
        tokio::fs::create_dir(dir.path().join("nested.pdf")).await.unwrap();

        let sources = collect_sources(dir.path()).await.unwrap();
        let names: Vec<_> = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.PDF", "b.txt"]);
    }

    #[tokio::test]
    async fn test_bad_file_does_not_stop_the_batch() {
        let root = tempfile::tempdir().unwrap();
        let papers = root.path().join("papers");
        tokio::fs::create_dir(&papers).await.unwrap();
        tokio::fs::write(papers.join("one.txt"), "1. Q1\nA. a\nB. b\nAnswer: B")
            .await
            .unwrap();
        tokio::fs::write(papers.join("two.txt"), "1. Q2\nA. a\n2. Q3\nA. x")
            .await
            .unwrap();
        tokio::fs::write(papers.join("broken.pdf"), "not a pdf").await.unwrap();

        let store = Arc::new(SqliteQuestionStore::in_memory().unwrap());
        let stats = importer(root.path(), store.clone())
            .import_dir(&papers, &Metadata::new("CV", "2023", None))
            .await
            .unwrap();

        assert_eq!(
            stats,
            BatchStats {
                total: 3,
                success: 2,
                failed: 1,
                questions: 3,
            }
        );
        assert_eq!(store.count(&QuestionFilter::default()).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_batch_counts_without_persisting() {
        let root = tempfile::tempdir().unwrap();
        tokio::fs::write(root.path().join("one.txt"), "1. Q1\nA. a")
            .await
            .unwrap();

        let store = Arc::new(SqliteQuestionStore::in_memory().unwrap());
        let stats = importer(root.path(), store.clone())
            .dry_run(true)
            .import_dir(root.path(), &Metadata::new("CV", "2023", None))
            .await
            .unwrap();

        assert_eq!(stats.questions, 1);
        assert_eq!(store.count(&QuestionFilter::default()).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_directory_is_not_an_error() {
        let root = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteQuestionStore::in_memory().unwrap());

        let stats = importer(root.path(), store)
            .import_dir(root.path(), &Metadata::new("CV", "2023", None))
            .await
            .unwrap();

        assert_eq!(stats, BatchStats::default());
    }
}
