use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use exam_question_import::config::Config;
use exam_question_import::infrastructure::SqliteQuestionStore;
use exam_question_import::logger;
use exam_question_import::models::{load_paper_toml, save_paper_toml, ExamPaper, Metadata};
use exam_question_import::orchestrator::BatchImporter;
use exam_question_import::utils::logging::{log_import_complete, log_import_start, log_startup};
use exam_question_import::workflow::{ImportCtx, ImportFlow};

/// 从试卷 PDF 中提取选择题并导入题库
#[derive(Debug, Parser)]
#[command(name = "import_questions", version)]
struct Cli {
    /// PDF 文件（也接受 .txt、复核后的 .toml，或包含 .pdf/.txt 的目录）
    pdf_path: PathBuf,

    /// 考试名称
    exam: String,

    /// 年份
    year: String,

    /// 主题（默认 General）
    topic: Option<String>,

    /// 数据库文件，覆盖配置中的 database_path
    #[arg(long, value_name = "PATH")]
    db: Option<String>,

    /// 只解析不入库
    #[arg(long)]
    dry_run: bool,

    /// 把解析结果写入 TOML 文件，供人工复核后重新导入
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    // 加载配置
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            logger::init();
            error!("❌ 配置加载失败: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // 初始化日志
    logger::init_with_verbose(config.verbose_logging);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ 导入失败: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, mut config: Config) -> Result<()> {
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if cli.export.is_some() && cli.pdf_path.is_dir() {
        bail!("--export 只支持单个文件");
    }

    let metadata = Metadata::new(cli.exam, cli.year, cli.topic);
    let mode = if cli.dry_run { "试运行（不入库）" } else { "试卷导入" };
    log_startup(mode, &config.database_path);

    // dry run 不触碰数据库文件
    let store = if cli.dry_run {
        SqliteQuestionStore::in_memory()?
    } else {
        SqliteQuestionStore::connect(&config.database_path)
            .with_context(|| format!("无法打开数据库: {}", config.database_path))?
    };
    let store = Arc::new(store);
    let flow = ImportFlow::new(store.clone(), &config)?;

    let result = if cli.pdf_path.is_dir() {
        BatchImporter::new(flow.clone(), config.max_concurrent_imports)
            .dry_run(cli.dry_run)
            .import_dir(&cli.pdf_path, &metadata)
            .await
            .and_then(|stats| {
                if stats.failed > 0 {
                    bail!("{} 个文件导入失败", stats.failed);
                }
                Ok(())
            })
    } else {
        import_file(&flow, &cli.pdf_path, metadata, cli.dry_run, cli.export.as_deref()).await
    };

    drop(flow);

    // 所有 ImportFlow 都已释放，这里是唯一的持有者
    match Arc::try_unwrap(store) {
        Ok(store) => store.close()?,
        Err(_) => warn!("⚠️ 数据库连接仍被占用，跳过显式关闭"),
    }

    result
}

async fn import_file(
    flow: &ImportFlow,
    source: &Path,
    metadata: Metadata,
    dry_run: bool,
    export: Option<&Path>,
) -> Result<()> {
    log_import_start(
        &source.display().to_string(),
        &metadata.exam,
        &metadata.year,
        &metadata.topic,
    );
    let ctx = ImportCtx::new(source, metadata);

    let is_reviewed = source
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let report = if is_reviewed {
        let paper = load_paper_toml(source).await?;
        info!("✓ 读取复核文件: {} 道题目", paper.questions.len());
        if dry_run {
            info!("试运行模式，跳过入库");
            return Ok(());
        }
        flow.import_reviewed(paper, &ctx).await?
    } else if dry_run {
        flow.dry_run(&ctx).await?
    } else {
        flow.run(&ctx).await?
    };

    info!("Found {} questions in the PDF", report.questions_count());

    if let Some(path) = export {
        let paper = ExamPaper::new(&ctx.metadata, Some(report.source.clone()), report.questions.clone());
        save_paper_toml(&paper, path).await?;
        info!("📝 已导出 {} 道题目到 {}", paper.questions.len(), path.display());
    }

    log_import_complete(&report.source, report.questions_count(), report.persisted.len());
    Ok(())
}
