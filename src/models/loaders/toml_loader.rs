use crate::models::paper::ExamPaper;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 将试卷解析结果写入 TOML 文件
pub async fn save_paper_toml(paper: &ExamPaper, toml_file_path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(paper)
        .with_context(|| format!("无法序列化试卷: {}", toml_file_path.display()))?;

    if let Some(parent) = toml_file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("无法创建目录: {}", parent.display()))?;
        }
    }

    fs::write(toml_file_path, content)
        .await
        .with_context(|| format!("无法写入TOML文件: {}", toml_file_path.display()))?;

    Ok(())
}

/// 从 TOML 文件加载复核后的试卷
pub async fn load_paper_toml(toml_file_path: &Path) -> Result<ExamPaper> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let paper: ExamPaper = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    tracing::info!("成功加载 {} 个题目", paper.questions.len());

    Ok(paper)
}
