//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力：记录因格式不受支持而被丢弃的题目块

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::services::question_parser::DroppedBlock;

/// 警告写入服务
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 使用指定文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    /// 追加写入被丢弃的题目块
    ///
    /// # 参数
    /// - `source`: 来源文件名
    /// - `blocks`: 被丢弃的题目块
    pub async fn write(&self, source: &str, blocks: &[DroppedBlock]) -> Result<()> {
        if blocks.is_empty() {
            return Ok(());
        }

        debug!("写入警告: {} | {} 个题目块", source, blocks.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await
            .with_context(|| format!("无法打开警告文件: {}", self.warn_file_path))?;

        let mut warn_msg = String::new();
        for block in blocks {
            warn_msg.push_str(&format!(
                "文件 {} | 第 {} 行 | 未识别到选项: {}\n",
                source, block.line_number, block.text
            ));
        }

        file.write_all(warn_msg.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
