//! 导入上下文
//!
//! 封装"我正在导入哪个文件、用什么元数据"这一信息

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::models::Metadata;

/// 导入上下文
#[derive(Debug, Clone)]
pub struct ImportCtx {
    /// 源文件路径
    pub source: PathBuf,

    /// 批次元数据
    pub metadata: Metadata,

    /// 文件序号（仅用于日志显示，从 1 开始）
    pub file_index: usize,
}

impl ImportCtx {
    pub fn new(source: impl Into<PathBuf>, metadata: Metadata) -> Self {
        Self {
            source: source.into(),
            metadata,
            file_index: 1,
        }
    }

    pub fn with_index(mut self, file_index: usize) -> Self {
        self.file_index = file_index;
        self
    }

    /// 源文件名（不含目录）
    pub fn file_name(&self) -> String {
        file_name_of(&self.source)
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}

impl Display for ImportCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文件 #{} {} | {} {} {}]",
            self.file_index,
            self.file_name(),
            self.metadata.exam,
            self.metadata.year,
            self.metadata.topic
        )
    }
}
