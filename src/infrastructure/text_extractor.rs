//! 文本提取器 - 基础设施层
//!
//! 把源文件字节转换成纯文本，再切分成解析器需要的行序列。
//! 不认识题目，不处理业务流程。

use crate::error::{ImportError, ImportResult};
use std::path::Path;
use std::sync::Arc;

/// 文本提取能力
pub trait TextExtractor: Send + Sync {
    /// 从文件字节中提取全部文本
    fn extract_text(&self, bytes: &[u8]) -> ImportResult<String>;
}

/// 基于 `pdf-extract` 的 PDF 文本提取器
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> ImportResult<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ImportError::Extraction(e.to_string()))
    }
}

/// 已经提取好的纯文本（.txt）
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> ImportResult<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// 根据文件扩展名选择提取器，`.txt` 视为纯文本，其余按 PDF 处理
pub fn extractor_for(path: &Path) -> Arc<dyn TextExtractor> {
    let is_text = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));

    if is_text {
        Arc::new(PlainTextExtractor)
    } else {
        Arc::new(PdfTextExtractor)
    }
}

/// 按换行切分文本，去掉首尾空白并丢弃空行
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
