use thiserror::Error;

/// 导入流程错误类型
///
/// 题目内容格式不规范不会产生错误（解析器会降级处理），
/// 只有源文件、文本提取、批量校验和存储层的问题才会向上传播。
#[derive(Debug, Error)]
pub enum ImportError {
    /// 源文件不存在或无法读取
    #[error("文件不存在或无法读取: {path}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// PDF 文本提取失败
    #[error("PDF文本提取失败: {0}")]
    Extraction(String),

    /// 批量校验失败（任一题目不满足不变量，整批拒绝）
    #[error("Invalid question format at index {index}: {reason}")]
    Validation { index: usize, reason: String },

    /// 存储层错误，原样传播
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// 后台任务异常终止
    #[error("导入任务异常终止: {0}")]
    TaskFailed(String),
}

/// 存储层错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 数据库操作失败
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    /// 存储层自身的格式约束（与解析器的校验相互独立）
    #[error("Question validation failed at index {index}: {reason}")]
    SchemaViolation { index: usize, reason: String },

    /// 选项序列化失败
    #[error("选项序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 连接锁被毒化（持锁线程 panic）
    #[error("数据库连接锁已失效")]
    LockPoisoned,
}

impl ImportError {
    /// 创建源文件不可用错误
    pub fn source_unavailable(path: impl Into<String>, source: std::io::Error) -> Self {
        ImportError::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    /// 创建批量校验错误
    pub fn validation(index: usize, reason: impl Into<String>) -> Self {
        ImportError::Validation {
            index,
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 导入流程结果类型
pub type ImportResult<T> = Result<T, ImportError>;

/// 存储层结果类型
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_is_propagated_verbatim() {
        let storage = StorageError::SchemaViolation {
            index: 2,
            reason: "Each question must have exactly 4 options".to_string(),
        };
        let expected = storage.to_string();

        let err: ImportError = storage.into();
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_validation_message_names_index() {
        let err = ImportError::validation(3, "options length 2");
        assert!(err.to_string().contains("index 3"));
    }
}
