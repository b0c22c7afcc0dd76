use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// 配置文件路径环境变量
pub const CONFIG_FILE_ENV: &str = "EXAM_IMPORT_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite 数据库文件
    pub database_path: String,
    /// 上传文件暂存目录
    pub uploads_dir: String,
    /// HTTP 服务监听地址
    pub bind_addr: String,
    /// 单个上传文件大小上限（字节）
    pub max_upload_bytes: usize,
    /// 目录批量导入时同时处理的文件数量
    pub max_concurrent_imports: usize,
    /// 无法识别的题目块写入的文件
    pub warn_file_path: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "questions.db".to_string(),
            uploads_dir: "uploads".to_string(),
            bind_addr: "127.0.0.1:5000".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
            max_concurrent_imports: 4,
            warn_file_path: "warn.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::with_env_overrides(Self::default())
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    /// 先读取 `EXAM_IMPORT_CONFIG` 指向的配置文件（如果有），再应用环境变量
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => Ok(Self::with_env_overrides(Self::from_file(Path::new(&path))?)),
            Err(_) => Ok(Self::from_env()),
        }
    }

    fn with_env_overrides(base: Self) -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or(base.database_path),
            uploads_dir: std::env::var("UPLOADS_DIR").unwrap_or(base.uploads_dir),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(base.bind_addr),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_upload_bytes),
            max_concurrent_imports: std::env::var("MAX_CONCURRENT_IMPORTS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_concurrent_imports),
            warn_file_path: std::env::var("WARN_FILE_PATH").unwrap_or(base.warn_file_path),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(base.verbose_logging),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_path = \"/tmp/exam.db\"").unwrap();
        writeln!(file, "max_concurrent_imports = 8").unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.database_path, "/tmp/exam.db");
        assert_eq!(config.max_concurrent_imports, 8);
        assert_eq!(config.uploads_dir, "uploads");
        assert_eq!(config.warn_file_path, "warn.txt");
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_upload_bytes = \"lots\"").unwrap();

        assert!(Config::from_file(file.path()).is_err());
    }
}
