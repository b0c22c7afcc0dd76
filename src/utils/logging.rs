/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

/// 记录程序启动信息
///
/// # 参数
/// - `mode`: 运行模式描述
/// - `database_path`: 数据库路径
pub fn log_startup(mode: &str, database_path: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    info!("🗄️ 数据库: {}", database_path);
    info!("{}", "=".repeat(60));
}

/// 记录单个文件导入开始
///
/// # 参数
/// - `source`: 源文件路径
/// - `exam`: 考试名称
/// - `year`: 年份
/// - `topic`: 主题
pub fn log_import_start(source: &str, exam: &str, year: &str, topic: &str) {
    info!("📥 正在导入: {}", source);
    info!("📋 考试: {} | 年份: {} | 主题: {}", exam, year, topic);
}

/// 记录单个文件导入完成
///
/// # 参数
/// - `source`: 源文件名
/// - `parsed`: 解析出的题目数
/// - `persisted`: 入库的题目数
pub fn log_import_complete(source: &str, parsed: usize, persisted: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✅ {} 导入完成: 解析 {} 道, 入库 {} 道", source, parsed, persisted);
    info!("{}", "─".repeat(60));
}

/// 记录目录批量导入开始
///
/// # 参数
/// - `total`: 文件总数
/// - `max_concurrent`: 最大并发数
pub fn log_files_found(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待导入的文件", total);
    info!("📋 最多同时导入 {} 个文件\n", max_concurrent);
}

/// 打印批量导入最终统计
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `questions`: 入库题目总数
pub fn log_batch_summary(success: usize, failed: usize, questions: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部导入完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, success + failed);
    info!("❌ 失败: {}", failed);
    info!("📝 题目总数: {}", questions);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars_not_bytes() {
        assert_eq!(truncate_text("心脏病学", 2), "心脏...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
