//! 日志初始化
//!
//! 优先使用 `RUST_LOG`，否则默认 info 级别

use tracing_subscriber::EnvFilter;

/// 初始化全局日志（默认 info 级别）
pub fn init() {
    init_with_verbose(false);
}

/// 初始化全局日志，`verbose` 为 true 时默认 debug 级别
///
/// 重复调用是安全的（测试中会多次调用）
pub fn init_with_verbose(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
