//! 日志初始化

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化 tracing 日志
///
/// 默认级别 `info`，可通过 `RUST_LOG` 覆盖；`verbose` 为真时默认级别改为 `debug`。
/// 重复初始化（例如测试中）会被忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
