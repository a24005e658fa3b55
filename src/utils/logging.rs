use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

use crate::models::job::{BatchSummary, JobStatus};

/// 初始化日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n幻灯片生成日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `min_interval_secs`: 两次调用之间的最小间隔
/// - `max_retries`: 过载时的最大重试次数
pub fn log_startup(min_interval_secs: u64, max_retries: u32) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 串行幻灯片生成模式");
    info!("⏱️ 调用间隔: {} 秒 | 最大重试: {} 次", min_interval_secs, max_retries);
    info!("{}", "=".repeat(60));
}

/// 记录幻灯片规划结果
pub fn log_deck_loaded(total: usize, min_interval_secs: u64, has_template: bool) {
    info!("✓ 共规划 {} 张幻灯片", total);
    info!(
        "📋 将逐张生成，每张之间至少间隔 {} 秒",
        min_interval_secs
    );
    if has_template {
        info!("🖼️ 使用用户模版作为所有幻灯片的参考图\n");
    } else {
        info!("🖼️ 第 1 张成功后将作为后续幻灯片的参考图\n");
    }
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &BatchSummary, output_dir: &str, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.succeeded, summary.total());
    info!("❌ 失败: {}", summary.failed);
    if summary.cancelled {
        info!("⏹️ 已取消，未执行: {}", summary.not_attempted);
    }
    info!("🔁 外部调用总次数: {}", summary.total_attempts);
    for (index, job) in summary.jobs.iter().enumerate() {
        if job.status == JobStatus::Failed {
            info!(
                "   - 第 {} 张 (ID#{}): {}",
                index + 1,
                job.id,
                job.error_note.as_deref().unwrap_or("unknown_error")
            );
        }
    }
    info!("{}", "=".repeat(60));
    info!("\n图片已保存至: {}", output_dir);
    info!("日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
