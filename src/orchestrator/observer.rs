//! 批次观察者
//!
//! 编排器通过它对外报告进度，不依赖任何具体的展示方式。

use tracing::{debug, info};

use crate::models::job::{BatchSummary, JobStatus, SlideJob};
use crate::workflow::progress::QueueStatus;

/// 批次事件的接收方
///
/// 所有回调都在编排任务内同步调用，实现方不应阻塞。
pub trait BatchObserver: Send + Sync {
    /// 队列状态变化；`None` 表示批次结束，进度清空
    fn on_progress(&self, _status: Option<&QueueStatus>) {}

    /// 某个任务的状态发生变化
    fn on_job_update(&self, _index: usize, _job: &SlideJob) {}

    /// 批次结束（正常结束或被取消）
    fn on_batch_complete(&self, _summary: &BatchSummary) {}
}

/// 不做任何事的观察者
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// 把事件写入 tracing 日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn on_progress(&self, status: Option<&QueueStatus>) {
        let Some(status) = status else {
            debug!("队列进度已清空");
            return;
        };

        // 倒计时每 10 秒打印一次，避免刷屏
        if status.cooldown_remaining > 0 && status.cooldown_remaining % 10 != 0 {
            return;
        }

        if status.cooldown_remaining > 0 {
            info!(
                "⏳ 第 {}/{} 张冷却中，剩余 {} 秒，预计还需 {} 秒",
                status.position(),
                status.total,
                status.cooldown_remaining,
                status.eta_seconds
            );
        } else {
            debug!(
                "第 {}/{} 张，预计还需 {} 秒",
                status.position(),
                status.total,
                status.eta_seconds
            );
        }
    }

    fn on_job_update(&self, index: usize, job: &SlideJob) {
        match success_message(index, job) {
            Some(message) => info!("{}", message),
            None => debug!("[幻灯片 {} ID#{}] 状态: {}", index + 1, job.id, job.status),
        }
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        info!(
            "🏁 批次结束: 成功 {} / 失败 {} / 未执行 {}{}",
            summary.succeeded,
            summary.failed,
            summary.not_attempted,
            if summary.cancelled { "（已取消）" } else { "" }
        );
    }
}

/// 成功时的提示；失败已由编排器以 warn 级别记录，这里不再重复
fn success_message(index: usize, job: &SlideJob) -> Option<String> {
    (job.status == JobStatus::Succeeded).then(|| {
        format!(
            "[幻灯片 {} ID#{}] ✅ 生成成功（尝试 {} 次）",
            index + 1,
            job.id,
            job.attempts
        )
    })
}
