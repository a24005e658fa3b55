//! 队列进度与 ETA
//!
//! 纯计算，不缓存：每个倒计时刻度和每次任务状态变化都重新计算。

use std::time::Duration;

use serde::Serialize;

/// 当前队列状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// 当前任务下标（从 0 开始）
    pub current_index: usize,
    pub total: usize,
    /// 冷却剩余秒数
    pub cooldown_remaining: u64,
    /// 预计剩余秒数
    pub eta_seconds: u64,
}

impl QueueStatus {
    /// 面向展示的序号（从 1 开始）
    pub fn position(&self) -> usize {
        self.current_index + 1
    }
}

/// 进度计算参数
#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter {
    per_job_estimate: Duration,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(per_job_estimate: Duration, interval: Duration) -> Self {
        Self {
            per_job_estimate,
            interval,
        }
    }

    pub fn status(&self, job_index: usize, total: usize, cooldown_remaining: u64) -> QueueStatus {
        QueueStatus {
            current_index: job_index,
            total,
            cooldown_remaining,
            eta_seconds: eta(
                job_index,
                total,
                cooldown_remaining,
                self.per_job_estimate.as_secs(),
                self.interval.as_secs(),
            ),
        }
    }
}

/// `eta = cooldown_remaining + (total - 1 - job_index) * interval + per_job_estimate`
pub fn eta(job_index: usize, total: usize, cooldown_remaining: u64, per_job_estimate: u64, interval: u64) -> u64 {
    let remaining_jobs = total.saturating_sub(1).saturating_sub(job_index) as u64;
    cooldown_remaining
        .saturating_add(remaining_jobs.saturating_mul(interval))
        .saturating_add(per_job_estimate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eta_formula() {
        // 3 张，第 1 张冷却还剩 40 秒
        assert_eq!(eta(1, 3, 40, 30, 65), 40 + 65 + 30);
        // 最后一张
        assert_eq!(eta(2, 3, 0, 30, 65), 30);
        // 第一张没有冷却
        assert_eq!(eta(0, 3, 0, 30, 65), 2 * 65 + 30);
    }

    #[test]
    fn test_eta_does_not_underflow() {
        assert_eq!(eta(5, 3, 0, 30, 65), 30);
        assert_eq!(eta(0, 0, 0, 30, 65), 30);
    }

    #[test]
    fn test_reporter_recomputes_each_tick() {
        let reporter = ProgressReporter::new(Duration::from_secs(30), Duration::from_secs(65));
        let a = reporter.status(1, 3, 10);
        let b = reporter.status(1, 3, 9);
        assert_eq!(a.eta_seconds - b.eta_seconds, 1);
        assert_eq!(a.position(), 2);
        assert_eq!(b.cooldown_remaining, 9);
    }
}
