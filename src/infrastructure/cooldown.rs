//! 冷却闸门
//!
//! 每秒倒计时一次并回调剩余秒数，等待期间随时可以被取消令牌打断。
//! 只负责"等"，是否需要等由编排层决定（批次的第一次调用不经过闸门）。

use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep_until, Instant};

use crate::infrastructure::cancel::CancelToken;

/// 等待被取消
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("冷却等待已被取消")]
pub struct Cancelled;

/// 可取消的倒计时器
#[derive(Debug, Clone)]
pub struct CooldownGate {
    tick: Duration,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::with_tick(Duration::from_secs(1))
    }

    pub fn with_tick(tick: Duration) -> Self {
        Self { tick }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// 把时长换算成倒计时秒数（向上取整）
    pub fn seconds_for(interval: Duration) -> u64 {
        let secs = interval.as_secs();
        if interval.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    /// 倒计时 `seconds` 个刻度
    ///
    /// 每个刻度开始时回调剩余数，结束时回调一次 0。
    /// 取消后在当前刻度内返回 `Err(Cancelled)`，不再回调。
    pub async fn wait(
        &self,
        seconds: u64,
        cancel: &CancelToken,
        mut on_tick: impl FnMut(u64),
    ) -> Result<(), Cancelled> {
        let start = Instant::now();

        for elapsed in 0..seconds {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            on_tick(seconds - elapsed);

            // 按绝对截止时间睡眠，回调耗时不会累积成漂移
            let deadline = start + self.tick * (elapsed as u32 + 1);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Cancelled),
                _ = sleep_until(deadline) => {}
            }
        }

        if cancel.is_cancelled() {
            return Err(Cancelled);
        }
        on_tick(0);
        Ok(())
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new()
    }
}
