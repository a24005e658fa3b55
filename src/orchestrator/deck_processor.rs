//! 幻灯片批次处理器 - 编排层
//!
//! ## 职责
//!
//! 逐张处理一个批次的全部幻灯片，是批次级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **严格串行**：同一时刻最多只有一个外部调用
//! 2. **冷却间隔**：第 i 张（i > 0）开始前等待最小间隔，每秒报告一次倒计时
//! 3. **参考图**：委托 `workflow::reference` 选择参考图，首张成功图片写入缓存
//! 4. **重试**：委托 `RetryPolicy` 决定是否重试
//! 5. **失败隔离**：单张失败只标记该任务，继续处理下一张
//! 6. **取消**：每张开始前、每个冷却刻度和每次重试退避都检查取消令牌

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::GenerationError;
use crate::infrastructure::{CancelToken, CooldownGate};
use crate::models::image::SlideImage;
use crate::models::job::{BatchContext, BatchSummary, JobStatus, SlideJob};
use crate::orchestrator::observer::BatchObserver;
use crate::services::generator::{GenerationRequest, ImageGenerator};
use crate::workflow::job_ctx::JobCtx;
use crate::workflow::progress::ProgressReporter;
use crate::workflow::reference::{self, FirstImageCache};
use crate::workflow::retry::{RetryFailure, RetryPolicy, Retried};

/// 重试退避期间被取消的任务备注
pub const CANCELLED_NOTE: &str = "cancelled";

/// 批次编排器
///
/// 只持有能力（生成器、重试策略、冷却闸门），不持有任何批次状态；
/// 每次 `run` 都从一个新的 `BatchContext` 开始。
pub struct Orchestrator {
    generator: Arc<dyn ImageGenerator>,
    retry_policy: RetryPolicy,
    per_job_estimate: Duration,
    gate: CooldownGate,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn ImageGenerator>, retry_policy: RetryPolicy, per_job_estimate: Duration) -> Self {
        Self {
            generator,
            retry_policy,
            per_job_estimate,
            gate: CooldownGate::new(),
        }
    }

    /// 按配置创建
    pub fn from_config(generator: Arc<dyn ImageGenerator>, config: &Config) -> Self {
        let retry_policy = RetryPolicy::new(
            config.max_transient_retries,
            config.initial_backoff(),
            config.backoff_jitter(),
        );
        Self::new(generator, retry_policy, config.per_job_estimate())
    }

    /// 替换冷却闸门（测试中可以缩短刻度）
    pub fn with_gate(mut self, gate: CooldownGate) -> Self {
        self.gate = gate;
        self
    }

    /// 处理整个批次
    ///
    /// 单张失败不会中断批次；只有取消会提前结束，未开始的任务保持 `Pending`。
    pub async fn run(
        &self,
        mut batch: BatchContext,
        observer: &dyn BatchObserver,
        cancel: &CancelToken,
    ) -> BatchSummary {
        let total = batch.total();
        let reporter = ProgressReporter::new(self.per_job_estimate, batch.min_interval);
        let cooldown_secs = CooldownGate::seconds_for(batch.min_interval);
        let mut first_image = FirstImageCache::new();
        let mut cancelled = false;

        log_batch_start(total, cooldown_secs, batch.user_template.is_some());

        for index in 0..total {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let ctx = JobCtx::new(batch.jobs[index].id.clone(), index, total);

            // ========== 1. 冷却 ==========
            set_status(&mut batch.jobs[index], index, JobStatus::Waiting, observer);
            observer.on_progress(Some(&reporter.status(index, total, 0)));

            if index > 0 {
                log_cooldown(&ctx, cooldown_secs);
                let waited = self
                    .gate
                    .wait(cooldown_secs, cancel, |remaining| {
                        observer.on_progress(Some(&reporter.status(index, total, remaining)));
                    })
                    .await;

                if waited.is_err() {
                    warn!("{} ⏹️ 冷却期间收到取消，停止批次", ctx);
                    set_status(&mut batch.jobs[index], index, JobStatus::Pending, observer);
                    cancelled = true;
                    break;
                }
            }

            // ========== 2. 调用 ==========
            set_status(&mut batch.jobs[index], index, JobStatus::Requesting, observer);
            observer.on_progress(Some(&reporter.status(index, total, 0)));

            let outcome = self
                .generate_one(&batch, index, first_image.get(), &ctx, cancel)
                .await;

            // ========== 3. 记录结果 ==========
            let job = &mut batch.jobs[index];
            match outcome {
                Ok(Retried { value, attempts }) => {
                    job.attempts = attempts;
                    if first_image.store(index, batch.user_template.is_some(), &value) {
                        info!("{} 📌 已缓存为后续幻灯片的参考图", ctx);
                    }
                    job.image = Some(value);
                    job.error_note = None;
                    job.status = JobStatus::Succeeded;
                }
                Err(RetryFailure {
                    kind,
                    attempts,
                    error,
                    cancelled: true,
                }) => {
                    warn!("{} ⏹️ 重试等待期间收到取消，停止批次（最后错误 [{}]: {}）", ctx, kind, error);
                    job.attempts = attempts;
                    job.image = None;
                    job.error_note = Some(CANCELLED_NOTE.to_string());
                    job.status = JobStatus::Failed;
                    cancelled = true;
                }
                Err(RetryFailure {
                    kind,
                    attempts,
                    error,
                    cancelled: false,
                }) => {
                    warn!("{} ❌ {}: {}", ctx, kind.user_message(), error);
                    job.attempts = attempts;
                    job.image = None;
                    job.error_note = Some(kind.note().to_string());
                    job.status = JobStatus::Failed;
                }
            }
            observer.on_job_update(index, job);

            if cancelled {
                break;
            }
        }

        observer.on_progress(None);

        let summary = BatchSummary::from_jobs(batch.jobs, cancelled);
        observer.on_batch_complete(&summary);
        summary
    }

    /// 为第 `index` 张解析参考图并带重试地调用生成器
    async fn generate_one(
        &self,
        batch: &BatchContext,
        index: usize,
        cached_first_image: Option<&SlideImage>,
        ctx: &JobCtx,
        cancel: &CancelToken,
    ) -> Result<Retried<SlideImage>, RetryFailure<GenerationError>> {
        let resolved = reference::resolve(batch, index, cached_first_image);
        match &resolved {
            Some(reference) => info!("{} 🎨 开始生成（参考图: {}）", ctx, reference.source),
            None => info!("{} 🎨 开始生成（无参考图）", ctx),
        }

        let request = GenerationRequest {
            prompt: &batch.jobs[index].prompt,
            style: &batch.global_style,
            reference: resolved.map(|r| r.image),
            language_hint: batch.language_hint.as_deref(),
        };

        let generator = self.generator.as_ref();
        self.retry_policy
            .execute_until(cancel, move || generator.generate(request))
            .await
    }
}

fn set_status(job: &mut SlideJob, index: usize, status: JobStatus, observer: &dyn BatchObserver) {
    job.status = status;
    observer.on_job_update(index, job);
}

// ========== 日志辅助函数 ==========

fn log_batch_start(total: usize, cooldown_secs: u64, has_template: bool) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始生成 {} 张幻灯片", total);
    info!(
        "⏱️ 调用间隔 {} 秒 | 参考模版: {}",
        cooldown_secs,
        if has_template { "用户模版" } else { "首张幻灯片" }
    );
    info!("{}", "=".repeat(60));
}

fn log_cooldown(ctx: &JobCtx, cooldown_secs: u64) {
    info!("{} ⏳ 冷却 {} 秒后开始", ctx, cooldown_secs);
}
