//! 生成任务与批次模型

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::models::image::SlideImage;
use crate::models::slide::{PresentationAnalysis, SlideDescriptor};

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 尚未开始
    Pending,
    /// 冷却等待中
    Waiting,
    /// 外部调用进行中
    Requesting,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// 是否已有最终结果
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    pub fn name(self) -> &'static str {
        match self {
            JobStatus::Pending => "待处理",
            JobStatus::Waiting => "冷却中",
            JobStatus::Requesting => "生成中",
            JobStatus::Succeeded => "成功",
            JobStatus::Failed => "失败",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 单张幻灯片的生成任务
///
/// 只由 `Orchestrator` 在批次内修改。
#[derive(Debug, Clone, Serialize)]
pub struct SlideJob {
    pub id: String,
    pub prompt: String,
    pub status: JobStatus,
    #[serde(skip)]
    pub image: Option<SlideImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_note: Option<String>,
    /// 外部调用尝试次数（含重试）
    pub attempts: u32,
}

impl SlideJob {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            status: JobStatus::Pending,
            image: None,
            error_note: None,
            attempts: 0,
        }
    }
}

impl From<&SlideDescriptor> for SlideJob {
    fn from(slide: &SlideDescriptor) -> Self {
        SlideJob::new(slide.id.clone(), slide.visual_prompt.clone())
    }
}

/// 一个批次的只读上下文
///
/// 除任务状态外，创建后不再修改。
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub jobs: Vec<SlideJob>,
    pub global_style: String,
    pub language_hint: Option<String>,
    /// 用户上传的参考模版，设置后所有任务共用
    pub user_template: Option<SlideImage>,
    /// 两次外部调用之间的最小间隔
    pub min_interval: Duration,
}

impl BatchContext {
    pub fn new(jobs: Vec<SlideJob>, global_style: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            jobs,
            global_style: global_style.into(),
            language_hint: None,
            user_template: None,
            min_interval,
        }
    }

    /// 由分析结果构建批次
    pub fn from_analysis(analysis: &PresentationAnalysis, min_interval: Duration) -> Self {
        let jobs = analysis.slides.iter().map(SlideJob::from).collect();
        let mut batch = Self::new(jobs, analysis.global_style.clone(), min_interval);
        batch.language_hint = analysis.language_hint().map(str::to_string);
        batch
    }

    pub fn with_language_hint(mut self, language: impl Into<String>) -> Self {
        self.language_hint = Some(language.into());
        self
    }

    pub fn with_user_template(mut self, template: SlideImage) -> Self {
        self.user_template = Some(template);
        self
    }

    pub fn total(&self) -> usize {
        self.jobs.len()
    }
}

/// 单个任务的最终结果（不含图片）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_note: Option<String>,
    pub attempts: u32,
}

/// 批次结束后的汇总
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// 最终的任务列表（按原顺序）
    pub jobs: Vec<SlideJob>,
    pub succeeded: usize,
    pub failed: usize,
    /// 因取消而未开始的任务数
    pub not_attempted: usize,
    pub cancelled: bool,
    /// 所有任务的外部调用总次数
    pub total_attempts: u32,
}

impl BatchSummary {
    pub fn from_jobs(jobs: Vec<SlideJob>, cancelled: bool) -> Self {
        let count = |status: JobStatus| jobs.iter().filter(|j| j.status == status).count();
        let succeeded = count(JobStatus::Succeeded);
        let failed = count(JobStatus::Failed);
        let not_attempted = jobs.len() - succeeded - failed;
        let total_attempts = jobs.iter().map(|j| j.attempts).sum();
        Self {
            jobs,
            succeeded,
            failed,
            not_attempted,
            cancelled,
            total_attempts,
        }
    }

    pub fn total(&self) -> usize {
        self.jobs.len()
    }

    /// 已有最终结果的任务数
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn outcomes(&self) -> Vec<JobOutcome> {
        self.jobs
            .iter()
            .map(|job| JobOutcome {
                id: job.id.clone(),
                status: job.status,
                error_note: job.error_note.clone(),
                attempts: job.attempts,
            })
            .collect()
    }
}
