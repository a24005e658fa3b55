//! 任务处理上下文
//!
//! 封装"我正在处理第几张幻灯片"这一信息，只用于日志

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct JobCtx {
    /// 幻灯片 ID
    pub slide_id: String,

    /// 任务下标（从 0 开始）
    pub job_index: usize,

    /// 批次任务总数
    pub total: usize,
}

impl JobCtx {
    pub fn new(slide_id: impl Into<String>, job_index: usize, total: usize) -> Self {
        Self {
            slide_id: slide_id.into(),
            job_index,
            total,
        }
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[幻灯片 {}/{} ID#{}]",
            self.job_index + 1,
            self.total,
            self.slide_id
        )
    }
}
