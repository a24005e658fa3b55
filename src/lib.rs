//! # Slide Render Queue
//!
//! 把一段文本规划成幻灯片，并在外部图像服务的配额限制下逐张生成图片
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只提供等待与取消能力
//! - `CooldownGate` - 每秒一个刻度、可取消的倒计时
//! - `CancelToken` - 批次级取消令牌
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单张幻灯片或单次分析
//! - `AnalysisService` - 文本分析能力（LLM / TOML 文件）
//! - `ImageGenerator` - 图像生成能力（Gemini）
//! - `OutputWriter` - 写图片和汇总文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张幻灯片"如何被处理
//! - `RetryPolicy` - 错误归类与有界重试
//! - `reference` - 参考图选择
//! - `ProgressReporter` - ETA 计算
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/deck_processor` - 批次编排器，严格串行
//! - `orchestrator/batch_processor` - 应用入口，分析 → 编排 → 输出
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CancelToken, CooldownGate};
pub use models::{BatchContext, BatchSummary, JobStatus, SlideImage, SlideJob};
pub use orchestrator::{App, BatchObserver, Orchestrator};
pub use services::{GenerationRequest, ImageGenerator};
pub use workflow::{ErrorKind, QueueStatus, RetryPolicy};
