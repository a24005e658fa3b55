//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批次调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 文本分析，构建批次
//! - Ctrl-C 取消
//! - 输出结果和全局统计
//!
//! ### `deck_processor` - 批次编排器
//! - 逐张处理幻灯片（严格串行）
//! - 冷却、参考图、重试、失败隔离
//! - 通过 `BatchObserver` 报告进度
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (App)
//!     ↓
//! deck_processor (Orchestrator，处理 Vec<SlideJob>)
//!     ↓
//! workflow (reference / retry / progress)
//!     ↓
//! services (能力层：analysis / generator / output)
//!     ↓
//! infrastructure (基础设施：CooldownGate / CancelToken)
//! ```

pub mod batch_processor;
pub mod deck_processor;
pub mod observer;

// 重新导出主要类型
pub use batch_processor::App;
pub use deck_processor::Orchestrator;
pub use observer::{BatchObserver, NoopObserver, TracingObserver};
