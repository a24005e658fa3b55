//! 流程层：单个任务如何被重试、用什么参考图、进度如何计算

pub mod job_ctx;
pub mod progress;
pub mod reference;
pub mod retry;

pub use job_ctx::JobCtx;
pub use progress::{ProgressReporter, QueueStatus};
pub use reference::{FirstImageCache, ReferenceSource, ResolvedReference};
pub use retry::{classify, Classify, ErrorKind, Retried, RetryFailure, RetryPolicy};
