//! 重试策略 - 流程层
//!
//! 先把失败归类，再决定是否重试：
//!
//! | 类别 | 识别方式 | 处理 |
//! |---|---|---|
//! | 服务过载 | 503 / `UNAVAILABLE` / "overloaded" | 指数退避 + 随机抖动，有上限 |
//! | 配额耗尽 | 429 / `RESOURCE_EXHAUSTED` / "quota" | 立即失败 |
//! | 请求非法 | 400 / `INVALID_ARGUMENT` / "aspect ratio" | 立即失败 |
//! | 未知 | 其他 | 重试一次后失败 |
//!
//! 退避等待可被取消令牌打断，取消后不再发出任何调用。

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::infrastructure::CancelToken;

/// 失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 服务暂时过载
    TransientOverload,
    /// 调用方的配额/频率限制已用尽
    QuotaExhausted,
    /// 请求参数有误（配置问题）
    InvalidRequest,
    Unknown,
}

impl ErrorKind {
    /// 写入任务的机器可读备注
    pub fn note(self) -> &'static str {
        match self {
            ErrorKind::TransientOverload => "service_overloaded",
            ErrorKind::QuotaExhausted => "quota_exhausted",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Unknown => "unknown_error",
        }
    }

    /// 面向用户的说明
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::TransientOverload => "服务繁忙，重试后仍未成功",
            ErrorKind::QuotaExhausted => "API 配额已用尽，请检查账号额度或稍后再试",
            ErrorKind::InvalidRequest => "请求参数无效，请检查模型与生成配置",
            ErrorKind::Unknown => "生成失败（未知错误）",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.note())
    }
}

/// 能被归类的错误
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

impl Classify for GenerationError {
    fn kind(&self) -> ErrorKind {
        classify(self.status, self.code.as_deref(), &self.message)
    }
}

impl Classify for anyhow::Error {
    fn kind(&self) -> ErrorKind {
        classify(None, None, &format!("{:#}", self))
    }
}

/// 根据状态码、服务端状态字符串和消息归类失败
///
/// 判断顺序：配额 → 非法请求 → 过载 → 未知。
pub fn classify(status: Option<u16>, code: Option<&str>, message: &str) -> ErrorKind {
    let message = message.to_lowercase();
    let code = code.map(|c| c.to_uppercase());
    let code = code.as_deref();

    if status == Some(429)
        || code == Some("RESOURCE_EXHAUSTED")
        || message.contains("limit: 0")
        || message.contains("quota")
        || message.contains("rate limit")
        || message.contains("resource_exhausted")
    {
        return ErrorKind::QuotaExhausted;
    }

    if status == Some(400)
        || code == Some("INVALID_ARGUMENT")
        || message.contains("aspect ratio")
        || message.contains("invalid_argument")
    {
        return ErrorKind::InvalidRequest;
    }

    if status == Some(503)
        || code == Some("UNAVAILABLE")
        || message.contains("overloaded")
        || message.contains("unavailable")
    {
        return ErrorKind::TransientOverload;
    }

    ErrorKind::Unknown
}

/// 重试成功的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    /// 总调用次数（首次 + 重试）
    pub attempts: u32,
}

/// 最终失败
#[derive(Debug, Clone)]
pub struct RetryFailure<E> {
    pub kind: ErrorKind,
    pub attempts: u32,
    pub error: E,
    /// 退避等待期间收到取消
    pub cancelled: bool,
}

impl<E: fmt::Display> fmt::Display for RetryFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (共尝试 {} 次): {}",
            self.kind,
            self.kind.user_message(),
            self.attempts,
            self.error
        )
    }
}

/// 有界重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 过载类错误的最大重试次数
    max_transient_retries: u32,
    initial_delay: Duration,
    max_jitter: Duration,
}

/// 未知错误只重试一次
const UNKNOWN_RETRIES: u32 = 1;

impl RetryPolicy {
    pub fn new(max_transient_retries: u32, initial_delay: Duration, max_jitter: Duration) -> Self {
        // 抖动不超过基础延迟，保证相邻两次退避严格递增
        Self {
            max_transient_retries,
            initial_delay,
            max_jitter: max_jitter.min(initial_delay),
        }
    }

    pub fn max_transient_retries(&self) -> u32 {
        self.max_transient_retries
    }

    /// 第 `retry` 次重试（从 0 开始）的退避时长
    pub fn backoff_delay(&self, retry: u32, jitter: Duration) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor) + jitter.min(self.max_jitter)
    }

    fn random_jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }

    /// 执行调用，按错误类别决定是否重试
    pub async fn execute<T, E, F, Fut>(&self, call: F) -> Result<Retried<T>, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        self.execute_until(&CancelToken::new(), call).await
    }

    /// 同 `execute`，但退避等待期间收到取消时立即返回最后一次的错误，
    /// 并标记 `cancelled`
    pub async fn execute_until<T, E, F, Fut>(
        &self,
        cancel: &CancelToken,
        mut call: F,
    ) -> Result<Retried<T>, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let mut attempts = 0u32;
        let mut transient_retries = 0u32;
        let mut unknown_retries = 0u32;

        loop {
            attempts += 1;
            let error = match call().await {
                Ok(value) => return Ok(Retried { value, attempts }),
                Err(error) => error,
            };

            let kind = error.kind();
            let retry_index = match kind {
                ErrorKind::TransientOverload if transient_retries < self.max_transient_retries => {
                    transient_retries += 1;
                    Some(transient_retries + unknown_retries - 1)
                }
                ErrorKind::Unknown if unknown_retries < UNKNOWN_RETRIES => {
                    unknown_retries += 1;
                    Some(transient_retries + unknown_retries - 1)
                }
                _ => None,
            };

            let Some(retry_index) = retry_index else {
                debug!(attempts, kind = %kind, "不再重试: {}", error);
                return Err(RetryFailure {
                    kind,
                    attempts,
                    error,
                    cancelled: false,
                });
            };

            let delay = self.backoff_delay(retry_index, self.random_jitter());
            warn!(
                attempt = attempts,
                kind = %kind,
                delay_ms = delay.as_millis() as u64,
                "⏳ 调用失败，稍后重试: {}",
                error
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(attempts, kind = %kind, "⏹️ 退避期间收到取消，放弃重试");
                    return Err(RetryFailure {
                        kind,
                        attempts,
                        error,
                        cancelled: true,
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(2000), Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn scripted(
        results: Vec<Result<&'static str, GenerationError>>,
    ) -> (Mutex<VecDeque<Result<&'static str, GenerationError>>>, Mutex<Vec<Instant>>) {
        (Mutex::new(results.into()), Mutex::new(Vec::new()))
    }

    fn overloaded() -> GenerationError {
        GenerationError::with_status(503, "The model is overloaded").code("UNAVAILABLE")
    }

    #[test]
    fn test_classify_quota_signals() {
        assert_eq!(classify(Some(429), None, ""), ErrorKind::QuotaExhausted);
        assert_eq!(
            classify(None, Some("resource_exhausted"), "whatever"),
            ErrorKind::QuotaExhausted
        );
        assert_eq!(
            classify(None, None, "Quota exceeded for metric ... limit: 0"),
            ErrorKind::QuotaExhausted
        );
    }

    #[test]
    fn test_classify_invalid_and_transient() {
        assert_eq!(classify(Some(400), None, "bad"), ErrorKind::InvalidRequest);
        assert_eq!(
            classify(None, None, "Aspect ratio 16:9 is not supported"),
            ErrorKind::InvalidRequest
        );
        assert_eq!(classify(Some(503), None, ""), ErrorKind::TransientOverload);
        assert_eq!(
            classify(None, None, "Service Unavailable"),
            ErrorKind::TransientOverload
        );
        assert_eq!(classify(Some(500), None, "internal"), ErrorKind::Unknown);
        assert_eq!(classify(None, None, "connection reset"), ErrorKind::Unknown);
    }

    #[test]
    fn test_quota_wins_over_overload() {
        assert_eq!(
            classify(Some(503), None, "quota exceeded"),
            ErrorKind::QuotaExhausted
        );
    }

    #[test]
    fn test_anyhow_errors_are_classified_by_message() {
        let err = anyhow::anyhow!("upstream").context("model overloaded");
        assert_eq!(err.kind(), ErrorKind::TransientOverload);
    }

    #[test]
    fn test_backoff_doubles_and_jitter_is_capped() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1500), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(0, Duration::ZERO), Duration::from_millis(1500));
        assert_eq!(policy.backoff_delay(1, Duration::ZERO), Duration::from_millis(3000));
        assert_eq!(policy.backoff_delay(2, Duration::ZERO), Duration::from_millis(6000));
        assert_eq!(
            policy.backoff_delay(0, Duration::from_secs(10)),
            Duration::from_millis(2000)
        );
        // 最大抖动下仍严格递增
        assert!(
            policy.backoff_delay(0, Duration::from_millis(499))
                < policy.backoff_delay(1, Duration::ZERO)
        );
    }

    #[test]
    fn test_jitter_never_exceeds_base_delay() {
        let policy = RetryPolicy::new(2, Duration::from_millis(100), Duration::from_secs(5));
        for _ in 0..50 {
            assert!(policy.random_jitter() < Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_retries_then_succeeds() {
        let policy = RetryPolicy::new(2, Duration::from_millis(2000), Duration::ZERO);
        let (script, calls) = scripted(vec![Err(overloaded()), Err(overloaded()), Ok("image")]);

        let result = policy
            .execute(|| {
                calls.lock().unwrap().push(Instant::now());
                let next = script.lock().unwrap().pop_front().unwrap();
                async move { next }
            })
            .await
            .unwrap();

        assert_eq!(result, Retried { value: "image", attempts: 3 });
        let calls = calls.lock().unwrap();
        let first_gap = calls[1] - calls[0];
        let second_gap = calls[2] - calls[1];
        assert!(first_gap >= Duration::from_millis(2000) && first_gap < Duration::from_millis(2010));
        assert!(second_gap >= Duration::from_millis(4000) && second_gap < Duration::from_millis(4010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_retries_are_capped() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10), Duration::ZERO);
        let (script, _) = scripted(vec![Err(overloaded()), Err(overloaded()), Err(overloaded()), Ok("never")]);

        let failure = policy
            .execute(|| {
                let next = script.lock().unwrap().pop_front().unwrap();
                async move { next }
            })
            .await
            .unwrap_err();

        assert_eq!(failure.kind, ErrorKind::TransientOverload);
        assert_eq!(failure.attempts, 3);
        assert_eq!(script.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_and_invalid_fail_immediately() {
        let policy = RetryPolicy::default();

        for error in [
            GenerationError::with_status(429, "Too many requests"),
            GenerationError::with_status(400, "Request contains an invalid argument"),
        ] {
            let start = Instant::now();
            let failure = policy
                .execute(|| {
                    let error = error.clone();
                    async move { Err::<(), _>(error) }
                })
                .await
                .unwrap_err();

            assert_eq!(failure.attempts, 1);
            assert_eq!(start.elapsed(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_error_retries_once() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10), Duration::ZERO);
        let (script, _) = scripted(vec![
            Err(GenerationError::new("connection reset")),
            Err(GenerationError::new("connection reset")),
            Ok("never"),
        ]);

        let failure = policy
            .execute(|| {
                let next = script.lock().unwrap().pop_front().unwrap();
                async move { next }
            })
            .await
            .unwrap_err();

        assert_eq!(failure.kind, ErrorKind::Unknown);
        assert_eq!(failure.attempts, 2);
        assert!(failure.to_string().contains("unknown_error"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_stops_retrying() {
        let policy = RetryPolicy::new(2, Duration::from_millis(2000), Duration::ZERO);
        let cancel = CancelToken::new();
        let calls = Mutex::new(0u32);

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                cancel.cancel();
            })
        };

        let start = Instant::now();
        let failure = policy
            .execute_until(&cancel, || {
                *calls.lock().unwrap() += 1;
                async move { Err::<(), _>(overloaded()) }
            })
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(failure.cancelled);
        assert_eq!(failure.kind, ErrorKind::TransientOverload);
        assert_eq!(failure.attempts, 1);
        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(start.elapsed() < Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_then_success() {
        let policy = RetryPolicy::default();
        let (script, _) = scripted(vec![Err(GenerationError::new("reset by peer")), Ok("image")]);

        let result = policy
            .execute(|| {
                let next = script.lock().unwrap().pop_front().unwrap();
                async move { next }
            })
            .await
            .unwrap();

        assert_eq!(result.attempts, 2);
    }
}
