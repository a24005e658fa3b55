//! LLM 文本分析服务 - 业务能力层
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（Gemini 的 OpenAI 兼容端点、Azure、Doubao 等）

use std::time::Duration;

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AnalysisError;
use crate::models::slide::PresentationAnalysis;
use crate::services::analysis::{
    build_system_instruction, parse_analysis_response, AnalysisOptions, AnalysisService,
};
use crate::workflow::retry::RetryPolicy;

/// 基于 LLM 的文本分析服务
///
/// 职责：
/// - 组装系统提示词并调用 LLM
/// - 解析返回的幻灯片规划
/// - 不关心图片生成和排队
pub struct LlmAnalysisService {
    client: Client<OpenAIConfig>,
    model_name: String,
    retry_policy: RetryPolicy,
}

impl LlmAnalysisService {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            retry_policy: RetryPolicy::new(2, Duration::from_millis(1500), Duration::from_millis(500)),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// 返回去掉首尾空白的响应内容。
    pub async fn send_to_llm(&self, user_message: &str, system_message: Option<&str>) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(8192u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AnalysisError::CallFailed {
                model: self.model_name.clone(),
                message: e.to_string(),
            }
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AnalysisError::EmptyResponse {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl AnalysisService for LlmAnalysisService {
    async fn analyze(&self, text: &str, options: &AnalysisOptions) -> Result<PresentationAnalysis> {
        let system_instruction = build_system_instruction(options);
        let system = system_instruction.as_str();
        info!("🧠 开始分析文本 ({} 字符)，模型: {}", text.chars().count(), self.model_name);

        let retried = self
            .retry_policy
            .execute(move || async move {
                let raw = self.send_to_llm(text, Some(system)).await?;
                parse_analysis_response(&raw).map_err(anyhow::Error::from)
            })
            .await
            .map_err(|failure| {
                failure
                    .error
                    .context(format!("文本分析失败（共尝试 {} 次）", failure.attempts))
            })?;

        info!(
            "✅ 文本分析完成: {} 张幻灯片（尝试 {} 次）",
            retried.value.slides.len(),
            retried.attempts
        );
        Ok(retried.value)
    }
}

/// 读取待分析的原始文本
pub async fn read_input_text(path: &str) -> Result<String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取输入文件: {}", path))?;
    if text.trim().is_empty() {
        anyhow::bail!("输入文件为空: {}", path);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> LlmAnalysisService {
        let mut config = Config::default();
        config.llm_api_key = std::env::var("LLM_API_KEY").unwrap_or_default();
        LlmAnalysisService::new(&config)
    }

    #[tokio::test]
    async fn test_read_input_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "城市能源转型").unwrap();
        let text = read_input_text(path.to_str().unwrap()).await.unwrap();
        assert_eq!(text, "城市能源转型");

        std::fs::write(&path, "  \n").unwrap();
        assert!(read_input_text(path.to_str().unwrap()).await.is_err());
    }

    /// 测试真实的分析调用
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_analyze_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_analyze_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = create_test_service();
        let options = AnalysisOptions {
            slide_count: crate::models::style::SlideCountOption::Fixed(3),
            ..Default::default()
        };

        let result = service
            .analyze("城市正在从化石能源转向太阳能、风能和储能系统。", &options)
            .await;

        match result {
            Ok(analysis) => {
                println!("✅ 分析成功: {} 张幻灯片", analysis.slides.len());
                assert!(!analysis.slides.is_empty());
            }
            Err(e) => panic!("分析失败: {:#}", e),
        }
    }
}
