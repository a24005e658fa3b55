//! Gemini 图像生成服务
//!
//! 通过 `generateContent` REST 接口生成图片。每次调用（包括重试）都新建
//! HTTP 客户端，即用即抛。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GenerationError;
use crate::models::image::SlideImage;
use crate::services::generator::{build_image_prompt, GenerationRequest, ImageGenerator};

/// Gemini 图像生成客户端配置
pub struct GeminiImageGenerator {
    api_key: String,
    api_base_url: String,
    model_name: String,
    timeout: Duration,
}

impl GeminiImageGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.image_api_key.clone(),
            api_base_url: config.image_api_base_url.trim_end_matches('/').to_string(),
            model_name: config.image_model_name.clone(),
            timeout: config.request_timeout(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, self.model_name
        )
    }

    /// 只显示密钥后 4 位
    fn key_hint(&self) -> String {
        let tail: String = self
            .api_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<SlideImage, GenerationError> {
        if self.api_key.trim().is_empty() {
            return Err(GenerationError::with_status(400, "API Key 未配置").code("INVALID_ARGUMENT"));
        }

        debug!(
            "调用图像模型 {}，密钥 {}，参考图: {}",
            self.model_name,
            self.key_hint(),
            request.reference.is_some()
        );

        let body = build_request_body(&request);

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GenerationError::new(format!("无法创建 HTTP 客户端: {}", e)))?;

        let response = client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::new(format!("请求超时 ({} 秒)", self.timeout.as_secs()))
                } else {
                    GenerationError::new(format!("请求失败: {}", e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::new(format!("读取响应失败: {}", e)))?;

        if !status.is_success() {
            let error = parse_error_body(status.as_u16(), &text);
            warn!("图像模型返回错误: {}", error);
            return Err(error);
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::new(format!("无法解析响应: {}", e)))?;

        extract_image(parsed)
    }
}

// ========== 请求/响应结构 ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
    image_size: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// 参考图放在最前面，其后是文字提示词
fn build_request_body(request: &GenerationRequest<'_>) -> GenerateContentRequest {
    let mut parts = Vec::new();

    if let Some(reference) = request.reference {
        parts.push(Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: Some(reference.mime_type().to_string()),
                data: reference.to_base64(),
            }),
        });
    }

    parts.push(Part {
        text: Some(build_image_prompt(request)),
        inline_data: None,
    });

    GenerateContentRequest {
        contents: vec![Content { parts }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE"],
            image_config: ImageConfig {
                aspect_ratio: "16:9",
                image_size: "2K",
            },
        },
    }
}

/// 服务端错误体 `{"error": {"code", "message", "status"}}`，解析失败时退回原文
fn parse_error_body(http_status: u16, body: &str) -> GenerationError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let mut error = GenerationError::with_status(
                parsed.error.code.unwrap_or(http_status),
                parsed.error.message,
            );
            if let Some(status) = parsed.error.status {
                error = error.code(status);
            }
            error
        }
        Err(_) => GenerationError::with_status(http_status, body.trim().to_string()),
    }
}

/// 取第一个候选里的第一张图片
fn extract_image(response: GenerateContentResponse) -> Result<SlideImage, GenerationError> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let mut text_output = String::new();
    for part in parts {
        if let Some(inline) = part.inline_data {
            if inline.data.is_empty() {
                continue;
            }
            let mime = inline.mime_type.unwrap_or_else(|| "image/png".to_string());
            return SlideImage::from_base64(mime, &inline.data)
                .map_err(|e| GenerationError::new(format!("图片数据不是合法的 base64: {}", e)));
        }
        if let Some(text) = part.text {
            text_output.push_str(&text);
        }
    }

    if !text_output.trim().is_empty() {
        warn!("模型返回了文字而不是图片: {}", text_output.trim());
        return Err(GenerationError::new("模型返回了文字描述而不是图片"));
    }

    Err(GenerationError::new("响应中没有图片数据"))
}
