//! 图像生成能力 - 业务能力层
//!
//! 只描述"给一段画面描述，返回一张图"，不关心排队、冷却和重试。

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::models::image::SlideImage;

/// 默认风格（分析结果没有给出全局风格时使用）
pub const DEFAULT_STYLE: &str = "Professional, Clean, Modern";

/// 一次生成请求
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub style: &'a str,
    pub reference: Option<&'a SlideImage>,
    pub language_hint: Option<&'a str>,
}

/// 外部图像生成服务
///
/// 实现方每次调用都应使用新的连接和凭据，不在调用之间保留会话状态。
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<SlideImage, GenerationError>;
}

/// 构建发送给图像模型的完整提示词
pub fn build_image_prompt(request: &GenerationRequest<'_>) -> String {
    let style = if request.style.trim().is_empty() {
        DEFAULT_STYLE
    } else {
        request.style.trim()
    };

    let language = request
        .language_hint
        .map(|lang| format!("\n- Language Requirement: Text shown in the image MUST be in {}.", lang))
        .unwrap_or_default();

    let prompt = format!(
        "[Task]\n\
         Generate a high-quality, high-resolution presentation slide (16:9).\n\
         \n\
         [Style Context]\n\
         {}\n\
         \n\
         [Scene Description]\n\
         {}\n\
         \n\
         [Quality & Technical Requirements]\n\
         - Resolution: High resolution, extremely detailed.\n\
         - Composition: Balanced for a presentation slide, leave space for overlay text.\n\
         - Format: 16:9 aspect ratio.{}",
        style,
        request.prompt.trim(),
        language
    );

    if request.reference.is_some() {
        format!(
            "[Image-to-Image Directive]\n\
             Use the provided image as a strict Style Reference (Color, Layout, Mood).\n\
             Generate a NEW image based on this reference but with the following content:\n\
             \n\
             {}",
            prompt
        )
    } else {
        prompt
    }
}
