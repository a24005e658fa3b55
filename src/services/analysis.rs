//! 文本分析服务 - 业务能力层
//!
//! 把原始文本规划成一组幻灯片描述。只负责"规划"，不负责生成图片。

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::error::AnalysisError;
use crate::models::loaders::load_deck_from_toml;
use crate::models::slide::PresentationAnalysis;
use crate::models::style::{find_preset, SlideCountOption, TextRichness, AUTO_STYLE};

/// 默认系统提示词
pub const DEFAULT_SYSTEM_PROMPT: &str = "视觉叙事设计师 (Visual Narrative Designer)

背景
将文本文档转化为具有视觉冲击力、叙事驱动的幻灯片演示文稿（基于图像）。
核心产出: 一系列高保真图像提示词和文本内容。

角色
1. 语言专家：必须检测输入文本的语言，所有输出字段（visualPrompt, textContent, explanation）必须完全使用检测到的语言。
2. 自适应艺术总监：拒绝通用模板，根据内容情感定制视觉识别。

流程
【步骤 1】语言识别：设置 detectedLanguage 字段（例如 \"中文\"、\"English\"、\"日本語\"）。
【步骤 2】全局视觉风格：在 globalStyle 中描述统一的视觉识别，所有幻灯片共用。
【步骤 3】幻灯片规划：每张幻灯片给出 visualPrompt、textContent、explanation。";

/// 返回格式约束
const RESPONSE_FORMAT: &str = "【输出格式】
只返回一个 JSON 对象，不要附加任何解释：
{
  \"detectedLanguage\": string,
  \"documentType\": string,
  \"globalStyle\": string,
  \"visualCoherence\": string,
  \"slides\": [
    {
      \"id\": number,
      \"title\": string,
      \"visualPrompt\": string,
      \"textContent\": { \"mainTitle\": string, \"subTitle\": string, \"bodyPoints\": [string] },
      \"metaphor\": string,
      \"mood\": string,
      \"explanation\": string
    }
  ]
}";

/// 分析选项
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub richness: TextRichness,
    pub slide_count: SlideCountOption,
    /// 参考模版的风格描述
    pub reference_style: Option<String>,
    /// `AUTO`、预设名或自由文本
    pub visual_style: Option<String>,
    /// 覆盖默认系统提示词
    pub system_prompt: Option<String>,
}

/// 文本分析服务
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, text: &str, options: &AnalysisOptions) -> Result<PresentationAnalysis>;
}

/// 风格指令
pub fn style_instruction(options: &AnalysisOptions) -> String {
    let reference = options
        .reference_style
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let visual = options
        .visual_style
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match (reference, visual) {
        (Some(reference), Some(visual)) if visual != AUTO_STYLE => format!(
            "【视觉风格指令 - 组合模式】\n[参考模版]：{}\n[用户偏好]：{}\n融合策略：以参考模版为基础，融入用户偏好。",
            reference, visual
        ),
        (Some(reference), _) => format!(
            "【视觉风格指令 - 模版参考模式】\n{}\n请严格遵循此风格。",
            reference
        ),
        (None, Some(AUTO_STYLE)) => "【视觉风格指令 - 自动规划模式】\n\
             1. 不使用任何预设风格。\n\
             2. 以创意总监的身份，根据文本的情感和语义规划全新的视觉识别。\n\
             3. 强制要求：背景必须是纯白色 (#FFFFFF) 或超浅米色 (#F8F9FA)，禁止深色背景和复杂渐变。\n\
             4. 目标：版面通透、信息丰富，主体在白底上清晰突出。"
            .to_string(),
        (None, Some(visual)) => match find_preset(visual) {
            Some(preset) => format!(
                "【视觉风格指令 - 预设模式】\n{}\n{}",
                preset.label, preset.description
            ),
            None => format!("【视觉风格指令 - 自定义模式】\n{}", visual),
        },
        (None, None) => "【视觉风格指令 - 默认】\n使用干净现代的风格，纯白背景。".to_string(),
    }
}

/// 组装完整的系统提示词
pub fn build_system_instruction(options: &AnalysisOptions) -> String {
    let base = options
        .system_prompt
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    format!(
        "{}\n\n---\n{}\n---\n{}\n---\n{}\n\n{}\n\n【最终检查】\n\
         1. 语言：detectedLanguage 必须准确，所有输出内容都使用该语言。\n\
         2. 风格：自动模式下背景必须为纯白。",
        base,
        style_instruction(options),
        options.slide_count.instruction(),
        options.richness.instruction(),
        RESPONSE_FORMAT
    )
}

/// 解析分析模型返回的 JSON，允许外层包着 ```json 代码块
pub fn parse_analysis_response(raw: &str) -> Result<PresentationAnalysis, AnalysisError> {
    let json = strip_code_fence(raw);
    let analysis: PresentationAnalysis = serde_json::from_str(json)?;

    if analysis.slides.is_empty() {
        return Err(AnalysisError::NoSlides);
    }

    debug!(
        "分析结果: {} 张幻灯片，语言: {}",
        analysis.slides.len(),
        analysis.detected_language
    );
    Ok(analysis)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // 去掉语言标记所在的第一行
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}

/// 从 TOML 文件读取已分析好的幻灯片，跳过 LLM 调用
pub struct TomlDeckAnalysis {
    path: PathBuf,
}

impl TomlDeckAnalysis {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AnalysisService for TomlDeckAnalysis {
    async fn analyze(&self, _text: &str, _options: &AnalysisOptions) -> Result<PresentationAnalysis> {
        load_deck_from_toml(&self.path).await
    }
}
