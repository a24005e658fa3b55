use serde::{Deserialize, Serialize};

/// 幻灯片上的文字内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default)]
    pub main_title: String,
    #[serde(default)]
    pub sub_title: String,
    #[serde(default)]
    pub body_points: Vec<String>,
}

/// 分析服务产出的单页幻灯片描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDescriptor {
    #[serde(deserialize_with = "deserialize_slide_id")]
    pub id: String,
    /// 功能性标题，例如 "第 1 页 - 引言"
    #[serde(default)]
    pub title: String,
    /// 交给图像生成服务的完整画面描述
    pub visual_prompt: String,
    #[serde(default)]
    pub text_content: TextContent,
    #[serde(default)]
    pub metaphor: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub explanation: String,
}

/// 一次文本分析的完整结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationAnalysis {
    #[serde(default)]
    pub detected_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(alias = "globalStyleDefinition")]
    pub global_style: String,
    #[serde(default)]
    pub visual_coherence: String,
    pub slides: Vec<SlideDescriptor>,
}

impl PresentationAnalysis {
    /// 语言提示，空字符串视为未检测到
    pub fn language_hint(&self) -> Option<&str> {
        let lang = self.detected_language.trim();
        (!lang.is_empty()).then_some(lang)
    }
}

// 幻灯片 ID 既可能是整数也可能是字符串
fn deserialize_slide_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct SlideIdVisitor;

    impl<'de> Visitor<'de> for SlideIdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer slide id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(SlideIdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_analysis_json() {
        let json = r#"{
            "detectedLanguage": "中文",
            "documentType": "report",
            "globalStyleDefinition": "白底，扁平插画",
            "visualCoherence": "统一配色",
            "slides": [
                {"id": 1, "title": "封面", "visualPrompt": "城市与太阳能玻璃",
                 "textContent": {"mainTitle": "未来能源", "subTitle": "城市"},
                 "metaphor": "光", "mood": "明亮", "explanation": "开场"},
                {"id": "s2", "visualPrompt": "动能人行道"}
            ]
        }"#;

        let analysis: PresentationAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.language_hint(), Some("中文"));
        assert_eq!(analysis.global_style, "白底，扁平插画");
        assert_eq!(analysis.slides.len(), 2);
        assert_eq!(analysis.slides[0].id, "1");
        assert_eq!(analysis.slides[0].text_content.main_title, "未来能源");
        assert_eq!(analysis.slides[1].id, "s2");
        assert!(analysis.slides[1].text_content.body_points.is_empty());
    }

    #[test]
    fn test_blank_language_is_no_hint() {
        let analysis = PresentationAnalysis {
            detected_language: "  ".to_string(),
            document_type: None,
            global_style: String::new(),
            visual_coherence: String::new(),
            slides: vec![],
        };
        assert_eq!(analysis.language_hint(), None);
    }
}
