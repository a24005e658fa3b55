//! 视觉风格预设与内容密度选项

use phf::phf_map;

/// 自动风格标记：由分析模型自行规划风格（强制白底）
pub const AUTO_STYLE: &str = "AUTO";

/// 风格预设
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub label: &'static str,
    pub description: &'static str,
}

/// 按键名查找的风格预设库
pub static STYLE_PRESETS: phf::Map<&'static str, StylePreset> = phf_map! {
    "business_modern" => StylePreset {
        label: "现代商务 (Modern Business)",
        description: "风格: 现代商务矢量插画，扁平化，轮廓清晰\n配色: 白色背景，深炭灰轮廓，柔和赤陶色点缀\n元素: 极简线条，无脸职业人物，B2B 概念图标\n技术: Flat Vector; 无阴影/渐变/3D",
    },
    "business_premium" => StylePreset {
        label: "高端商务 (Premium Corporate)",
        description: "风格: 高端企业质感，深色主题，金属与玻璃\n配色: 深蓝/深灰背景，金银点缀\n元素: 抽象几何，数据流，城市天际线剪影\n技术: Cinematic 3D; 戏剧化光线; 景深",
    },
    "creative_vibrant" => StylePreset {
        label: "活力创意 (Vibrant Creative)",
        description: "风格: 大胆用色，动态构图，几何叠加\n配色: 高饱和对比色，霓虹色系\n元素: 抽象形状，流动线条，孟菲斯元素\n技术: Bold Graphic Design; 高对比",
    },
    "creative_minimal" => StylePreset {
        label: "极简创意 (Minimal Creative)",
        description: "风格: 留白艺术，单色系，强调排版\n配色: 大面积白/米色，单一强调色\n元素: 几何线条，负空间，点线面构成\n技术: Swiss Design; 大量留白",
    },
    "japanese_magazine" => StylePreset {
        label: "日系杂志 (Japanese Editorial)",
        description: "风格: 日本商业杂志，极简智性，隐喻与光影\n配色: 米白/浅灰基调，点缀深色\n元素: 摄影与插画融合，大量留白\n技术: Japanese Editorial; Wabi-sabi",
    },
    "japanese_anime" => StylePreset {
        label: "日系动漫 (Anime Style)",
        description: "风格: 现代日本动漫插画，赛璐璐着色\n配色: 鲜明和谐，柔和阴影\n元素: 细腻线条，场景氛围感\n技术: Anime illustration; Cel shading",
    },
    "tech_futuristic" => StylePreset {
        label: "科技未来 (Futuristic Tech)",
        description: "风格: 赛博朋克/科幻，深色 UI\n配色: 深色背景，电蓝/电紫/霓虹绿\n元素: 电路纹理，数据可视化，全息效果\n技术: Cyberpunk UI; Grid patterns",
    },
    "tech_clean" => StylePreset {
        label: "清爽科技 (Clean Tech)",
        description: "风格: 干净利落，友好易懂\n配色: 白色/浅灰背景，品牌色点缀\n元素: 简洁图标，等距插画\n技术: Product Design; Isometric; Soft shadows",
    },
    "educational" => StylePreset {
        label: "教育说明 (Educational)",
        description: "风格: 清晰易懂，信息分层\n配色: 柔和但区分度高\n元素: 图解、流程图、时间线\n技术: Infographic; Clear hierarchy",
    },
    "organic_natural" => StylePreset {
        label: "自然有机 (Organic Natural)",
        description: "风格: 自然质感，手工感\n配色: 大地色系，绿/棕/米\n元素: 植物纹理，手绘元素，纸质质感\n技术: Organic textures; Earthy tones",
    },
};

/// 查找风格预设
pub fn find_preset(key: &str) -> Option<&'static StylePreset> {
    STYLE_PRESETS.get(key.trim())
}

/// 文本密度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRichness {
    /// 精简：画面为主
    Concise,
    /// 详实：图文平衡
    Rich,
    /// 智能：小图组合 + 多段落
    #[default]
    Auto,
}

impl TextRichness {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "concise" | "精简" => Some(TextRichness::Concise),
            "rich" | "详实" => Some(TextRichness::Rich),
            "auto" | "智能" => Some(TextRichness::Auto),
            _ => None,
        }
    }

    /// 分析提示词中的密度指令
    pub fn instruction(self) -> &'static str {
        match self {
            TextRichness::Concise => {
                "【文本密度 - 精简模式】\n- 画面占比 > 85%。\n- 主标题 < 8 个字 / 6 个单词。\n- 禁止大段文字。"
            }
            TextRichness::Rich => {
                "【文本密度 - 详实模式】\n- 画面与文字 5:5 平衡。\n- 允许 3-5 个要点或简短段落。\n- 信息层级清晰。"
            }
            TextRichness::Auto => {
                "【文本密度 - 智能模式】\n- 采用更多小图组合（信息图表/元素）。\n- 每页可用多个段落详细表达。\n- 内容详实，适合沟通讲解。"
            }
        }
    }
}

/// 幻灯片页数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlideCountOption {
    /// 由分析模型根据内容量决定
    #[default]
    Auto,
    /// 固定页数
    Fixed(u32),
}

impl SlideCountOption {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Some(SlideCountOption::Auto);
        }
        s.parse().ok().map(SlideCountOption::Fixed)
    }

    pub fn instruction(self) -> String {
        match self {
            SlideCountOption::Auto => "【智能页数规划】\n- 分析内容量和复杂度。\n- 基础页数 = 4 + 核心观点数。\n- 范围约束：5 ~ 15 页。".to_string(),
            SlideCountOption::Fixed(count) => {
                format!("【固定页数要求】\n严格按照 {} 页进行内容规划。", count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_preset() {
        let preset = find_preset("tech_clean").unwrap();
        assert!(preset.label.contains("Clean Tech"));
        assert!(find_preset(" educational ").is_some());
        assert!(find_preset("unknown").is_none());
        assert_eq!(STYLE_PRESETS.len(), 10);
    }

    #[test]
    fn test_parse_richness_and_count() {
        assert_eq!(TextRichness::parse("RICH"), Some(TextRichness::Rich));
        assert_eq!(TextRichness::parse("精简"), Some(TextRichness::Concise));
        assert_eq!(TextRichness::parse("dense"), None);

        assert_eq!(SlideCountOption::parse("Auto"), Some(SlideCountOption::Auto));
        assert_eq!(SlideCountOption::parse(" 12 "), Some(SlideCountOption::Fixed(12)));
        assert_eq!(SlideCountOption::parse("twelve"), None);
    }

    #[test]
    fn test_fixed_count_instruction_mentions_count() {
        assert!(SlideCountOption::Fixed(8).instruction().contains("8 页"));
    }
}
