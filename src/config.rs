use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::style::{SlideCountOption, TextRichness};

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- 队列节奏 ---
    /// 两次外部调用之间的最小间隔（秒）
    pub min_interval_secs: u64,
    /// 单张幻灯片生成耗时的估计值（秒），只用于 ETA
    pub per_job_estimate_secs: u64,
    /// 服务过载时的最大重试次数
    pub max_transient_retries: u32,
    /// 首次退避时长（毫秒），之后每次翻倍
    pub initial_backoff_ms: u64,
    /// 退避随机抖动上限（毫秒）
    pub backoff_jitter_ms: u64,
    // --- 图像生成服务 ---
    pub image_api_key: String,
    pub image_api_base_url: String,
    pub image_model_name: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 文本分析 LLM ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 输入输出 ---
    /// 原始文本文件
    pub input_file: String,
    /// 已分析好的 TOML 幻灯片文件，设置后跳过 LLM 分析
    pub deck_file: Option<String>,
    /// 用户提供的参考模版图片
    pub template_image: Option<String>,
    /// 视觉风格：`AUTO`、预设名或自由文本
    pub visual_style: Option<String>,
    pub text_richness: TextRichness,
    pub slide_count: SlideCountOption,
    /// 图片输出目录
    pub output_dir: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_interval_secs: 65,
            per_job_estimate_secs: 30,
            max_transient_retries: 2,
            initial_backoff_ms: 2000,
            backoff_jitter_ms: 500,
            image_api_key: String::new(),
            image_api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            image_model_name: "gemini-3-pro-image-preview".to_string(),
            request_timeout_secs: 180,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.5-pro".to_string(),
            input_file: "input.txt".to_string(),
            deck_file: None,
            template_image: None,
            visual_style: None,
            text_richness: TextRichness::Auto,
            slide_count: SlideCountOption::Auto,
            output_dir: "output_slides".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置，缺失或无法解析的值使用默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let image_api_key = lookup("GEMINI_API_KEY").unwrap_or(default.image_api_key);
        Self {
            min_interval_secs: parse_var(&lookup, "MIN_INTERVAL_SECS").unwrap_or(default.min_interval_secs),
            per_job_estimate_secs: parse_var(&lookup, "PER_JOB_ESTIMATE_SECS").unwrap_or(default.per_job_estimate_secs),
            max_transient_retries: parse_var(&lookup, "MAX_TRANSIENT_RETRIES").unwrap_or(default.max_transient_retries),
            initial_backoff_ms: parse_var(&lookup, "INITIAL_BACKOFF_MS").unwrap_or(default.initial_backoff_ms),
            backoff_jitter_ms: parse_var(&lookup, "BACKOFF_JITTER_MS").unwrap_or(default.backoff_jitter_ms),
            llm_api_key: non_empty("LLM_API_KEY").unwrap_or_else(|| image_api_key.clone()),
            image_api_key,
            image_api_base_url: lookup("GEMINI_API_BASE_URL").unwrap_or(default.image_api_base_url),
            image_model_name: lookup("IMAGE_MODEL_NAME").unwrap_or(default.image_model_name),
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS").unwrap_or(default.request_timeout_secs),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            input_file: lookup("INPUT_FILE").unwrap_or(default.input_file),
            deck_file: non_empty("DECK_FILE"),
            template_image: non_empty("TEMPLATE_IMAGE"),
            visual_style: non_empty("VISUAL_STYLE"),
            text_richness: lookup("TEXT_RICHNESS")
                .and_then(|v| TextRichness::parse(&v))
                .unwrap_or(default.text_richness),
            slide_count: lookup("SLIDE_COUNT")
                .and_then(|v| SlideCountOption::parse(&v))
                .unwrap_or(default.slide_count),
            output_dir: lookup("OUTPUT_DIR").unwrap_or(default.output_dir),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
        }
    }

    /// 检查配置是否可以启动一个批次
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "MIN_INTERVAL_SECS",
                self.min_interval_secs,
                "必须大于 0",
            ));
        }
        if self.image_api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                var_name: "GEMINI_API_KEY".to_string(),
            });
        }
        if let SlideCountOption::Fixed(count) = self.slide_count {
            if !(1..=30).contains(&count) {
                return Err(ConfigError::invalid("SLIDE_COUNT", count, "范围 1~30"));
            }
        }
        if let Some(template) = &self.template_image {
            if !Path::new(template).exists() {
                return Err(ConfigError::invalid("TEMPLATE_IMAGE", template, "文件不存在"));
            }
        }
        Ok(())
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }

    pub fn per_job_estimate(&self) -> Duration {
        Duration::from_secs(self.per_job_estimate_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn backoff_jitter(&self) -> Duration {
        Duration::from_millis(self.backoff_jitter_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = config_from(&[]);
        assert_eq!(config.min_interval_secs, 65);
        assert_eq!(config.max_transient_retries, 2);
        assert_eq!(config.slide_count, SlideCountOption::Auto);
        assert!(config.deck_file.is_none());
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let config = config_from(&[
            ("MIN_INTERVAL_SECS", "10"),
            ("MAX_TRANSIENT_RETRIES", "not-a-number"),
            ("GEMINI_API_KEY", "key-123"),
            ("SLIDE_COUNT", "8"),
            ("TEXT_RICHNESS", "rich"),
            ("DECK_FILE", "  "),
        ]);
        assert_eq!(config.min_interval_secs, 10);
        assert_eq!(config.max_transient_retries, 2);
        assert_eq!(config.llm_api_key, "key-123");
        assert_eq!(config.slide_count, SlideCountOption::Fixed(8));
        assert_eq!(config.text_richness, TextRichness::Rich);
        assert!(config.deck_file.is_none());
    }

    #[test]
    fn test_validate_rejects_missing_key_and_zero_interval() {
        let mut config = config_from(&[("GEMINI_API_KEY", "k")]);
        assert!(config.validate().is_ok());

        config.min_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        config.min_interval_secs = 65;
        config.image_api_key.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_validate_rejects_out_of_range_slide_count() {
        let mut config = config_from(&[("GEMINI_API_KEY", "k")]);
        config.slide_count = SlideCountOption::Fixed(0);
        assert!(config.validate().is_err());
    }
}
