use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文本分析错误（批次开始前）
    #[error("分析错误: {0}")]
    Analysis(#[from] AnalysisError),
    /// 图像生成错误
    #[error("生成错误: {0}")]
    Generation(#[from] GenerationError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 外部图像生成服务返回的原始错误
///
/// 只携带可用于分类的信息：HTTP 状态码、服务端状态字符串和消息，
/// 具体归类见 `workflow::retry::classify`。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("图像生成失败 (status={status:?}, code={code:?}): {message}")]
pub struct GenerationError {
    /// HTTP 状态码（网络层失败时为空）
    pub status: Option<u16>,
    /// 服务端返回的状态字符串，例如 `UNAVAILABLE`
    pub code: Option<String>,
    /// 错误消息
    pub message: String,
}

impl GenerationError {
    /// 只有消息的错误
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    /// 带 HTTP 状态码的错误
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code: None,
            message: message.into(),
        }
    }

    /// 附加服务端状态字符串
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// 文本分析错误
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// 调用分析服务失败
    #[error("分析服务调用失败 (模型: {model}): {message}")]
    CallFailed { model: String, message: String },
    /// 返回内容为空
    #[error("分析服务返回内容为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 返回内容不是合法 JSON
    #[error("无法解析分析结果: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
    /// 没有规划出任何幻灯片
    #[error("分析结果中没有幻灯片")]
    NoSlides,
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 无法识别的图片格式
    #[error("无法识别的图片格式: {path}")]
    UnsupportedImage { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必填项为空
    #[error("配置项 {var_name} 不能为空")]
    Missing { var_name: String },
    /// 取值非法
    #[error("配置项 {var_name} 取值非法: '{value}' ({reason})")]
    Invalid {
        var_name: String,
        value: String,
        reason: String,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::InvalidJson { source: err }
    }
}

// ========== 便捷构造函数 ==========

impl FileError {
    /// 创建文件读取错误
    pub fn read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    /// 创建文件写入错误
    pub fn write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}

impl ConfigError {
    pub fn invalid(
        var_name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::Invalid {
            var_name: var_name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display_contains_status_and_message() {
        let err = GenerationError::with_status(503, "The model is overloaded").code("UNAVAILABLE");
        let text = err.to_string();
        assert!(text.contains("503"));
        assert!(text.contains("UNAVAILABLE"));
        assert!(text.contains("overloaded"));
    }

    #[test]
    fn test_app_error_wraps_config_error() {
        let err: AppError = ConfigError::Missing {
            var_name: "GEMINI_API_KEY".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "配置错误: 配置项 GEMINI_API_KEY 不能为空");
    }
}
