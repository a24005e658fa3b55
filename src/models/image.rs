//! 幻灯片图片
//!
//! 图片字节用 `Arc<[u8]>` 共享，参考图在多个任务之间传递时只复制指针。

use std::fmt;
use std::sync::{Arc, LazyLock};

use base64::{engine::general_purpose, Engine};
use regex::Regex;

static DATA_URL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^data:(.+?);base64,(.+)$").ok());

/// 一张图片（生成结果或参考模版）
#[derive(Clone, PartialEq, Eq)]
pub struct SlideImage {
    mime_type: String,
    data: Arc<[u8]>,
}

impl SlideImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// 从 base64 数据构建，服务端返回的 inlineData 走这里
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> Result<Self, base64::DecodeError> {
        let data = general_purpose::STANDARD.decode(encoded.trim())?;
        Ok(Self::new(mime_type, data))
    }

    /// 解析 `data:<mime>;base64,<data>` 形式的 Data URL
    pub fn from_data_url(url: &str) -> Option<Self> {
        let caps = DATA_URL_RE.as_ref()?.captures(url.trim())?;
        Self::from_base64(&caps[1], &caps[2]).ok()
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.data)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 两个句柄是否指向同一份字节
    pub fn shares_bytes_with(&self, other: &SlideImage) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// 按 MIME 类型推断文件扩展名
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }

    /// 按文件扩展名推断 MIME 类型
    pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "webp" => Some("image/webp"),
            "gif" => Some("image/gif"),
            _ => None,
        }
    }
}

impl fmt::Debug for SlideImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlideImage")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}
