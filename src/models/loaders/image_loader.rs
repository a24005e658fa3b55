use crate::error::FileError;
use crate::models::image::SlideImage;
use std::path::Path;
use tokio::fs;

/// 读取用户提供的参考模版图片
///
/// MIME 类型由扩展名决定，不认识的扩展名直接拒绝。
pub async fn load_template_image(path: &Path) -> Result<SlideImage, FileError> {
    let path_str = path.display().to_string();

    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(SlideImage::mime_for_extension)
        .ok_or_else(|| FileError::UnsupportedImage {
            path: path_str.clone(),
        })?;

    let data = fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FileError::NotFound {
                path: path_str.clone(),
            }
        } else {
            FileError::read_failed(path_str.clone(), e)
        }
    })?;

    tracing::debug!("参考模版已加载: {} ({} 字节)", path_str, data.len());

    Ok(SlideImage::new(mime, data))
}
