//! 参考图选择
//!
//! 优先级：
//! 1. 用户模版：所有任务（包括第 0 个）都用它
//! 2. 第 0 个任务：没有参考图
//! 3. 其余任务：第 0 个任务成功时的图片，否则没有参考图

use std::fmt;

use crate::models::image::SlideImage;
use crate::models::job::BatchContext;

/// 参考图来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSource {
    UserTemplate,
    FirstSlide,
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceSource::UserTemplate => write!(f, "用户模版"),
            ReferenceSource::FirstSlide => write!(f, "首张幻灯片"),
        }
    }
}

/// 选中的参考图
#[derive(Debug, Clone, Copy)]
pub struct ResolvedReference<'a> {
    pub source: ReferenceSource,
    pub image: &'a SlideImage,
}

/// 第 0 个任务成功后的图片缓存，每个批次最多写入一次
#[derive(Debug, Default)]
pub struct FirstImageCache {
    image: Option<SlideImage>,
}

impl FirstImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录成功图片，只接受第 0 个任务且没有用户模版时的写入
    ///
    /// 返回是否写入。
    pub fn store(&mut self, job_index: usize, has_user_template: bool, image: &SlideImage) -> bool {
        if job_index != 0 || has_user_template || self.image.is_some() {
            return false;
        }
        self.image = Some(image.clone());
        true
    }

    pub fn get(&self) -> Option<&SlideImage> {
        self.image.as_ref()
    }
}

/// 为第 `job_index` 个任务选择参考图
pub fn resolve<'a>(
    batch: &'a BatchContext,
    job_index: usize,
    cached_first_image: Option<&'a SlideImage>,
) -> Option<ResolvedReference<'a>> {
    if let Some(template) = batch.user_template.as_ref() {
        return Some(ResolvedReference {
            source: ReferenceSource::UserTemplate,
            image: template,
        });
    }

    if job_index == 0 {
        return None;
    }

    cached_first_image.map(|image| ResolvedReference {
        source: ReferenceSource::FirstSlide,
        image,
    })
}
