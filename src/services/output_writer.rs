//! 结果写入服务 - 业务能力层
//!
//! 只负责把批次结果落盘，不关心流程

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::FileError;
use crate::models::job::{BatchSummary, JobOutcome, JobStatus, SlideJob};

/// 写入 `summary.json` 的内容
#[derive(Debug, Serialize)]
struct SummaryFile<'a> {
    total: usize,
    succeeded: usize,
    failed: usize,
    not_attempted: usize,
    cancelled: bool,
    total_attempts: u32,
    jobs: Vec<JobOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<&'a str>,
}

/// 结果写入服务
///
/// 职责：
/// - 保存成功的幻灯片图片
/// - 把失败/未执行的任务追加到 failed.txt
/// - 写入 summary.json
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 图片文件名：`slide_<NN>_<id>.<ext>`
    pub fn image_file_name(index: usize, job: &SlideJob, extension: &str) -> String {
        let id: String = job
            .id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("slide_{:02}_{}.{}", index + 1, id, extension)
    }

    /// 写入一个批次的全部结果，返回写出的图片路径
    pub async fn write_summary(&self, summary: &BatchSummary) -> Result<Vec<PathBuf>, FileError> {
        let dir_display = self.output_dir.display().to_string();
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| FileError::write_failed(dir_display, e))?;
        self.reset_failed().await?;

        let mut written = Vec::new();
        for (index, job) in summary.jobs.iter().enumerate() {
            if let Some(path) = self.write_image(index, job).await? {
                written.push(path);
            }
            if job.status != JobStatus::Succeeded {
                self.write_failed(index, job).await?;
            }
        }

        let names: Vec<String> = written
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        let file = SummaryFile {
            total: summary.total(),
            succeeded: summary.succeeded,
            failed: summary.failed,
            not_attempted: summary.not_attempted,
            cancelled: summary.cancelled,
            total_attempts: summary.total_attempts,
            jobs: summary.outcomes(),
            images: names.iter().map(String::as_str).collect(),
        };

        let path = self.output_dir.join("summary.json");
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| FileError::write_failed(path.display().to_string(), e.into()))?;
        fs::write(&path, json)
            .await
            .map_err(|e| FileError::write_failed(path.display().to_string(), e))?;

        debug!("结果已写入: {}", self.output_dir.display());
        Ok(written)
    }

    /// 保存成功任务的图片
    async fn write_image(&self, index: usize, job: &SlideJob) -> Result<Option<PathBuf>, FileError> {
        let Some(image) = job.image.as_ref().filter(|_| job.status == JobStatus::Succeeded) else {
            return Ok(None);
        };

        let path = self
            .output_dir
            .join(Self::image_file_name(index, job, image.extension()));
        fs::write(&path, image.data())
            .await
            .map_err(|e| FileError::write_failed(path.display().to_string(), e))?;

        debug!("图片已保存: {} ({} 字节)", path.display(), image.len());
        Ok(Some(path))
    }

    /// 清掉上一个批次留下的 failed.txt
    async fn reset_failed(&self) -> Result<(), FileError> {
        let path = self.output_dir.join("failed.txt");
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FileError::write_failed(path.display().to_string(), e)),
        }
    }

    /// 追加一行失败记录
    async fn write_failed(&self, index: usize, job: &SlideJob) -> Result<(), FileError> {
        let path = self.output_dir.join("failed.txt");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| FileError::write_failed(path.display().to_string(), e))?;

        let line = format!(
            "幻灯片 {} | ID {} | 状态: {} | 原因: {} | 尝试 {} 次\n",
            index + 1,
            job.id,
            job.status,
            job.error_note.as_deref().unwrap_or("not_attempted"),
            job.attempts
        );

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| FileError::write_failed(path.display().to_string(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::image::SlideImage;

    fn job(id: &str, status: JobStatus, note: Option<&str>) -> SlideJob {
        let mut job = SlideJob::new(id, "prompt");
        job.status = status;
        job.error_note = note.map(String::from);
        job.attempts = u32::from(status != JobStatus::Pending);
        if status == JobStatus::Succeeded {
            job.image = Some(SlideImage::new("image/png", vec![1u8, 2, 3]));
        }
        job
    }

    #[test]
    fn test_image_file_name() {
        let job = SlideJob::new("intro/1", "p");
        assert_eq!(OutputWriter::image_file_name(2, &job, "png"), "slide_03_intro_1.png");
    }

    #[tokio::test]
    async fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path().join("out"));

        let summary = BatchSummary::from_jobs(
            vec![
                job("1", JobStatus::Succeeded, None),
                job("2", JobStatus::Failed, Some("quota_exhausted")),
                job("3", JobStatus::Pending, None),
            ],
            true,
        );

        let written = writer.write_summary(&summary).await.unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(std::fs::read(&written[0]).unwrap(), vec![1, 2, 3]);
        assert!(written[0].ends_with("slide_01_1.png"));

        let failed = std::fs::read_to_string(writer.output_dir().join("failed.txt")).unwrap();
        let lines: Vec<&str> = failed.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("quota_exhausted"));
        assert!(lines[1].contains("not_attempted"));

        let json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(writer.output_dir().join("summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json["succeeded"], 1);
        assert_eq!(json["not_attempted"], 1);
        assert_eq!(json["cancelled"], true);
        assert_eq!(json["jobs"][1]["error_note"], "quota_exhausted");
        assert_eq!(json["images"][0], "slide_01_1.png");
    }

    #[tokio::test]
    async fn test_failed_list_only_covers_latest_batch() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());

        let first = BatchSummary::from_jobs(vec![job("1", JobStatus::Failed, Some("quota_exhausted"))], false);
        writer.write_summary(&first).await.unwrap();

        let second = BatchSummary::from_jobs(vec![job("a", JobStatus::Failed, Some("invalid_request"))], false);
        writer.write_summary(&second).await.unwrap();

        let failed = std::fs::read_to_string(dir.path().join("failed.txt")).unwrap();
        let lines: Vec<&str> = failed.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("invalid_request"));

        let all_ok = BatchSummary::from_jobs(vec![job("b", JobStatus::Succeeded, None)], false);
        writer.write_summary(&all_ok).await.unwrap();
        assert!(!dir.path().join("failed.txt").exists());
    }
}
