use crate::models::slide::PresentationAnalysis;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载已分析好的幻灯片
pub async fn load_deck_from_toml(toml_file_path: &Path) -> Result<PresentationAnalysis> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let deck = parse_deck(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "成功加载 {} 张幻灯片: {}",
        deck.slides.len(),
        toml_file_path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(deck)
}

/// 解析 TOML 内容
pub fn parse_deck(content: &str) -> Result<PresentationAnalysis> {
    let deck: PresentationAnalysis = toml::from_str(content)?;
    if deck.slides.is_empty() {
        anyhow::bail!("TOML 中没有任何幻灯片");
    }
    Ok(deck)
}
