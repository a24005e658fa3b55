//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、创建日志文件、输出启动信息
//! 2. **文本分析**：调用分析服务（或读取 TOML 幻灯片文件）得到幻灯片规划
//! 3. **批次构建**：组装 `BatchContext`，加载用户模版
//! 4. **取消**：把 Ctrl-C 接到批次的取消令牌上
//! 5. **委托编排**：交给 `Orchestrator` 逐张生成
//! 6. **结果输出**：写图片、failed.txt、summary.json，打印统计
//!
//! 分析失败直接返回错误，不会开始任何生成。

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::CancelToken;
use crate::models::job::{BatchContext, BatchSummary};
use crate::models::loaders::load_template_image;
use crate::models::slide::PresentationAnalysis;
use crate::orchestrator::deck_processor::Orchestrator;
use crate::orchestrator::observer::{BatchObserver, TracingObserver};
use crate::services::analysis::{AnalysisOptions, AnalysisService, TomlDeckAnalysis};
use crate::services::gemini_generator::GeminiImageGenerator;
use crate::services::generator::ImageGenerator;
use crate::services::llm_analysis::{read_input_text, LlmAnalysisService};
use crate::services::output_writer::OutputWriter;
use crate::utils::logging::{init_log_file, log_deck_loaded, log_startup, print_final_stats, truncate_text};

/// 有用户模版时交给分析模型的风格描述
const TEMPLATE_REFERENCE_STYLE: &str = "沿用用户上传的参考模版：保持其配色、版式结构与整体氛围。";

/// 应用主结构
pub struct App {
    config: Config,
    analysis: Box<dyn AnalysisService>,
    generator: Arc<dyn ImageGenerator>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        let analysis: Box<dyn AnalysisService> = match &config.deck_file {
            Some(deck) => Box::new(TomlDeckAnalysis::new(deck)),
            None => Box::new(LlmAnalysisService::new(&config)),
        };
        let generator: Arc<dyn ImageGenerator> = Arc::new(GeminiImageGenerator::new(&config));

        Self::with_services(config, analysis, generator)
    }

    /// 使用指定的服务创建应用
    pub fn with_services(
        config: Config,
        analysis: Box<dyn AnalysisService>,
        generator: Arc<dyn ImageGenerator>,
    ) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(config.min_interval_secs, config.max_transient_retries);

        Ok(Self {
            config,
            analysis,
            generator,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BatchSummary> {
        let cancel = CancelToken::new();
        let signal_task = spawn_ctrl_c_listener(cancel.clone());

        let result = self.run_with(&TracingObserver, &cancel).await;

        signal_task.abort();
        result
    }

    /// 使用指定的观察者和取消令牌运行
    pub async fn run_with(&self, observer: &dyn BatchObserver, cancel: &CancelToken) -> Result<BatchSummary> {
        let template = match &self.config.template_image {
            Some(path) => Some(load_template_image(Path::new(path)).await?),
            None => None,
        };

        let analysis = self.analyze(template.is_some()).await?;

        let mut batch = BatchContext::from_analysis(&analysis, self.config.min_interval());
        if let Some(template) = template {
            batch = batch.with_user_template(template);
        }
        log_deck_loaded(batch.total(), self.config.min_interval_secs, batch.user_template.is_some());

        let orchestrator = Orchestrator::from_config(self.generator.clone(), &self.config);
        let summary = orchestrator.run(batch, observer, cancel).await;

        let writer = OutputWriter::new(&self.config.output_dir);
        let written = writer.write_summary(&summary).await?;
        info!("💾 已保存 {} 张图片", written.len());

        print_final_stats(&summary, &self.config.output_dir, &self.config.output_log_file);

        Ok(summary)
    }

    /// 文本分析（批次开始前）
    async fn analyze(&self, has_template: bool) -> Result<PresentationAnalysis> {
        let text = match &self.config.deck_file {
            Some(_) => String::new(),
            None => read_input_text(&self.config.input_file).await?,
        };
        if !text.is_empty() {
            info!("📄 输入文本: {}", truncate_text(text.trim(), 40));
        }

        let options = AnalysisOptions {
            richness: self.config.text_richness,
            slide_count: self.config.slide_count,
            reference_style: has_template.then(|| TEMPLATE_REFERENCE_STYLE.to_string()),
            visual_style: self.config.visual_style.clone(),
            system_prompt: None,
        };

        let analysis = self.analysis.analyze(&text, &options).await?;
        if analysis.slides.is_empty() {
            anyhow::bail!("分析结果中没有幻灯片");
        }
        Ok(analysis)
    }
}

/// 收到 Ctrl-C 时取消批次
fn spawn_ctrl_c_listener(cancel: CancelToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹️ 收到 Ctrl-C，当前幻灯片完成后停止");
            cancel.cancel();
        }
    })
}
