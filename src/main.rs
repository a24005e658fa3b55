use anyhow::Result;
use slide_render_queue::{logger, App, Config};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    let summary = match run(config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("❌ 批次未能完成: {:#}", e);
            return Err(e);
        }
    };

    if summary.cancelled {
        warn!("批次已取消，{} 张幻灯片未生成", summary.not_attempted);
    }

    Ok(())
}

async fn run(config: Config) -> Result<slide_render_queue::BatchSummary> {
    App::initialize(config).await?.run().await
}
