//! # Patent Gateway 服务入口
//!
//! 合作方 HTTP 路由面由外围胶水承载；本进程运行后台调度
//! （到期扫描 + 专利缓存刷新）。

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use patent_gateway::app::scheduler::BackgroundScheduler;
use patent_gateway::app::{AppContext, Stores};
use patent_gateway::config::AppConfig;
use patent_gateway::error::Result;
use patent_gateway::storage::memory::{
    MemoryKeyStore, MemoryPatentStore, MemorySubscriptionStore, MemoryUsageStore,
};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "patent-gateway", about = "Patent expiration metering gateway")]
struct Args {
    /// 配置文件路径（缺省使用内置默认值）
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => {
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config
        }
    };

    patent_gateway::logging::init_logging(config.log_level.as_ref());
    tracing::info!("patent-gateway 启动");

    let stores = Stores {
        keys: Arc::new(MemoryKeyStore::default()),
        usage: Arc::new(MemoryUsageStore::default()),
        subscriptions: Arc::new(MemorySubscriptionStore::default()),
        patents: Arc::new(MemoryPatentStore::default()),
    };

    let context = AppContext::build(config, stores).await?;

    let scheduler = BackgroundScheduler::new(
        Arc::clone(&context.sweep),
        Arc::clone(&context.refresh),
        context.config.scheduler.clone(),
    );
    let handles = scheduler.start();
    tracing::info!("后台调度已启动");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| patent_gateway::GatewayError::internal_with_source("等待停机信号失败", e))?;
    tracing::info!("收到停机信号，正在退出");

    scheduler.shutdown();
    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}
