//! # 后台任务调度器
//!
//! 到期扫描与缓存刷新在独立的固定间隔循环中运行，
//! 与请求服务并发；通过 watch 通道协调停机。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app::refresh::PatentCacheRefresh;
use crate::config::SchedulerConfig;
use crate::webhook::sweep::ExpirationSweep;

/// 后台任务调度器
pub struct BackgroundScheduler {
    sweep: Arc<ExpirationSweep>,
    refresh: Arc<PatentCacheRefresh>,
    config: SchedulerConfig,
    shutdown_tx: watch::Sender<bool>,
}

impl BackgroundScheduler {
    #[must_use]
    pub fn new(
        sweep: Arc<ExpirationSweep>,
        refresh: Arc<PatentCacheRefresh>,
        config: SchedulerConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            sweep,
            refresh,
            config,
            shutdown_tx,
        }
    }

    /// 启动全部后台循环
    #[must_use]
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        {
            let sweep = Arc::clone(&self.sweep);
            let interval = Duration::from_secs(self.config.sweep_interval_secs);
            let mut shutdown_rx = self.shutdown_tx.subscribe();
            handles.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = sweep.run_once().await {
                                tracing::error!(error = %e, "到期扫描执行失败");
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            tracing::info!("到期扫描循环停止");
                            break;
                        }
                    }
                }
            }));
        }

        {
            let refresh = Arc::clone(&self.refresh);
            let interval = Duration::from_secs(self.config.refresh_interval_secs);
            let mut shutdown_rx = self.shutdown_tx.subscribe();
            handles.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                // 首个 tick 立即触发，启动时先完成一次全量刷新
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = refresh.run_once().await {
                                tracing::error!(error = %e, "专利缓存刷新失败");
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            tracing::info!("缓存刷新循环停止");
                            break;
                        }
                    }
                }
            }));
        }

        handles
    }

    /// 通知全部循环停机
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
