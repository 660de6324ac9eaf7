//! 自动化运行器 - 编排层
//!
//! ## 职责
//!
//! 一次自动化运行 = 按顺序处理配置中的每个目标：
//!
//! 1. **互斥**：同一时刻只允许一次运行，忙时直接跳过
//! 2. **打开页面**：委托 `PageHost`
//! 3. **等待稳定**：固定等待页面渲染
//! 4. **下发命令**：向页面代理发送 `processPosts` 并限时等待回复
//! 5. **记录**：写入运行历史、最后运行时间和运行日志
//!
//! 单个目标失败只记录日志，继续处理下一个目标。

use super::page_host::PageHost;
use crate::config::Config;
use crate::error::{AppError, AppResult, AutomationError};
use crate::models::{BatchConfig, Configuration, RunSummary};
use crate::protocol::PageCommand;
use crate::services::RunLog;
use crate::store::{KeyValueStore, SettingsStore};
use crate::utils::logging;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// 运行器的时间参数
#[derive(Clone, Debug)]
pub struct OrchestratorOptions {
    pub service_host: String,
    pub page_stabilize: Duration,
    pub command_timeout: Duration,
}

impl OrchestratorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            service_host: config.service_host.clone(),
            page_stabilize: config.page_stabilize(),
            command_timeout: config.command_timeout(),
        }
    }
}

/// 单个目标的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub url: String,
    pub summary: Option<RunSummary>,
    pub error: Option<String>,
}

/// 一次运行的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn posts_processed(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.summary.as_ref())
            .map(|s| s.posts_processed)
            .sum()
    }
}

/// 自动化运行器
pub struct Orchestrator<S: KeyValueStore, H: PageHost> {
    settings: SettingsStore<S>,
    host: Arc<H>,
    options: OrchestratorOptions,
    run_log: Option<RunLog>,
    run_lock: Mutex<()>,
}

impl<S: KeyValueStore, H: PageHost> Orchestrator<S, H> {
    pub fn new(settings: SettingsStore<S>, host: Arc<H>, options: OrchestratorOptions) -> Self {
        Self {
            settings,
            host,
            options,
            run_log: None,
            run_lock: Mutex::new(()),
        }
    }

    /// 同时把每个目标的结果写入运行日志文件
    pub fn with_run_log(mut self, run_log: RunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    pub fn settings(&self) -> &SettingsStore<S> {
        &self.settings
    }

    /// 执行一次自动化运行
    ///
    /// 已有运行在进行时返回 `RunInProgress`，不会排队。
    pub async fn run_automation(&self, config: &Configuration) -> AppResult<RunReport> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| AutomationError::RunInProgress)?;

        let total = config.targets.len();
        logging::log_run_start(total, config.posts_per_target);

        let batch = config.batch_config();
        let mut report = RunReport::default();

        for (index, target) in config.targets.iter().enumerate() {
            let target_index = index + 1;
            let url = target.feed_url(&self.options.service_host);
            logging::log_target_start(target_index, total, &url);

            let outcome = match self.process_target(&url, &batch).await {
                Ok(summary) => {
                    info!(
                        "[目标 {}] ✅ 处理完成: {} 条帖子",
                        target_index, summary.posts_processed
                    );
                    let error = match self.record_summary(summary.clone()).await {
                        Ok(()) => None,
                        Err(e) => {
                            error!("[目标 {}] ❌ 写入运行历史失败: {}", target_index, e);
                            Some(e.to_string())
                        }
                    };
                    self.log_success(&url, summary.posts_processed).await;
                    TargetOutcome {
                        url,
                        summary: Some(summary),
                        error,
                    }
                }
                Err(e) => {
                    error!("[目标 {}] ❌ 处理失败: {}", target_index, e);
                    self.log_failure(&url, &e).await;
                    TargetOutcome {
                        url,
                        summary: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        logging::print_final_stats(
            report.succeeded(),
            report.failed(),
            total,
            report.posts_processed(),
            self.run_log.as_ref().map(RunLog::path).unwrap_or("-"),
        );
        Ok(report)
    }

    async fn process_target(&self, url: &str, batch: &BatchConfig) -> AppResult<RunSummary> {
        let handle = self
            .host
            .open(url)
            .await
            .map_err(|e| AppError::target_unreachable(url, e))?;

        if !self.options.page_stabilize.is_zero() {
            info!("⏳ 等待页面稳定 {} 毫秒", self.options.page_stabilize.as_millis());
            tokio::time::sleep(self.options.page_stabilize).await;
        }

        let result = handle
            .request(
                PageCommand::ProcessPosts { config: *batch },
                self.options.command_timeout,
                url,
            )
            .await;
        if let Err(e) = &result {
            if e.is_page_unresponsive() {
                self.host.discard(url).await;
            }
        }
        Ok(result?.summary)
    }

    /// 写入运行历史并更新最后运行时间
    pub async fn record_summary(&self, summary: RunSummary) -> AppResult<()> {
        self.settings.record_run(summary).await?;
        self.settings.set_last_run(Utc::now()).await
    }

    async fn log_success(&self, url: &str, posts: usize) {
        if let Some(run_log) = &self.run_log {
            if let Err(e) = run_log.write_success(url, posts).await {
                warn!("⚠️ 写入运行日志失败: {:#}", e);
            }
        }
    }

    async fn log_failure(&self, url: &str, err: &AppError) {
        if let Some(run_log) = &self.run_log {
            if let Err(e) = run_log.write_failure(url, &err.to_string()).await {
                warn!("⚠️ 写入运行日志失败: {:#}", e);
            }
        }
    }
}
