//! 自动化服务 - 编排层
//!
//! 对外的命令入口：处理 `ServiceCommand`，维护定时器，
//! 并把定时器触发转换为自动化运行。

use super::automation::Orchestrator;
use super::page_host::PageHost;
use crate::error::AppResult;
use crate::models::{AutomationSettings, Configuration};
use crate::protocol::{ServiceCommand, ServiceResponse, Status};
use crate::scheduler::{ScheduleEntry, TimerRegistry, Trigger};
use crate::store::KeyValueStore;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 命令处理器
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: ServiceCommand) -> ServiceResponse;
}

/// 自动化服务
pub struct AutomationService<S: KeyValueStore, H: PageHost> {
    orchestrator: Arc<Orchestrator<S, H>>,
    timers: Mutex<TimerRegistry>,
}

impl<S, H> AutomationService<S, H>
where
    S: KeyValueStore + 'static,
    H: PageHost + 'static,
{
    /// `triggers` 是定时器触发时使用的发送端
    pub fn new(orchestrator: Arc<Orchestrator<S, H>>, triggers: mpsc::Sender<Trigger>) -> Self {
        Self {
            orchestrator,
            timers: Mutex::new(TimerRegistry::new(triggers)),
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator<S, H>> {
        &self.orchestrator
    }

    async fn current_configuration(&self) -> AppResult<Configuration> {
        let settings = self.orchestrator.settings().load_settings().await?;
        Ok(settings.to_configuration()?)
    }

    /// 按当前设置重新注册定时器，返回注册数量
    pub async fn reschedule(&self) -> AppResult<usize> {
        let configuration = self.current_configuration().await?;
        let mut timers = self.timers.lock().await;
        Ok(timers.register(&configuration.schedule, &chrono::Local::now()))
    }

    pub async fn alarms(&self) -> Vec<ScheduleEntry> {
        self.timers.lock().await.alarms()
    }

    /// 在后台启动一次运行并立即返回
    pub async fn spawn_run(&self, trigger: Trigger) -> AppResult<JoinHandle<()>> {
        let configuration = self.current_configuration().await?;
        let orchestrator = Arc::clone(&self.orchestrator);
        info!("▶️ 触发自动化运行: {:?}", trigger);

        Ok(tokio::spawn(async move {
            match orchestrator.run_automation(&configuration).await {
                Ok(report) => info!(
                    "✓ 运行结束: 成功 {}/{} 个目标",
                    report.succeeded(),
                    report.outcomes.len()
                ),
                Err(e) if e.is_run_in_progress() => warn!("⚠️ {}", e),
                Err(e) => error!("❌ 运行失败: {}", e),
            }
        }))
    }

    /// 持续消费定时器触发，直到所有发送端关闭
    pub async fn run_triggers(self: Arc<Self>, mut receiver: mpsc::Receiver<Trigger>) {
        while let Some(trigger) = receiver.recv().await {
            if let Err(e) = self.spawn_run(trigger).await {
                error!("❌ 无法启动定时运行: {}", e);
            }
        }
        info!("触发通道已关闭");
    }

    /// 合并到当前设置后必须仍能得到合法的运行配置，否则不写入
    async fn validate_update(&self, entries: &Map<String, Value>) -> AppResult<()> {
        let current = self.orchestrator.settings().load_settings().await?;
        let mut merged = match serde_json::to_value(current)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in entries {
            merged.insert(key.clone(), value.clone());
        }
        let candidate: AutomationSettings = serde_json::from_value(Value::Object(merged))?;
        candidate.to_configuration()?;
        Ok(())
    }

    async fn dispatch(&self, command: ServiceCommand) -> AppResult<ServiceResponse> {
        let settings = self.orchestrator.settings();
        match command {
            ServiceCommand::Run => {
                self.spawn_run(Trigger::Manual).await?;
                Ok(ServiceResponse::status(Status::Started))
            }
            ServiceCommand::ProcessingComplete { results } => {
                info!("📨 收到处理结果: {} ({} 条)", results.url, results.posts_processed);
                self.orchestrator.record_summary(results).await?;
                Ok(ServiceResponse::status(Status::Received))
            }
            ServiceCommand::UpdateConfig { config } => {
                self.validate_update(&config).await?;
                settings.update(config).await?;
                self.reschedule().await?;
                Ok(ServiceResponse::status(Status::Updated))
            }
            ServiceCommand::GetConfig => Ok(ServiceResponse::Config {
                config: settings.full_config().await?,
            }),
            ServiceCommand::GetHistory => Ok(ServiceResponse::History {
                history: settings.load_history().await?,
            }),
        }
    }
}

#[async_trait]
impl<S, H> CommandHandler for AutomationService<S, H>
where
    S: KeyValueStore + 'static,
    H: PageHost + 'static,
{
    async fn handle(&self, command: ServiceCommand) -> ServiceResponse {
        match self.dispatch(command).await {
            Ok(response) => response,
            Err(e) => {
                error!("❌ 命令处理失败: {}", e);
                ServiceResponse::error(e.to_string())
            }
        }
    }
}
