use crate::browser;
use crate::config::Config;
use crate::host;
use crate::orchestrator::{
    AutomationService, BatchRunner, ChromePageHost, Orchestrator, OrchestratorOptions, RunReport,
};
use crate::scheduler::{next_fires, Trigger};
use crate::services::{ElementResolver, RunLog};
use crate::store::{JsonFileStore, SettingsStore};
use crate::utils::logging;
use crate::workflow::InteractionFlow;
use anyhow::{Context, Result};
use chromiumoxide::Browser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

const TRIGGER_QUEUE: usize = 16;

type Service = AutomationService<JsonFileStore, ChromePageHost>;

/// 应用主结构
pub struct App {
    service: Arc<Service>,
    triggers: mpsc::Receiver<Trigger>,
}

impl App {
    /// 初始化应用：运行日志、浏览器、存储、服务
    pub async fn initialize(config: Config) -> Result<Self> {
        let run_log = RunLog::new(&config.output_log_file);
        run_log.init().await?;

        logging::log_startup(&config);

        let browser = open_browser(&config).await?;

        let runner = BatchRunner::new(
            InteractionFlow::new(ElementResolver::new(), config.interaction_delays()),
            config.between_posts(),
        );
        let host = Arc::new(ChromePageHost::new(
            browser,
            config.service_host.clone(),
            runner,
        ));

        let orchestrator = Orchestrator::new(
            settings_store(&config),
            host,
            OrchestratorOptions::from_config(&config),
        )
        .with_run_log(run_log);

        let (sender, triggers) = mpsc::channel(TRIGGER_QUEUE);
        let service = Arc::new(AutomationService::new(Arc::new(orchestrator), sender));

        Ok(Self { service, triggers })
    }

    /// 立即执行一次自动化运行
    pub async fn run_once(&self) -> Result<RunReport> {
        let orchestrator = self.service.orchestrator();
        let configuration = orchestrator
            .settings()
            .load_settings()
            .await?
            .to_configuration()?;
        Ok(orchestrator.run_automation(&configuration).await?)
    }

    /// 常驻运行：注册定时器，处理 stdin 命令
    ///
    /// stdin 关闭后定时器继续运行，直到收到 Ctrl+C。
    pub async fn serve(self) -> Result<()> {
        let registered = self.service.reschedule().await?;
        info!("⏰ 已注册 {} 个定时器", registered);

        let trigger_loop = tokio::spawn(Arc::clone(&self.service).run_triggers(self.triggers));

        if let Err(e) = host::run_stdio_bridge(self.service.as_ref()).await {
            warn!("⚠️ 命令通道异常退出: {}", e);
        }

        info!("命令通道已关闭，定时器继续运行，按 Ctrl+C 退出");
        tokio::signal::ctrl_c().await.context("无法监听 Ctrl+C")?;
        trigger_loop.abort();
        info!("👋 程序退出");
        Ok(())
    }
}

/// 打印按当前设置计算出的下一次触发时间（不连接浏览器）
pub async fn print_schedule(config: &Config) -> Result<()> {
    let settings = settings_store(config).load_settings().await?;
    let configuration = settings.to_configuration()?;
    let entries = next_fires(&configuration.schedule, &chrono::Local::now());

    if entries.is_empty() {
        println!("定时已关闭（autoProcess = false）或没有配置星期");
        return Ok(());
    }

    println!("目标: {}", settings.targets.join(", "));
    for entry in entries {
        println!(
            "{:<28} {}",
            entry.name,
            entry
                .fire_time
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M (%a)")
        );
    }
    Ok(())
}

fn settings_store(config: &Config) -> SettingsStore<JsonFileStore> {
    SettingsStore::new(Arc::new(JsonFileStore::new(&config.store_path)))
}

async fn open_browser(config: &Config) -> Result<Browser> {
    if config.launch_headless {
        return browser::launch_browser(config.chrome_executable.as_deref(), true).await;
    }
    browser::connect_to_browser(config.browser_debug_port)
        .await
        .with_context(|| {
            format!(
                "请先以 --remote-debugging-port={} 启动浏览器并登录",
                config.browser_debug_port
            )
        })
}
