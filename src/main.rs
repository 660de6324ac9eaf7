use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use post_automator::app::{self, App};
use post_automator::utils::logging;
use post_automator::Config;
use std::path::PathBuf;
use tracing::{info, warn};

/// 定时为指定主页的最新帖子点赞并转发
#[derive(Parser)]
#[command(name = "post-automator", version, about)]
struct Cli {
    /// TOML 配置文件路径
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// 常驻运行：定时器 + stdin 命令通道（默认）
    Daemon,

    /// 立即执行一次自动化运行
    Run,

    /// 打印下一次定时触发时间
    Schedule,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref()).context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging || cli.verbose);

    match cli.command.unwrap_or(Command::Daemon) {
        Command::Daemon => App::initialize(config).await?.serve().await,
        Command::Run => {
            let report = App::initialize(config).await?.run_once().await?;
            if report.failed() > 0 {
                warn!("⚠️ {} 个目标处理失败", report.failed());
            } else {
                info!("✅ 所有目标处理完成");
            }
            Ok(())
        }
        Command::Schedule => app::print_schedule(&config).await,
    }
}
