/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use crate::config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 日志写到 stderr，stdout 留给命令协议。
/// `RUST_LOG` 优先；否则默认 info，`verbose` 时为 debug。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）时忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 帖子自动互动");
    info!("🌐 站点: {}", config.service_host);
    info!("💾 存储文件: {}", config.store_path);
    info!("{}", "=".repeat(60));
}

/// 记录一次运行开始
pub fn log_run_start(targets: usize, posts_per_target: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始自动化运行: {} 个目标，每个最多 {} 条帖子", targets, posts_per_target);
    info!("{}", "=".repeat(60));
}

/// 记录单个目标开始
pub fn log_target_start(target_index: usize, total: usize, url: &str) {
    info!("\n{}", "─".repeat(60));
    info!("[目标 {}] 📄 开始处理 {}/{}: {}", target_index, target_index, total, url);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(success: usize, failed: usize, total: usize, posts: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 本次运行统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功目标: {}/{}", success, total);
    info!("❌ 失败目标: {}", failed);
    info!("📝 处理帖子: {}", posts);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}
