use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序运行配置
///
/// 自动化任务本身的设置（目标主页、点赞/转发开关、定时）保存在键值存储中，
/// 这里只包含进程级别的运行参数。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否自行启动无头浏览器（否则连接已打开的浏览器）
    pub launch_headless: bool,
    /// 浏览器可执行文件路径（仅启动无头浏览器时使用）
    pub chrome_executable: Option<String>,
    /// 目标站点主机名
    pub service_host: String,
    /// 键值存储文件
    pub store_path: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 打开页面后等待页面稳定的时间（毫秒）
    pub page_stabilize_ms: u64,
    /// 点赞后的等待时间（毫秒）
    pub settle_ms: u64,
    /// 点赞成功后到开始转发前的等待时间（毫秒）
    pub repost_delay_ms: u64,
    /// 点击转发按钮后等待菜单出现的时间（毫秒）
    pub menu_open_ms: u64,
    /// 确认转发后的等待时间（毫秒）
    pub repost_settle_ms: u64,
    /// 两条帖子之间的等待时间（毫秒）
    pub between_posts_ms: u64,
    /// 等待页面返回处理结果的超时时间（秒）
    pub command_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            launch_headless: false,
            chrome_executable: None,
            service_host: "www.linkedin.com".to_string(),
            store_path: "post_automator_store.json".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            page_stabilize_ms: 5000,
            settle_ms: 500,
            repost_delay_ms: 1000,
            menu_open_ms: 1000,
            repost_settle_ms: 1000,
            between_posts_ms: 2000,
            command_timeout_secs: 180,
        }
    }
}

impl Config {
    /// 从默认值 + 环境变量构建配置
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，再叠加环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    ConfigError::FileParseFailed {
                        path: path.display().to_string(),
                        source: Box::new(e),
                    }
                })?;
                toml::from_str::<Config>(&content).map_err(|e| ConfigError::FileParseFailed {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })?
            }
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    fn with_env_overrides(self) -> AppResult<Self> {
        Ok(Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", "u16")?
                .unwrap_or(self.browser_debug_port),
            launch_headless: env_parse("LAUNCH_HEADLESS", "bool")?.unwrap_or(self.launch_headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE")
                .ok()
                .or(self.chrome_executable),
            service_host: std::env::var("SERVICE_HOST").unwrap_or(self.service_host),
            store_path: std::env::var("STORE_PATH").unwrap_or(self.store_path),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            page_stabilize_ms: env_parse("PAGE_STABILIZE_MS", "u64")?
                .unwrap_or(self.page_stabilize_ms),
            settle_ms: env_parse("SETTLE_MS", "u64")?.unwrap_or(self.settle_ms),
            repost_delay_ms: env_parse("REPOST_DELAY_MS", "u64")?.unwrap_or(self.repost_delay_ms),
            menu_open_ms: env_parse("MENU_OPEN_MS", "u64")?.unwrap_or(self.menu_open_ms),
            repost_settle_ms: env_parse("REPOST_SETTLE_MS", "u64")?
                .unwrap_or(self.repost_settle_ms),
            between_posts_ms: env_parse("BETWEEN_POSTS_MS", "u64")?
                .unwrap_or(self.between_posts_ms),
            command_timeout_secs: env_parse("COMMAND_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.command_timeout_secs),
        })
    }

    /// 帖子交互各步骤的等待时间
    pub fn interaction_delays(&self) -> InteractionDelays {
        InteractionDelays {
            settle: Duration::from_millis(self.settle_ms),
            before_repost: Duration::from_millis(self.repost_delay_ms),
            menu_open: Duration::from_millis(self.menu_open_ms),
            repost_settle: Duration::from_millis(self.repost_settle_ms),
        }
    }

    pub fn between_posts(&self) -> Duration {
        Duration::from_millis(self.between_posts_ms)
    }

    pub fn page_stabilize(&self) -> Duration {
        Duration::from_millis(self.page_stabilize_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// 帖子交互的固定等待时间
///
/// 每次模拟点击之后页面都会异步变化，下一次读取前必须等待。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteractionDelays {
    /// 点赞点击后
    pub settle: Duration,
    /// 点赞成功后、点击转发按钮前
    pub before_repost: Duration,
    /// 点击转发按钮后、查找确认菜单项前
    pub menu_open: Duration,
    /// 点击确认转发后
    pub repost_settle: Duration,
}

impl InteractionDelays {
    /// 所有等待都为零（用于测试）
    pub fn none() -> Self {
        Self {
            settle: Duration::ZERO,
            before_repost: Duration::ZERO,
            menu_open: Duration::ZERO,
            repost_settle: Duration::ZERO,
        }
    }
}

impl Default for InteractionDelays {
    fn default() -> Self {
        Config::default().interaction_delays()
    }
}

fn env_parse<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value: value.clone(),
                expected_type: expected_type.to_string(),
            }
            .into()),
        },
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_timings() {
        let config = Config::default();
        let delays = config.interaction_delays();
        assert_eq!(delays.settle, Duration::from_millis(500));
        assert_eq!(delays.before_repost, Duration::from_secs(1));
        assert_eq!(config.between_posts(), Duration::from_secs(2));
        assert_eq!(config.page_stabilize(), Duration::from_secs(5));
    }

    #[test]
    fn load_reads_partial_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("automator.toml");
        std::fs::write(
            &path,
            "service_host = \"example.test\"\nsettle_ms = 10\ncommand_timeout_secs = 3\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.settle_ms, 10);
        assert_eq!(config.command_timeout(), Duration::from_secs(3));
        assert_eq!(config.between_posts_ms, 2000);
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "settle_ms = \"soon\"").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::Config(ConfigError::FileParseFailed { .. })
        ));
    }
}
