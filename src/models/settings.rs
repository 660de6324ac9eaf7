use super::target::TargetHandle;
use crate::error::ConfigError;
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 一周七天，顺序与存储中的默认值一致
pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// 存储中使用的星期名称（小写英文全称）
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// `updateConfig` 允许写入的键，与 `AutomationSettings` 的字段一一对应
pub const SETTING_KEYS: [&str; 7] = [
    "targets",
    "postsPerTarget",
    "enableLike",
    "enableRepost",
    "autoProcess",
    "scheduleTime",
    "scheduleDays",
];

/// 持久化的自动化设置，字段名与键值存储中的键一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutomationSettings {
    pub targets: Vec<String>,
    pub posts_per_target: u32,
    pub enable_like: bool,
    pub enable_repost: bool,
    /// 是否按定时自动运行
    pub auto_process: bool,
    /// "HH:MM"
    pub schedule_time: String,
    pub schedule_days: Vec<String>,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            targets: vec!["acceldata".to_string()],
            posts_per_target: 3,
            enable_like: true,
            enable_repost: true,
            auto_process: true,
            schedule_time: "11:00".to_string(),
            schedule_days: ALL_WEEKDAYS
                .iter()
                .map(|day| weekday_name(*day).to_string())
                .collect(),
        }
    }
}

impl AutomationSettings {
    /// 转换为经过校验的运行配置
    ///
    /// 无法识别的星期名称会被忽略；目标或时间格式错误则返回错误。
    pub fn to_configuration(&self) -> Result<Configuration, ConfigError> {
        let targets = self
            .targets
            .iter()
            .map(|raw| raw.parse::<TargetHandle>())
            .collect::<Result<Vec<_>, _>>()?;

        let time = parse_schedule_time(&self.schedule_time)?;

        let mut days: Vec<Weekday> = Vec::new();
        for raw in &self.schedule_days {
            match raw.trim().parse::<Weekday>() {
                Ok(day) if !days.contains(&day) => days.push(day),
                Ok(_) => {}
                Err(_) => warn!("⚠️ 忽略无法识别的星期: {}", raw),
            }
        }

        Ok(Configuration {
            targets,
            posts_per_target: self.posts_per_target as usize,
            enable_like: self.enable_like,
            enable_repost: self.enable_repost,
            schedule: ScheduleConfig {
                time,
                days,
                enabled: self.auto_process,
            },
        })
    }
}

/// 解析 "HH:MM"
pub fn parse_schedule_time(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        ConfigError::InvalidScheduleTime {
            value: value.to_string(),
        }
    })
}

/// 定时设置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub time: NaiveTime,
    /// 去重后的星期列表
    pub days: Vec<Weekday>,
    pub enabled: bool,
}

/// 一次运行使用的配置，按值传给每次批处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub targets: Vec<TargetHandle>,
    pub posts_per_target: usize,
    pub enable_like: bool,
    pub enable_repost: bool,
    pub schedule: ScheduleConfig,
}

impl Configuration {
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            posts_per_target: self.posts_per_target,
            enable_like: self.enable_like,
            enable_repost: self.enable_repost,
        }
    }
}

/// 发送给页面的批处理配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfig {
    pub posts_per_target: usize,
    #[serde(default = "enabled")]
    pub enable_like: bool,
    #[serde(default = "enabled")]
    pub enable_repost: bool,
}

fn enabled() -> bool {
    true
}
