//! 每周定时器
//!
//! 每个配置的星期对应一个 tokio 任务：等到首次触发时间，之后每 7 天触发一次，
//! 触发时向通道发送 `Trigger::Scheduled`。

use super::next_fire::{next_fires, ScheduleEntry};
use crate::models::ScheduleConfig;
use chrono::{DateTime, TimeZone, Utc, Weekday};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// 定时器周期：一周
pub const TIMER_PERIOD: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// 一次运行的触发来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Scheduled(Weekday),
}

struct Timer {
    entry: ScheduleEntry,
    task: JoinHandle<()>,
}

/// 定时器注册表
pub struct TimerRegistry {
    sender: mpsc::Sender<Trigger>,
    timers: Vec<Timer>,
}

impl TimerRegistry {
    pub fn new(sender: mpsc::Sender<Trigger>) -> Self {
        Self {
            sender,
            timers: Vec::new(),
        }
    }

    /// 按定时设置重新注册所有定时器（先清除旧的）
    ///
    /// 返回注册的定时器数量；定时关闭时不注册任何定时器。
    pub fn register<Tz: TimeZone>(&mut self, schedule: &ScheduleConfig, now: &DateTime<Tz>) -> usize {
        let cleared = self.clear_all();
        if cleared > 0 {
            debug!("已清除 {} 个旧定时器", cleared);
        }

        let now_utc = now.with_timezone(&Utc);
        for entry in next_fires(schedule, now) {
            let delay = (entry.fire_time - now_utc).to_std().unwrap_or(Duration::ZERO);
            info!(
                "⏰ 注册定时器 {}: 首次触发 {}",
                entry.name,
                entry.fire_time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
            );
            let task = tokio::spawn(weekly_timer(entry.weekday, delay, self.sender.clone()));
            self.timers.push(Timer { entry, task });
        }

        if self.timers.is_empty() {
            info!("⏰ 定时已关闭或没有配置星期，未注册定时器");
        }
        self.timers.len()
    }

    /// 清除所有定时器，返回清除的数量
    pub fn clear_all(&mut self) -> usize {
        let count = self.timers.len();
        for timer in self.timers.drain(..) {
            timer.task.abort();
        }
        count
    }

    /// 当前注册的定时器（首次触发时间）
    pub fn alarms(&self) -> Vec<ScheduleEntry> {
        self.timers.iter().map(|timer| timer.entry.clone()).collect()
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.clear_all();
    }
}

async fn weekly_timer(weekday: Weekday, delay: Duration, sender: mpsc::Sender<Trigger>) {
    let mut interval = tokio::time::interval_at(Instant::now() + delay, TIMER_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        debug!("⏰ 定时器触发: {:?}", weekday);
        if sender.send(Trigger::Scheduled(weekday)).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveTime, Timelike};

    fn schedule_at(now: &DateTime<Utc>, days: Vec<Weekday>) -> ScheduleConfig {
        ScheduleConfig {
            time: NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap(),
            days,
            enabled: true,
        }
    }

    fn minute_start(now: DateTime<Utc>) -> DateTime<Utc> {
        now.with_second(0).unwrap().with_nanosecond(0).unwrap()
    }

    #[tokio::test]
    async fn due_timer_fires_immediately() {
        let (sender, mut receiver) = mpsc::channel(4);
        let mut registry = TimerRegistry::new(sender);
        let now = minute_start(Utc::now());

        let count = registry.register(&schedule_at(&now, vec![now.weekday()]), &now);
        assert_eq!(count, 1);

        let trigger = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
            .await
            .unwrap();
        assert_eq!(trigger, Some(Trigger::Scheduled(now.weekday())));
    }

    #[tokio::test]
    async fn register_replaces_previous_timers() {
        let (sender, _receiver) = mpsc::channel(4);
        let mut registry = TimerRegistry::new(sender);
        let now = minute_start(Utc::now());

        registry.register(&schedule_at(&now, crate::models::ALL_WEEKDAYS.to_vec()), &now);
        assert_eq!(registry.alarms().len(), 7);

        registry.register(&schedule_at(&now, vec![Weekday::Tue, Weekday::Thu]), &now);
        let names: Vec<String> = registry.alarms().into_iter().map(|a| a.name).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"postAutomation_tuesday".to_string()));
        assert!(names.contains(&"postAutomation_thursday".to_string()));
    }

    #[tokio::test]
    async fn disabled_schedule_registers_nothing() {
        let (sender, _receiver) = mpsc::channel(4);
        let mut registry = TimerRegistry::new(sender);
        let now = Utc::now();
        let mut schedule = schedule_at(&now, vec![Weekday::Mon]);
        schedule.enabled = false;

        assert_eq!(registry.register(&schedule, &now), 0);
        assert!(registry.alarms().is_empty());
        assert_eq!(registry.clear_all(), 0);
    }
}
