//! 下一次触发时间的计算

use crate::models::{weekday_name, ScheduleConfig};
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday,
};

/// 定时器名称前缀
pub const ALARM_PREFIX: &str = "postAutomation_";

/// 夏令时跳过的时段最多向后查找的分钟数
const GAP_SEARCH_MINUTES: i64 = 180;

/// 某个星期对应的定时器名称，例如 `postAutomation_monday`
pub fn alarm_name(weekday: Weekday) -> String {
    format!("{}{}", ALARM_PREFIX, weekday_name(weekday))
}

/// 把本地时间解析为时区中的时刻
///
/// 重复的时刻取较早的一个；不存在的时刻（夏令时跳过）取跳过之后最早的有效时刻。
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => (1..=GAP_SEARCH_MINUTES)
            .find_map(|minutes| tz.from_local_datetime(&(local + Duration::minutes(minutes))).earliest()),
    }
}

/// 计算 `now` 之后（含）第一个星期为 `weekday`、本地时间为 `time` 的时刻
///
/// `now` 恰好等于目标时刻时返回 `now` 本身。
pub fn compute_next_fire<Tz: TimeZone>(
    weekday: Weekday,
    time: NaiveTime,
    now: &DateTime<Tz>,
) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();

    for offset in 0..=14 {
        let date = today + Duration::days(offset);
        if date.weekday() != weekday {
            continue;
        }
        if let Some(candidate) = resolve_local(&tz, date.and_time(time)) {
            if candidate >= *now {
                return candidate;
            }
        }
    }

    // 两周内找不到有效时刻只可能出现在极端的时区规则下
    now.clone() + Duration::days(7)
}

/// 一个已计算好的定时项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub name: String,
    pub weekday: Weekday,
    pub fire_time: DateTime<Utc>,
}

/// 为定时设置中的每个星期计算下一次触发时间，按触发时间排序
///
/// 定时关闭时返回空列表。
pub fn next_fires<Tz: TimeZone>(schedule: &ScheduleConfig, now: &DateTime<Tz>) -> Vec<ScheduleEntry> {
    if !schedule.enabled {
        return Vec::new();
    }

    let mut entries: Vec<ScheduleEntry> = schedule
        .days
        .iter()
        .map(|weekday| ScheduleEntry {
            name: alarm_name(*weekday),
            weekday: *weekday,
            fire_time: compute_next_fire(*weekday, schedule.time, now).with_timezone(&Utc),
        })
        .collect();
    entries.sort_by_key(|entry| entry.fire_time);
    entries
}
