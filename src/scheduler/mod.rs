//! 定时调度
//!
//! - `next_fire` - 计算每个星期的下一次触发时间
//! - `timers` - 每周定时器，触发时通过通道通知自动化服务

pub mod next_fire;
pub mod timers;

pub use next_fire::{alarm_name, compute_next_fire, next_fires, ScheduleEntry, ALARM_PREFIX};
pub use timers::{TimerRegistry, Trigger, TIMER_PERIOD};
