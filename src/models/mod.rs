pub mod post;
pub mod run;
pub mod settings;
pub mod target;

pub use post::{PostActionResult, PostError, PostState, Role};
pub use run::{BatchReport, RunHistory, RunSummary, RUN_HISTORY_CAPACITY};
pub use settings::{
    parse_schedule_time, weekday_name, AutomationSettings, BatchConfig, Configuration,
    ScheduleConfig, ALL_WEEKDAYS, SETTING_KEYS,
};
pub use target::TargetHandle;
