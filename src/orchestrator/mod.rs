//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责运行调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `service` - 自动化服务
//! - 处理外部命令（run / updateConfig / getConfig / getHistory / processingComplete）
//! - 维护每周定时器，把触发转换为运行
//!
//! ### `automation` - 自动化运行器
//! - 单次运行互斥
//! - 按顺序处理每个目标，单个目标失败不影响其余目标
//! - 写入运行历史和运行日志
//!
//! ### `page_host` / `page_agent` - 页面资源
//! - 打开或复用页面，每个页面一个代理任务
//! - 命令往返有超时
//!
//! ### `batch_runner` - 批处理器
//! - 发现帖子、截断、逐条驱动交互流程
//!
//! ## 层次关系
//!
//! ```text
//! service (命令 / 定时触发)
//!     ↓
//! automation (处理 Vec<TargetHandle>)
//!     ↓
//! page_host → page_agent → batch_runner (处理 Vec<PostNode>)
//!     ↓
//! workflow::InteractionFlow (处理单条帖子)
//!     ↓
//! services (能力层：resolver / discovery / run log)
//!     ↓
//! dom (文档树：chrome / memory)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：automation 管目标，batch_runner 管帖子
//! 2. **资源隔离**：只有页面代理持有页面
//! 3. **向下依赖**：编排层 → workflow → services → dom
//! 4. **失败隔离**：操作 → 帖子 → 目标，错误不会波及同级

pub mod automation;
pub mod batch_runner;
pub mod page_agent;
pub mod page_host;
pub mod service;

pub use automation::{Orchestrator, OrchestratorOptions, RunReport, TargetOutcome};
pub use batch_runner::BatchRunner;
pub use page_agent::{spawn_page_agent, PageEnvelope, PageHandle};
pub use page_host::{
    ChromePageHost, ChromeTabs, MemoryPageHost, PageHost, Tab, TabPageHost, TabSource,
};
pub use service::{AutomationService, CommandHandler};
