//! # Post Automator
//!
//! 定时为指定公司/个人主页的最新帖子点赞并转发的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `dom/` - 文档树抽象，`ChromeDocument` 基于真实页面，`MemoryDocument` 用于测试
//! - `store/` - 键值存储，保存设置和运行历史
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单条帖子
//! - `ElementResolver` - 多策略定位点赞/转发控件
//! - `PostDiscovery` - 发现页面上的帖子
//! - `RunLog` - 写运行日志能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条帖子"的完整处理流程
//! - `PostCtx` - 上下文封装（批次 + 帖子序号）
//! - `InteractionFlow` - 状态机（检查点赞 → 点赞 → 检查转发 → 转发）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 单个页面上的批处理
//! - `orchestrator/automation` - 按目标顺序运行，失败隔离
//! - `orchestrator/service` - 命令处理和定时触发
//! - `scheduler/` - 每周定时器
//! - `host/` - stdin/stdout 命令通道
//!
//! ## 模块结构

pub mod app;
pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod host;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod protocol;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::{Config, InteractionDelays};
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{AutomationSettings, BatchConfig, Configuration, PostActionResult, RunSummary};
pub use orchestrator::{AutomationService, BatchRunner, Orchestrator, RunReport};
pub use workflow::{InteractionFlow, PostCtx};
