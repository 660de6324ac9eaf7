//! 命令协议
//!
//! - `ServiceCommand` / `ServiceResponse`：外部（弹窗、stdio）与自动化服务之间
//! - `PageCommand`：编排器发给页面代理，回复是进程内的 `BatchReport`
//!
//! 所有消息都是带 `action` 字段的 JSON 对象。

use crate::models::{BatchConfig, RunHistory, RunSummary};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 发给自动化服务的命令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ServiceCommand {
    /// 立即运行一次
    #[serde(alias = "runNow")]
    Run,
    /// 页面代理上报的批处理结果
    ProcessingComplete { results: RunSummary },
    /// 合并写入设置
    UpdateConfig { config: Map<String, Value> },
    GetConfig,
    GetHistory,
}

/// 响应状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Started,
    Received,
    Updated,
    Error,
}

/// 自动化服务的响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceResponse {
    Error { status: Status, message: String },
    Status { status: Status },
    Config { config: Value },
    History { history: RunHistory },
}

impl ServiceResponse {
    pub fn status(status: Status) -> Self {
        ServiceResponse::Status { status }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServiceResponse::Error {
            status: Status::Error,
            message: message.into(),
        }
    }
}

/// 发给页面代理的命令
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageCommand {
    ProcessPosts { config: BatchConfig },
}
