//! 键值存储
//!
//! 设置和运行历史保存在外部键值存储中，所有组件都通过注入的 `KeyValueStore` 访问，
//! 每次都是整值读取-修改-写回，不做部分更新。

pub mod json_file;
pub mod memory;
pub mod settings_store;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use settings_store::SettingsStore;

use crate::error::AppResult;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// 键值存储
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 读取一个键，不存在时返回 `None`
    async fn get(&self, key: &str) -> AppResult<Option<Value>>;

    /// 一次写入多个键
    async fn set(&self, entries: Map<String, Value>) -> AppResult<()>;
}
