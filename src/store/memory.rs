use super::KeyValueStore;
use crate::error::AppResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// 内存键值存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 带初始内容创建
    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    /// 当前所有内容的快照
    pub async fn snapshot(&self) -> Map<String, Value> {
        self.values.lock().await.clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, entries: Map<String, Value>) -> AppResult<()> {
        let mut values = self.values.lock().await;
        for (key, value) in entries {
            values.insert(key, value);
        }
        Ok(())
    }
}
