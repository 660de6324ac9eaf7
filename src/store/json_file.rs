use super::KeyValueStore;
use crate::error::{AppResult, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// 保存在单个 JSON 文件中的键值存储
///
/// 文件内容是一个 JSON 对象；写入时先写临时文件再重命名。
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> AppResult<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(StoreError::ReadFailed {
                    path: self.path.display().to_string(),
                    source: Box::new(e),
                }
                .into())
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(StoreError::Corrupted {
                path: self.path.display().to_string(),
                detail: format!("顶层不是对象: {}", other),
            }
            .into()),
            Err(e) => Err(StoreError::Corrupted {
                path: self.path.display().to_string(),
                detail: e.to_string(),
            }
            .into()),
        }
    }

    async fn write_all(&self, values: &Map<String, Value>) -> AppResult<()> {
        let write_failed = |e: std::io::Error| StoreError::WriteFailed {
            path: self.path.display().to_string(),
            source: Box::new(e),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let content = serde_json::to_string_pretty(values)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await.map_err(write_failed)?;
        fs::rename(&tmp_path, &self.path).await.map_err(write_failed)?;
        debug!("存储已写入: {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, entries: Map<String, Value>) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_all().await?;
        for (key, value) in entries {
            values.insert(key, value);
        }
        self.write_all(&values).await
    }
}
