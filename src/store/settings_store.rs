//! 设置与运行历史的类型化访问

use super::KeyValueStore;
use crate::error::{AppResult, ConfigError, StoreError};
use crate::models::{AutomationSettings, RunHistory, RunSummary, SETTING_KEYS};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub const KEY_LAST_RUN: &str = "lastRun";
pub const KEY_RUN_HISTORY: &str = "runHistory";

/// 在键值存储之上提供设置、最后运行时间和运行历史的读写
pub struct SettingsStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> Clone for SettingsStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore> SettingsStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn get_typed<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.store.get(key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                StoreError::InvalidValue {
                    key: key.to_string(),
                    source: Box::new(e),
                }
                .into()
            }),
        }
    }

    /// 读取设置，缺失的键使用默认值
    pub async fn load_settings(&self) -> AppResult<AutomationSettings> {
        let defaults = serde_json::to_value(AutomationSettings::default())?;
        let mut merged = match defaults {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let keys: Vec<String> = merged.keys().cloned().collect();
        for key in keys {
            if let Some(value) = self.store.get(&key).await? {
                if !value.is_null() {
                    merged.insert(key, value);
                }
            }
        }

        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    /// 写入部分设置（整值覆盖给出的每个键）
    ///
    /// 只接受设置键，`lastRun` 和 `runHistory` 由运行过程自己维护。
    pub async fn update(&self, entries: Map<String, Value>) -> AppResult<()> {
        if let Some(key) = entries.keys().find(|key| !SETTING_KEYS.contains(&key.as_str())) {
            return Err(ConfigError::UnknownSettingKey { key: key.clone() }.into());
        }
        debug!("更新设置: {:?}", entries.keys().collect::<Vec<_>>());
        self.store.set(entries).await?;
        info!("✓ 配置已更新");
        Ok(())
    }

    pub async fn last_run(&self) -> AppResult<Option<DateTime<Utc>>> {
        self.get_typed(KEY_LAST_RUN).await
    }

    pub async fn set_last_run(&self, at: DateTime<Utc>) -> AppResult<()> {
        let mut entries = Map::new();
        entries.insert(KEY_LAST_RUN.to_string(), json!(at));
        self.store.set(entries).await
    }

    pub async fn load_history(&self) -> AppResult<RunHistory> {
        Ok(self.get_typed(KEY_RUN_HISTORY).await?.unwrap_or_default())
    }

    /// 追加一条运行摘要（读取-修改-写回）
    pub async fn record_run(&self, summary: RunSummary) -> AppResult<RunHistory> {
        let mut history = self.load_history().await?;
        history.record(summary);

        let mut entries = Map::new();
        entries.insert(KEY_RUN_HISTORY.to_string(), serde_json::to_value(&history)?);
        self.store.set(entries).await?;
        Ok(history)
    }

    /// 完整配置视图：设置 + 最后运行时间 + 运行历史
    pub async fn full_config(&self) -> AppResult<Value> {
        let mut config = match serde_json::to_value(self.load_settings().await?)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        config.insert(KEY_LAST_RUN.to_string(), json!(self.last_run().await?));
        config.insert(
            KEY_RUN_HISTORY.to_string(),
            serde_json::to_value(self.load_history().await?)?,
        );
        Ok(Value::Object(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RUN_HISTORY_CAPACITY;
    use crate::store::MemoryStore;

    fn settings_store() -> SettingsStore<MemoryStore> {
        SettingsStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn empty_store_yields_defaults() {
        let store = settings_store();
        assert_eq!(store.load_settings().await.unwrap(), AutomationSettings::default());
        assert_eq!(store.last_run().await.unwrap(), None);
        assert!(store.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stored_values_override_defaults() {
        let store = settings_store();
        let mut entries = Map::new();
        entries.insert("targets".into(), json!(["acme", "in/jane"]));
        entries.insert("enableRepost".into(), json!(false));
        store.update(entries).await.unwrap();

        let settings = store.load_settings().await.unwrap();
        assert_eq!(settings.targets, vec!["acme", "in/jane"]);
        assert!(!settings.enable_repost);
        assert_eq!(settings.posts_per_target, 3);
    }

    #[tokio::test]
    async fn history_is_capped_at_twenty() {
        let store = settings_store();
        for n in 0..RUN_HISTORY_CAPACITY + 1 {
            store
                .record_run(RunSummary::new("https://example.test", n))
                .await
                .unwrap();
        }
        let history = store.load_history().await.unwrap();
        assert_eq!(history.len(), RUN_HISTORY_CAPACITY);
        assert_eq!(history.latest().unwrap().posts_processed, RUN_HISTORY_CAPACITY);
    }

    #[tokio::test]
    async fn full_config_includes_last_run_and_history() {
        let store = settings_store();
        let now = Utc::now();
        store.set_last_run(now).await.unwrap();
        store
            .record_run(RunSummary::new("https://example.test", 2))
            .await
            .unwrap();

        let config = store.full_config().await.unwrap();
        assert_eq!(config["postsPerTarget"], 3);
        assert_eq!(config["runHistory"].as_array().unwrap().len(), 1);
        assert_eq!(store.last_run().await.unwrap(), Some(now));
    }

    #[tokio::test]
    async fn malformed_history_is_an_error() {
        let raw = Arc::new(MemoryStore::new());
        let mut entries = Map::new();
        entries.insert(KEY_RUN_HISTORY.into(), json!("oops"));
        raw.set(entries).await.unwrap();
        assert!(SettingsStore::new(raw).load_history().await.is_err());
    }

    #[tokio::test]
    async fn update_rejects_non_setting_keys() {
        let store = settings_store();
        store
            .record_run(RunSummary::new("https://example.test", 1))
            .await
            .unwrap();

        for key in [KEY_RUN_HISTORY, KEY_LAST_RUN, "somethingElse"] {
            let mut entries = Map::new();
            entries.insert("postsPerTarget".into(), json!(7));
            entries.insert(key.into(), json!("oops"));
            let err = store.update(entries).await.unwrap_err();
            assert!(matches!(
                err,
                crate::error::AppError::Config(ConfigError::UnknownSettingKey { .. })
            ));
        }

        assert_eq!(store.load_settings().await.unwrap().posts_per_target, 3);
        assert_eq!(store.load_history().await.unwrap().len(), 1);
        assert_eq!(store.last_run().await.unwrap(), None);
    }
}
