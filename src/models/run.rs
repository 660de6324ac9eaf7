use super::post::PostActionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// 运行历史最多保留的条数
pub const RUN_HISTORY_CAPACITY: usize = 20;

/// 一次批处理的摘要，写入运行历史后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    /// 实际处理时所在的页面地址
    pub url: String,
    /// 处理过的帖子数量（不论每条是否成功）
    pub posts_processed: usize,
}

impl RunSummary {
    pub fn new(url: impl Into<String>, posts_processed: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            url: url.into(),
            posts_processed,
        }
    }
}

/// 批处理的完整结果：摘要 + 每条帖子的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub summary: RunSummary,
    pub results: Vec<PostActionResult>,
}

impl BatchReport {
    pub fn failed_posts(&self) -> usize {
        self.results.iter().filter(|r| !r.is_clean()).count()
    }
}

/// 运行历史，最新的在最前，超出容量时淘汰最旧的
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RunSummary>", into = "Vec<RunSummary>")]
pub struct RunHistory {
    entries: VecDeque<RunSummary>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在最前面插入一条记录
    pub fn record(&mut self, summary: RunSummary) {
        self.entries.push_front(summary);
        self.entries.truncate(RUN_HISTORY_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&RunSummary> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunSummary> {
        self.entries.iter()
    }
}

impl From<Vec<RunSummary>> for RunHistory {
    fn from(entries: Vec<RunSummary>) -> Self {
        let mut entries: VecDeque<RunSummary> = entries.into();
        entries.truncate(RUN_HISTORY_CAPACITY);
        Self { entries }
    }
}

impl From<RunHistory> for Vec<RunSummary> {
    fn from(history: RunHistory) -> Self {
        history.entries.into()
    }
}
