//! 批处理器 - 编排层
//!
//! ## 职责
//!
//! 在一个已经加载好的页面上处理一批帖子：
//!
//! 1. **发现帖子**：委托 `PostDiscovery`
//! 2. **截断**：只保留前 `postsPerTarget` 条
//! 3. **逐条处理**：委托 `InteractionFlow`，帖子之间固定等待（最后一条之后不等）
//! 4. **汇总**：按实际处理的条数生成 `RunSummary`

use crate::dom::Document;
use crate::error::AppResult;
use crate::models::{BatchConfig, BatchReport, RunSummary};
use crate::services::PostDiscovery;
use crate::workflow::{InteractionFlow, PostCtx};
use std::time::Duration;
use tracing::info;

/// 批处理器
#[derive(Clone, Debug)]
pub struct BatchRunner {
    flow: InteractionFlow,
    between_posts: Duration,
}

impl BatchRunner {
    pub fn new(flow: InteractionFlow, between_posts: Duration) -> Self {
        Self {
            flow,
            between_posts,
        }
    }

    /// 处理当前页面上的帖子
    ///
    /// # 参数
    /// - `config`: 本批次的配置
    /// - `document`: 当前页面
    /// - `batch_index`: 批次序号（仅用于日志）
    pub async fn run<D: Document>(
        &self,
        config: &BatchConfig,
        document: &D,
        batch_index: usize,
    ) -> AppResult<BatchReport> {
        let url = document.url().await?;
        let mut posts = PostDiscovery::discover(document).await?;
        posts.truncate(config.posts_per_target);

        let total = posts.len();
        info!("[批次 {}] 📋 本批处理 {} 条帖子: {}", batch_index, total, url);

        let mut results = Vec::with_capacity(total);
        for (index, post) in posts.iter().enumerate() {
            let ctx = PostCtx::new(batch_index, index + 1);
            results.push(self.flow.run(post, config, &ctx).await);

            if index + 1 < total && !self.between_posts.is_zero() {
                tokio::time::sleep(self.between_posts).await;
            }
        }

        let report = BatchReport {
            summary: RunSummary::new(url, total),
            results,
        };
        info!(
            "[批次 {}] ✓ 完成: 处理 {} 条，其中 {} 条有未完成的操作",
            batch_index,
            total,
            report.failed_posts()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InteractionDelays;
    use crate::dom::{el, MemoryDocument};
    use crate::services::ElementResolver;

    fn runner() -> BatchRunner {
        BatchRunner::new(
            InteractionFlow::new(ElementResolver::new(), InteractionDelays::none()),
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn empty_page_processes_nothing() {
        let document = MemoryDocument::new("https://example.test/feed", el("main"));
        let config = BatchConfig {
            posts_per_target: 3,
            enable_like: true,
            enable_repost: true,
        };
        let report = runner().run(&config, &document, 1).await.unwrap();
        assert_eq!(report.summary.posts_processed, 0);
        assert_eq!(report.summary.url, "https://example.test/feed");
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn posts_without_controls_still_count() {
        let document = MemoryDocument::new(
            "https://example.test/feed",
            el("main")
                .child(el("div").class("feed-shared-update-v2"))
                .child(el("div").class("feed-shared-update-v2")),
        );
        let config = BatchConfig {
            posts_per_target: 5,
            enable_like: true,
            enable_repost: true,
        };
        let report = runner().run(&config, &document, 1).await.unwrap();
        assert_eq!(report.summary.posts_processed, 2);
        assert_eq!(report.failed_posts(), 2);
    }
}
