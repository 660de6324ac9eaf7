//! 帖子发现服务 - 业务能力层
//!
//! 只负责"找出页面上的帖子"能力，按顺序尝试几种结构，
//! 第一个有结果的结构即为答案，不同结构的结果不会合并。

use crate::dom::{Document, DomNode, Query, Step};
use crate::error::AppResult;
use tracing::{debug, info, warn};

/// 帖子发现服务
pub struct PostDiscovery;

impl PostDiscovery {
    /// 按文档顺序返回页面上的帖子根节点
    pub async fn discover<D: Document>(document: &D) -> AppResult<Vec<D::Node>> {
        let post_card = Query::new(Step::tag("div").class("feed-shared-update-v2"));
        let posts = document.find_all(&post_card).await?;
        if !posts.is_empty() {
            info!("🔍 找到 {} 条帖子（feed-shared-update-v2）", posts.len());
            return Ok(posts);
        }
        debug!("未找到 feed-shared-update-v2，尝试 data-urn");

        let urn_cards = Query::new(Step::tag("div").with_attr("data-urn"));
        let posts = document.find_all(&urn_cards).await?;
        if !posts.is_empty() {
            info!("🔍 找到 {} 条帖子（data-urn）", posts.len());
            return Ok(posts);
        }
        debug!("未找到 data-urn，尝试滚动容器");

        let scroll_container =
            Query::new(Step::tag("div").class("scaffold-finite-scroll__content"));
        if let Some(container) = document.find_first(&scroll_container).await? {
            let posts = container.children().await?;
            info!("🔍 找到 {} 条帖子（滚动容器子元素）", posts.len());
            return Ok(posts);
        }

        warn!("⚠️ 页面上没有找到任何帖子");
        Ok(Vec::new())
    }
}
