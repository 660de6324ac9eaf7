//! 文档树抽象
//!
//! 所有帖子交互都只通过读取和操作渲染后的文档树完成。
//! - `chrome` - 基于 chromiumoxide 的真实页面
//! - `memory` - 内存中的文档树，用于测试

pub mod chrome;
pub mod memory;
pub mod query;

pub use chrome::{ChromeDocument, ChromeNode};
pub use memory::{el, ElementBuilder, MemoryDocument, MemoryNode};
pub use query::{AttrPredicate, NodeView, Query, Step};

use crate::error::AppResult;
use async_trait::async_trait;

/// 文档树中的一个节点
///
/// 节点引用只在一次批处理内有效，不会跨批次复用。
#[async_trait]
pub trait DomNode: Send + Sync + Sized {
    /// 在本节点的子树中（不含自身）按文档顺序查找
    async fn find_all(&self, query: &Query) -> AppResult<Vec<Self>>;

    /// 直接子元素
    async fn children(&self) -> AppResult<Vec<Self>>;

    /// 文本内容（textContent）
    async fn text(&self) -> AppResult<String>;

    async fn attribute(&self, name: &str) -> AppResult<Option<String>>;

    /// 模拟一次用户点击
    async fn click(&self) -> AppResult<()>;
}

/// 一个页面的文档
#[async_trait]
pub trait Document: Send + Sync {
    type Node: DomNode;

    /// 从文档根开始按文档顺序查找
    async fn find_all(&self, query: &Query) -> AppResult<Vec<Self::Node>>;

    async fn find_first(&self, query: &Query) -> AppResult<Option<Self::Node>> {
        Ok(self.find_all(query).await?.into_iter().next())
    }

    /// 当前页面地址
    async fn url(&self) -> AppResult<String>;
}
