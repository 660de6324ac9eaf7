//! 内存文档树
//!
//! 不依赖浏览器即可驱动元素定位、帖子发现和交互流程，主要用于测试。
//! 节点记录点击次数，并可以配置点击后的属性变化来模拟页面的异步响应。

use super::query::{NodeView, Query};
use super::{Document, DomNode};
use crate::error::AppResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// 点击后对节点属性的修改
#[derive(Clone, Debug)]
struct ClickEffect {
    name: String,
    value: String,
}

#[derive(Debug)]
struct NodeData {
    tag: String,
    text: String,
    attrs: Mutex<BTreeMap<String, String>>,
    children: Vec<MemoryNode>,
    on_click: Vec<ClickEffect>,
    clicks: AtomicUsize,
}

/// 内存文档树中的节点，克隆后指向同一个节点
#[derive(Clone, Debug)]
pub struct MemoryNode {
    inner: Arc<NodeData>,
}

/// 节点构造器
#[derive(Debug, Default)]
pub struct ElementBuilder {
    tag: String,
    text: String,
    attrs: BTreeMap<String, String>,
    children: Vec<MemoryNode>,
    on_click: Vec<ClickEffect>,
}

/// 创建一个元素构造器
pub fn el(tag: &str) -> ElementBuilder {
    ElementBuilder {
        tag: tag.to_ascii_lowercase(),
        ..ElementBuilder::default()
    }
}

impl ElementBuilder {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    /// 节点自身的文本（子节点文本会在 textContent 中追加）
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, child: impl Into<MemoryNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// 点击后把属性设置为指定值
    pub fn on_click_set(mut self, name: &str, value: &str) -> Self {
        self.on_click.push(ClickEffect {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn build(self) -> MemoryNode {
        MemoryNode {
            inner: Arc::new(NodeData {
                tag: self.tag,
                text: self.text,
                attrs: Mutex::new(self.attrs),
                children: self.children,
                on_click: self.on_click,
                clicks: AtomicUsize::new(0),
            }),
        }
    }
}

impl From<ElementBuilder> for MemoryNode {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

impl MemoryNode {
    fn attrs(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.inner
            .attrs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 被点击的次数
    pub fn click_count(&self) -> usize {
        self.inner.clicks.load(Ordering::SeqCst)
    }

    pub fn same_node(&self, other: &MemoryNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 按先序遍历返回子树中的所有后代（不含自身）
    pub fn descendants(&self) -> Vec<MemoryNode> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants(&self, out: &mut Vec<MemoryNode>) {
        for child in &self.inner.children {
            out.push(child.clone());
            child.collect_descendants(out);
        }
    }

    /// 在子树中查找第一个属性等于指定值的节点
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<MemoryNode> {
        self.descendants()
            .into_iter()
            .find(|node| node.attribute_value(name).as_deref() == Some(value))
    }

    fn apply_click(&self) {
        self.inner.clicks.fetch_add(1, Ordering::SeqCst);
        let mut attrs = self.attrs();
        for effect in &self.inner.on_click {
            attrs.insert(effect.name.clone(), effect.value.clone());
        }
    }

    fn query(&self, query: &Query) -> Vec<MemoryNode> {
        let mut frontier = vec![self.clone()];
        for step in query.steps() {
            let mut next: Vec<MemoryNode> = Vec::new();
            for context in &frontier {
                for node in context.descendants() {
                    if step.matches(&node) && !next.iter().any(|n| n.same_node(&node)) {
                        next.push(node);
                    }
                }
            }
            frontier = next;
        }

        // 多步查询的结果按文档顺序重新排列
        self.descendants()
            .into_iter()
            .filter(|node| frontier.iter().any(|n| n.same_node(node)))
            .collect()
    }
}

impl NodeView for MemoryNode {
    fn tag_name(&self) -> String {
        self.inner.tag.clone()
    }

    fn attribute_value(&self, name: &str) -> Option<String> {
        self.attrs().get(name).cloned()
    }

    fn text_content(&self) -> String {
        let mut text = self.inner.text.clone();
        for child in &self.inner.children {
            text.push_str(&child.text_content());
        }
        text
    }
}

#[async_trait]
impl DomNode for MemoryNode {
    async fn find_all(&self, query: &Query) -> AppResult<Vec<Self>> {
        Ok(self.query(query))
    }

    async fn children(&self) -> AppResult<Vec<Self>> {
        Ok(self.inner.children.clone())
    }

    async fn text(&self) -> AppResult<String> {
        Ok(self.text_content())
    }

    async fn attribute(&self, name: &str) -> AppResult<Option<String>> {
        Ok(self.attribute_value(name))
    }

    async fn click(&self) -> AppResult<()> {
        self.apply_click();
        Ok(())
    }
}

/// 内存文档
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    url: String,
    root: MemoryNode,
}

impl MemoryDocument {
    pub fn new(url: impl Into<String>, body: impl Into<MemoryNode>) -> Self {
        Self {
            url: url.into(),
            root: el("html").child(body).build(),
        }
    }

    pub fn root(&self) -> &MemoryNode {
        &self.root
    }
}

#[async_trait]
impl Document for MemoryDocument {
    type Node = MemoryNode;

    async fn find_all(&self, query: &Query) -> AppResult<Vec<MemoryNode>> {
        Ok(self.root.query(query))
    }

    async fn url(&self) -> AppResult<String> {
        Ok(self.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Step;

    fn sample() -> MemoryDocument {
        MemoryDocument::new(
            "https://example.test/feed",
            el("body").child(
                el("div")
                    .class("feed")
                    .child(el("article").attr("data-urn", "1").child(el("button").text("Like")))
                    .child(el("article").attr("data-urn", "2").child(el("button").text("Repost"))),
            ),
        )
    }

    #[tokio::test]
    async fn queries_follow_document_order() {
        let doc = sample();
        let found = doc
            .find_all(&Query::new(Step::tag("article").with_attr("data-urn")))
            .await
            .unwrap();
        let ids: Vec<_> = found
            .iter()
            .map(|n| n.attribute_value("data-urn").unwrap())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn node_queries_stay_inside_subtree() {
        let doc = sample();
        let first = doc
            .find_first(&Query::new(Step::tag("article")))
            .await
            .unwrap()
            .unwrap();
        let buttons = first.find_all(&Query::new(Step::tag("button"))).await.unwrap();
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].text().await.unwrap(), "Like");
    }

    #[tokio::test]
    async fn click_applies_effects_and_counts() {
        let button = el("button")
            .attr("aria-pressed", "false")
            .on_click_set("aria-pressed", "true")
            .build();
        button.click().await.unwrap();
        assert_eq!(button.click_count(), 1);
        assert_eq!(button.attribute("aria-pressed").await.unwrap().as_deref(), Some("true"));
    }
}
