//! 基于 chromiumoxide 的文档实现
//!
//! 查询在页面内用 `document.evaluate` 执行相对 XPath，把命中的节点打上一次性的标记属性，
//! 再用 CSS 属性选择器把它们取回为元素句柄，最后清除标记。

use super::query::Query;
use super::{Document, DomNode};
use crate::error::{AppError, AppResult};
use crate::infrastructure::JsExecutor;
use async_trait::async_trait;
use chromiumoxide::Element;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const MARK_ATTR: &str = "data-post-automator-mark";

static NEXT_MARK: AtomicU64 = AtomicU64::new(1);

fn next_mark() -> String {
    format!("m{}", NEXT_MARK.fetch_add(1, Ordering::Relaxed))
}

fn mark_selector(mark: &str) -> String {
    format!("[{}=\"{}\"]", MARK_ATTR, mark)
}

/// 生成标记脚本的函数体，`context` 为 XPath 的上下文节点表达式
fn mark_script(context: &str, xpath: &str, mark: &str) -> AppResult<String> {
    Ok(format!(
        r#"
        const result = document.evaluate({xpath}, {context}, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        for (let i = 0; i < result.snapshotLength; i++) {{
            const node = result.snapshotItem(i);
            if (node.nodeType === Node.ELEMENT_NODE) {{
                node.setAttribute({attr}, {mark});
            }}
        }}
        return result.snapshotLength;
        "#,
        xpath = serde_json::to_string(xpath)?,
        context = context,
        attr = serde_json::to_string(MARK_ATTR)?,
        mark = serde_json::to_string(mark)?,
    ))
}

fn unmark_script(mark: &str) -> AppResult<String> {
    Ok(format!(
        "document.querySelectorAll({}).forEach(node => node.removeAttribute({}));",
        serde_json::to_string(&mark_selector(mark))?,
        serde_json::to_string(MARK_ATTR)?,
    ))
}

fn marked_count(value: Option<&serde_json::Value>) -> AppResult<u64> {
    value
        .and_then(|v| v.as_u64())
        .ok_or_else(|| AppError::unexpected_script_result(format!("标记计数: {:?}", value)))
}

/// 浏览器页面中的一个元素
#[derive(Debug)]
pub struct ChromeNode {
    element: Element,
}

impl ChromeNode {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    async fn call(&self, function_body: String) -> AppResult<Option<serde_json::Value>> {
        let declaration = format!("function() {{ {} }}", function_body);
        let returns = self.element.call_js_fn(declaration, false).await?;
        Ok(returns.result.value)
    }
}

#[async_trait]
impl DomNode for ChromeNode {
    async fn find_all(&self, query: &Query) -> AppResult<Vec<Self>> {
        let mark = next_mark();
        let xpath = query.to_xpath();
        let count = marked_count(self.call(mark_script("this", &xpath, &mark)?).await?.as_ref())?;
        debug!("XPath {} 命中 {} 个节点", xpath, count);
        if count == 0 {
            return Ok(Vec::new());
        }

        let elements = self.element.find_elements(mark_selector(&mark)).await;
        self.call(unmark_script(&mark)?).await?;
        Ok(elements?.into_iter().map(ChromeNode::new).collect())
    }

    async fn children(&self) -> AppResult<Vec<Self>> {
        let elements = self.element.find_elements(":scope > *").await?;
        Ok(elements.into_iter().map(ChromeNode::new).collect())
    }

    async fn text(&self) -> AppResult<String> {
        let value = self.call("return this.textContent || '';".to_string()).await?;
        Ok(value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> AppResult<Option<String>> {
        Ok(self.element.attribute(name).await?)
    }

    async fn click(&self) -> AppResult<()> {
        // 与手动点击一致，使用元素自身的 click()，不依赖元素是否在可视区域
        self.call("this.click();".to_string()).await?;
        Ok(())
    }
}

/// 浏览器中的一个页面
#[derive(Clone)]
pub struct ChromeDocument {
    executor: JsExecutor,
}

impl ChromeDocument {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Document for ChromeDocument {
    type Node = ChromeNode;

    async fn find_all(&self, query: &Query) -> AppResult<Vec<ChromeNode>> {
        let mark = next_mark();
        let xpath = query.to_xpath();
        let script = format!("(() => {{ {} }})()", mark_script("document", &xpath, &mark)?);
        let value = self.executor.eval(script).await?;
        let count = marked_count(Some(&value))?;
        debug!("XPath {} 在文档中命中 {} 个节点", xpath, count);
        if count == 0 {
            return Ok(Vec::new());
        }

        let elements = self
            .executor
            .page()
            .find_elements(mark_selector(&mark))
            .await;
        self.executor.eval(unmark_script(&mark)?).await?;
        Ok(elements?.into_iter().map(ChromeNode::new).collect())
    }

    async fn url(&self) -> AppResult<String> {
        Ok(self.executor.page().url().await?.unwrap_or_default())
    }
}
