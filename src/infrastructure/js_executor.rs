//! JS 执行器 - 基础设施层
//!
//! 持有 page 资源，只暴露"执行 JS"的能力

use crate::error::AppResult;
use chromiumoxide::Page;
use serde_json::Value as JsonValue;

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源
/// - 暴露 eval() 能力
/// - 不认识帖子 / 点赞 / 转发
/// - 不处理业务流程
#[derive(Clone)]
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// # 参数
    /// - `js_code`: 要执行的 JavaScript 表达式
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        match result.value() {
            Some(value) => Ok(value.clone()),
            None => Ok(JsonValue::Null),
        }
    }
}
