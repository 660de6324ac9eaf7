//! 文档查询描述
//!
//! `Query` 是一条由若干后代步骤组成的查询链，浏览器后端把它编译成相对 XPath，
//! 内存后端直接按同样的语义求值，两边的匹配结果保持一致。

/// 属性条件
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrPredicate {
    /// 属性存在
    Exists(String),
    /// 属性值完全相等
    Equals(String, String),
    /// 属性值包含子串（区分大小写）
    Contains(String, String),
    /// 属性值包含子串（不区分大小写）
    ContainsIgnoreCase(String, String),
    /// class 中包含某个完整的类名
    HasClass(String),
}

/// 查询中的一个后代步骤
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Step {
    tag: Option<String>,
    attrs: Vec<AttrPredicate>,
    text_contains: Option<String>,
}

impl Step {
    /// 匹配任意标签
    pub fn any() -> Self {
        Self::default()
    }

    /// 匹配指定标签
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into().to_ascii_lowercase()),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>) -> Self {
        self.attrs.push(AttrPredicate::Exists(name.into()));
        self
    }

    pub fn attr_eq(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(AttrPredicate::Equals(name.into(), value.into()));
        self
    }

    pub fn attr_contains(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs
            .push(AttrPredicate::Contains(name.into(), value.into()));
        self
    }

    pub fn attr_contains_ci(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(AttrPredicate::ContainsIgnoreCase(
            name.into(),
            value.into().to_lowercase(),
        ));
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.attrs.push(AttrPredicate::HasClass(class.into()));
        self
    }

    /// 文本内容包含子串（不区分大小写）
    pub fn text_contains(mut self, text: impl Into<String>) -> Self {
        self.text_contains = Some(text.into().to_lowercase());
        self
    }

    /// 判断节点是否满足本步骤
    pub fn matches<N: NodeView + ?Sized>(&self, node: &N) -> bool {
        if let Some(tag) = &self.tag {
            if !node.tag_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        let attrs_ok = self.attrs.iter().all(|predicate| match predicate {
            AttrPredicate::Exists(name) => node.attribute_value(name).is_some(),
            AttrPredicate::Equals(name, value) => {
                node.attribute_value(name).as_deref() == Some(value.as_str())
            }
            AttrPredicate::Contains(name, value) => node
                .attribute_value(name)
                .is_some_and(|v| v.contains(value.as_str())),
            AttrPredicate::ContainsIgnoreCase(name, value) => node
                .attribute_value(name)
                .is_some_and(|v| v.to_lowercase().contains(value.as_str())),
            AttrPredicate::HasClass(class) => node
                .attribute_value("class")
                .is_some_and(|v| v.split_whitespace().any(|c| c == class)),
        });
        if !attrs_ok {
            return false;
        }

        match &self.text_contains {
            Some(text) => node.text_content().to_lowercase().contains(text.as_str()),
            None => true,
        }
    }

    fn to_xpath(&self) -> String {
        let mut conditions: Vec<String> = self
            .attrs
            .iter()
            .map(|predicate| match predicate {
                AttrPredicate::Exists(name) => format!("@{}", name),
                AttrPredicate::Equals(name, value) => {
                    format!("@{}={}", name, xpath_literal(value))
                }
                AttrPredicate::Contains(name, value) => {
                    format!("contains(@{}, {})", name, xpath_literal(value))
                }
                AttrPredicate::ContainsIgnoreCase(name, value) => format!(
                    "contains({}, {})",
                    lowercase_xpath(&format!("@{}", name)),
                    xpath_literal(value)
                ),
                AttrPredicate::HasClass(class) => format!(
                    "contains(concat(' ', normalize-space(@class), ' '), {})",
                    xpath_literal(&format!(" {} ", class))
                ),
            })
            .collect();

        if let Some(text) = &self.text_contains {
            conditions.push(format!(
                "contains({}, {})",
                lowercase_xpath("."),
                xpath_literal(text)
            ));
        }

        let tag = self.tag.as_deref().unwrap_or("*");
        if conditions.is_empty() {
            tag.to_string()
        } else {
            format!("{}[{}]", tag, conditions.join(" and "))
        }
    }
}

/// 后代步骤链，每一步都在上一步结果的子树中查找
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    steps: Vec<Step>,
}

impl Query {
    pub fn new(step: Step) -> Self {
        Self { steps: vec![step] }
    }

    /// 在当前结果的子树中继续查找
    pub fn descendant(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// 编译为相对上下文节点的 XPath（`.//a[..]//b[..]`）
    pub fn to_xpath(&self) -> String {
        let mut xpath = String::from(".");
        for step in &self.steps {
            xpath.push_str("//");
            xpath.push_str(&step.to_xpath());
        }
        xpath
    }
}

/// 供 `Step::matches` 读取的节点视图
pub trait NodeView {
    fn tag_name(&self) -> String;
    fn attribute_value(&self, name: &str) -> Option<String>;
    fn text_content(&self) -> String;
}

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

fn lowercase_xpath(expr: &str) -> String {
    format!("translate({}, '{}', '{}')", expr, UPPER, LOWER)
}

/// XPath 1.0 没有转义，字符串里同时含有两种引号时只能用 concat()
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
