//! 元素定位服务 - 业务能力层
//!
//! 只负责"在一条帖子里找到某个控件"，不关心流程。
//! 每种角色按优先级依次尝试多种策略，第一个命中的结果即为答案；
//! 所有查询都限定在帖子根节点的子树内。

use crate::dom::{DomNode, Query, Step};
use crate::error::AppResult;
use crate::models::Role;
use std::collections::HashMap;
use tracing::debug;

/// 单个定位策略
#[derive(Clone, Debug)]
pub enum Strategy {
    /// 查询结果中的第一个
    First(Query),
    /// 查询结果中优先取带有指定属性的，没有则取第一个
    PreferAttribute { query: Query, attribute: String },
    /// 先找到容器，再取容器内的第一个匹配项
    FirstWithin { container: Query, target: Query },
    /// 按文本标签挑选：文本（去空白、小写）以 `starts_with` 开头且不包含任何 `excludes`
    ByLabel {
        items: Query,
        starts_with: String,
        excludes: Vec<String>,
    },
    /// 查询结果中的第 `index` 个（从 0 开始）
    Nth { query: Query, index: usize },
}

impl Strategy {
    /// 策略名称（用于日志）
    pub fn describe(&self) -> String {
        match self {
            Strategy::First(query) => format!("first {}", query.to_xpath()),
            Strategy::PreferAttribute { query, attribute } => {
                format!("prefer @{} in {}", attribute, query.to_xpath())
            }
            Strategy::FirstWithin { container, target } => {
                format!("{} within {}", target.to_xpath(), container.to_xpath())
            }
            Strategy::ByLabel { items, starts_with, .. } => {
                format!("label '{}' in {}", starts_with, items.to_xpath())
            }
            Strategy::Nth { query, index } => format!("#{} of {}", index, query.to_xpath()),
        }
    }

    /// 在 `root` 的子树中执行本策略
    pub async fn locate<N: DomNode>(&self, root: &N) -> AppResult<Option<N>> {
        match self {
            Strategy::First(query) => Ok(root.find_all(query).await?.into_iter().next()),
            Strategy::PreferAttribute { query, attribute } => {
                let mut matches = root.find_all(query).await?;
                for (index, node) in matches.iter().enumerate() {
                    if node.attribute(attribute).await?.is_some() {
                        return Ok(Some(matches.swap_remove(index)));
                    }
                }
                Ok(matches.into_iter().next())
            }
            Strategy::FirstWithin { container, target } => {
                match root.find_all(container).await?.into_iter().next() {
                    Some(container) => Ok(container.find_all(target).await?.into_iter().next()),
                    None => Ok(None),
                }
            }
            Strategy::ByLabel {
                items,
                starts_with,
                excludes,
            } => {
                for node in root.find_all(items).await? {
                    let label = node.text().await?.trim().to_lowercase();
                    if label.starts_with(starts_with.as_str())
                        && !excludes.iter().any(|word| label.contains(word.as_str()))
                    {
                        return Ok(Some(node));
                    }
                }
                Ok(None)
            }
            Strategy::Nth { query, index } => {
                Ok(root.find_all(query).await?.into_iter().nth(*index))
            }
        }
    }
}

/// 元素定位服务
///
/// 职责：
/// - 为每种角色维护一组有序的定位策略
/// - 找不到时返回 `None`，这是正常结果而不是错误
/// - 某个策略执行出错时视为未命中，继续下一个策略
#[derive(Clone, Debug)]
pub struct ElementResolver {
    strategies: HashMap<Role, Vec<Strategy>>,
}

impl Default for ElementResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementResolver {
    /// 使用默认的站点策略创建
    pub fn new() -> Self {
        let strategies = Role::ALL
            .iter()
            .map(|role| (*role, default_strategies(*role)))
            .collect();
        Self { strategies }
    }

    /// 替换某个角色的策略列表
    pub fn with_strategies(mut self, role: Role, strategies: Vec<Strategy>) -> Self {
        self.strategies.insert(role, strategies);
        self
    }

    pub fn strategies(&self, role: Role) -> &[Strategy] {
        self.strategies.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 定位帖子中的某个角色
    pub async fn locate<N: DomNode>(&self, post_root: &N, role: Role) -> Option<N> {
        for (index, strategy) in self.strategies(role).iter().enumerate() {
            match strategy.locate(post_root).await {
                Ok(Some(node)) => {
                    debug!("✓ {} 由策略 {} 命中: {}", role, index + 1, strategy.describe());
                    return Some(node);
                }
                Ok(None) => {
                    debug!("{} 策略 {} 未命中", role, index + 1);
                }
                Err(e) => {
                    debug!("{} 策略 {} 执行失败，尝试下一个: {}", role, index + 1, e);
                }
            }
        }
        debug!("{} 所有策略均未命中", role);
        None
    }
}

fn dropdown_items() -> Query {
    Query::new(Step::tag("div").attr_contains("class", "artdeco-dropdown__item"))
}

/// 默认的站点定位策略
pub fn default_strategies(role: Role) -> Vec<Strategy> {
    match role {
        Role::LikeControl => vec![
            Strategy::First(Query::new(
                Step::tag("button")
                    .attr_contains("id", "ember")
                    .attr_contains_ci("aria-label", "like"),
            )),
            Strategy::PreferAttribute {
                query: Query::new(Step::tag("button").text_contains("like")),
                attribute: "aria-pressed".to_string(),
            },
            Strategy::FirstWithin {
                container: Query::new(Step::tag("div").attr_contains("class", "social-actions")),
                target: Query::new(Step::tag("button")),
            },
            Strategy::FirstWithin {
                container: Query::new(Step::tag("div").text_contains("social-actions")),
                target: Query::new(Step::tag("button")),
            },
        ],
        Role::LikeIndicator => vec![Strategy::First(Query::new(
            Step::tag("li-icon").attr_eq("type", "like-filled"),
        ))],
        Role::RepostControl => vec![
            Strategy::First(
                Query::new(
                    Step::tag("div").attr_contains("class", "feed-shared-social-action-bar"),
                )
                .descendant(
                    Step::tag("button")
                        .attr_contains("id", "ember")
                        .attr_contains("class", "artdeco-dropdown__trigger"),
                ),
            ),
            Strategy::First(Query::new(Step::tag("button").text_contains("repost"))),
        ],
        Role::RepostIndicator => vec![
            Strategy::First(Query::new(
                Step::tag("button")
                    .text_contains("repost")
                    .attr_eq("aria-pressed", "true"),
            )),
            Strategy::First(Query::new(
                Step::tag("li-icon").attr_eq("type", "repost-filled"),
            )),
        ],
        Role::RepostMenuConfirm => vec![
            // "Repost with your thoughts" 会打开编辑框，必须排除
            Strategy::ByLabel {
                items: dropdown_items(),
                starts_with: "repost".to_string(),
                excludes: vec!["thoughts".to_string()],
            },
            Strategy::Nth {
                query: dropdown_items(),
                index: 1,
            },
        ],
    }
}
