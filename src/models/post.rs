use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error;

/// 帖子中需要定位的控件或状态标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// 点赞按钮
    LikeControl,
    /// 已点赞的图标
    LikeIndicator,
    /// 转发按钮（打开转发菜单）
    RepostControl,
    /// 已转发的状态标识
    RepostIndicator,
    /// 转发菜单中的"转发"确认项
    RepostMenuConfirm,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::LikeControl,
        Role::LikeIndicator,
        Role::RepostControl,
        Role::RepostIndicator,
        Role::RepostMenuConfirm,
    ];
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::LikeControl => "点赞按钮",
            Role::LikeIndicator => "已点赞标识",
            Role::RepostControl => "转发按钮",
            Role::RepostIndicator => "已转发标识",
            Role::RepostMenuConfirm => "转发确认项",
        };
        f.write_str(name)
    }
}

/// 单条帖子上未能完成的操作
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum PostError {
    /// 所有定位策略都没有找到控件
    #[error("未找到{0}")]
    ElementNotFound(Role),
    /// 页面操作失败（脚本执行失败、节点失效等）
    #[error("页面操作失败: {0}")]
    Dom(String),
}

/// 帖子交互状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostState {
    Unprocessed,
    LikeChecked,
    LikeDone,
    LikeSkipped,
    RepostChecked,
    RepostDone,
    RepostSkipped,
    Complete,
}

/// 单条帖子的处理结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostActionResult {
    /// 处理结束时帖子是否处于已点赞状态
    pub liked: bool,
    /// 处理结束时帖子是否处于已转发状态（未检查时为 false）
    pub reposted: bool,
    /// 本次是否实际执行过点击操作
    pub attempted: bool,
    pub error: Option<PostError>,
}

impl PostActionResult {
    pub fn is_clean(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_serialize_with_role_detail() {
        let err = PostError::ElementNotFound(Role::LikeControl);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "elementNotFound", "detail": "likeControl"})
        );
        assert_eq!(err.to_string(), "未找到点赞按钮");
    }
}
