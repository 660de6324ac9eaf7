//! 帖子处理上下文
//!
//! 封装"我正在处理第几批的第几条帖子"这一信息

use std::fmt::Display;

/// 帖子处理上下文（仅用于日志显示）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostCtx {
    /// 页面代理收到的批处理序号（从1开始）
    pub batch_index: usize,

    /// 帖子在本批次中的序号（从1开始）
    pub post_index: usize,
}

impl PostCtx {
    pub fn new(batch_index: usize, post_index: usize) -> Self {
        Self {
            batch_index,
            post_index,
        }
    }
}

impl Display for PostCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 {} 帖子 {}]", self.batch_index, self.post_index)
    }
}
