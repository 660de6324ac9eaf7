//! 帖子交互流程 - 流程层
//!
//! 核心职责：定义"一条帖子"的完整处理流程
//!
//! 流程顺序：
//! 1. 检查是否已点赞 → 未点赞则点赞
//! 2. 本次点赞成功后，检查是否已转发 → 未转发则打开菜单并确认转发
//!
//! 任何一步失败都只记录在结果里，帖子总会走到 `Complete`。

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::InteractionDelays;
use crate::dom::DomNode;
use crate::error::AppError;
use crate::models::{BatchConfig, PostActionResult, PostError, PostState, Role};
use crate::services::ElementResolver;
use crate::workflow::post_ctx::PostCtx;

/// 单条帖子在状态机中流转时携带的数据
struct Progress<N> {
    state: PostState,
    result: PostActionResult,
    /// 检查点赞状态时定位到的点赞按钮，点赞时复用
    like_control: Option<N>,
    /// 本次运行中是否成功点了赞
    liked_now: bool,
}

/// 帖子交互流程
///
/// - 按状态机驱动单条帖子
/// - 不持有任何页面资源
/// - 只依赖元素定位能力（services）
#[derive(Clone, Debug)]
pub struct InteractionFlow {
    resolver: ElementResolver,
    delays: InteractionDelays,
}

impl InteractionFlow {
    pub fn new(resolver: ElementResolver, delays: InteractionDelays) -> Self {
        Self { resolver, delays }
    }

    /// 处理一条帖子，返回最终结果
    pub async fn run<N: DomNode>(
        &self,
        post: &N,
        config: &BatchConfig,
        ctx: &PostCtx,
    ) -> PostActionResult {
        let mut progress = Progress {
            state: PostState::Unprocessed,
            result: PostActionResult::default(),
            like_control: None,
            liked_now: false,
        };

        while progress.state != PostState::Complete {
            let next = self.step(post, config, ctx, &mut progress).await;
            debug!("{} {:?} → {:?}", ctx, progress.state, next);
            progress.state = next;
        }

        progress.result
    }

    async fn step<N: DomNode>(
        &self,
        post: &N,
        config: &BatchConfig,
        ctx: &PostCtx,
        progress: &mut Progress<N>,
    ) -> PostState {
        match progress.state {
            PostState::Unprocessed => {
                if !config.enable_like {
                    debug!("{} 点赞已关闭", ctx);
                    return PostState::RepostChecked;
                }
                match self.is_liked(post, progress).await {
                    Ok(true) => {
                        progress.result.liked = true;
                        PostState::LikeSkipped
                    }
                    Ok(false) => PostState::LikeChecked,
                    Err(e) => {
                        warn!("{} ⚠️ 检查点赞状态失败: {}", ctx, e);
                        progress.result.error = Some(PostError::Dom(e.to_string()));
                        PostState::RepostChecked
                    }
                }
            }

            PostState::LikeChecked => {
                let control = match progress.like_control.take() {
                    Some(control) => Some(control),
                    None => self.resolver.locate(post, Role::LikeControl).await,
                };
                let Some(control) = control else {
                    warn!("{} ⚠️ 未找到点赞按钮，跳过", ctx);
                    progress.result.error = Some(PostError::ElementNotFound(Role::LikeControl));
                    return PostState::RepostChecked;
                };

                progress.result.attempted = true;
                match control.click().await {
                    Ok(()) => {
                        self.wait(self.delays.settle).await;
                        progress.result.liked = true;
                        progress.liked_now = true;
                        PostState::LikeDone
                    }
                    Err(e) => {
                        warn!("{} ⚠️ 点赞失败: {}", ctx, e);
                        progress.result.error = Some(PostError::Dom(e.to_string()));
                        PostState::RepostChecked
                    }
                }
            }

            PostState::LikeDone => {
                info!("{} 👍 点赞完成", ctx);
                PostState::RepostChecked
            }

            PostState::LikeSkipped => {
                info!("{} ✓ 已点赞，跳过", ctx);
                PostState::RepostChecked
            }

            PostState::RepostChecked => {
                if !(config.enable_repost && progress.liked_now) {
                    return PostState::RepostSkipped;
                }
                if self
                    .resolver
                    .locate(post, Role::RepostIndicator)
                    .await
                    .is_some()
                {
                    info!("{} ✓ 已转发，跳过", ctx);
                    progress.result.reposted = true;
                    return PostState::RepostSkipped;
                }
                match self.repost(post, ctx).await {
                    Ok(()) => {
                        progress.result.reposted = true;
                        PostState::RepostDone
                    }
                    Err(error) => {
                        warn!("{} ⚠️ 转发未完成: {}", ctx, error);
                        progress.result.error = Some(error);
                        PostState::Complete
                    }
                }
            }

            PostState::RepostDone => {
                info!("{} 🔁 转发完成", ctx);
                PostState::Complete
            }

            PostState::RepostSkipped | PostState::Complete => PostState::Complete,
        }
    }

    /// 点赞按钮带 `aria-pressed="true"`，或存在已点赞图标
    async fn is_liked<N: DomNode>(
        &self,
        post: &N,
        progress: &mut Progress<N>,
    ) -> Result<bool, AppError> {
        if let Some(control) = self.resolver.locate(post, Role::LikeControl).await {
            let pressed = control.attribute("aria-pressed").await?;
            progress.like_control = Some(control);
            if pressed.as_deref() == Some("true") {
                return Ok(true);
            }
        }
        Ok(self
            .resolver
            .locate(post, Role::LikeIndicator)
            .await
            .is_some())
    }

    async fn repost<N: DomNode>(&self, post: &N, ctx: &PostCtx) -> Result<(), PostError> {
        self.wait(self.delays.before_repost).await;

        let control = self
            .resolver
            .locate(post, Role::RepostControl)
            .await
            .ok_or(PostError::ElementNotFound(Role::RepostControl))?;
        control.click().await.map_err(dom_error)?;
        debug!("{} 转发菜单已打开", ctx);
        self.wait(self.delays.menu_open).await;

        let confirm = self
            .resolver
            .locate(post, Role::RepostMenuConfirm)
            .await
            .ok_or(PostError::ElementNotFound(Role::RepostMenuConfirm))?;
        confirm.click().await.map_err(dom_error)?;
        self.wait(self.delays.repost_settle).await;
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

fn dom_error(e: AppError) -> PostError {
    PostError::Dom(e.to_string())
}
