//! 页面代理 - 编排层
//!
//! 每个打开的页面对应一个后台任务，按顺序处理收到的命令，
//! 同一个页面上同一时刻只会有一个批处理在运行。

use super::batch_runner::BatchRunner;
use crate::dom::Document;
use crate::error::{AppError, AppResult};
use crate::models::BatchReport;
use crate::protocol::PageCommand;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tracing::{debug, error, info};

const AGENT_QUEUE: usize = 8;

/// 发给页面代理的一条命令和它的回复通道
pub struct PageEnvelope {
    pub command: PageCommand,
    pub reply: oneshot::Sender<AppResult<BatchReport>>,
}

/// 页面代理的句柄，克隆后指向同一个代理
#[derive(Clone, Debug)]
pub struct PageHandle {
    sender: mpsc::Sender<PageEnvelope>,
    task: Option<Arc<AbortHandle>>,
}

impl PageHandle {
    pub fn from_sender(sender: mpsc::Sender<PageEnvelope>) -> Self {
        Self { sender, task: None }
    }

    /// 代理任务是否已经退出
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// 终止代理任务，正在运行的批处理会被放弃
    pub fn shutdown(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// 发送命令并在限定时间内等待回复
    ///
    /// 超时、代理退出或回复通道被丢弃都视为页面无响应。
    pub async fn request(
        &self,
        command: PageCommand,
        timeout: Duration,
        url: &str,
    ) -> AppResult<BatchReport> {
        let (reply, receiver) = oneshot::channel();
        let exchange = async {
            self.sender
                .send(PageEnvelope { command, reply })
                .await
                .map_err(|_| AppError::page_unresponsive(url, "页面代理已退出"))?;
            receiver
                .await
                .map_err(|_| AppError::page_unresponsive(url, "回复通道已关闭"))?
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(AppError::page_unresponsive(
                url,
                format!("等待超过 {} 秒", timeout.as_secs()),
            )),
        }
    }
}

/// 为一个页面启动代理任务
pub fn spawn_page_agent<D>(document: D, runner: BatchRunner) -> PageHandle
where
    D: Document + 'static,
{
    let (sender, mut receiver) = mpsc::channel::<PageEnvelope>(AGENT_QUEUE);

    let task = tokio::spawn(async move {
        let mut batch_index = 0;
        while let Some(PageEnvelope { command, reply }) = receiver.recv().await {
            batch_index += 1;
            let result = match command {
                PageCommand::ProcessPosts { config } => {
                    info!("[批次 {}] 📨 收到 processPosts", batch_index);
                    runner.run(&config, &document, batch_index).await
                }
            };
            if let Err(e) = &result {
                error!("[批次 {}] ❌ 批处理失败: {}", batch_index, e);
            }
            if reply.send(result).is_err() {
                debug!("[批次 {}] 请求方已放弃等待", batch_index);
            }
        }
        debug!("页面代理退出");
    });

    PageHandle {
        sender,
        task: Some(Arc::new(task.abort_handle())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InteractionDelays;
    use crate::dom::{el, MemoryDocument};
    use crate::models::BatchConfig;
    use crate::services::ElementResolver;
    use crate::workflow::InteractionFlow;

    fn runner() -> BatchRunner {
        BatchRunner::new(
            InteractionFlow::new(ElementResolver::new(), InteractionDelays::none()),
            Duration::ZERO,
        )
    }

    fn command() -> PageCommand {
        PageCommand::ProcessPosts {
            config: BatchConfig {
                posts_per_target: 3,
                enable_like: true,
                enable_repost: true,
            },
        }
    }

    #[tokio::test]
    async fn agent_replies_with_report() {
        let document = MemoryDocument::new(
            "https://example.test/company/acme/posts/",
            el("main").child(el("div").class("feed-shared-update-v2")),
        );
        let handle = spawn_page_agent(document, runner());
        let report = handle
            .request(command(), Duration::from_secs(5), "https://example.test")
            .await
            .unwrap();
        assert_eq!(report.summary.posts_processed, 1);
        assert_eq!(report.summary.url, "https://example.test/company/acme/posts/");
    }

    #[tokio::test]
    async fn silent_agent_times_out() {
        let (sender, _receiver) = mpsc::channel(1);
        let handle = PageHandle::from_sender(sender);
        let err = handle
            .request(command(), Duration::from_millis(20), "https://example.test")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Automation(crate::error::AutomationError::PageUnresponsive { .. })
        ));
    }

    #[tokio::test]
    async fn shutdown_stops_the_agent() {
        let document = MemoryDocument::new("https://example.test", el("main"));
        let handle = spawn_page_agent(document, runner());
        assert!(!handle.is_closed());

        handle.shutdown();
        for _ in 0..50 {
            if handle.is_closed() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(handle.is_closed());
        assert!(handle
            .request(command(), Duration::from_secs(1), "https://example.test")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn dropped_agent_is_unresponsive() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let handle = PageHandle::from_sender(sender);
        assert!(handle.is_closed());
        assert!(handle
            .request(command(), Duration::from_secs(1), "https://example.test")
            .await
            .is_err());
    }
}
