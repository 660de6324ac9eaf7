//! 页面宿主 - 编排层
//!
//! 负责"给我一个停在某个地址上的页面，以及它的页面代理"。
//! 浏览器实现会复用已经打开在站点上的标签页，只在没有时才新建。
//! 当前页面导航失败或代理无响应时会被丢弃，下一个目标重新获取页面。

use super::batch_runner::BatchRunner;
use super::page_agent::{spawn_page_agent, PageEnvelope, PageHandle};
use crate::browser;
use crate::dom::{ChromeDocument, Document, MemoryDocument, MemoryNode};
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::JsExecutor;
use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex as StdMutex;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// 页面宿主
#[async_trait]
pub trait PageHost: Send + Sync {
    /// 打开（或导航到）指定地址，返回该页面代理的句柄
    async fn open(&self, url: &str) -> AppResult<PageHandle>;

    /// 放弃当前页面（例如代理无响应），下次 `open` 会重新获取
    async fn discard(&self, url: &str);
}

/// 可以承载页面代理的标签页
#[async_trait]
pub trait Tab: Send + Sync + 'static {
    type Document: Document + 'static;

    async fn navigate(&self, url: &str) -> AppResult<()>;

    fn document(&self) -> Self::Document;
}

/// 标签页来源：复用站点上已有的，没有时新建
#[async_trait]
pub trait TabSource: Send + Sync + 'static {
    type Tab: Tab;

    /// 返回一个已经停在 `url` 上的标签页
    async fn acquire(&self, url: &str) -> AppResult<Self::Tab>;
}

struct OpenTab<T> {
    tab: T,
    handle: PageHandle,
}

/// 在同一个标签页上依次处理各个目标的页面宿主
pub struct TabPageHost<S: TabSource> {
    source: S,
    runner: BatchRunner,
    current: Mutex<Option<OpenTab<S::Tab>>>,
}

impl<S: TabSource> TabPageHost<S> {
    pub fn with_source(source: S, runner: BatchRunner) -> Self {
        Self {
            source,
            runner,
            current: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<S: TabSource> PageHost for TabPageHost<S> {
    async fn open(&self, url: &str) -> AppResult<PageHandle> {
        let mut current = self.current.lock().await;

        if let Some(open) = current.take() {
            if open.handle.is_closed() {
                debug!("页面代理已退出，重新获取页面");
            } else {
                debug!("复用当前页面导航到: {}", url);
                match open.tab.navigate(url).await {
                    Ok(()) => {
                        let handle = open.handle.clone();
                        *current = Some(open);
                        return Ok(handle);
                    }
                    Err(e) => {
                        warn!("⚠️ 当前页面导航失败，重新获取页面: {}", e);
                        open.handle.shutdown();
                    }
                }
            }
        }

        let tab = self.source.acquire(url).await?;
        let handle = spawn_page_agent(tab.document(), self.runner.clone());
        *current = Some(OpenTab {
            tab,
            handle: handle.clone(),
        });
        Ok(handle)
    }

    async fn discard(&self, url: &str) {
        if let Some(open) = self.current.lock().await.take() {
            info!("🗑️ 丢弃无响应的页面: {}", url);
            open.handle.shutdown();
        }
    }
}

#[async_trait]
impl Tab for Page {
    type Document = ChromeDocument;

    async fn navigate(&self, url: &str) -> AppResult<()> {
        self.goto(url)
            .await
            .map_err(|e| AppError::navigation_failed(url, e))?;
        if let Err(e) = self.bring_to_front().await {
            debug!("无法将页面切到前台: {}", e);
        }
        Ok(())
    }

    fn document(&self) -> ChromeDocument {
        ChromeDocument::new(JsExecutor::new(self.clone()))
    }
}

/// 浏览器中的标签页来源
pub struct ChromeTabs {
    browser: Browser,
    service_host: String,
}

#[async_trait]
impl TabSource for ChromeTabs {
    type Tab = Page;

    async fn acquire(&self, url: &str) -> AppResult<Page> {
        match browser::find_page_on_host(&self.browser, &self.service_host).await {
            Ok(Some(page)) => match Tab::navigate(&page, url).await {
                Ok(()) => return Ok(page),
                Err(e) => warn!("⚠️ 已有页面导航失败，改为新建: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("⚠️ 读取页面列表失败: {:#}", e),
        }

        info!("📄 新建页面: {}", url);
        self.browser.new_page(url).await.map_err(|e| {
            AppError::Browser(BrowserError::PageCreationFailed {
                source: Box::new(e),
            })
        })
    }
}

/// 基于 chromiumoxide 的页面宿主
pub type ChromePageHost = TabPageHost<ChromeTabs>;

impl TabPageHost<ChromeTabs> {
    pub fn new(browser: Browser, service_host: impl Into<String>, runner: BatchRunner) -> Self {
        Self::with_source(
            ChromeTabs {
                browser,
                service_host: service_host.into(),
            },
            runner,
        )
    }
}

/// 内存页面宿主，每个地址对应一份预先构造的文档
///
/// 没有登记的地址视为导航失败；登记为无响应的地址会收下命令但永不回复。
pub struct MemoryPageHost {
    runner: BatchRunner,
    pages: HashMap<String, MemoryDocument>,
    unresponsive: HashSet<String>,
    opened: StdMutex<Vec<String>>,
    discarded: StdMutex<Vec<String>>,
    stalled: Mutex<Vec<(String, mpsc::Receiver<PageEnvelope>)>>,
}

impl MemoryPageHost {
    pub fn new(runner: BatchRunner) -> Self {
        Self {
            runner,
            pages: HashMap::new(),
            unresponsive: HashSet::new(),
            opened: StdMutex::new(Vec::new()),
            discarded: StdMutex::new(Vec::new()),
            stalled: Mutex::new(Vec::new()),
        }
    }

    /// 登记一个地址，页面地址即为该地址
    pub fn with_page(mut self, url: &str, body: impl Into<MemoryNode>) -> Self {
        self.pages
            .insert(url.to_string(), MemoryDocument::new(url, body));
        self
    }

    /// 登记一个加载后会重定向的地址
    pub fn with_redirect(mut self, url: &str, final_url: &str, body: impl Into<MemoryNode>) -> Self {
        self.pages
            .insert(url.to_string(), MemoryDocument::new(final_url, body));
        self
    }

    pub fn with_unresponsive(mut self, url: &str) -> Self {
        self.unresponsive.insert(url.to_string());
        self
    }

    fn record(list: &StdMutex<Vec<String>>, url: &str) {
        if let Ok(mut list) = list.lock() {
            list.push(url.to_string());
        }
    }

    /// 按顺序返回打开过的地址
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|opened| opened.clone())
            .unwrap_or_default()
    }

    /// 按顺序返回被丢弃的地址
    pub fn discarded(&self) -> Vec<String> {
        self.discarded
            .lock()
            .map(|discarded| discarded.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageHost for MemoryPageHost {
    async fn open(&self, url: &str) -> AppResult<PageHandle> {
        Self::record(&self.opened, url);

        if self.unresponsive.contains(url) {
            let (sender, receiver) = mpsc::channel(1);
            self.stalled.lock().await.push((url.to_string(), receiver));
            return Ok(PageHandle::from_sender(sender));
        }

        match self.pages.get(url) {
            Some(document) => Ok(spawn_page_agent(document.clone(), self.runner.clone())),
            None => Err(AppError::navigation_failed(
                url,
                std::io::Error::new(std::io::ErrorKind::NotFound, "页面不存在"),
            )),
        }
    }

    async fn discard(&self, url: &str) {
        Self::record(&self.discarded, url);
        self.stalled.lock().await.retain(|(stalled, _)| stalled != url);
    }
}
