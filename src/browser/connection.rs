use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 连接到已开启远程调试端口的浏览器
pub async fn connect_to_browser(port: u16) -> Result<Browser> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url)
        .await
        .map_err(|e| {
            error!("连接浏览器失败: {}", e);
            e
        })
        .with_context(|| format!("无法连接到浏览器 {}", browser_url))?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok(browser)
}

/// 查找一个已经打开在指定站点上的页面
pub async fn find_page_on_host(browser: &Browser, host: &str) -> Result<Option<Page>> {
    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    for page in pages {
        if let Ok(Some(url)) = page.url().await {
            debug!("检查页面: {}", url);
            if url.contains(host) {
                info!("✓ 复用已打开的页面: {}", url);
                return Ok(Some(page));
            }
        }
    }

    debug!("没有已打开的 {} 页面", host);
    Ok(None)
}
