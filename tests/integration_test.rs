use post_automator::browser::{connect_to_browser, find_page_on_host};
use post_automator::config::Config;
use post_automator::dom::{ChromeDocument, Document};
use post_automator::models::TargetHandle;
use post_automator::services::PostDiscovery;
use post_automator::utils::logging;
use post_automator::JsExecutor;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_connection() {
    // 初始化日志
    logging::init(true);

    // 加载配置
    let config = Config::from_env().expect("加载配置失败");

    // 测试浏览器连接
    let result = connect_to_browser(config.browser_debug_port).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_discover_posts_on_live_page() {
    // 初始化日志
    logging::init(true);

    // 加载配置
    let config = Config::from_env().expect("加载配置失败");

    // 连接浏览器
    let browser = connect_to_browser(config.browser_debug_port)
        .await
        .expect("连接浏览器失败");

    let url = "acceldata"
        .parse::<TargetHandle>()
        .expect("目标解析失败")
        .feed_url(&config.service_host);

    let page = match find_page_on_host(&browser, &config.service_host)
        .await
        .expect("读取页面列表失败")
    {
        Some(page) => {
            page.goto(url.as_str()).await.expect("导航失败");
            page
        }
        None => browser.new_page(url.as_str()).await.expect("创建页面失败"),
    };
    tokio::time::sleep(config.page_stabilize()).await;

    // 只读取，不点击
    let document = ChromeDocument::new(JsExecutor::new(page));
    let posts = PostDiscovery::discover(&document)
        .await
        .expect("发现帖子失败");
    println!("{} 上找到 {} 条帖子", document.url().await.unwrap(), posts.len());
}
