use flatex_archive_downloader::browser::connect_to_browser_and_page;
use flatex_archive_downloader::config::Config;
use flatex_archive_downloader::logger;
use flatex_archive_downloader::services::{parse_reply, read_page_context, Command};
use flatex_archive_downloader::{ArchiveSession, BrowserSession, JsExecutor};

/// 需要先手动启动浏览器：chrome --remote-debugging-port=9222，并登录打开归档页面
const DEBUG_PORT: u16 = 9222;
const ARCHIVE_URL: &str = "https://konto.flatex.at/banking-flatex.at/documentArchiveListFormAction.do";

fn live_config() -> Config {
    Config {
        archive_url: ARCHIVE_URL.to_string(),
        browser_debug_port: Some(DEBUG_PORT),
        ..Config::default()
    }
}

#[test]
fn test_parse_reply_public_api() {
    let body = r#"{"commands":[{"command":"execute","script":"DocumentViewer.finished('/downloadData/1/a.pdf', 1)"}]}"#;
    assert_eq!(
        parse_reply(body).unwrap(),
        Command::Finished("/downloadData/1/a.pdf".to_string())
    );
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_connection() {
    logger::init(true);

    let result = connect_to_browser_and_page(DEBUG_PORT, ARCHIVE_URL).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_read_live_archive_page() {
    logger::init(true);

    let config = live_config();
    let (_browser, page) = connect_to_browser_and_page(DEBUG_PORT, &config.archive_url)
        .await
        .expect("连接浏览器失败");
    let session = BrowserSession::new(JsExecutor::new(page), &config).expect("创建会话失败");

    let ctx = read_page_context(&session).await.expect("读取会话标识失败");
    assert!(!ctx.ids.token_id.is_empty());

    let rows = session.list_rows().await.expect("读取行失败");
    println!("找到 {} 行", rows.len());

    let filter = session.read_filter_state().await.expect("读取筛选条件失败");
    assert_eq!(filter.get("storeSettings.checked"), Some("off"));
}
