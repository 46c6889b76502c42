use anyhow::{Context, Result};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;

/// 启动带持久化配置目录的浏览器并导航到归档页面
pub async fn launch_browser(config: &Config) -> Result<(Browser, Page)> {
    info!(
        "🚀 启动浏览器 ({})...",
        if config.headless { "无头模式" } else { "有界面" }
    );
    debug!("配置目录: {}", config.profile_dir.display());

    std::fs::create_dir_all(&config.profile_dir).with_context(|| {
        format!("无法创建浏览器配置目录: {}", config.profile_dir.display())
    })?;

    let mut builder = BrowserConfig::builder()
        .user_data_dir(&config.profile_dir)
        .window_size(1400, 1000)
        .viewport(None)
        .args(vec![
            "--disable-dev-shm-usage", // 防止共享内存不足
            "--no-first-run",
        ]);
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = &config.chrome_path {
        builder = builder.chrome_executable(path);
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        anyhow::anyhow!("配置浏览器失败: {}", e)
    })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

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

    let page = browser.new_page(config.archive_url.as_str()).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    info!("✅ 已打开: {}", config.archive_url);
    Ok((browser, page))
}
