//! 应用入口 - 编排层
//!
//! 负责资源管理：创建输出目录、启动或连接浏览器、持有会话，
//! 然后把逐行处理委托给 RunController。

use std::time::Duration;

use anyhow::Result;
use chromiumoxide::Browser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{BrowserSession, JsExecutor};
use crate::models::RunStats;
use crate::orchestrator::run_controller::RunController;
use crate::services::Downloader;
use crate::utils::logging::{log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    /// 浏览器是否由本程序启动（连接到已有浏览器时不关闭）
    owns_browser: bool,
    session: BrowserSession,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        // 输出目录不可用时直接终止
        Downloader::new(&config).prepare_output_dir().await?;

        let (browser, page, owns_browser) = match config.browser_debug_port {
            Some(port) => {
                let (browser, page) =
                    browser::connect_to_browser_and_page(port, &config.archive_url).await?;
                (browser, page, false)
            }
            None => {
                let (browser, page) = browser::launch_browser(&config).await?;
                (browser, page, true)
            }
        };

        // 创建会话（JsExecutor 持有 page）
        let session = BrowserSession::new(JsExecutor::new(page), &config)?;

        Ok(Self {
            config,
            browser,
            owns_browser,
            session,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        if !self.config.no_wait {
            wait_for_user_ready().await?;
        }
        sleep(Duration::from_secs(1)).await;

        let stats = RunController::new(&self.config).run(&self.session).await?;

        print_final_stats(&stats, &self.config.output_dir);
        Ok(stats)
    }

    /// 关闭自己启动的浏览器
    pub async fn shutdown(mut self) {
        if !self.owns_browser {
            return;
        }
        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        let _ = self.browser.wait().await;
    }
}

/// 等待用户在浏览器中准备好归档页面
async fn wait_for_user_ready() -> Result<()> {
    info!("\n请在浏览器中准备归档页面：");
    info!("1) 登录");
    info!("2) 打开文档归档");
    info!("3) 设置筛选条件");
    info!("4) 滚动直到所有行都已显示");
    info!("准备好后按回车开始批量下载...");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(())
}
