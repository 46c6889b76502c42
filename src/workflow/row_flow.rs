//! 单行处理流程 - 流程层
//!
//! 读筛选状态 → 构建请求 → 提交 → 解析命令（处理 display 往返）→ 下载

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::infrastructure::ArchiveSession;
use crate::models::{ArchiveRow, PageContext, RowOutcome};
use crate::services::command_parser::{parse_reply, resolve_command_url, Command};
use crate::services::request_builder::RowRequest;
use crate::services::Downloader;
use crate::workflow::row_ctx::RowCtx;

/// 单行处理流程
///
/// - 不持有页面资源，只依赖 ArchiveSession 能力
/// - 错误向上返回，由编排层决定是否终止
pub struct RowFlow {
    downloader: Downloader,
    display_rounds: u32,
}

impl RowFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            downloader: Downloader::new(config),
            display_rounds: config.display_rounds,
        }
    }

    pub async fn run<S: ArchiveSession + ?Sized>(
        &self,
        session: &S,
        page: &PageContext,
        row: &ArchiveRow,
        ctx: &RowCtx,
    ) -> Result<RowOutcome> {
        if !ctx.preview.is_empty() {
            info!("{} {}", ctx, ctx.preview);
        }

        let link = self.resolve_link(session, page, row, ctx).await?;
        debug!("{} 🔗 {}", ctx, link);

        self.downloader.download(session, &link).await
    }

    /// 取得文档链接
    ///
    /// 收到 `display(...)` 时先预热该地址再重新提交，最多 `display_rounds` 次；
    /// 仍是 `display` 时，使用最后一次的地址作为文档链接。
    async fn resolve_link<S: ArchiveSession + ?Sized>(
        &self,
        session: &S,
        page: &PageContext,
        row: &ArchiveRow,
        ctx: &RowCtx,
    ) -> Result<String> {
        // 筛选条件可能在运行中被修改，每行重新读取
        let filter = session.read_filter_state().await?;
        let request = RowRequest::build(page, &filter, row);

        let mut round = 0;
        loop {
            let reply = session.submit_row(&request).await?;
            if !reply.is_success() {
                return Err(AppError::Fetch {
                    url: request.url.clone(),
                    status: reply.status,
                });
            }

            match parse_reply(&reply.body)? {
                Command::Finished(raw) => return resolve_command_url(&raw, &page.page_url),
                Command::Display(raw) => {
                    let url = resolve_command_url(&raw, &page.page_url)?;
                    if round >= self.display_rounds {
                        debug!("{} display 轮数用尽，按文档链接处理", ctx);
                        return Ok(url);
                    }
                    round += 1;
                    info!(
                        "{} ⏳ 服务器仍在处理 (第 {}/{} 轮)",
                        ctx, round, self.display_rounds
                    );
                    if let Err(e) = session.warm_up(&url).await {
                        warn!("{} 预热失败: {}", ctx, e);
                    }
                }
                Command::Unrecognized => {
                    return Err(AppError::Parse("无法识别的响应".to_string()))
                }
            }
        }
    }
}
