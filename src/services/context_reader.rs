//! 页面上下文读取 - 业务能力层
//!
//! 启动时执行一次，读不到会话标识即为致命错误，不重试。

use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::infrastructure::ArchiveSession;
use crate::models::{PageContext, SessionIds};

/// 读取会话标识和页面地址
pub async fn read_page_context<S: ArchiveSession + ?Sized>(session: &S) -> Result<PageContext> {
    let probe = session.probe_context().await?;
    debug!(
        "页面状态: present={}, url={}",
        probe.state_present, probe.page_url
    );

    if !probe.state_present {
        return Err(AppError::context_unavailable(
            "页面上没有应用状态对象，请确认已登录并打开文档归档",
        ));
    }

    let ids = SessionIds {
        token_id: probe.token_id,
        window_id: probe.window_id,
    };
    if !ids.is_complete() {
        return Err(AppError::context_unavailable(
            "无法提取 tokenId / windowId，请确认页面已完全加载",
        ));
    }
    if probe.page_url.trim().is_empty() {
        return Err(AppError::context_unavailable("页面地址为空"));
    }

    info!("✓ 已读取会话标识");
    Ok(PageContext {
        ids,
        page_url: probe.page_url,
    })
}
