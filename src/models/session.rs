//! 会话标识
//!
//! 每次运行从页面读取一次，之后每个行请求都要携带

use serde::Deserialize;

/// 会话标识（tokenId / windowId）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIds {
    pub token_id: String,
    pub window_id: String,
}

impl SessionIds {
    pub fn is_complete(&self) -> bool {
        !self.token_id.trim().is_empty() && !self.window_id.trim().is_empty()
    }
}

/// 页面上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub ids: SessionIds,
    /// 归档页面地址，用作 POST 目标和相对 URL 的基准
    pub page_url: String,
}
