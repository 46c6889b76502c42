//! 归档会话能力接口
//!
//! 上层只依赖这个 trait，不直接接触浏览器。测试中用脚本化的假实现替代。

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ArchiveRow, FilterState};
use crate::services::request_builder::RowRequest;

/// 页面内应用状态的原始读数
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextProbe {
    /// 页面上是否存在应用状态对象
    pub state_present: bool,
    pub page_url: String,
    pub token_id: String,
    pub window_id: String,
}

/// 行请求的响应
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CommandReply {
    pub status: u16,
    #[serde(default)]
    pub body: String,
}

impl CommandReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 文档请求的响应
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl DocumentResponse {
    /// 内容是否为 PDF（看 content-type 或文件头）
    pub fn looks_like_pdf(&self) -> bool {
        let by_type = self
            .content_type
            .as_deref()
            .map(|t| t.to_ascii_lowercase().contains("pdf"))
            .unwrap_or(false);
        by_type || self.body.starts_with(b"%PDF")
    }
}

/// 归档会话
///
/// 提供读取页面状态、提交行请求、下载文档和预热的能力。
/// 所有方法都在同一个页面上顺序调用，不会并发。
#[async_trait]
pub trait ArchiveSession: Send + Sync {
    /// 读取页面内的会话标识和页面地址
    async fn probe_context(&self) -> Result<ContextProbe>;

    /// 当前渲染的文档行快照
    async fn list_rows(&self) -> Result<Vec<ArchiveRow>>;

    /// 当前筛选表单的值
    async fn read_filter_state(&self) -> Result<FilterState>;

    /// 提交行选择请求
    async fn submit_row(&self, request: &RowRequest) -> Result<CommandReply>;

    /// 以当前会话身份下载文档
    async fn fetch_document(&self, url: &str) -> Result<DocumentResponse>;

    /// 用隐藏 iframe 加载 URL，唤醒服务器端会话
    async fn warm_up(&self, url: &str) -> Result<()>;
}
