//! 行请求构建 - 业务能力层
//!
//! 纯函数：不访问网络，不修改状态

use serde::Serialize;

use crate::models::{ArchiveRow, FilterState, PageContext};

/// 选中行的表单字段名
pub const SELECTED_ROW_FIELD: &str = "documentArchiveListTable.selectedrowidx";

/// 行选择请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRequest {
    /// POST 目标（归档页面地址）
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub fields: Vec<(String, String)>,
}

impl RowRequest {
    /// 根据会话标识、筛选状态和目标行构建请求
    pub fn build(ctx: &PageContext, filter: &FilterState, row: &ArchiveRow) -> Self {
        let headers = vec![
            ("x-ajax".to_string(), "true".to_string()),
            ("x-requested-with".to_string(), "XMLHttpRequest".to_string()),
            ("x-tokenid".to_string(), ctx.ids.token_id.clone()),
            ("x-windowid".to_string(), ctx.ids.window_id.clone()),
        ];

        let mut form = filter.clone();
        form.set(SELECTED_ROW_FIELD, row.request_index().to_string());
        let fields = form
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        Self {
            url: ctx.page_url.clone(),
            headers,
            fields,
        }
    }

    /// application/x-www-form-urlencoded 请求体
    pub fn encoded_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
