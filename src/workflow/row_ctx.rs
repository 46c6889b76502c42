//! 行处理上下文
//!
//! 封装"我正在处理第几行、共到第几行"这一信息，只用于日志

use std::fmt::Display;

use crate::models::ArchiveRow;
use crate::utils::logging::{row_prefix, truncate_text};

/// 行处理上下文
#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 行位置（从 1 开始）
    pub position: usize,
    /// 本次运行的结束行
    pub end: usize,
    /// 行文本预览
    pub preview: String,
}

impl RowCtx {
    pub fn new(row: &ArchiveRow, end: usize) -> Self {
        Self {
            position: row.position,
            end,
            preview: truncate_text(&row.text, 60),
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", row_prefix(self.position, self.end))
    }
}
