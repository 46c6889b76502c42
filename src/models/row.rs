//! 归档表格行

use std::fmt::Display;

use serde::Deserialize;

use crate::error::{AppError, Result};

/// 文档行选择器
pub const ROW_SELECTOR: &str = r#"tr[onclick^="DocumentViewer.openPopupIfRequired"]"#;

/// 归档表格中的一行
///
/// 只在当前筛选/排序视图内有意义，换了筛选条件后位置即失效。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArchiveRow {
    /// 显示位置（从 1 开始）
    pub position: usize,
    /// 可见文本，仅用于日志
    #[serde(default)]
    pub text: String,
}

impl ArchiveRow {
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }

    /// 提交给服务器的行索引（从 0 开始）
    pub fn request_index(&self) -> usize {
        self.position.saturating_sub(1)
    }
}

impl Display for ArchiveRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.position)
    }
}

/// 行范围（包含两端，从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    /// 根据当前行数计算实际范围
    ///
    /// - `start < 1` 视为 1
    /// - `end == 0` 或超出行数时截到最后一行
    pub fn resolve(start: usize, end: usize, row_count: usize) -> Result<Self> {
        if row_count == 0 {
            return Err(AppError::NoRows);
        }
        let start = start.max(1);
        let end = if end == 0 { row_count } else { end.min(row_count) };
        if start > end {
            return Err(AppError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, position: usize) -> bool {
        (self.start..=self.end).contains(&position)
    }

    /// 范围内的行，按位置升序
    pub fn select(&self, rows: &[ArchiveRow]) -> Vec<ArchiveRow> {
        let mut selected: Vec<ArchiveRow> = rows
            .iter()
            .filter(|row| self.contains(row.position))
            .cloned()
            .collect();
        selected.sort_by_key(|row| row.position);
        selected
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}
