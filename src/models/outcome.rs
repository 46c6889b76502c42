//! 单行处理结果与整体统计

use std::path::PathBuf;

/// 单行处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// 已写入文件
    Downloaded { path: PathBuf, bytes: usize },
    /// 文件已存在，跳过
    Skipped { path: PathBuf },
    /// 失败（重试耗尽或不可重试）
    Failed { reason: String },
}

impl RowOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        RowOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RowOutcome::Failed { .. })
    }
}

/// 整体统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

impl RunStats {
    pub fn record(&mut self, outcome: &RowOutcome) {
        self.total += 1;
        match outcome {
            RowOutcome::Downloaded { .. } => self.downloaded += 1,
            RowOutcome::Skipped { .. } => self.skipped += 1,
            RowOutcome::Failed { .. } => self.failed += 1,
        }
    }
}
