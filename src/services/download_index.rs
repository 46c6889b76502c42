//! 下载记录 - 业务能力层
//!
//! 输出目录中的 `.download-index.json` 记录 文档主名 → 实际保存的文件名。
//! 文件名来自响应头时，下次运行仍能在请求前找到已下载的文件。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{AppError, Result};
use crate::services::downloader::write_atomic;

pub const INDEX_FILE: &str = ".download-index.json";

pub struct DownloadIndex {
    dir: PathBuf,
    path: PathBuf,
}

impl DownloadIndex {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            dir: output_dir.to_path_buf(),
            path: output_dir.join(INDEX_FILE),
        }
    }

    /// 读取记录；文件不存在或损坏时视为空
    async fn load(&self) -> BTreeMap<String, String> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(_) => return BTreeMap::new(),
        };
        serde_json::from_slice(&content).unwrap_or_else(|e| {
            warn!("下载记录损坏，忽略 ({}): {}", self.path.display(), e);
            BTreeMap::new()
        })
    }

    /// 某个文档之前保存的文件名
    pub async fn lookup(&self, stem: &str) -> Option<String> {
        self.load().await.remove(stem)
    }

    /// 记录文档保存的文件名
    pub async fn record(&self, stem: &str, file_name: &str) -> Result<()> {
        let mut entries = self.load().await;
        entries.insert(stem.to_string(), file_name.to_string());

        let body = serde_json::to_vec_pretty(&entries)?;
        write_atomic(&self.dir, &self.path, body, true)
            .await
            .map_err(|source| AppError::Filesystem {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let index = DownloadIndex::new(dir.path());

        assert_eq!(index.lookup("flatex_42").await, None);

        index.record("flatex_42", "Abrechnung_2024.pdf").await.unwrap();
        index.record("flatex_43", "Depotauszug.pdf").await.unwrap();

        let reopened = DownloadIndex::new(dir.path());
        assert_eq!(
            reopened.lookup("flatex_42").await.as_deref(),
            Some("Abrechnung_2024.pdf")
        );
        assert_eq!(
            reopened.lookup("flatex_43").await.as_deref(),
            Some("Depotauszug.pdf")
        );
    }

    #[tokio::test]
    async fn test_corrupt_index_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"{not json").unwrap();
        let index = DownloadIndex::new(dir.path());

        assert_eq!(index.lookup("flatex_1").await, None);
        index.record("flatex_1", "a.pdf").await.unwrap();
        assert_eq!(index.lookup("flatex_1").await.as_deref(), Some("a.pdf"));
    }
}
