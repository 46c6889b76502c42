//! 文档下载 - 业务能力层
//!
//! 单个文档的状态机：
//!
//! ```text
//! Start → Fetch ─ 2xx ─→ WriteFile → Done
//!           │
//!           ├─ 503 ─→ WarmUp → Fetch（最多 retries 次）
//!           │           └─ 次数耗尽 → Failed
//!           └─ 其他 ─→ Failed
//! ```
//!
//! 开启 skip_existing 且目标文件已存在时直接跳过，不发起任何请求。
//! 目标文件按 URL 推导的文件名或下载记录中的文件名查找。
//! 写入先落到同目录的临时文件，完整写完后再改名，中断不会留下残缺的 PDF。

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::infrastructure::{ArchiveSession, DocumentResponse};
use crate::models::RowOutcome;
use crate::services::download_index::DownloadIndex;
use crate::services::file_naming::{
    build_stable_stem, filename_for_response, filename_from_url, unique_target,
};

/// 文档下载服务
pub struct Downloader {
    output_dir: PathBuf,
    retries: u32,
    skip_existing: bool,
    allowed_hosts: Vec<String>,
    index: DownloadIndex,
}

impl Downloader {
    pub fn new(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            retries: config.retries.max(1),
            skip_existing: config.skip_existing,
            allowed_hosts: config.allowed_hosts.clone(),
            index: DownloadIndex::new(&config.output_dir),
        }
    }

    /// 创建输出目录，失败即为致命错误
    pub async fn prepare_output_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::OutputDirUnusable {
                path: self.output_dir.clone(),
                reason: e.to_string(),
            })
    }

    /// 链接主机是否在允许列表中
    pub fn is_allowed(&self, link: &str) -> bool {
        let host = Url::parse(link)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()));
        match host {
            Some(host) => self.allowed_hosts.iter().any(|h| *h == host),
            None => false,
        }
    }

    /// 下载一个文档并写入输出目录
    pub async fn download<S: ArchiveSession + ?Sized>(
        &self,
        session: &S,
        link: &str,
    ) -> Result<RowOutcome> {
        if !self.is_allowed(link) {
            return Ok(RowOutcome::failed(format!("非允许的下载主机: {}", link)));
        }

        let stem = build_stable_stem(link);
        if self.skip_existing {
            if let Some(target) = self.existing_target(link, &stem).await {
                debug!("文件已存在，跳过请求: {}", target.display());
                return Ok(RowOutcome::Skipped { path: target });
            }
        }

        let response = self.fetch_with_warm_up(session, link).await?;

        if !response.looks_like_pdf() {
            return Ok(RowOutcome::failed(format!(
                "不是 PDF (content-type={})",
                response.content_type.as_deref().unwrap_or("unknown")
            )));
        }

        let name = filename_for_response(response.content_disposition.as_deref(), link, &stem);
        if self.skip_existing {
            let target = self.output_dir.join(&name);
            if target.exists() {
                return Ok(RowOutcome::Skipped { path: target });
            }
        }

        let target = unique_target(&self.output_dir, &name);
        let bytes = response.body.len();
        self.write_file(&target, response.body).await?;

        if let Some(saved) = target.file_name().and_then(|n| n.to_str()) {
            if let Err(e) = self.index.record(&stem, saved).await {
                warn!("更新下载记录失败: {}", e);
            }
        }

        Ok(RowOutcome::Downloaded {
            path: target,
            bytes,
        })
    }

    /// 请求前即可确定的已存在文件：先查下载记录，再查 URL 推导的文件名
    async fn existing_target(&self, link: &str, stem: &str) -> Option<PathBuf> {
        let recorded = self
            .index
            .lookup(stem)
            .await
            .map(|name| self.output_dir.join(name));
        let derived = self.output_dir.join(filename_from_url(link, stem));

        recorded
            .into_iter()
            .chain(std::iter::once(derived))
            .find(|target| target.is_file())
    }

    /// 请求文档，503 时预热后重试
    async fn fetch_with_warm_up<S: ArchiveSession + ?Sized>(
        &self,
        session: &S,
        link: &str,
    ) -> Result<DocumentResponse> {
        let mut attempt = 1;
        loop {
            let response = session.fetch_document(link).await?;
            match response.status {
                200..=299 => return Ok(response),
                503 if attempt < self.retries => {
                    warn!(
                        "⚠️ HTTP 503 (尝试 {}/{})，预热后重试...",
                        attempt, self.retries
                    );
                    if let Err(e) = session.warm_up(link).await {
                        warn!("预热失败: {}", e);
                    }
                    attempt += 1;
                }
                status => {
                    return Err(AppError::Fetch {
                        url: link.to_string(),
                        status,
                    })
                }
            }
        }
    }

    async fn write_file(&self, target: &Path, body: Vec<u8>) -> Result<()> {
        let size_kb = body.len() as f64 / 1024.0;
        match write_atomic(&self.output_dir, target, body, false).await {
            Ok(()) => {
                info!("💾 已保存 {} ({:.1} KB)", target.display(), size_kb);
                Ok(())
            }
            Err(source) => match self.output_dir_problem().await {
                Some(reason) => Err(AppError::OutputDirUnusable {
                    path: self.output_dir.clone(),
                    reason,
                }),
                None => Err(AppError::Filesystem {
                    path: target.to_path_buf(),
                    source,
                }),
            },
        }
    }

    /// 输出目录本身的问题（不存在、不是目录、只读）
    async fn output_dir_problem(&self) -> Option<String> {
        match tokio::fs::metadata(&self.output_dir).await {
            Err(e) => Some(e.to_string()),
            Ok(meta) if !meta.is_dir() => Some("不是目录".to_string()),
            Ok(meta) if meta.permissions().readonly() => Some("目录只读".to_string()),
            Ok(_) => None,
        }
    }
}

/// 先写同目录临时文件，再改名为目标文件
///
/// `overwrite` 为 false 时目标已存在（包括悬空链接）即失败，临时文件随之删除。
pub(crate) async fn write_atomic(
    dir: &Path,
    target: &Path,
    body: Vec<u8>,
    overwrite: bool,
) -> std::io::Result<()> {
    let dir = dir.to_path_buf();
    let target = target.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let mut tmp = tempfile::Builder::new()
            .prefix(".partial-")
            .suffix(".tmp")
            .tempfile_in(&dir)?;
        tmp.write_all(&body)?;
        tmp.as_file_mut().sync_all()?;

        let persisted = if overwrite {
            tmp.persist(&target)
        } else {
            tmp.persist_noclobber(&target)
        };
        persisted.map(|_| ()).map_err(|e| e.error)
    })
    .await
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
}
