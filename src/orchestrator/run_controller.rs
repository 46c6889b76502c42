//! 运行控制器 - 编排层
//!
//! 按位置升序逐行处理，单行错误只计入失败，致命错误终止运行。

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::infrastructure::ArchiveSession;
use crate::models::{RowOutcome, RowRange, RunStats};
use crate::services::{list_rows, read_page_context};
use crate::utils::logging::log_rows_loaded;
use crate::workflow::{RowCtx, RowFlow};

/// 运行控制器
pub struct RunController {
    start_row: usize,
    end_row: usize,
    flow: RowFlow,
}

impl RunController {
    pub fn new(config: &Config) -> Self {
        Self {
            start_row: config.start_row,
            end_row: config.end_row,
            flow: RowFlow::new(config),
        }
    }

    pub async fn run<S: ArchiveSession + ?Sized>(&self, session: &S) -> Result<RunStats> {
        let page = read_page_context(session).await?;
        let rows = list_rows(session).await?;
        let range = RowRange::resolve(self.start_row, self.end_row, rows.len())?;
        log_rows_loaded(rows.len(), range.start, range.end);

        let mut stats = RunStats::default();

        // 严格按位置升序，一行完全处理完才开始下一行
        for row in range.select(&rows) {
            let ctx = RowCtx::new(&row, range.end);

            let outcome = match self.flow.run(session, &page, &row, &ctx).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => {
                    error!("{} ❌ 致命错误，终止运行: {}", ctx, e);
                    return Err(e);
                }
                Err(e) => RowOutcome::failed(e.to_string()),
            };

            log_outcome(&ctx, &outcome);
            stats.record(&outcome);
        }

        Ok(stats)
    }
}

fn log_outcome(ctx: &RowCtx, outcome: &RowOutcome) {
    match outcome {
        RowOutcome::Downloaded { path, bytes } => info!(
            "{} ✅ 已下载 {} ({:.1} KB)",
            ctx,
            file_name(path),
            *bytes as f64 / 1024.0
        ),
        RowOutcome::Skipped { path } => info!("{} ⏭️ 已存在，跳过 {}", ctx, file_name(path)),
        RowOutcome::Failed { reason } => warn!("{} ❌ 失败: {}", ctx, reason),
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::{CommandReply, ContextProbe};
    use crate::testing::{status_response, Event, FakeSession};

    fn config(dir: &std::path::Path, start_row: usize, end_row: usize) -> Config {
        Config {
            archive_url: crate::testing::PAGE_URL.to_string(),
            output_dir: dir.to_path_buf(),
            start_row,
            end_row,
            retries: 2,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_processes_all_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let session = FakeSession::new(5);

        let stats = RunController::new(&config(dir.path(), 1, 0))
            .run(&session)
            .await
            .unwrap();

        assert_eq!(
            stats,
            RunStats {
                downloaded: 5,
                skipped: 0,
                failed: 0,
                total: 5,
            }
        );
        assert_eq!(session.submitted_indices(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_row_bounds_limit_requests() {
        let dir = tempfile::tempdir().unwrap();
        let session = FakeSession::new(400);

        let stats = RunController::new(&config(dir.path(), 190, 340))
            .run(&session)
            .await
            .unwrap();

        let indices = session.submitted_indices();
        assert_eq!(indices.len(), 151);
        assert_eq!(indices.first(), Some(&189));
        assert_eq!(indices.last(), Some(&339));
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(stats.total, 151);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_row_is_finished_before_next_row_starts() {
        let dir = tempfile::tempdir().unwrap();
        let session = FakeSession::new(3);

        RunController::new(&config(dir.path(), 1, 0))
            .run(&session)
            .await
            .unwrap();

        // 每行的 Fetch 都出现在下一行 Submit 之前
        let order: Vec<_> = session
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Submit(_) | Event::Fetch(_)))
            .collect();
        assert_eq!(
            order,
            vec![
                Event::Submit(0),
                Event::Fetch("https://konto.flatex.at/downloadData/0/doc_0.pdf".to_string()),
                Event::Submit(1),
                Event::Fetch("https://konto.flatex.at/downloadData/1/doc_1.pdf".to_string()),
                Event::Submit(2),
                Event::Fetch("https://konto.flatex.at/downloadData/2/doc_2.pdf".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_row_failures_do_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let session = FakeSession::new(4);
        session.queue_reply(
            0,
            CommandReply {
                status: 200,
                body: "garbage".to_string(),
            },
        );
        session.queue_document(
            "https://konto.flatex.at/downloadData/1/doc_1.pdf",
            status_response(404),
        );
        for _ in 0..2 {
            session.queue_document(
                "https://konto.flatex.at/downloadData/2/doc_2.pdf",
                status_response(503),
            );
        }

        let stats = RunController::new(&config(dir.path(), 1, 0))
            .run(&session)
            .await
            .unwrap();

        assert_eq!(
            stats,
            RunStats {
                downloaded: 1,
                skipped: 0,
                failed: 3,
                total: 4,
            }
        );
        assert!(dir.path().join("doc_3.pdf").exists());
        assert!(!dir.path().join("doc_2.pdf").exists());
    }

    #[tokio::test]
    async fn test_skip_existing_counts_skips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc_0.pdf"), b"%PDF").unwrap();
        let session = FakeSession::new(2);
        let config = Config {
            skip_existing: true,
            ..config(dir.path(), 1, 0)
        };

        let stats = RunController::new(&config).run(&session).await.unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.downloaded, 1);
        assert_eq!(session.fetch_count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_failure_counts_as_failed_row() {
        let dir = tempfile::tempdir().unwrap();
        // 悬空链接占用 doc_1.pdf：目录仍可用，但这一行无法落盘
        std::os::unix::fs::symlink(
            dir.path().join("nowhere/doc_1.pdf"),
            dir.path().join("doc_1.pdf"),
        )
        .unwrap();
        let session = FakeSession::new(3);

        let stats = RunController::new(&config(dir.path(), 1, 0))
            .run(&session)
            .await
            .unwrap();

        assert_eq!(
            stats,
            RunStats {
                downloaded: 2,
                skipped: 0,
                failed: 1,
                total: 3,
            }
        );
        assert_eq!(session.submitted_indices(), vec![0, 1, 2]);
        assert!(dir.path().join("doc_0.pdf").is_file());
        assert!(dir.path().join("doc_2.pdf").is_file());
    }

    #[tokio::test]
    async fn test_missing_context_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let session = FakeSession::new(2).with_probe(ContextProbe::default());

        let result = RunController::new(&config(dir.path(), 1, 0)).run(&session).await;

        assert!(matches!(result, Err(AppError::ContextUnavailable { .. })));
        assert!(session.submitted_indices().is_empty());
    }

    #[tokio::test]
    async fn test_empty_table_and_invalid_range() {
        let dir = tempfile::tempdir().unwrap();

        let empty = FakeSession::new(0);
        let result = RunController::new(&config(dir.path(), 1, 0)).run(&empty).await;
        assert!(matches!(result, Err(AppError::NoRows)));

        let session = FakeSession::new(10);
        let result = RunController::new(&config(dir.path(), 8, 3)).run(&session).await;
        assert!(matches!(result, Err(AppError::InvalidRange { .. })));
    }

    #[tokio::test]
    async fn test_unusable_output_dir_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("missing");
        let session = FakeSession::new(3);

        let result = RunController::new(&config(&gone, 1, 0)).run(&session).await;

        assert!(matches!(result, Err(AppError::OutputDirUnusable { .. })));
        assert_eq!(session.submitted_indices(), vec![0]);
    }
}
