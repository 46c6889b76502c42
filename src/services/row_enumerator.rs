//! 归档行枚举 - 业务能力层

use tracing::debug;

use crate::error::Result;
use crate::infrastructure::ArchiveSession;
use crate::models::ArchiveRow;

/// 读取当前渲染的行（调用时刻的快照）
pub async fn list_rows<S: ArchiveSession + ?Sized>(session: &S) -> Result<Vec<ArchiveRow>> {
    let mut rows = session.list_rows().await?;
    rows.sort_by_key(|row| row.position);
    rows.dedup_by_key(|row| row.position);
    debug!("读取到 {} 行", rows.len());
    Ok(rows)
}
