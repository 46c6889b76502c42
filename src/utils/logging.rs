/// 日志工具模块
///
/// 提供运行横幅、行前缀和最终统计的输出
use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::models::RunStats;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 文档归档批量下载");
    info!("🌐 归档页面: {}", config.archive_url);
    info!("📁 输出目录: {}", config.output_dir.display());
    info!("🔁 最大请求次数: {}", config.retries);
    if config.skip_existing {
        info!("⏭️ 跳过已存在的文件");
    }
    info!("{}", "=".repeat(60));
}

/// 记录行范围信息
pub fn log_rows_loaded(row_count: usize, start: usize, end: usize) {
    info!("✓ 找到 {} 行", row_count);
    info!("📋 将处理第 {}..{} 行\n", start, end);
}

/// 行日志前缀，例如 `[行 12/340]`
pub fn row_prefix(position: usize, end: usize) -> String {
    format!("[行 {}/{}]", position, end)
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, output_dir: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 下载: {}/{}", stats.downloaded, stats.total);
    info!("⏭️ 跳过: {}", stats.skipped);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
    let shown = output_dir
        .canonicalize()
        .unwrap_or_else(|_| output_dir.to_path_buf());
    info!("\n文件已保存至: {}", shown.display());
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Abrechnung", 20), "Abrechnung");
        assert_eq!(truncate_text("Dividendengutschrift", 8), "Dividend...");
        assert_eq!(truncate_text("äöüß", 2), "äö...");
    }

    #[test]
    fn test_row_prefix() {
        assert_eq!(row_prefix(12, 340), "[行 12/340]");
    }
}
