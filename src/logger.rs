use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 默认级别为 info（verbose 时为 debug），可通过 RUST_LOG 覆盖。
pub fn init(verbose: bool) {
    let default_level = if verbose {
        "flatex_archive_downloader=debug,info"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
