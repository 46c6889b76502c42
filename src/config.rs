//! 程序配置
//!
//! 优先级：命令行 / 环境变量 > TOML 配置文件 > 默认值
//!
//! 开关类选项（skip-existing、headless、no-wait、verbose）是取或：
//! 命令行或配置文件任一处打开即生效，命令行不能关闭配置文件里打开的开关。

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// 默认允许下载的主机
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["konto.flatex.at", "konto.flatex.de"];

/// 命令行参数
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "flatex-archive-downloader", version, about = "批量下载 flatex 文档归档中的 PDF")]
pub struct Cli {
    /// 文档归档页面 URL
    #[arg(long, env = "ARCHIVE_URL")]
    pub archive_url: Option<String>,

    /// PDF 保存目录
    #[arg(long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// 目标文件已存在时跳过
    #[arg(long, env = "SKIP_EXISTING")]
    pub skip_existing: bool,

    /// 持久化浏览器配置目录（跨运行保留登录状态）
    #[arg(long, env = "PROFILE_DIR")]
    pub profile_dir: Option<PathBuf>,

    /// 无头模式
    #[arg(long, env = "HEADLESS")]
    pub headless: bool,

    /// 起始行（从 1 开始，包含）
    #[arg(long, env = "START_ROW")]
    pub start_row: Option<usize>,

    /// 结束行（包含，0 表示到最后一行）
    #[arg(long, env = "END_ROW")]
    pub end_row: Option<usize>,

    /// 503 时的最大请求次数
    #[arg(long, env = "RETRIES")]
    pub retries: Option<u32>,

    /// HTTP 超时（秒）
    #[arg(long, env = "TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    /// 连接到已运行浏览器的调试端口，而不是启动新浏览器
    #[arg(long, env = "BROWSER_DEBUG_PORT")]
    pub debug_port: Option<u16>,

    /// 浏览器可执行文件路径
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// 允许下载的主机（可重复）
    #[arg(long = "allowed-host")]
    pub allowed_hosts: Vec<String>,

    /// display(...) 响应后重新请求的最大轮数
    #[arg(long, env = "DISPLAY_ROUNDS")]
    pub display_rounds: Option<u32>,

    /// 预热 iframe 加载完成后的等待时间（毫秒）
    #[arg(long, env = "WARMUP_SETTLE_MS")]
    pub warmup_settle_ms: Option<u64>,

    /// 不等待用户按回车，直接开始
    #[arg(long, env = "NO_WAIT")]
    pub no_wait: bool,

    /// TOML 配置文件
    #[arg(long, env = "DOWNLOADER_CONFIG")]
    pub config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, env = "VERBOSE_LOGGING")]
    pub verbose: bool,
}

/// TOML 配置文件内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FileConfig {
    pub archive_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub skip_existing: Option<bool>,
    pub profile_dir: Option<PathBuf>,
    pub headless: Option<bool>,
    pub start_row: Option<usize>,
    pub end_row: Option<usize>,
    pub retries: Option<u32>,
    pub timeout: Option<u64>,
    pub debug_port: Option<u16>,
    pub chrome_path: Option<PathBuf>,
    pub allowed_hosts: Option<Vec<String>>,
    pub display_rounds: Option<u32>,
    pub warmup_settle_ms: Option<u64>,
    pub no_wait: Option<bool>,
    pub verbose: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 归档页面 URL
    pub archive_url: String,
    /// PDF 保存目录
    pub output_dir: PathBuf,
    /// 跳过已存在的文件
    pub skip_existing: bool,
    /// 浏览器配置目录
    pub profile_dir: PathBuf,
    /// 无头模式
    pub headless: bool,
    /// 起始行（1 起）
    pub start_row: usize,
    /// 结束行，0 表示最后一行
    pub end_row: usize,
    /// 每个文档最多请求次数
    pub retries: u32,
    /// HTTP 超时
    pub timeout: Duration,
    /// 浏览器调试端口
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件
    pub chrome_path: Option<PathBuf>,
    /// 允许下载的主机
    pub allowed_hosts: Vec<String>,
    /// display 轮数上限
    pub display_rounds: u32,
    /// 预热等待
    pub warmup_settle: Duration,
    /// 不等待用户确认
    pub no_wait: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_url: String::new(),
            output_dir: PathBuf::from("downloads"),
            skip_existing: false,
            profile_dir: PathBuf::from(".browser-profile"),
            headless: false,
            start_row: 1,
            end_row: 0,
            retries: 3,
            timeout: Duration::from_secs(30),
            browser_debug_port: None,
            chrome_path: None,
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            display_rounds: 2,
            warmup_settle: Duration::from_millis(5000),
            no_wait: false,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 解析命令行并合并配置文件
    pub fn from_args() -> Result<Self> {
        let cli = Cli::parse();
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    /// 合并命令行与配置文件
    pub fn merge(cli: Cli, file: FileConfig) -> Result<Self> {
        let default = Self::default();

        let archive_url = cli
            .archive_url
            .or(file.archive_url)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::Config("缺少 --archive-url".to_string()))?;

        let allowed_hosts = if !cli.allowed_hosts.is_empty() {
            cli.allowed_hosts
        } else {
            file.allowed_hosts.unwrap_or(default.allowed_hosts)
        };
        let allowed_hosts = allowed_hosts
            .into_iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        let retries = cli.retries.or(file.retries).unwrap_or(default.retries);
        if retries == 0 {
            return Err(AppError::Config("--retries 至少为 1".to_string()));
        }

        Ok(Self {
            archive_url,
            output_dir: cli.output_dir.or(file.output_dir).unwrap_or(default.output_dir),
            skip_existing: cli.skip_existing || file.skip_existing.unwrap_or(default.skip_existing),
            profile_dir: cli.profile_dir.or(file.profile_dir).unwrap_or(default.profile_dir),
            headless: cli.headless || file.headless.unwrap_or(default.headless),
            start_row: cli.start_row.or(file.start_row).unwrap_or(default.start_row),
            end_row: cli.end_row.or(file.end_row).unwrap_or(default.end_row),
            retries,
            timeout: cli
                .timeout
                .or(file.timeout)
                .map(Duration::from_secs)
                .unwrap_or(default.timeout),
            browser_debug_port: cli.debug_port.or(file.debug_port),
            chrome_path: cli.chrome_path.or(file.chrome_path),
            allowed_hosts,
            display_rounds: cli
                .display_rounds
                .or(file.display_rounds)
                .unwrap_or(default.display_rounds),
            warmup_settle: cli
                .warmup_settle_ms
                .or(file.warmup_settle_ms)
                .map(Duration::from_millis)
                .unwrap_or(default.warmup_settle),
            no_wait: cli.no_wait || file.no_wait.unwrap_or(default.no_wait),
            verbose_logging: cli.verbose || file.verbose.unwrap_or(default.verbose_logging),
        })
    }
}
