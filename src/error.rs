use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 页面上下文不可用（未登录或页面结构变化）
    #[error("无法读取页面上下文: {reason}")]
    ContextUnavailable { reason: String },

    /// 服务器返回的命令无法解析
    #[error("命令解析失败: {0}")]
    Parse(String),

    /// 文档请求返回了非成功状态码
    #[error("HTTP {status}: {url}")]
    Fetch { url: String, status: u16 },

    /// 网络请求本身失败（连接、超时等）
    #[error("请求失败 ({url}): {message}")]
    Transport { url: String, message: String },

    /// 写文件失败（单行错误）
    #[error("文件写入失败 ({}): {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 输出目录不可用（致命）
    #[error("输出目录不可用 ({}): {reason}", .path.display())]
    OutputDirUnusable { path: PathBuf, reason: String },

    /// 表格中没有任何行
    #[error("没有找到文档行，请确认已打开文档归档页面（经典视图）")]
    NoRows,

    /// 行范围无效
    #[error("行范围无效: start-row ({start}) > end-row ({end})")]
    InvalidRange { start: usize, end: usize },

    /// 浏览器启动或连接失败
    #[error("浏览器错误: {0}")]
    Browser(String),

    /// 页面脚本执行失败
    #[error("执行脚本失败: {0}")]
    Script(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl AppError {
    /// 是否为致命错误（终止整个运行）
    ///
    /// 单行错误（解析、请求、写文件）只记入失败计数，循环继续。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::ContextUnavailable { .. }
                | AppError::OutputDirUnusable { .. }
                | AppError::NoRows
                | AppError::InvalidRange { .. }
                | AppError::Browser(_)
                | AppError::Config(_)
        )
    }

    pub fn context_unavailable(reason: impl Into<String>) -> Self {
        AppError::ContextUnavailable {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Script(format!("JSON 解析失败: {}", err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(format!("TOML 解析失败: {}", err))
    }
}

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;
