//! # flatex Archive Downloader
//!
//! 通过真实浏览器会话批量下载 flatex 文档归档中的 PDF
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `ArchiveSession` - 读页面状态、提交行请求、下载、预热
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个行或单个响应
//! - `context_reader` / `row_enumerator` - 读取会话标识和行
//! - `request_builder` / `command_parser` - 构建请求、解析响应命令
//! - `downloader` / `file_naming` - 下载、命名、写文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行"的完整处理流程
//! - `RowCtx` - 上下文封装（行位置 + 结束行）
//! - `RowFlow` - 流程编排（筛选 → 请求 → 解析 → 下载）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 资源管理
//! - `orchestrator/run_controller` - 逐行处理和统计

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, Result};
pub use infrastructure::{ArchiveSession, BrowserSession, JsExecutor};
pub use models::{ArchiveRow, RowOutcome, RunStats};
pub use orchestrator::{App, RunController};
pub use workflow::{RowCtx, RowFlow};
