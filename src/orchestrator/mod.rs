//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、关闭）
//! - 管理浏览器资源（Browser、BrowserSession）
//! - 输出全局统计信息
//!
//! ### `run_controller` - 运行控制器
//! - 读取会话标识、枚举行、计算行范围
//! - 逐行委托 RowFlow，汇总下载 / 跳过 / 失败
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 Browser)
//!     ↓
//! run_controller (处理 Vec<ArchiveRow>)
//!     ↓
//! workflow::RowFlow (处理单行)
//!     ↓
//! services (能力层：context / rows / request / parser / downloader)
//!     ↓
//! infrastructure (基础设施：ArchiveSession、JsExecutor)
//! ```

pub mod app;
pub mod run_controller;

pub use app::App;
pub use run_controller::RunController;
