//! 基础设施层
//!
//! 持有稀缺资源（Page），只向上暴露能力

pub mod browser_session;
pub mod js_executor;
pub mod session;

pub use browser_session::BrowserSession;
pub use js_executor::JsExecutor;
pub use session::{ArchiveSession, CommandReply, ContextProbe, DocumentResponse};
