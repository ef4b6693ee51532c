//! # `tradelens-advisor`
//!
//! 应用层。`AnalysisService` 通过 `ModelClient` 端口把已校验的请求转换为
//! 解析后的结果，`AdvisorSession` 在其外层驱动密钥管理与提交流程。
//! 具体适配器由外部注入。

pub mod service;
pub mod session;

pub use service::AnalysisService;
pub use session::{AdvisorSession, PanelState};
