//! # `tradelens-core`
//!
//! 交易分析助手的领域层：请求与结果实体、提示词与响应 Schema 的构建、
//! 错误分类，以及由适配器实现的端口
//! (`ModelClient`、`CredentialStore`)。
//! 本 crate 不执行任何 I/O。

pub mod analysis;
pub mod common;
pub mod config;
pub mod credential;

#[cfg(feature = "test-utils")]
pub mod test_utils;
