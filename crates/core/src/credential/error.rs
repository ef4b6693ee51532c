use thiserror::Error;

/// # Summary
/// 密钥持久化相关错误。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error`。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// 底层存储失败
    #[error("Storage error: {0}")]
    Storage(String),

    /// 提交了空白密钥
    #[error("API key must not be empty.")]
    Empty,
}
