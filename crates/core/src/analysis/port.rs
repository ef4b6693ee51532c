use super::error::ModelError;
use super::prompt::ModelPayload;
use crate::credential::Credential;
use async_trait::async_trait;

/// # Summary
/// 能够回答分析载荷的远程生成模型契约。
///
/// # Invariants
/// - 实现必须满足 `Send` 与 `Sync`，同一客户端可服务多个并发会话。
/// - 错误由适配器归类为 `ModelError`。
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// # Summary
    /// 发送一个载荷并返回拼接后的回复文本。
    ///
    /// # Logic
    /// 1. 使用 `credential` 认证。
    /// 2. 按服务端的传输格式发送载荷。
    /// 3. 提取回复文本，或对错误进行归类。
    ///
    /// # Arguments
    /// * `credential`: 仅用于本次调用的 API 密钥。
    /// * `payload`: 已准备好的提示词、图片与响应 Schema。
    ///
    /// # Returns
    /// * `Ok(text)` - 模型原始文本（预期为 JSON）。
    /// * `Err(ModelError)` - 其他情况。

    async fn generate(
        &self,
        credential: &Credential,
        payload: &ModelPayload,
    ) -> Result<String, ModelError>;
}
