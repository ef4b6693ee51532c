use super::entity::Credential;
use super::error::CredentialError;
use async_trait::async_trait;

/// # Summary
/// 客户端本地保存唯一 API 密钥的存储契约。
///
/// # Invariants
/// - 至多保存一个密钥，键名为 `CREDENTIAL_STORAGE_KEY`。
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// # Summary
    /// 读取已保存的密钥。
    ///
    /// # Returns
    /// * 未保存（或仅保存了空白）时返回 `None`。
    async fn load(&self) -> Result<Option<Credential>, CredentialError>;

    /// 插入或替换已保存的密钥。
    async fn save(&self, credential: &Credential) -> Result<(), CredentialError>;

    /// 删除已保存的密钥。对空存储执行清除同样成功。
    async fn clear(&self) -> Result<(), CredentialError>;
}
