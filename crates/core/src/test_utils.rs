//! 供下游 crate 测试使用的内存端口实现。

use crate::analysis::error::ModelError;
use crate::analysis::port::ModelClient;
use crate::analysis::prompt::ModelPayload;
use crate::credential::{Credential, CredentialError, CredentialStore};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// # Summary
/// 返回预设回复并记录每次载荷的 `ModelClient`。
pub struct RecordingModelClient {
    reply: Result<String, ModelError>,
    calls: Mutex<Vec<(String, ModelPayload)>>,
}

impl RecordingModelClient {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: ModelError) -> Self {
        Self {
            reply: Err(err),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn payloads(&self) -> Vec<ModelPayload> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// 按调用顺序记录客户端收到的密钥。
    pub async fn credentials_seen(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl ModelClient for RecordingModelClient {
    async fn generate(
        &self,
        credential: &Credential,
        payload: &ModelPayload,
    ) -> Result<String, ModelError> {
        self.calls
            .lock()
            .await
            .push((credential.expose().to_string(), payload.clone()));
        self.reply.clone()
    }
}

/// # Summary
/// 保存在内存中的 `CredentialStore`。
#[derive(Default)]
pub struct MemCredentialStore {
    value: Mutex<Option<Credential>>,
    fail: bool,
}

impl MemCredentialStore {
    pub fn with(credential: Credential) -> Self {
        Self {
            value: Mutex::new(Some(credential)),
            fail: false,
        }
    }

    /// 所有操作都返回 `CredentialError::Storage` 的存储。
    pub fn broken() -> Self {
        Self {
            value: Mutex::new(None),
            fail: true,
        }
    }

    pub async fn current(&self) -> Option<Credential> {
        self.value.lock().await.clone()
    }

    fn check(&self) -> Result<(), CredentialError> {
        if self.fail {
            Err(CredentialError::Storage("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CredentialStore for MemCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialError> {
        self.check()?;
        Ok(self.value.lock().await.clone())
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        self.check()?;
        *self.value.lock().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        self.check()?;
        *self.value.lock().await = None;
        Ok(())
    }
}
