use crate::wire::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use tradelens_core::analysis::error::ModelError;
use tradelens_core::analysis::port::ModelClient;
use tradelens_core::analysis::prompt::ModelPayload;
use tradelens_core::config::ModelConfig;
use tradelens_core::credential::Credential;

/// 携带 API 密钥的请求头。
pub const API_KEY_HEADER: &str = "x-goog-api-key";

const BLOCKING_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
];

/// # Summary
/// 基于 Gemini `generateContent` REST 接口的 `ModelClient` 实现。
///
/// # Invariants
/// - 使用基于 rustls 的异步 `reqwest` 客户端。
/// - 每次 `generate` 调用恰好发出一次 HTTP 请求。
#[derive(Clone)]
pub struct GeminiClient {
    /// 共享的 HTTP 客户端
    client: Client,
    // 不带末尾斜杠的基础地址
    endpoint: String,
    model: String,
}

impl GeminiClient {
    /// # Summary
    /// 根据配置中的模型段创建客户端。
    ///
    /// # Logic
    /// 1. 确保已安装 rustls 加密提供者 (ring)。
    /// 2. 设置可选的传输层超时。
    /// 3. 构建 `reqwest` 客户端。
    ///
    /// # Arguments
    /// * `config`: 服务地址、模型名与超时。
    ///
    /// # Returns
    /// * 客户端实例；HTTP 栈无法初始化时返回 `ModelError::Network`。
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        install_crypto_provider();

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ModelError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none()
        && rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
    {
        debug!("rustls crypto provider was installed concurrently");
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    /// # Summary
    /// 调用一次 `generateContent` 并返回候选文本。
    ///
    /// # Logic
    /// 1. 序列化载荷，保持片段顺序。
    /// 2. 携带 API 密钥请求头发送。
    /// 3. 非 2xx 响应交给 `classify_error` 归类。
    /// 4. 通过 `extract_text` 提取回复文本。
    async fn generate(
        &self,
        credential: &Credential,
        payload: &ModelPayload,
    ) -> Result<String, ModelError> {
        let body = GenerateContentRequest::from(payload);
        info!(
            "Calling model {} with {} parts",
            self.model,
            payload.parts.len()
        );

        let resp = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Model request failed to send: {}", e);
                ModelError::Network(e.to_string())
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = classify_error(status.as_u16(), &text);
            warn!("Model service returned HTTP {}: {}", status.as_u16(), err);
            return Err(err);
        }

        extract_text(&text)
    }
}

/// # Summary
/// 将服务端错误响应映射为 `ModelError`。
///
/// # Logic
/// 1. 尽量解析 `{error:{message,status,details}}` 错误信封。
/// 2. 密钥被拒归为 `Unauthorized`。
/// 3. 安全拦截归为 `Blocked`。
/// 4. 其余情况归为 `Platform`。
pub fn classify_error(status: u16, body: &str) -> ModelError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let message = match &parsed {
        Some(env) if !env.error.message.is_empty() => env.error.message.clone(),
        _ => body.trim().chars().take(200).collect(),
    };
    let api_status = parsed
        .as_ref()
        .and_then(|env| env.error.status.as_deref())
        .unwrap_or_default();
    let key_rejected = parsed.as_ref().is_some_and(|env| {
        env.error
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
    });

    if status == 401
        || status == 403
        || matches!(api_status, "UNAUTHENTICATED" | "PERMISSION_DENIED")
        || key_rejected
        || message.to_lowercase().contains("api key not valid")
    {
        return ModelError::Unauthorized(message);
    }

    if message.to_uppercase().contains("SAFETY") {
        return ModelError::Blocked(message);
    }

    ModelError::Platform(format!("HTTP {}: {}", status, message))
}

/// # Summary
/// 从成功响应体中取出回复文本。
///
/// # Logic
/// 1. 响应信封无法解码 -> `Decode`。
/// 2. 提示词被拦截 -> `Blocked`。
/// 3. 没有候选 -> `EmptyResponse`。
/// 4. 因安全原因结束 -> `Blocked`。
/// 5. 拼接首个候选的文本片段，结果为空白 -> `EmptyResponse`。

pub fn extract_text(body: &str) -> Result<String, ModelError> {
    let resp: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ModelError::Decode(e.to_string()))?;

    if let Some(reason) = resp
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(ModelError::Blocked(reason));
    }

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or(ModelError::EmptyResponse)?;

    if let Some(reason) = candidate.finish_reason.as_deref()
        && BLOCKING_FINISH_REASONS.contains(&reason)
    {
        return Err(ModelError::Blocked(reason.to_string()));
    }

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(text)
}
