use rust_decimal::Decimal;
use thiserror::Error;

/// # Summary
/// 组装请求时产生的输入校验错误。
///
/// # Invariants
/// - `Display` 输出可直接展示给用户的完整句子。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Exactly {expected} price charts are required, got {actual}.")]
    ChartCount { expected: usize, actual: usize },

    #[error("Please upload all 5 price charts (chart {} is missing).", .index + 1)]
    MissingChart { index: usize },

    #[error("Please upload a screenshot of the order interface.")]
    MissingInterfaceImage,

    #[error("Capital must be a positive number, got {0}.")]
    NonPositiveCapital(Decimal),

    #[error("{filename} is {size} bytes, images must be at most {limit} bytes (4 MB).")]
    ImageTooLarge {
        filename: String,
        size: usize,
        limit: usize,
    },

    #[error("Chart slot {0} does not exist.")]
    ChartIndexOutOfRange(usize),
}

/// # Summary
/// `ModelClient` 适配器上报的结构化错误。
///
/// # Invariants
/// - 由适配器负责归类服务端错误，调用方不解析错误文本。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// 服务端拒绝了密钥。
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 服务端因策略或安全原因拒绝回答。
    #[error("Blocked: {0}")]
    Blocked(String),

    /// 连接、DNS、TLS 或超时错误。
    #[error("Network error: {0}")]
    Network(String),

    /// 服务端返回的其他错误状态。
    #[error("Platform error: {0}")]
    Platform(String),

    /// 无法解码服务端响应信封。
    #[error("Decode error: {0}")]
    Decode(String),

    /// 服务端回复中没有任何文本。
    #[error("Empty response")]
    EmptyResponse,
}

/// # Summary
/// 一次分析的最终错误，返回给调用方。
///
/// # Invariants
/// - `Display` 是唯一面向用户的可读信息。
/// - 附带的细节仅用于日志。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("API key is not set. Please add your API key in settings.")]
    MissingCredential,

    #[error("API key is not valid. Please check it in settings.")]
    InvalidCredential(String),

    #[error("The response was blocked for safety reasons. Please try again with different data.")]
    ContentPolicyBlocked(String),

    #[error("Could not get a response from the AI. Please check your API key and network connection.")]
    MalformedResponse(String),

    #[error("Could not get a response from the AI. Please check your API key and network connection.")]
    TransportFailure(String),
}

impl AnalysisError {
    /// 调用方是否应提示用户（重新）输入密钥。

    pub fn requires_credential_prompt(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingCredential | AnalysisError::InvalidCredential(_)
        )
    }
}

impl From<ModelError> for AnalysisError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Unauthorized(msg) => AnalysisError::InvalidCredential(msg),
            ModelError::Blocked(msg) => AnalysisError::ContentPolicyBlocked(msg),
            ModelError::Decode(msg) => AnalysisError::MalformedResponse(msg),
            ModelError::EmptyResponse => {
                AnalysisError::MalformedResponse("empty response".to_string())
            }
            ModelError::Network(msg) | ModelError::Platform(msg) => {
                AnalysisError::TransportFailure(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_mapping() {
        assert_eq!(
            AnalysisError::from(ModelError::Unauthorized("bad key".into())),
            AnalysisError::InvalidCredential("bad key".into())
        );
        assert_eq!(
            AnalysisError::from(ModelError::Blocked("SAFETY".into())),
            AnalysisError::ContentPolicyBlocked("SAFETY".into())
        );
        assert!(matches!(
            AnalysisError::from(ModelError::EmptyResponse),
            AnalysisError::MalformedResponse(_)
        ));
        assert!(matches!(
            AnalysisError::from(ModelError::Platform("HTTP 500".into())),
            AnalysisError::TransportFailure(_)
        ));
        assert!(matches!(
            AnalysisError::from(ModelError::Network("timeout".into())),
            AnalysisError::TransportFailure(_)
        ));
    }

    #[test]
    fn test_credential_prompt_classification() {
        assert!(AnalysisError::MissingCredential.requires_credential_prompt());
        assert!(AnalysisError::InvalidCredential(String::new()).requires_credential_prompt());
        assert!(!AnalysisError::ContentPolicyBlocked(String::new()).requires_credential_prompt());
        assert!(!AnalysisError::MalformedResponse(String::new()).requires_credential_prompt());
        assert!(!AnalysisError::TransportFailure(String::new()).requires_credential_prompt());
    }

    #[test]
    fn test_user_messages_hide_details() {
        let err = AnalysisError::TransportFailure("connection reset by 10.0.0.1".into());
        assert!(!err.to_string().contains("10.0.0.1"));
        let err = RequestError::MissingChart { index: 2 };
        assert!(err.to_string().contains("chart 3"));
    }
}
