use std::sync::Arc;
use tracing::{error, info, warn};
use tradelens_core::analysis::entity::{AnalysisRequest, AnalysisResult};
use tradelens_core::analysis::error::AnalysisError;
use tradelens_core::analysis::port::ModelClient;
use tradelens_core::analysis::prompt::build_payload;
use tradelens_core::common::Locale;
use tradelens_core::credential::Credential;

/// # Summary
/// 分析服务：组装载荷、调用一次模型并解析回复。只依赖 `ModelClient` trait，
/// 具体适配器由外部注入。
///
/// # Invariants
/// - 不持有可变状态，并发调用互不影响。
/// - 日志中不输出密钥与图片数据。
pub struct AnalysisService {
    // 模型服务端口
    client: Arc<dyn ModelClient>,
    // 提示词中格式化资金所用的区域设置
    locale: Locale,
}

impl AnalysisService {
    pub fn new(client: Arc<dyn ModelClient>, locale: Locale) -> Self {
        Self { client, locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// # Summary
    /// 执行一次分析。
    ///
    /// # Logic
    /// 1. 未提供密钥时直接返回 `MissingCredential`，不发起任何网络请求。
    /// 2. 组装载荷并恰好调用一次模型。
    /// 3. 将服务端失败映射为 `AnalysisError`。
    /// 4. 将去除首尾空白后的回复解析为 `AnalysisResult`。
    ///
    /// # Arguments
    /// * `request` - 已校验的请求。
    /// * `credential` - 用户配置的 API 密钥（可能为空）。
    ///
    /// # Returns
    /// * `Result<AnalysisResult, AnalysisError>` - 分析结果，或唯一的一个错误。
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        credential: Option<&Credential>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let Some(credential) = credential else {
            warn!("Analysis refused: no API key configured");
            return Err(AnalysisError::MissingCredential);
        };

        let payload = build_payload(request, self.locale);
        info!(
            "Submitting analysis: kind={}, horizon={:?}, images={}, document={}",
            request.kind(),
            request.holding_horizon(),
            payload.image_parts().count(),
            request.supporting_document().is_some()
        );

        let text = self
            .client
            .generate(credential, &payload)
            .await
            .map_err(|e| {
                warn!("Model call failed: {}", e);
                AnalysisError::from(e)
            })?;

        let result = parse_result(&text)?;
        info!("Analysis finished: should_trade={}", result.should_trade);
        Ok(result)
    }
}

/// # Summary
/// 将模型原始文本解码为 `AnalysisResult`。
///
/// # Logic
/// 去除首尾空白后严格解析，不尝试修复非法 JSON。`recommendation` 中缺失的字段
/// 按空串处理，`shouldTrade` 缺失则视为格式错误。
pub fn parse_result(text: &str) -> Result<AnalysisResult, AnalysisError> {
    serde_json::from_str::<AnalysisResult>(text.trim()).map_err(|e| {
        error!("Malformed model response: {}", e);
        AnalysisError::MalformedResponse(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradelens_core::analysis::entity::Verdict;


    #[test]
    fn test_parse_trims_whitespace() {
        let result = parse_result("\n  {\"shouldTrade\": false, \"noTradeReason\": \"x\"}  \n").unwrap();
        assert!(!result.should_trade);
        assert_eq!(result.no_trade_reason.as_deref(), Some("x"));
    }

    #[test]
    fn test_parse_rejects_missing_required_field() {
        assert!(matches!(
            parse_result(r#"{"recommendation": null}"#),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_keeps_reason_when_stray_recommendation_is_incomplete() {
        let result = parse_result(
            r#"{"shouldTrade": false, "recommendation": {"orderType": ""}, "noTradeReason": "wait for signal"}"#,
        )
        .unwrap();
        assert_eq!(result.verdict(), Verdict::NoTrade { reason: "wait for signal" });
    }

    #[test]
    fn test_parse_accepts_trade_with_missing_fields() {
        let result = parse_result(
            r#"{"shouldTrade": true, "recommendation": {"orderType": "Buy", "takeProfit": "210"}}"#,
        )
        .unwrap();
        match result.verdict() {
            Verdict::Trade(rec) => {
                assert_eq!(rec.order_type, "Buy");
                assert_eq!(rec.take_profit, "210");
                assert!(rec.entry_point.is_empty());
                assert!(rec.reasoning.is_empty());
            }
            other => panic!("unexpected verdict: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_prose_wrapper() {
        assert!(matches!(
            parse_result("```json\n{\"shouldTrade\": false}\n```"),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }
}
