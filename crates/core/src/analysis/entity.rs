use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::RequestError;

/// 每次分析请求必须附带的K线图数量。
pub const CHART_COUNT: usize = 5;

/// 单张图片的大小上限，按编码前的原始字节计算。
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// 模型拒绝交易却未给出理由时展示的默认说明。
pub const DEFAULT_NO_TRADE_REASON: &str =
    "Do not enter a trade right now. Wait for a clearer signal.";

/// 新建草稿时预填的持仓周期。
pub const DEFAULT_HOLDING_HORIZON: &str = "1 hour";

/// # Summary
/// 用户计划交易的品种类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentKind {
    // 期货等衍生品
    Derivative,
    // 上市股票
    Equity,
}

impl FromStr for InvestmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "derivative" | "future" | "futures" => Ok(InvestmentKind::Derivative),
            "equity" | "stock" | "stocks" => Ok(InvestmentKind::Equity),
            _ => Err(format!("Unknown investment kind: {}", s)),
        }
    }
}

impl std::fmt::Display for InvestmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvestmentKind::Derivative => write!(f, "Future"),
            InvestmentKind::Equity => write!(f, "Stocks"),
        }
    }
}

/// # Summary
/// 图表槽位对应的时间周期。请求中第 `i` 个槽位存放 `CHART_TIMEFRAMES[i]` 的图表。
///
/// # Invariants
/// - 仅用于标注，不校验图片内容是否与周期相符。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartTimeframe {
    M5,
    M15,
    H1,
    H4,
    H6,
}

/// 按提交顺序排列的图表槽位。
pub const CHART_TIMEFRAMES: [ChartTimeframe; CHART_COUNT] = [
    ChartTimeframe::M5,
    ChartTimeframe::M15,
    ChartTimeframe::H1,
    ChartTimeframe::H4,
    ChartTimeframe::H6,
];

impl ChartTimeframe {
    /// 槽位的可读标签。
    pub fn label(self) -> &'static str {
        match self {
            ChartTimeframe::M5 => "5-minute chart",
            ChartTimeframe::M15 => "15-minute chart",
            ChartTimeframe::H1 => "1-hour chart",
            ChartTimeframe::H4 => "4-hour chart",
            ChartTimeframe::H6 => "6-hour chart",
        }
    }
}

impl std::fmt::Display for ChartTimeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartTimeframe::M5 => write!(f, "5m"),
            ChartTimeframe::M15 => write!(f, "15m"),
            ChartTimeframe::H1 => write!(f, "1h"),
            ChartTimeframe::H4 => write!(f, "4h"),
            ChartTimeframe::H6 => write!(f, "6h"),
        }
    }
}

/// # Summary
/// 请求附带的图片，已完成 base64 编码。
///
/// # Invariants
/// - `base64_payload` 原样转发给模型服务，不做任何改写。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub filename: String,
    pub mime_type: String,
    pub base64_payload: String,
}

impl ImageAttachment {
    /// # Summary
    /// 由原始图片字节构造附件。
    ///
    /// # Logic
    /// 1. 超过 `MAX_IMAGE_BYTES` 的数据直接拒绝。
    /// 2. 使用标准带填充的 base64 字母表编码。
    ///
    /// # Arguments
    /// * `filename`: 原始文件名。
    /// * `mime_type`: 文件的 MIME 类型，例如 `image/png`。
    /// * `bytes`: 文件原始内容。
    ///
    /// # Returns
    /// * 成功返回附件，超限返回 `RequestError::ImageTooLarge`。
    pub fn from_bytes(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: &[u8],
    ) -> Result<Self, RequestError> {
        let filename = filename.into();
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(RequestError::ImageTooLarge {
                filename,
                size: bytes.len(),
                limit: MAX_IMAGE_BYTES,
            });
        }

        Ok(Self {
            filename,
            mime_type: mime_type.into(),
            base64_payload: BASE64.encode(bytes),
        })
    }
}

/// # Summary
/// 可选的辅助文档，以纯文本形式附加。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocument {
    pub filename: String,
    pub text_content: String,
}

/// # Summary
/// 一次通过校验的分析表单提交。
///
/// # Invariants
/// - 图表恰好 `CHART_COUNT` 张，顺序与 `CHART_TIMEFRAMES` 一致。
/// - 下单界面截图必然存在。
/// - `capital > 0`。
/// - 构造完成后不可变。
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    kind: InvestmentKind,
    capital: Decimal,
    holding_horizon: String,
    chart_images: Vec<ImageAttachment>,
    order_interface_image: ImageAttachment,
    supporting_document: Option<TextDocument>,
}

impl AnalysisRequest {
    /// # Summary
    /// 校验并组装分析请求。
    ///
    /// # Logic
    /// 1. 检查图表数量是否恰好为 `CHART_COUNT`。
    /// 2. 检查资金是否严格大于零。
    ///
    /// # Returns
    /// * 成功返回请求，否则返回首个不满足的 `RequestError`。
    pub fn new(
        kind: InvestmentKind,
        capital: Decimal,
        holding_horizon: impl Into<String>,
        chart_images: Vec<ImageAttachment>,
        order_interface_image: ImageAttachment,
        supporting_document: Option<TextDocument>,
    ) -> Result<Self, RequestError> {
        if chart_images.len() != CHART_COUNT {
            return Err(RequestError::ChartCount {
                expected: CHART_COUNT,
                actual: chart_images.len(),
            });
        }
        if capital <= Decimal::ZERO {
            return Err(RequestError::NonPositiveCapital(capital));
        }

        Ok(Self {
            kind,
            capital,
            holding_horizon: holding_horizon.into(),
            chart_images,
            order_interface_image,
            supporting_document,
        })
    }

    pub fn kind(&self) -> InvestmentKind {
        self.kind
    }

    pub fn capital(&self) -> Decimal {
        self.capital
    }

    pub fn holding_horizon(&self) -> &str {
        &self.holding_horizon
    }

    pub fn chart_images(&self) -> &[ImageAttachment] {
        &self.chart_images
    }

    pub fn order_interface_image(&self) -> &ImageAttachment {
        &self.order_interface_image
    }

    pub fn supporting_document(&self) -> Option<&TextDocument> {
        self.supporting_document.as_ref()
    }
}

/// # Summary
/// 提交前逐项收集输入的可变表单状态。
///
/// # Invariants
/// - 图表槽位下标与 `CHART_TIMEFRAMES` 对应。
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub kind: InvestmentKind,
    pub capital: Decimal,
    pub holding_horizon: String,
    charts: [Option<ImageAttachment>; CHART_COUNT],
    pub order_interface_image: Option<ImageAttachment>,
    pub supporting_document: Option<TextDocument>,
}

impl Default for RequestDraft {
    fn default() -> Self {
        Self {
            kind: InvestmentKind::Derivative,
            capital: Decimal::ONE_THOUSAND,
            holding_horizon: DEFAULT_HOLDING_HORIZON.to_string(),
            charts: Default::default(),
            order_interface_image: None,
            supporting_document: None,
        }
    }
}

impl RequestDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Summary
    /// 填充或清空一个图表槽位。
    ///
    /// # Arguments
    /// * `index`: 槽位下标，范围 `0..CHART_COUNT`。
    /// * `image`: 新内容，`None` 表示清空。
    ///
    /// # Returns
    /// * 下标越界时返回 `RequestError::ChartIndexOutOfRange`。
    pub fn set_chart(
        &mut self,
        index: usize,
        image: Option<ImageAttachment>,
    ) -> Result<(), RequestError> {
        let slot = self
            .charts
            .get_mut(index)
            .ok_or(RequestError::ChartIndexOutOfRange(index))?;
        *slot = image;
        Ok(())
    }

    pub fn chart(&self, index: usize) -> Option<&ImageAttachment> {
        self.charts.get(index).and_then(Option::as_ref)
    }

    pub fn charts_filled(&self) -> usize {
        self.charts.iter().filter(|slot| slot.is_some()).count()
    }

    /// # Summary
    /// 校验草稿并转换为 `AnalysisRequest`。
    ///
    /// # Logic
    /// 1. 所有图表槽位必须已填充。
    /// 2. 必须提供下单界面截图。
    /// 3. 资金必须为正数。
    ///
    /// # Returns
    /// * 成功返回请求，否则以 `RequestError` 返回首个失败的检查项。
    pub fn submit(self) -> Result<AnalysisRequest, RequestError> {
        if let Some(index) = self.charts.iter().position(Option::is_none) {
            return Err(RequestError::MissingChart { index });
        }
        let order_interface_image = self
            .order_interface_image
            .ok_or(RequestError::MissingInterfaceImage)?;

        AnalysisRequest::new(
            self.kind,
            self.capital,
            self.holding_horizon,
            self.charts.into_iter().flatten().collect(),
            order_interface_image,
            self.supporting_document,
        )
    }
}

/// # Summary
/// 模型返回的交易建议。所有字段均为模型自选单位的建议文本。
///
/// # Invariants
/// - 缺失的字段解码为空串，展示层以占位符渲染，不会导致整份回复被拒绝。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recommendation {
    // 衍生品为 Long/Short，股票为 Buy/Sell
    pub order_type: String,
    pub entry_point: String,
    pub stop_loss: String,
    pub take_profit: String,
    // 投入资金的比例或金额
    pub capital_allocation: String,
    pub reasoning: String,
    pub profit_estimate: String,
    pub risk_estimate: String,
    pub holding_time: String,
}

/// # Summary
/// 模型的结构化回答。
///
/// # Invariants
/// - 由 `should_trade` 决定其余两个字段中哪个有效。服务端不保证二者配对，
///   调用方统一通过 `verdict()` 分支。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub should_trade: bool,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
    #[serde(default)]
    pub no_trade_reason: Option<String>,
}

/// # Summary
/// 由 `AnalysisResult` 推导出的展示结论。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    Trade(&'a Recommendation),
    // `shouldTrade` 为 true 但未返回建议
    MissingRecommendation,
    NoTrade { reason: &'a str },
}

impl AnalysisResult {
    /// # Summary
    /// 仅依据 `should_trade` 决定展示内容。
    ///
    /// # Logic
    /// 1. `should_trade == false`：展示理由，缺失或为空白时使用 `DEFAULT_NO_TRADE_REASON`，
    ///    多余的建议一律忽略。
    /// 2. `should_trade == true`：存在建议时展示建议。
    pub fn verdict(&self) -> Verdict<'_> {
        if !self.should_trade {
            let reason = self
                .no_trade_reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_NO_TRADE_REASON);
            return Verdict::NoTrade { reason };
        }

        match &self.recommendation {
            Some(rec) => Verdict::Trade(rec),
            None => Verdict::MissingRecommendation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn image(name: &str) -> ImageAttachment {
        ImageAttachment::from_bytes(name, "image/png", b"png-bytes").unwrap()
    }

    fn charts() -> Vec<ImageAttachment> {
        (0..CHART_COUNT).map(|i| image(&format!("chart{}.png", i))).collect()
    }

    #[test]
    fn test_image_size_limit_applies_to_raw_bytes() {
        let at_limit = vec![0u8; MAX_IMAGE_BYTES];
        let ok = ImageAttachment::from_bytes("big.png", "image/png", &at_limit).unwrap();
        // base64 编码后会超过上限，只按原始字节计算

        assert!(ok.base64_payload.len() > MAX_IMAGE_BYTES);

        let over = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = ImageAttachment::from_bytes("huge.png", "image/png", &over).unwrap_err();
        assert_eq!(
            err,
            RequestError::ImageTooLarge {
                filename: "huge.png".to_string(),
                size: MAX_IMAGE_BYTES + 1,
                limit: MAX_IMAGE_BYTES,
            }
        );
    }

    #[test]
    fn test_base64_encoding() {
        let img = ImageAttachment::from_bytes("a.png", "image/png", b"hello").unwrap();
        assert_eq!(img.base64_payload, "aGVsbG8=");
        assert_eq!(img.mime_type, "image/png");
    }

    #[test]
    fn test_request_requires_five_charts() {
        let mut four = charts();
        four.pop();
        let err = AnalysisRequest::new(
            InvestmentKind::Equity,
            dec!(1000),
            "1 day",
            four,
            image("ui.png"),
            None,
        )
        .unwrap_err();
        assert_eq!(err, RequestError::ChartCount { expected: 5, actual: 4 });
    }

    #[test]
    fn test_request_requires_positive_capital() {
        for capital in [dec!(0), dec!(-5)] {
            let err = AnalysisRequest::new(
                InvestmentKind::Equity,
                capital,
                "1 day",
                charts(),
                image("ui.png"),
                None,
            )
            .unwrap_err();
            assert_eq!(err, RequestError::NonPositiveCapital(capital));
        }
    }

    #[test]
    fn test_draft_defaults() {
        let draft = RequestDraft::new();
        assert_eq!(draft.kind, InvestmentKind::Derivative);
        assert_eq!(draft.capital, dec!(1000));
        assert_eq!(draft.holding_horizon, "1 hour");
        assert_eq!(draft.charts_filled(), 0);
    }

    #[test]
    fn test_draft_validation_order() {
        let mut draft = RequestDraft::new();
        draft.capital = dec!(0);
        for i in 0..4 {
            draft.set_chart(i, Some(image("c.png"))).unwrap();
        }
        assert_eq!(
            draft.clone().submit().unwrap_err(),
            RequestError::MissingChart { index: 4 }
        );

        draft.set_chart(4, Some(image("c4.png"))).unwrap();
        assert_eq!(
            draft.clone().submit().unwrap_err(),
            RequestError::MissingInterfaceImage
        );

        draft.order_interface_image = Some(image("ui.png"));
        assert_eq!(
            draft.clone().submit().unwrap_err(),
            RequestError::NonPositiveCapital(dec!(0))
        );

        draft.capital = dec!(250.5);
        let request = draft.submit().unwrap();
        assert_eq!(request.chart_images().len(), CHART_COUNT);
        assert_eq!(request.chart_images()[4].filename, "c4.png");
        assert_eq!(request.capital(), dec!(250.5));
    }

    #[test]
    fn test_draft_rejects_out_of_range_slot() {
        let mut draft = RequestDraft::new();
        assert_eq!(
            draft.set_chart(5, Some(image("x.png"))).unwrap_err(),
            RequestError::ChartIndexOutOfRange(5)
        );
        draft.set_chart(2, Some(image("x.png"))).unwrap();
        draft.set_chart(2, None).unwrap();
        assert!(draft.chart(2).is_none());
    }

    #[test]
    fn test_investment_kind_parse_and_label() {
        assert_eq!("future".parse::<InvestmentKind>().unwrap(), InvestmentKind::Derivative);
        assert_eq!("Stocks".parse::<InvestmentKind>().unwrap(), InvestmentKind::Equity);
        assert!("bonds".parse::<InvestmentKind>().is_err());
        assert_eq!(InvestmentKind::Derivative.to_string(), "Future");
        assert_eq!(InvestmentKind::Equity.to_string(), "Stocks");
    }

    #[test]
    fn test_chart_timeframe_order() {
        let labels: Vec<String> = CHART_TIMEFRAMES.iter().map(|t| t.to_string()).collect();
        assert_eq!(labels, ["5m", "15m", "1h", "4h", "6h"]);
    }

    #[test]
    fn test_verdict_trusts_should_trade() {
        let result = AnalysisResult {
            should_trade: false,
            recommendation: Some(Recommendation {
                order_type: "Long".into(),
                entry_point: "1".into(),
                stop_loss: "1".into(),
                take_profit: "1".into(),
                capital_allocation: "1".into(),
                reasoning: "1".into(),
                profit_estimate: "1".into(),
                risk_estimate: "1".into(),
                holding_time: "1".into(),
            }),
            no_trade_reason: Some("wait for signal".into()),
        };
        assert_eq!(result.verdict(), Verdict::NoTrade { reason: "wait for signal" });
    }

    #[test]
    fn test_verdict_fallbacks() {
        let blank = AnalysisResult {
            should_trade: false,
            recommendation: None,
            no_trade_reason: Some("   ".into()),
        };
        assert_eq!(blank.verdict(), Verdict::NoTrade { reason: DEFAULT_NO_TRADE_REASON });

        let missing = AnalysisResult {
            should_trade: true,
            recommendation: None,
            no_trade_reason: Some("ignored".into()),
        };
        assert_eq!(missing.verdict(), Verdict::MissingRecommendation);
    }

    #[test]
    fn test_partial_recommendation_decodes_with_blanks() {
        let result: AnalysisResult = serde_json::from_str(
            r#"{"shouldTrade": true, "recommendation": {"orderType": "Long", "entryPoint": "101.5"}}"#,
        )
        .unwrap();
        let Verdict::Trade(rec) = result.verdict() else {
            panic!("expected a trade verdict");
        };
        assert_eq!(rec.order_type, "Long");
        assert_eq!(rec.entry_point, "101.5");
        assert_eq!(rec.stop_loss, "");
        assert_eq!(rec.holding_time, "");
    }
}
