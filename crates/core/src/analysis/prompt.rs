use super::entity::AnalysisRequest;
use super::schema::{Schema, analysis_response_schema};
use crate::common::{Locale, format_amount};
use tracing::debug;

/// 要求模型输出的 MIME 类型：严格 JSON，不带任何说明文字。
pub const RESPONSE_MIME_TYPE: &str = "application/json";

/// 辅助文档正文上方的分隔标题。
pub const DOCUMENT_HEADING: &str = "--- ATTACHED DOCUMENT CONTENT ---";

/// 每次请求模型都必须遵守的固定规则。
pub const SYSTEM_INSTRUCTION: &str = "\
You are an elite AI financial expert. Your task is to analyse the supplied market data and \
propose the most profitable investment strategy while keeping the user's capital safe.

MANDATORY RULES:
1. **Capital safety first**: The risk of an order must never exceed the capital the user provided. \
The stop loss must be sized so the account can never be wiped out.
2. **High probability only**: Only propose an order when you assess at least a 70% probability of \
success based on the combined signals.
3. **Decline when unsure**: If there is no clear trading opportunity or the market is too risky, \
return 'shouldTrade: false' and explain why in 'noTradeReason'.
4. **Comprehensive analysis**: Combine technical analysis of every chart, the signals visible in the \
order interface screenshot, the information in the attached document and the latest general market \
context before deciding.
5. **Complete output**: Always fill every field of the JSON schema that applies.
";

/// # Summary
/// 发往模型的多模态载荷中的一个片段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    // base64 数据原样转发
    InlineImage { mime_type: String, data: String },
}

/// # Summary
/// 一次分析调用所需的全部模型输入。
///
/// # Invariants
/// - `parts` 中先放所有文本片段，再按槽位顺序放图表，最后是下单界面截图。
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPayload {
    pub system_instruction: String,
    pub parts: Vec<Part>,
    pub response_mime_type: String,
    pub response_schema: Schema,
}

impl ModelPayload {
    pub fn text_parts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Text(text) => Some(text.as_str()),
            Part::InlineImage { .. } => None,
        })
    }

    pub fn image_parts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parts.iter().filter_map(|part| match part {
            Part::InlineImage { mime_type, data } => Some((mime_type.as_str(), data.as_str())),
            Part::Text(_) => None,
        })
    }
}

/// # Summary
/// 生成请求对应的用户提示词。
///
/// # Logic
/// 将品种类型、按 `locale` 格式化后的资金以及持仓周期填入固定模板。
pub fn build_user_prompt(request: &AnalysisRequest, locale: Locale) -> String {
    format!(
        "Please analyse the following data and provide a detailed trade recommendation.

**User information:**
- **Investment type**: {kind}
- **Available capital**: {capital} USD
- **Expected holding time**: {horizon}

**Base your analysis on the attached data:**
- **5 price charts** (5-minute, 15-minute, 1-hour, 4-hour and 6-hour): analyse trend, candlestick patterns and technical indicators (RSI, MACD, Bollinger Bands, etc.) across the timeframes.
- **1 order interface screenshot**: identify key price zones and support/resistance from the order book or the indicators on screen.
- **1 analysis document**: extract the important information, news or existing analysis it contains.

**Output requirements:**
From the combined analysis, give one single, best order suggestion that satisfies the rules above. Return the result exactly in the JSON format provided.",
        kind = request.kind(),
        capital = format_amount(request.capital(), locale),
        horizon = request.holding_horizon(),
    )
}

/// # Summary
/// 组装一次分析调用的完整载荷。
///
/// # Logic
/// 1. 文本片段：先是用户提示词，附带辅助文档时再追加文档块，否则不加占位。
/// 2. 图片片段：按槽位顺序放 5 张图表，然后是下单界面截图。
/// 3. 附上系统指令与响应 Schema。
///
/// # Arguments
/// * `request`: 已校验的请求。
/// * `locale`: 用于格式化资金的区域设置。
///
/// # Returns
/// * 载荷。相同输入总是得到相同结果。

pub fn build_payload(request: &AnalysisRequest, locale: Locale) -> ModelPayload {
    let mut parts = vec![Part::Text(build_user_prompt(request, locale))];

    if let Some(doc) = request.supporting_document() {
        parts.push(Part::Text(format!(
            "\n\n{}\n{}",
            DOCUMENT_HEADING, doc.text_content
        )));
    }

    parts.extend(
        request
            .chart_images()
            .iter()
            .chain(std::iter::once(request.order_interface_image()))
            .map(|img| Part::InlineImage {
                mime_type: img.mime_type.clone(),
                data: img.base64_payload.clone(),
            }),
    );

    debug!(
        "Built payload: {} parts, document attached: {}",
        parts.len(),
        request.supporting_document().is_some()
    );

    ModelPayload {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        parts,
        response_mime_type: RESPONSE_MIME_TYPE.to_string(),
        response_schema: analysis_response_schema(),
    }
}
