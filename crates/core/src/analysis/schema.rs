use serde::Serialize;
use std::collections::BTreeMap;

/// # Summary
/// 模型服务 Schema 方言（OpenAPI 子集）的基础类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    Object,
    Boolean,
    String,
}

/// # Summary
/// 随请求发送的响应 Schema 声明，由服务端据此约束输出。
///
/// # Invariants
/// - 空集合与 `nullable == false` 不出现在序列化结果中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub property_ordering: Vec<String>,
}

impl Schema {
    fn leaf(kind: SchemaType, description: &str) -> Self {
        Self {
            kind,
            description: Some(description.to_string()),
            nullable: false,
            properties: BTreeMap::new(),
            required: Vec::new(),
            property_ordering: Vec::new(),
        }
    }

    fn object(description: Option<&str>, fields: Vec<(&str, Schema)>, required: &[&str]) -> Self {
        let property_ordering = fields.iter().map(|(name, _)| name.to_string()).collect();
        Self {
            kind: SchemaType::Object,
            description: description.map(str::to_string),
            nullable: false,
            properties: fields
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
            required: required.iter().map(|r| r.to_string()).collect(),
            property_ordering,
        }
    }

    fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// 建议字段及提供给模型的字段说明。
const RECOMMENDATION_FIELDS: [(&str, &str); 9] = [
    (
        "orderType",
        "Order type: Long/Short for futures, Buy/Sell for stocks.",
    ),
    ("entryPoint", "Suggested entry price."),
    ("stopLoss", "Stop loss level."),
    ("takeProfit", "Take profit level."),
    (
        "capitalAllocation",
        "Percentage or amount of capital to commit to the order.",
    ),
    (
        "reasoning",
        "Detailed reasoning combining every analysed input behind this order.",
    ),
    (
        "profitEstimate",
        "Expected profit estimate (e.g. +5% or +50 USD).",
    ),
    ("riskEstimate", "Expected risk estimate (e.g. -2% or -20 USD)."),
    ("holdingTime", "Recommended time to hold the position."),
];

/// # Summary
/// 构建所有分析回复必须遵循的 Schema。
///
/// # Logic
/// 1. 必填布尔字段 `shouldTrade`。
/// 2. 可空对象 `recommendation`，其 9 个字符串字段均为必填。
/// 3. 可空字符串 `noTradeReason`。
/// 4. 通过 `propertyOrdering` 保证 `shouldTrade` 排在首位。

pub fn analysis_response_schema() -> Schema {
    let recommendation_fields: Vec<(&str, Schema)> = RECOMMENDATION_FIELDS
        .iter()
        .map(|(name, description)| (*name, Schema::leaf(SchemaType::String, description)))
        .collect();
    let recommendation_required: Vec<&str> =
        RECOMMENDATION_FIELDS.iter().map(|(name, _)| *name).collect();

    let recommendation = Schema::object(
        Some("Trade proposal details. Only filled when shouldTrade is true."),
        recommendation_fields,
        &recommendation_required,
    )
    .nullable();

    let no_trade_reason = Schema::leaf(
        SchemaType::String,
        "Why no trade should be placed, e.g. 'Do not enter a trade right now. Wait for a clearer signal.' Only filled when shouldTrade is false.",
    )
    .nullable();

    Schema::object(
        None,
        vec![
            (
                "shouldTrade",
                Schema::leaf(
                    SchemaType::Boolean,
                    "True when there is a trading opportunity, false otherwise.",
                ),
            ),
            ("recommendation", recommendation),
            ("noTradeReason", no_trade_reason),
        ],
        &["shouldTrade"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_shape() {
        let value = serde_json::to_value(analysis_response_schema()).unwrap();
        assert_eq!(value["type"], "OBJECT");
        assert_eq!(value["required"], json!(["shouldTrade"]));
        assert_eq!(
            value["propertyOrdering"],
            json!(["shouldTrade", "recommendation", "noTradeReason"])
        );
        assert_eq!(value["properties"]["shouldTrade"]["type"], "BOOLEAN");
        assert!(value.get("nullable").is_none());
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_nullable_members() {
        let value = serde_json::to_value(analysis_response_schema()).unwrap();
        let rec = &value["properties"]["recommendation"];
        assert_eq!(rec["type"], "OBJECT");
        assert_eq!(rec["nullable"], true);
        assert_eq!(rec["required"].as_array().unwrap().len(), 9);
        assert_eq!(rec["properties"].as_object().unwrap().len(), 9);
        for field in ["orderType", "entryPoint", "stopLoss", "takeProfit", "holdingTime"] {
            assert_eq!(rec["properties"][field]["type"], "STRING");
        }

        let reason = &value["properties"]["noTradeReason"];
        assert_eq!(reason["type"], "STRING");
        assert_eq!(reason["nullable"], true);
    }
}
