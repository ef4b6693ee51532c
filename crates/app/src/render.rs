use tradelens_advisor::PanelState;
use tradelens_core::analysis::entity::{AnalysisResult, Recommendation, Verdict};

pub const DISCLAIMER: &str =
    "Disclaimer: This information is for reference only and is not investment advice.";

const EMPTY_FIELD: &str = "---";

fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        EMPTY_FIELD
    } else {
        value
    }
}

/// # Summary
/// 结果面板的文本渲染。
pub fn render_panel(panel: &PanelState) -> String {
    match panel {
        PanelState::Idle => "The analysis result will be shown here.".to_string(),
        PanelState::Loading => "AI is analysing the data...".to_string(),
        PanelState::Failed(message) => format!("An error occurred\n{}", message),
        PanelState::Ready(result) => render_result(result),
    }
}

pub fn render_result(result: &AnalysisResult) -> String {
    match result.verdict() {
        Verdict::NoTrade { reason } => format!("Warning\n{}", reason),
        Verdict::MissingRecommendation => {
            "The model suggested a trade but returned no details. Please run the analysis again."
                .to_string()
        }
        Verdict::Trade(rec) => render_recommendation(rec),
    }
}

fn field_line(title: &str, value: &str) -> String {
    format!("{:<20}{}\n", format!("{}:", title), or_placeholder(value))
}

fn render_recommendation(rec: &Recommendation) -> String {
    let mut out = String::from("Trade recommendation\n\n");
    let fields = [
        ("Order type", &rec.order_type),
        ("Entry point", &rec.entry_point),
        ("Capital allocation", &rec.capital_allocation),
        ("Stop loss", &rec.stop_loss),
        ("Take profit", &rec.take_profit),
    ];
    for (title, value) in fields {
        out.push_str(&field_line(title, value));
    }

    out.push_str("\nReasoning:\n");
    out.push_str(or_placeholder(&rec.reasoning));
    out.push_str("\n\n");

    let estimates = [
        ("Profit estimate", &rec.profit_estimate),
        ("Risk estimate", &rec.risk_estimate),
        ("Holding time", &rec.holding_time),
    ];
    for (title, value) in estimates {
        out.push_str(&field_line(title, value));
    }
    out
}

/// 面板文本后附免责声明。

pub fn with_disclaimer(body: &str) -> String {
    format!("{}\n\n{}", body.trim_end(), DISCLAIMER)
}
