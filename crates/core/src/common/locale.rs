use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// 渲染金额时保留的最大小数位数。
const MAX_FRACTION_DIGITS: u32 = 3;

/// # Summary
/// 将金额写入提示词时使用的数字格式区域设置。
///
/// # Invariants
/// - 只影响展示，渲染后的金额不会再被解析。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    EnUs,
    EnGb,
    DeDe,
    FrFr,
    ViVn,
}

impl Locale {
    /// 整数部分每三位之间的分组分隔符。
    pub fn grouping_separator(self) -> &'static str {
        match self {
            Locale::EnUs | Locale::EnGb => ",",
            Locale::DeDe | Locale::ViVn => ".",
            // 窄不换行空格
            Locale::FrFr => "\u{202f}",
        }
    }

    /// 整数与小数之间的分隔符。
    pub fn decimal_separator(self) -> &'static str {
        match self {
            Locale::EnUs | Locale::EnGb => ".",
            Locale::DeDe | Locale::FrFr | Locale::ViVn => ",",
        }
    }

    /// 区域设置的 BCP-47 标签。
    pub fn tag(self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::EnGb => "en-GB",
            Locale::DeDe => "de-DE",
            Locale::FrFr => "fr-FR",
            Locale::ViVn => "vi-VN",
        }
    }

    /// # Summary
    /// 从 `LANG` 等 POSIX 环境变量值解析区域设置。
    ///
    /// # Logic
    /// 1. 有值时进行解析。
    /// 2. 缺失或无法识别时回退到 `en-US`。
    ///
    /// # Arguments
    /// * `value`: 原始值，例如 `Some("de_DE.UTF-8")`。
    ///
    /// # Returns
    /// * 解析得到的区域设置。
    pub fn from_posix_env(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse::<Locale>().ok())
            .unwrap_or_default()
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 去掉 ".UTF-8" 编码后缀与 "@euro" 一类修饰符
        let base = s.split(['.', '@']).next().unwrap_or("");
        match base.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "en-us" | "en" | "c" | "posix" => Ok(Locale::EnUs),
            "en-gb" => Ok(Locale::EnGb),
            "de-de" | "de" => Ok(Locale::DeDe),
            "fr-fr" | "fr" => Ok(Locale::FrFr),
            "vi-vn" | "vi" => Ok(Locale::ViVn),
            _ => Err(format!("Unknown locale: {}", s)),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// # Summary
/// 按区域设置分组渲染金额，例如 `1000` 渲染为 `"1,000"`。
///
/// # Logic
/// 1. 四舍五入（远离零）至最多 3 位小数。
/// 2. 去掉小数末尾的零。
/// 3. 整数部分按三位一组插入分隔符。
///
/// # Arguments
/// * `amount`: 待渲染的数值。
/// * `locale`: 目标区域设置。
///
/// # Returns
/// * 格式化后的文本。
pub fn format_amount(amount: Decimal, locale: Locale) -> String {
    let rounded = amount
        .round_dp_with_strategy(MAX_FRACTION_DIGITS, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits.as_str(), None),
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, locale.grouping_separator()));
    if let Some(frac) = frac_part {
        out.push_str(locale.decimal_separator());
        out.push_str(frac);
    }
    out
}

fn group_digits(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + (len / 3) * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_en_us_grouping() {
        assert_eq!(format_amount(dec!(1000), Locale::EnUs), "1,000");
        assert_eq!(format_amount(dec!(999), Locale::EnUs), "999");
        assert_eq!(format_amount(dec!(1234567.5), Locale::EnUs), "1,234,567.5");
        assert_eq!(format_amount(dec!(100000), Locale::EnUs), "100,000");
    }

    #[test]
    fn test_fraction_rounding_and_trailing_zeros() {
        assert_eq!(format_amount(dec!(1234.5678), Locale::EnUs), "1,234.568");
        assert_eq!(format_amount(dec!(2500.00), Locale::EnUs), "2,500");
        assert_eq!(format_amount(dec!(0.0005), Locale::EnUs), "0.001");
    }

    #[test]
    fn test_other_locales() {
        assert_eq!(format_amount(dec!(1234567.5), Locale::DeDe), "1.234.567,5");
        assert_eq!(format_amount(dec!(1000), Locale::ViVn), "1.000");
        assert_eq!(format_amount(dec!(1000), Locale::FrFr), "1\u{202f}000");
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(format_amount(dec!(-12345), Locale::EnUs), "-12,345");
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!("en-US".parse::<Locale>().unwrap(), Locale::EnUs);
        assert_eq!("de_DE.UTF-8".parse::<Locale>().unwrap(), Locale::DeDe);
        assert_eq!("fr_FR@euro".parse::<Locale>().unwrap(), Locale::FrFr);
        assert!("xx-YY".parse::<Locale>().is_err());
        assert_eq!(Locale::from_posix_env(Some("C.UTF-8")), Locale::EnUs);
        assert_eq!(Locale::from_posix_env(Some("vi_VN.UTF-8")), Locale::ViVn);
        assert_eq!(Locale::from_posix_env(None), Locale::EnUs);
    }
}
