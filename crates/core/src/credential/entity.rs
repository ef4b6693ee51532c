use std::fmt;

/// 持久化密钥时使用的固定键名。
pub const CREDENTIAL_STORAGE_KEY: &str = "gemini-api-key";

/// # Summary
/// 调用模型服务所需的 API 密钥。
///
/// # Invariants
/// - 不为空，首尾不含空白。
/// - `Debug` 输出不泄露密钥内容。
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// 去除 `raw` 首尾空白，结果为空时返回 `None`。
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// 最多显示末尾 4 个字符，例如 `****wxyz`。
    pub fn masked(&self) -> String {
        let count = self.0.chars().count();
        let tail: String = self.0.chars().skip(count.saturating_sub(4)).collect();
        if count <= 4 {
            "*".repeat(count)
        } else {
            format!("****{}", tail)
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}
