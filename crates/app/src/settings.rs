use anyhow::Context;
use config::{Config, Environment, File};
use std::path::Path;
use tracing::warn;
use tradelens_core::common::Locale;
use tradelens_core::config::AppConfig;

/// 在工作目录中查找的可选配置文件名。
const DEFAULT_CONFIG_NAME: &str = "tradelens";
const ENV_PREFIX: &str = "TRADELENS";

/// # Summary
/// 将工作目录下的 `.env` 读入进程环境变量。
///
/// # Logic
/// 文件不存在时静默跳过；文件无法读取或解析时返回警告文本。
/// 此时日志尚未初始化，由调用方在日志就绪后输出。
///
/// # Returns
/// * `Option<String>` - 需要输出的警告，没有则为 `None`。
pub fn load_dotenv() -> Option<String> {
    dotenv_warning(dotenvy::dotenv().map(|_| ()))
}

fn dotenv_warning(result: Result<(), dotenvy::Error>) -> Option<String> {
    match result {
        Err(e) if !e.not_found() => Some(format!("Ignoring unreadable .env file: {}", e)),
        _ => None,
    }
}

/// # Summary
/// 加载分层的应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 为基础。
/// 2. 合并 `path`（必需）或 `tradelens.toml`（可选）。
/// 3. 合并 `TRADELENS__SECTION__KEY` 形式的环境变量。
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };

    Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read configuration")?
        .try_deserialize::<AppConfig>()
        .context("Invalid configuration")
}

/// # Summary
/// 解析展示用的区域设置。
///
/// # Logic
/// 优先使用 `config.locale`；无法识别时回退到 `LANG`，再回退到 en-US。
pub fn resolve_locale(config: &AppConfig) -> Locale {
    config.locale.parse().unwrap_or_else(|_| {
        let lang = std::env::var("LANG").ok();
        let fallback = Locale::from_posix_env(lang.as_deref());
        warn!(
            "Unknown locale {:?}, using {}",
            config.locale, fallback
        );
        fallback
    })
}
