use crate::intake::{self, IntakeArgs};
use crate::render::{render_panel, with_disclaimer};
use crate::settings::resolve_locale;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tradelens_advisor::{AdvisorSession, AnalysisService, PanelState};
use tradelens_core::config::AppConfig;
use tradelens_gemini::GeminiClient;
use tradelens_store::SqliteCredentialStore;

const KEY_HINT: &str = "Hint: run `tradelens key set <KEY>` to configure your API key.";

/// # Summary
/// 组装运行时依赖并打开会话。
///
/// # Logic
/// 1. 打开 `data_dir` 下的 SQLite 设置库。
/// 2. 创建 Gemini 客户端与分析服务。
/// 3. 启动会话，加载已保存的密钥。
async fn open_session(config: &AppConfig) -> anyhow::Result<AdvisorSession> {
    let store = Arc::new(SqliteCredentialStore::new(Path::new(&config.storage.data_dir)).await?);
    let client = Arc::new(GeminiClient::new(&config.model)?);
    let service = AnalysisService::new(client, resolve_locale(config));
    Ok(AdvisorSession::start(store, service).await?)
}

/// # Summary
/// 读取磁盘上的文件执行一次分析并输出面板。
///
/// # Logic
/// 1. 先读取并校验全部输入。
/// 2. 打开会话。
/// 3. 提交一次并输出结果，`json` 为真时输出 JSON。
pub async fn analyze(config: &AppConfig, args: IntakeArgs, json: bool) -> anyhow::Result<ExitCode> {
    let request = intake::build_request(args)?;
    let mut session = open_session(config).await?;

    eprintln!("{}", render_panel(&PanelState::Loading));
    let panel = session.submit(&request).await;
    match panel {
        PanelState::Ready(result) if json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        other => println!("{}", with_disclaimer(&render_panel(other))),
    }
    let failed = matches!(panel, PanelState::Failed(_));

    if !failed {
        return Ok(ExitCode::SUCCESS);
    }
    if session.settings_prompt_open() {
        eprintln!("{}", KEY_HINT);
    }
    Ok(ExitCode::FAILURE)
}

pub async fn key_set(config: &AppConfig, raw: &str) -> anyhow::Result<ExitCode> {
    let mut session = open_session(config).await?;
    session.save_credential(raw).await?;
    if let Some(credential) = session.credential() {
        println!("API key saved ({}).", credential.masked());
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn key_show(config: &AppConfig) -> anyhow::Result<ExitCode> {
    let session = open_session(config).await?;
    match session.credential() {
        Some(credential) => {
            println!("API key: {}", credential.masked());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("No API key configured.");
            eprintln!("{}", KEY_HINT);
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn key_clear(config: &AppConfig) -> anyhow::Result<ExitCode> {
    let mut session = open_session(config).await?;
    session.clear_credential().await?;
    info!("API key removed from {}", config.storage.data_dir);
    println!("API key cleared.");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradelens_core::credential::CredentialError;

    fn config(dir: &tempfile::TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.data_dir = dir.path().join("data").display().to_string();
        config
    }

    #[tokio::test]
    async fn test_key_set_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);

        assert_eq!(key_show(&config).await.unwrap(), ExitCode::FAILURE);
        assert_eq!(key_set(&config, "  AIza-cli-key  ").await.unwrap(), ExitCode::SUCCESS);
        assert_eq!(key_show(&config).await.unwrap(), ExitCode::SUCCESS);

        let session = open_session(&config).await.unwrap();
        assert_eq!(session.credential().map(|c| c.expose()), Some("AIza-cli-key"));
        assert!(!session.settings_prompt_open());
    }

    #[tokio::test]
    async fn test_key_clear_removes_stored_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);

        key_set(&config, "AIza-cli-key").await.unwrap();
        assert_eq!(key_clear(&config).await.unwrap(), ExitCode::SUCCESS);
        assert_eq!(key_show(&config).await.unwrap(), ExitCode::FAILURE);
        assert!(open_session(&config).await.unwrap().settings_prompt_open());
    }

    #[tokio::test]
    async fn test_key_set_rejects_blank_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);

        let err = key_set(&config, "   ").await.unwrap_err();
        assert_eq!(err.downcast_ref::<CredentialError>(), Some(&CredentialError::Empty));
        assert!(open_session(&config).await.unwrap().credential().is_none());
    }
}
