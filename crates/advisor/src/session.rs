use crate::service::AnalysisService;
use std::sync::Arc;
use tracing::{info, warn};
use tradelens_core::analysis::entity::{AnalysisRequest, AnalysisResult};
use tradelens_core::credential::{Credential, CredentialError, CredentialStore};

/// 未配置 API 密钥时提交所展示的提示。
pub const MISSING_KEY_MESSAGE: &str = "Please set up your API key before analyzing.";

/// # Summary
/// 结果面板当前展示的内容。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Idle,
    // 由调用方在等待 `submit` 期间自行渲染
    Loading,
    Failed(String),
    Ready(AnalysisResult),
}

/// # Summary
/// 单个交互用户的提交与密钥管理流程。
///
/// # Invariants
/// - 密钥只在 `start` 时从存储读取一次并缓存。
/// - `submit` 需要 `&mut self`，同一时刻至多一个分析在进行。
pub struct AdvisorSession {
    store: Arc<dyn CredentialStore>,
    service: AnalysisService,
    credential: Option<Credential>,
    settings_prompt_open: bool,
    panel: PanelState,
}

impl AdvisorSession {
    /// # Summary
    /// 打开会话并加载已保存的密钥。
    ///
    /// # Logic
    /// 1. 从存储中读取密钥。
    /// 2. 未保存密钥时打开设置提示。
    pub async fn start(
        store: Arc<dyn CredentialStore>,
        service: AnalysisService,
    ) -> Result<Self, CredentialError> {
        let credential = store.load().await?;
        let settings_prompt_open = credential.is_none();
        if settings_prompt_open {
            info!("No API key stored, settings prompt opened");
        }
        Ok(Self {
            store,
            service,
            credential,
            settings_prompt_open,
            panel: PanelState::Idle,
        })
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn settings_prompt_open(&self) -> bool {
        self.settings_prompt_open
    }

    pub fn open_settings(&mut self) {
        self.settings_prompt_open = true;
    }

    pub fn close_settings(&mut self) {
        self.settings_prompt_open = false;
    }

    /// # Summary
    /// 保存用户输入的新 API 密钥。
    ///
    /// # Logic
    /// 1. 去除首尾空白，空白输入返回 `CredentialError::Empty`。
    /// 2. 先持久化，再更新缓存。
    /// 3. 清除错误面板并关闭设置提示。
    pub async fn save_credential(&mut self, raw: &str) -> Result<(), CredentialError> {
        let credential = Credential::new(raw).ok_or(CredentialError::Empty)?;
        self.store.save(&credential).await?;
        self.credential = Some(credential);

        if matches!(self.panel, PanelState::Failed(_)) {
            self.panel = PanelState::Idle;
        }
        self.settings_prompt_open = false;
        Ok(())
    }

    pub async fn clear_credential(&mut self) -> Result<(), CredentialError> {
        self.store.clear().await?;
        self.credential = None;
        Ok(())
    }

    /// # Summary
    /// 执行一次分析并将结果记录到面板。
    ///
    /// # Logic
    /// 1. 没有密钥：面板置为 `Failed(MISSING_KEY_MESSAGE)` 并打开设置提示，不发送请求。
    /// 2. 成功置为 `Ready(result)`，失败置为 `Failed("Analysis error: ...")`；
    ///    密钥类错误会重新打开设置提示。
    ///
    /// # Invariants
    /// - 返回的面板状态只会是 `Ready` 或 `Failed`。会话在等待期间被独占借用，
    ///   `Loading` 由调用方在 await 之前自行展示。
    ///
    /// # Returns
    /// * 提交完成后的面板状态。
    pub async fn submit(&mut self, request: &AnalysisRequest) -> &PanelState {
        let Some(credential) = self.credential.as_ref() else {
            warn!("Submission without API key");
            self.panel = PanelState::Failed(MISSING_KEY_MESSAGE.to_string());
            self.settings_prompt_open = true;
            return &self.panel;
        };

        self.panel = match
 self.service.analyze(request, Some(credential)).await {
            Ok(result) => PanelState::Ready(result),
            Err(e) => {
                if e.requires_credential_prompt() {
                    self.settings_prompt_open = true;
                }
                PanelState::Failed(format!("Analysis error: {}", e))
            }
        };
        &self.panel
    }
}
