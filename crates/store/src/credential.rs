use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tradelens_core::credential::{
    CREDENTIAL_STORAGE_KEY, Credential, CredentialError, CredentialStore,
};

/// 数据目录下的设置库文件名
const SETTINGS_DB: &str = "settings.db";

/// 基于 SQLite 的 `CredentialStore` 实现。
///
/// # Summary
/// 将客户端本地设置保存在 `<data_dir>/settings.db` 的键值表中，
/// 目前只使用 API 密钥这一项。
///
/// # Invariants
/// * 打开存储时即创建表结构。
/// * 所有操作都经由共享的 `SqlitePool` 执行。
pub struct SqliteCredentialStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteCredentialStore {
    /// 打开（或创建）设置库。
    ///
    /// # Logic
    /// 1. 确保 `data_dir` 存在。
    /// 2. 以 `create_if_missing` 方式连接。
    /// 3. 表不存在时创建 `settings` 表。
    ///
    /// # Arguments
    /// * `data_dir` - 存放 `settings.db` 的目录。
    ///
    /// # Returns
    /// * `Result<Self, CredentialError>` - 存储实例或存储错误。
    pub async fn new(data_dir: &Path) -> Result<Self, CredentialError> {
        fs::create_dir_all(data_dir).map_err(|e| CredentialError::Storage(e.to_string()))?;

        let path = data_dir.join(SETTINGS_DB);
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| CredentialError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| CredentialError::Storage(e.to_string()))?;

        info!("Settings store opened at {}", path.display());
        Ok(Self { pool, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    /// # Summary
    /// 读取 API 密钥所在行。
    ///
    /// # Returns
    /// * 行不存在或仅含空白时返回 `None`。
    async fn load(&self) -> Result<Option<Credential>, CredentialError> {
        let row = sqlx::query_as::<_, (String,)>("SELECT value FROM settings WHERE key = ?")
            .bind(CREDENTIAL_STORAGE_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CredentialError::Storage(e.to_string()))?;

        debug!("Credential row present: {}", row.is_some());
        Ok(row.and_then(|(value,)| Credential::new(value)))
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
            .bind(CREDENTIAL_STORAGE_KEY)
            .bind(credential.expose())
            .execute(&self.pool)
            .await
            .map_err(|e| CredentialError::Storage(e.to_string()))?;
        info!("API key saved ({})", credential.masked());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(CREDENTIAL_STORAGE_KEY)
            .execute(&self.pool)
            .await
            .map_err(|e| CredentialError::Storage(e.to_string()))?;
        info!("API key cleared");
        Ok(())
    }
}
