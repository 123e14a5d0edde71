use crate::calendar::Service;
use crate::sync::graph_api::{GraphApi, HttpGraphClient};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unknown calendar account: {0}")]
    UnknownAccount(String),
    #[error("Failed to read token file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse token: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Token for account {0} has expired")]
    TokenExpired(String),
}

/// A calendar account linked to a CRM user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarAccount {
    pub id: String,
    pub username: String,
    pub user_id: String,
    #[serde(default)]
    pub service: Service,
    pub token_cache: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenInfo {
    pub fn new(access_token: String, expires_in_seconds: i64) -> Self {
        Self {
            access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in_seconds),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

/// JSON token cache of one account. Tokens are written by the OAuth flow,
/// which lives outside this crate.
pub struct TokenStorage {
    path: PathBuf,
}

impl TokenStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save_token(&self, token: &TokenInfo) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn load_token(&self) -> Result<TokenInfo, AuthError> {
        let content = std::fs::read_to_string(&self.path)?;
        let token: TokenInfo = serde_json::from_str(&content)?;
        Ok(token)
    }
}

/// Resolves calendar accounts and hands out authenticated Graph clients.
pub trait AccountStore: Send + Sync {
    fn account(&self, account_id: &str) -> Option<CalendarAccount>;

    fn accounts_for_user(&self, user_id: &str, service: Service) -> Vec<CalendarAccount>;

    fn client_for(&self, account_id: &str) -> Result<Arc<dyn GraphApi>, AuthError>;
}

/// Accounts declared in the configuration file, each with its own token cache.
pub struct ConfigAccountStore {
    accounts: Vec<CalendarAccount>,
    base_url: String,
}

impl ConfigAccountStore {
    pub fn new(accounts: Vec<CalendarAccount>, base_url: String) -> Self {
        Self { accounts, base_url }
    }
}

impl AccountStore for ConfigAccountStore {
    fn account(&self, account_id: &str) -> Option<CalendarAccount> {
        self.accounts.iter().find(|a| a.id == account_id).cloned()
    }

    fn accounts_for_user(&self, user_id: &str, service: Service) -> Vec<CalendarAccount> {
        self.accounts
            .iter()
            .filter(|a| a.user_id == user_id && a.service == service)
            .cloned()
            .collect()
    }

    fn client_for(&self, account_id: &str) -> Result<Arc<dyn GraphApi>, AuthError> {
        let account = self
            .account(account_id)
            .ok_or_else(|| AuthError::UnknownAccount(account_id.to_string()))?;

        let token = TokenStorage::new(account.token_cache).load_token()?;
        if !token.is_valid() {
            tracing::warn!("Token of account {} expired at {}", account_id, token.expires_at);
            return Err(AuthError::TokenExpired(account_id.to_string()));
        }

        let client = HttpGraphClient::new(token.access_token).with_base_url(self.base_url.clone());
        Ok(Arc::new(client))
    }
}
