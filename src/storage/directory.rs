use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A CRM user, identified by the username they sign in with (an email address).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmUser {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
pub trait UserDirectory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Option<CrmUser>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: Vec<CrmUser>,
}

impl InMemoryDirectory {
    pub fn new(users: Vec<CrmUser>) -> Self {
        Self { users }
    }
}

impl UserDirectory for InMemoryDirectory {
    fn find_by_email(&self, email: &str) -> Option<CrmUser> {
        self.users.iter().find(|u| u.username == email).cloned()
    }
}

/// Calendars a user switched off, per account id.
pub trait DisabledCalendars: Send + Sync {
    fn disabled_calendars(&self, account_id: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisabledCalendarRegistry {
    #[serde(flatten)]
    by_account: HashMap<String, Vec<String>>,
}

impl DisabledCalendarRegistry {
    pub fn new(by_account: HashMap<String, Vec<String>>) -> Self {
        Self { by_account }
    }
}

impl DisabledCalendars for DisabledCalendarRegistry {
    fn disabled_calendars(&self, account_id: &str) -> Vec<String> {
        self.by_account.get(account_id).cloned().unwrap_or_default()
    }
}
