use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use worksuite_core::AppError;

/// Applications whose access is governed by the permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppKey {
    /// Contacts, companies and deals.
    Crm,
    /// Boards, columns and cards.
    Kanban,
    /// Mail client.
    Email,
    /// Money management.
    Money,
    /// To-do lists.
    Todos,
    /// Tenant administration, including permission management.
    Admin,
    /// File storage.
    Files,
    /// Notification center.
    Notifications,
    /// Image conversion.
    Image,
    /// Subscription billing.
    Billing,
}

impl AppKey {
    /// Returns a stable storage value for this app.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crm => "crm",
            Self::Kanban => "kanban",
            Self::Email => "email",
            Self::Money => "money",
            Self::Todos => "todos",
            Self::Admin => "admin",
            Self::Files => "files",
            Self::Notifications => "notifications",
            Self::Image => "image",
            Self::Billing => "billing",
        }
    }

    /// Returns all known apps in matrix order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AppKey] = &[
            AppKey::Crm,
            AppKey::Kanban,
            AppKey::Email,
            AppKey::Money,
            AppKey::Todos,
            AppKey::Admin,
            AppKey::Files,
            AppKey::Notifications,
            AppKey::Image,
            AppKey::Billing,
        ];

        ALL
    }
}

impl FromStr for AppKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|app| app.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown app key '{value}'")))
    }
}

impl Display for AppKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Access level inside one app. `Manage` implies `Write`, which implies `Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKey {
    /// View data.
    Read,
    /// Create and change data.
    Write,
    /// Administer the app.
    Manage,
}

impl ScopeKey {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Manage => "manage",
        }
    }

    /// Returns all known scopes, weakest first.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Read, Self::Write, Self::Manage]
    }
}

impl FromStr for ScopeKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "manage" => Ok(Self::Manage),
            _ => Err(AppError::Validation(format!(
                "unknown scope key '{value}'"
            ))),
        }
    }
}

impl Display for ScopeKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}
