//! Remote identity

use std::fmt;

use serde::{Deserialize, Serialize};

/// An authenticated remote user
///
/// Presence of an identity is what switches the ledger onto mirrored
/// storage. The access token is never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Short label for display: the email's local part, else the user id
    pub fn display_name(&self) -> String {
        let base = self
            .email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.user_id);

        if base.chars().count() > 8 {
            format!("@{}...", base.chars().take(8).collect::<String>())
        } else {
            format!("@{}", base)
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}
