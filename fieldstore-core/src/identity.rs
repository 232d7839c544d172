//! Identity types for authenticated principals

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Snapshot of a user captured at login.
///
/// The session store hands out clones, so changes made by a holder never
/// reach the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub roles: BTreeSet<String>,
    pub created_at: Timestamp,
}

impl UserSnapshot {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            full_name: None,
            roles: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
