//! User profile domain model.

use serde::{Deserialize, Serialize};

/// Stable identifier for a user profile row.
pub type UserId = i64;

/// Contact/profile record referenced by books (owner) and loans
/// (borrower and owner roles).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Database-generated identity; `0` until persisted.
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
    pub city: String,
    pub state: String,
}

impl UserProfile {
    /// Creates an unpersisted profile with the required contact fields.
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            image_url: None,
            city: city.into(),
            state: state.into(),
        }
    }
}
