//! User profile use-case service.

use crate::model::user_profile::{UserId, UserProfile};
use crate::repo::user_profile_repo::UserProfileRepository;
use crate::repo::{RepoError, RepoResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Service error for profile use-cases.
#[derive(Debug)]
pub enum UserProfileServiceError {
    /// Email does not look like an address.
    InvalidEmail(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for UserProfileServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail(value) => write!(f, "invalid email: `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserProfileServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidEmail(_) => None,
        }
    }
}

impl From<RepoError> for UserProfileServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Profile service facade over repository implementations.
pub struct UserProfileService<R: UserProfileRepository> {
    repo: R,
}

impl<R: UserProfileRepository> UserProfileService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new profile after an email shape check.
    pub fn register(
        &self,
        mut profile: UserProfile,
    ) -> Result<UserProfile, UserProfileServiceError> {
        if !is_valid_email(profile.email.as_str()) {
            return Err(UserProfileServiceError::InvalidEmail(profile.email));
        }

        self.repo.add(&mut profile)?;
        Ok(profile)
    }

    /// Gets one profile by id.
    pub fn get_profile(&self, id: UserId) -> RepoResult<Option<UserProfile>> {
        self.repo.get(id)
    }
}

/// Shape check only: one `@`, no whitespace, a dotted domain. Deliverable
/// address verification belongs to the mail layer, not storage.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}
