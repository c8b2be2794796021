//! Core data-access layer for bookswap.
//! This crate is the single source of truth for lending invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::book::{Author, AuthorId, Book, BookId, BookRecord};
pub use model::loan::{
    Loan, LoanId, LoanRecord, LoanStatus, StatusId, REQUESTED_STATUS_ID, STATUS_APPROVED,
    STATUS_DENIED, STATUS_REQUESTED, STATUS_RETURNED,
};
pub use model::user_profile::{UserId, UserProfile};
pub use model::ValidationError;
pub use repo::book_repo::{BookRepository, SqliteBookRepository};
pub use repo::loan_repo::{LoanRepository, SqliteLoanRepository};
pub use repo::user_profile_repo::{SqliteUserProfileRepository, UserProfileRepository};
pub use repo::{RepoError, RepoResult};
pub use service::book_service::{BookService, BookServiceError};
pub use service::loan_service::{LoanService, LoanServiceError};
pub use service::user_profile_service::{UserProfileService, UserProfileServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
