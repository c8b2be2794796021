//! Loan domain models and the loan status lookup set.
//!
//! # Responsibility
//! - Define the loan write model used by create/status-change paths.
//! - Define the `LoanRecord` read model reconstructed from joined rows.
//!
//! # Invariants
//! - A loan references exactly one book, one owner, one borrower, and one
//!   current status.
//! - Status names are data, not a compile-time enum: the lookup set lives
//!   in `loan_statuses` and is matched case-insensitively. The constants
//!   below exist only to key write-path branches and active-loan filters.

use crate::model::book::{Author, Book, BookId};
use crate::model::user_profile::{UserId, UserProfile};
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};

/// Stable identifier for a loan row.
pub type LoanId = i64;
/// Stable identifier for a loan status row.
pub type StatusId = i64;

/// Initial status name assigned to every new loan.
pub const STATUS_REQUESTED: &str = "requested";
/// Status name whose update also overwrites the due date.
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_DENIED: &str = "denied";
/// Status name whose update sets the return timestamp.
pub const STATUS_RETURNED: &str = "returned";

/// Seeded identifier of the `requested` status; new loans are created
/// with this id without a lookup round-trip.
pub const REQUESTED_STATUS_ID: StatusId = 1;

/// One entry of the loan status lookup set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanStatus {
    /// Lookup identity; `0` until resolved against `loan_statuses`.
    pub id: StatusId,
    /// Status name as stored; matching is case-insensitive.
    pub status: String,
}

impl LoanStatus {
    /// The initial state every loan request starts in.
    pub fn requested() -> Self {
        Self {
            id: REQUESTED_STATUS_ID,
            status: STATUS_REQUESTED.to_string(),
        }
    }

    /// An unresolved status carrying only a desired name.
    pub fn named(status: impl Into<String>) -> Self {
        Self {
            id: 0,
            status: status.into(),
        }
    }
}

/// Loan write model for create and status-change operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    /// Database-generated identity; `0` until persisted.
    pub id: LoanId,
    pub book_id: BookId,
    /// Profile of the book owner at request time.
    pub owner_id: UserId,
    /// Set from the acting user on create, never trusted from input.
    pub borrower_id: UserId,
    /// Caller-supplied due date in epoch seconds; converted to the stored
    /// epoch-milliseconds representation at the statement boundary.
    pub due_date_unix: i64,
    /// Current or desired status.
    pub status: LoanStatus,
}

impl Loan {
    /// Creates an unpersisted loan request for a book.
    pub fn request(book_id: BookId, owner_id: UserId, due_date_unix: i64) -> Self {
        Self {
            id: 0,
            book_id,
            owner_id,
            borrower_id: 0,
            due_date_unix,
            status: LoanStatus::requested(),
        }
    }

    /// Creates a status-change carrier for an existing loan.
    pub fn status_change(id: LoanId, status: impl Into<String>) -> Self {
        Self {
            id,
            book_id: 0,
            owner_id: 0,
            borrower_id: 0,
            due_date_unix: 0,
            status: LoanStatus::named(status),
        }
    }

    /// Checks invariants required before a loan request reaches storage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.book_id <= 0 {
            return Err(ValidationError::MissingBookRef);
        }
        if self.owner_id <= 0 {
            return Err(ValidationError::MissingOwnerRef);
        }
        if self.due_date_unix <= 0 {
            return Err(ValidationError::NonPositiveDueDate(self.due_date_unix));
        }
        Ok(())
    }

    /// Checks invariants required before a status change reaches storage.
    ///
    /// Due-date checks are deferred to the status-specific write branch:
    /// only an approval consumes `due_date_unix`.
    pub fn validate_status_change(&self) -> Result<(), ValidationError> {
        if self.id <= 0 {
            return Err(ValidationError::MissingLoanRef);
        }
        if self.status.status.trim().is_empty() {
            return Err(ValidationError::EmptyStatusName);
        }
        Ok(())
    }
}

/// Read model for one loan with its joined object graph.
///
/// Produced by flattening multi-row join results: the first row for a loan
/// id materializes the record, later rows only contribute unseen authors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    pub id: LoanId,
    pub book: Book,
    /// Authors of the loaned book, aggregated per loan.
    pub authors: Vec<Author>,
    pub borrower: UserProfile,
    pub owner: UserProfile,
    /// Epoch milliseconds; always set.
    pub request_date: i64,
    /// Epoch milliseconds; set once the owner responds.
    pub response_date: Option<i64>,
    /// Epoch milliseconds; set on create and overwritten on approval.
    pub due_date: Option<i64>,
    /// Epoch milliseconds; set when the book is marked returned.
    pub return_date: Option<i64>,
    pub status: LoanStatus,
}

#[cfg(test)]
mod tests {
    use super::{Loan, LoanStatus, STATUS_APPROVED};
    use crate::model::ValidationError;

    #[test]
    fn request_starts_in_requested_status() {
        let loan = Loan::request(3, 7, 1_700_000_000);
        assert_eq!(loan.status, LoanStatus::requested());
        assert_eq!(loan.borrower_id, 0);
        assert!(loan.validate().is_ok());
    }

    #[test]
    fn request_rejects_non_positive_due_date() {
        let loan = Loan::request(3, 7, 0);
        assert_eq!(
            loan.validate(),
            Err(ValidationError::NonPositiveDueDate(0))
        );
    }

    #[test]
    fn status_change_requires_persisted_loan_and_name() {
        let missing_ref = Loan::status_change(0, STATUS_APPROVED);
        assert_eq!(
            missing_ref.validate_status_change(),
            Err(ValidationError::MissingLoanRef)
        );

        let blank_name = Loan::status_change(5, "  ");
        assert_eq!(
            blank_name.validate_status_change(),
            Err(ValidationError::EmptyStatusName)
        );
    }
}
