//! Loan use-case service.
//!
//! # Responsibility
//! - Name the loan lifecycle transitions (`approve`, `deny`,
//!   `mark_returned`) on top of the generic status-update operation.
//! - Guard caller input before it reaches the repository.
//!
//! # Invariants
//! - The lifecycle (`requested -> approved|denied`,
//!   `approved -> returned`) is named here, not enforced here: the
//!   repository accepts any known status so operator-edited rows stay
//!   updatable.

use crate::model::book::BookId;
use crate::model::loan::{
    Loan, LoanId, LoanRecord, STATUS_APPROVED, STATUS_DENIED, STATUS_RETURNED,
};
use crate::model::user_profile::{UserId, UserProfile};
use crate::repo::loan_repo::LoanRepository;
use crate::repo::{RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for loan use-cases.
#[derive(Debug)]
pub enum LoanServiceError {
    /// Supplied due date (epoch seconds) is zero or negative.
    InvalidDueDate(i64),
    /// Target loan does not exist.
    LoanNotFound(LoanId),
    /// Desired status name matches no loan status row.
    UnknownStatus(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for LoanServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDueDate(value) => write!(f, "invalid due date: `{value}`"),
            Self::LoanNotFound(id) => write!(f, "loan not found: {id}"),
            Self::UnknownStatus(name) => write!(f, "unknown loan status: `{name}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LoanServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LoanServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::LoanNotFound(id),
            RepoError::UnknownStatus(name) => Self::UnknownStatus(name),
            other => Self::Repo(other),
        }
    }
}

/// Loan service facade over repository implementations.
pub struct LoanService<R: LoanRepository> {
    repo: R,
}

impl<R: LoanRepository> LoanService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Files a loan request by `borrower` for one book.
    pub fn request_loan(
        &self,
        book_id: BookId,
        owner_id: UserId,
        due_date_unix: i64,
        borrower: &UserProfile,
    ) -> Result<Loan, LoanServiceError> {
        if due_date_unix <= 0 {
            return Err(LoanServiceError::InvalidDueDate(due_date_unix));
        }

        let mut loan = Loan::request(book_id, owner_id, due_date_unix);
        self.repo.add(&mut loan, borrower)?;
        Ok(loan)
    }

    /// Approves a request and sets the agreed due date.
    pub fn approve(
        &mut self,
        loan_id: LoanId,
        due_date_unix: i64,
    ) -> Result<Loan, LoanServiceError> {
        if due_date_unix <= 0 {
            return Err(LoanServiceError::InvalidDueDate(due_date_unix));
        }

        let mut loan = Loan::status_change(loan_id, STATUS_APPROVED);
        loan.due_date_unix = due_date_unix;
        self.repo.update_status(&mut loan)?;
        Ok(loan)
    }

    /// Denies a request.
    pub fn deny(&mut self, loan_id: LoanId) -> Result<Loan, LoanServiceError> {
        let mut loan = Loan::status_change(loan_id, STATUS_DENIED);
        self.repo.update_status(&mut loan)?;
        Ok(loan)
    }

    /// Marks an approved loan as returned.
    pub fn mark_returned(&mut self, loan_id: LoanId) -> Result<Loan, LoanServiceError> {
        let mut loan = Loan::status_change(loan_id, STATUS_RETURNED);
        self.repo.update_status(&mut loan)?;
        Ok(loan)
    }

    /// Withdraws the borrower's own request. Removing a loan that does
    /// not belong to `borrower` is a silent no-op.
    pub fn cancel(&self, loan_id: LoanId, borrower: &UserProfile) -> RepoResult<()> {
        self.repo.delete(loan_id, borrower)
    }

    /// Active requests against one of the owner's books.
    pub fn requests_for_owned_book(
        &self,
        owner: &UserProfile,
        book_id: BookId,
    ) -> RepoResult<Vec<LoanRecord>> {
        self.repo.loans_for_owned_book(owner, book_id)
    }

    /// The borrower's request for one specific book, if any.
    pub fn request_for_book(
        &self,
        borrower: &UserProfile,
        book_id: BookId,
    ) -> RepoResult<Option<LoanRecord>> {
        self.repo.request_for_book(borrower, book_id)
    }

    /// Everything the borrower has requested, newest first.
    pub fn requests_by_borrower(&self, borrower: &UserProfile) -> RepoResult<Vec<LoanRecord>> {
        self.repo.requests_by_borrower(borrower)
    }

    /// The borrower's requests minus one loan, used to render the
    /// remaining list right after a removal.
    pub fn requests_by_borrower_excluding(
        &self,
        borrower: &UserProfile,
        excluded: LoanId,
    ) -> RepoResult<Vec<LoanRecord>> {
        self.repo.requests_by_borrower_excluding(borrower, excluded)
    }

    /// Active requests made against the owner's books, newest first.
    pub fn requests_for_owner(&self, owner: &UserProfile) -> RepoResult<Vec<LoanRecord>> {
        self.repo.requests_for_owner(owner)
    }
}
