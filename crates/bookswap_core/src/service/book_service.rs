//! Book use-case service.
//!
//! # Responsibility
//! - Provide the create-with-authors entry point for core callers.
//! - Read the created graph back so callers get storage-assigned state.

use crate::model::book::{Author, Book, BookId, BookRecord};
use crate::repo::book_repo::BookRepository;
use crate::repo::{RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for book use-cases.
#[derive(Debug)]
pub enum BookServiceError {
    /// Author list contains an empty name.
    InvalidAuthorName(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for BookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAuthorName(value) => write!(f, "invalid author name: `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent book state: {details}"),
        }
    }
}

impl Error for BookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BookServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Book service facade over repository implementations.
pub struct BookService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> BookService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists one book with its author names and reads the graph back.
    pub fn create_book(
        &mut self,
        mut book: Book,
        author_names: Vec<String>,
    ) -> Result<BookRecord, BookServiceError> {
        for name in &author_names {
            if name.trim().is_empty() {
                return Err(BookServiceError::InvalidAuthorName(name.clone()));
            }
        }

        let mut authors: Vec<Author> = author_names.into_iter().map(Author::new).collect();
        let book_id = self.repo.add(&mut book, &mut authors)?;
        self.repo
            .get(book_id)?
            .ok_or(BookServiceError::InconsistentState(
                "created book not found in read-back",
            ))
    }

    /// Gets one book with its aggregated author list.
    pub fn get_book(&self, id: BookId) -> RepoResult<Option<BookRecord>> {
        self.repo.get(id)
    }
}
