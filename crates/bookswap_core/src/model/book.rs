//! Book and author domain models.
//!
//! # Invariants
//! - A book is owned by exactly one user profile.
//! - Authors relate to books many-to-many through `book_authors`; author
//!   rows are created per book insert, never reused by name.

use crate::model::user_profile::UserId;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};

/// Stable identifier for a book row.
pub type BookId = i64;
/// Stable identifier for an author row.
pub type AuthorId = i64;

/// Book write/read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Database-generated identity; `0` until persisted.
    pub id: BookId,
    /// Owning user profile.
    pub owner_id: UserId,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub average_rating: f64,
    /// Whether the owner currently offers this book for lending.
    pub on_shelf: bool,
    /// Soft-delete tombstone; hidden books keep their loan history.
    pub is_deleted: bool,
}

impl Book {
    /// Creates an unpersisted book for the given owner.
    pub fn new(owner_id: UserId, title: impl Into<String>) -> Self {
        Self {
            id: 0,
            owner_id,
            title: title.into(),
            thumbnail_url: None,
            description: None,
            average_rating: 0.0,
            on_shelf: true,
            is_deleted: false,
        }
    }

    /// Checks domain invariants before the book reaches storage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyBookTitle);
        }
        if !(0.0..=5.0).contains(&self.average_rating) {
            return Err(ValidationError::RatingOutOfRange(self.average_rating));
        }
        Ok(())
    }

    /// Marks this book as softly deleted (tombstoned).
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    /// Returns whether this book should be considered visible/active.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Author write/read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Database-generated identity; `0` until persisted.
    pub id: AuthorId,
    pub name: String,
}

impl Author {
    /// Creates an unpersisted author.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }

    /// Checks domain invariants before the author reaches storage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyAuthorName);
        }
        Ok(())
    }
}

/// Read model for one book with its aggregated author list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: BookId,
    pub owner_id: UserId,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub average_rating: f64,
    pub on_shelf: bool,
    pub is_deleted: bool,
    /// Authors in link-row insertion order.
    pub authors: Vec<Author>,
}
