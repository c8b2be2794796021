//! Book repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist books together with their per-book author rows and link rows.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `add` runs book + author + link inserts in one IMMEDIATE transaction;
//!   a fault cannot leave an author row without its link.
//! - Every `add` call inserts fresh author rows, even when authors with
//!   identical names already exist. Dedup-by-name is an open product
//!   decision recorded in DESIGN.md.

use crate::model::book::{Author, AuthorId, Book, BookId, BookRecord};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, RepoResult, TableRequirement,
};
use rusqlite::{params, Connection, TransactionBehavior};

const BOOK_TABLES: &[TableRequirement] = &[
    TableRequirement {
        table: "books",
        columns: &[
            "id",
            "owner_id",
            "title",
            "thumbnail_url",
            "description",
            "average_rating",
            "on_shelf",
            "is_deleted",
        ],
    },
    TableRequirement {
        table: "authors",
        columns: &["id", "name"],
    },
    TableRequirement {
        table: "book_authors",
        columns: &["id", "book_id", "author_id"],
    },
];

/// Repository interface for book persistence.
pub trait BookRepository {
    /// Inserts one book and its authors, linking them through
    /// `book_authors`.
    ///
    /// Mutates the inputs: the generated book id and each generated author
    /// id are captured back onto the passed objects.
    fn add(&mut self, book: &mut Book, authors: &mut [Author]) -> RepoResult<BookId>;
    /// Gets one book with its aggregated author list.
    fn get(&self, id: BookId) -> RepoResult<Option<BookRecord>>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, BOOK_TABLES)?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn add(&mut self, book: &mut Book, authors: &mut [Author]) -> RepoResult<BookId> {
        book.validate()?;
        for author in authors.iter() {
            author.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO books (
                owner_id,
                title,
                thumbnail_url,
                description,
                average_rating,
                on_shelf,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                book.owner_id,
                book.title.as_str(),
                book.thumbnail_url.as_deref(),
                book.description.as_deref(),
                book.average_rating,
                bool_to_int(book.on_shelf),
                bool_to_int(book.is_deleted),
            ],
        )?;
        book.id = tx.last_insert_rowid();

        for author in authors.iter_mut() {
            tx.execute("INSERT INTO authors (name) VALUES (?1);", [author.name.as_str()])?;
            author.id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO book_authors (book_id, author_id) VALUES (?1, ?2);",
                params![book.id, author.id],
            )?;
        }

        tx.commit()?;
        Ok(book.id)
    }

    fn get(&self, id: BookId) -> RepoResult<Option<BookRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                owner_id,
                title,
                thumbnail_url,
                description,
                average_rating,
                on_shelf,
                is_deleted
             FROM books
             WHERE id = ?1;",
        )?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(BookRecord {
                id: row.get("id")?,
                owner_id: row.get("owner_id")?,
                title: row.get("title")?,
                thumbnail_url: row.get("thumbnail_url")?,
                description: row.get("description")?,
                average_rating: row.get("average_rating")?,
                on_shelf: int_to_bool(row.get("on_shelf")?, "books.on_shelf")?,
                is_deleted: int_to_bool(row.get("is_deleted")?, "books.is_deleted")?,
                authors: load_authors_for_book(self.conn, id)?,
            }));
        }

        Ok(None)
    }
}

fn load_authors_for_book(conn: &Connection, book_id: BookId) -> RepoResult<Vec<Author>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name
         FROM book_authors ba
         INNER JOIN authors a ON a.id = ba.author_id
         WHERE ba.book_id = ?1
         ORDER BY ba.id ASC;",
    )?;

    let mut rows = stmt.query([book_id])?;
    let mut authors = Vec::new();
    while let Some(row) = rows.next()? {
        let id: AuthorId = row.get("id")?;
        authors.push(Author {
            id,
            name: row.get("name")?,
        });
    }
    Ok(authors)
}
