//! Loan repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Create loan requests, transition loan status, hard-delete
//!   borrower-owned loans.
//! - Reconstruct nested loan object graphs from joined result sets.
//!
//! # Invariants
//! - New loans always start in the seeded `requested` status with the
//!   acting user as borrower, regardless of input state.
//! - Status resolution is a case-insensitive name match against the full
//!   `loan_statuses` table; an unknown name writes nothing.
//! - Status resolution + row update run in one IMMEDIATE transaction.
//! - Flattened queries group joined rows by loan id in first-seen order;
//!   repeated rows only contribute not-yet-seen authors.

use crate::model::book::{Author, AuthorId, Book, BookId};
use crate::model::loan::{
    Loan, LoanId, LoanRecord, LoanStatus, REQUESTED_STATUS_ID, STATUS_APPROVED, STATUS_DENIED,
    STATUS_RETURNED,
};
use crate::model::user_profile::UserProfile;
use crate::model::ValidationError;
use crate::repo::{ensure_connection_ready, int_to_bool, RepoError, RepoResult, TableRequirement};
use rusqlite::{params, Connection, Row, Rows, Transaction, TransactionBehavior};

const LOAN_TABLES: &[TableRequirement] = &[
    TableRequirement {
        table: "loans",
        columns: &[
            "id",
            "book_id",
            "owner_id",
            "borrower_id",
            "request_date",
            "response_date",
            "due_date",
            "return_date",
            "loan_status_id",
            "is_deleted",
        ],
    },
    TableRequirement {
        table: "loan_statuses",
        columns: &["id", "status"],
    },
    TableRequirement {
        table: "books",
        columns: &["id", "owner_id", "title", "is_deleted"],
    },
    TableRequirement {
        table: "authors",
        columns: &["id", "name"],
    },
    TableRequirement {
        table: "book_authors",
        columns: &["book_id", "author_id"],
    },
    TableRequirement {
        table: "user_profiles",
        columns: &["id", "email"],
    },
];

/// Shared projection for every flattened loan query. Each loan produces
/// one row per linked author; `collect_loan_records` regroups them.
const LOAN_SELECT_SQL: &str = "SELECT
    l.id AS loan_id,
    l.request_date,
    l.response_date,
    l.due_date,
    l.return_date,
    b.id AS book_id,
    b.owner_id AS book_owner_id,
    b.title,
    b.thumbnail_url,
    b.description,
    b.average_rating,
    b.on_shelf,
    b.is_deleted AS book_is_deleted,
    a.id AS author_id,
    a.name AS author_name,
    bor.id AS borrower_id,
    bor.email AS borrower_email,
    bor.first_name AS borrower_first_name,
    bor.last_name AS borrower_last_name,
    bor.image_url AS borrower_image_url,
    bor.city AS borrower_city,
    bor.state AS borrower_state,
    own.id AS owner_id,
    own.email AS owner_email,
    own.first_name AS owner_first_name,
    own.last_name AS owner_last_name,
    own.image_url AS owner_image_url,
    own.city AS owner_city,
    own.state AS owner_state,
    ls.id AS status_id,
    ls.status AS status_name
FROM loans l
LEFT JOIN books b ON b.id = l.book_id
LEFT JOIN book_authors ba ON ba.book_id = b.id
LEFT JOIN authors a ON a.id = ba.author_id
LEFT JOIN loan_statuses ls ON ls.id = l.loan_status_id
LEFT JOIN user_profiles own ON own.id = b.owner_id
LEFT JOIN user_profiles bor ON bor.id = l.borrower_id";

/// Repository interface for loan persistence and retrieval.
pub trait LoanRepository {
    /// Inserts a loan request: request date = now, borrower = `user`,
    /// status = the seeded `requested` state.
    ///
    /// Mutates the input loan with the generated id, the borrower id, and
    /// the requested status, ignoring whatever the caller set there.
    fn add(&self, loan: &mut Loan, user: &UserProfile) -> RepoResult<LoanId>;

    /// Hard-deletes a loan scoped to `user` as borrower.
    ///
    /// Deleting a loan that does not belong to the caller affects zero
    /// rows and is silent success by contract.
    fn delete(&self, id: LoanId, user: &UserProfile) -> RepoResult<()>;

    /// Resolves `loan.status` by name against the status lookup set and
    /// updates the loan row. The SET clause varies by resolved status:
    /// `returned` stamps the return date, `approved` stamps the response
    /// date and overwrites the due date from `loan.due_date_unix`, any
    /// other status stamps only the response date.
    ///
    /// Mutates `loan.status` with the resolved lookup row (identifier and
    /// stored name).
    fn update_status(&mut self, loan: &mut Loan) -> RepoResult<()>;

    /// All active (not denied, not returned, not soft-deleted) requests
    /// against one book owned by `user`.
    fn loans_for_owned_book(
        &self,
        user: &UserProfile,
        book_id: BookId,
    ) -> RepoResult<Vec<LoanRecord>>;

    /// At most one loan where `user` is borrower and the book matches.
    /// No status or soft-delete filtering.
    fn request_for_book(
        &self,
        user: &UserProfile,
        book_id: BookId,
    ) -> RepoResult<Option<LoanRecord>>;

    /// All loans where `user` is borrower, across all books and statuses,
    /// newest request first.
    fn requests_by_borrower(&self, user: &UserProfile) -> RepoResult<Vec<LoanRecord>>;

    /// Same as [`Self::requests_by_borrower`] minus exactly one loan id.
    fn requests_by_borrower_excluding(
        &self,
        user: &UserProfile,
        excluded: LoanId,
    ) -> RepoResult<Vec<LoanRecord>>;

    /// All active requests against books owned by `user`, excluding
    /// soft-deleted books, newest request first.
    fn requests_for_owner(&self, user: &UserProfile) -> RepoResult<Vec<LoanRecord>>;
}

/// SQLite-backed loan repository.
pub struct SqliteLoanRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteLoanRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, LOAN_TABLES)?;
        Ok(Self { conn })
    }
}

impl LoanRepository for SqliteLoanRepository<'_> {
    fn add(&self, loan: &mut Loan, user: &UserProfile) -> RepoResult<LoanId> {
        loan.validate()?;

        self.conn.execute(
            "INSERT INTO loans (
                book_id,
                owner_id,
                borrower_id,
                request_date,
                due_date,
                loan_status_id
            ) VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000), ?4, ?5);",
            params![
                loan.book_id,
                loan.owner_id,
                user.id,
                epoch_seconds_to_ms(loan.due_date_unix),
                REQUESTED_STATUS_ID,
            ],
        )?;

        loan.id = self.conn.last_insert_rowid();
        loan.borrower_id = user.id;
        loan.status = LoanStatus::requested();
        Ok(loan.id)
    }

    fn delete(&self, id: LoanId, user: &UserProfile) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM loans WHERE id = ?1 AND borrower_id = ?2;",
            params![id, user.id],
        )?;
        Ok(())
    }

    fn update_status(&mut self, loan: &mut Loan) -> RepoResult<()> {
        loan.validate_status_change()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let resolved = resolve_status(&tx, loan.status.status.as_str())?;

        let changed = match resolved.status.to_ascii_lowercase().as_str() {
            STATUS_RETURNED => tx.execute(
                "UPDATE loans
                 SET loan_status_id = ?1,
                     return_date = (strftime('%s', 'now') * 1000)
                 WHERE id = ?2;",
                params![resolved.id, loan.id],
            )?,
            STATUS_APPROVED => {
                if loan.due_date_unix <= 0 {
                    return Err(ValidationError::NonPositiveDueDate(loan.due_date_unix).into());
                }
                tx.execute(
                    "UPDATE loans
                     SET loan_status_id = ?1,
                         response_date = (strftime('%s', 'now') * 1000),
                         due_date = ?2
                     WHERE id = ?3;",
                    params![resolved.id, epoch_seconds_to_ms(loan.due_date_unix), loan.id],
                )?
            }
            _ => tx.execute(
                "UPDATE loans
                 SET loan_status_id = ?1,
                     response_date = (strftime('%s', 'now') * 1000)
                 WHERE id = ?2;",
                params![resolved.id, loan.id],
            )?,
        };

        if changed == 0 {
            return Err(RepoError::NotFound(loan.id));
        }

        tx.commit()?;
        loan.status = resolved;
        Ok(())
    }

    fn loans_for_owned_book(
        &self,
        user: &UserProfile,
        book_id: BookId,
    ) -> RepoResult<Vec<LoanRecord>> {
        let sql = format!(
            "{LOAN_SELECT_SQL}
             WHERE l.is_deleted = 0
               AND b.owner_id = ?1
               AND b.id = ?2
               AND lower(ls.status) NOT IN ('{STATUS_DENIED}', '{STATUS_RETURNED}');"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user.id, book_id])?;
        collect_loan_records(&mut rows)
    }

    fn request_for_book(
        &self,
        user: &UserProfile,
        book_id: BookId,
    ) -> RepoResult<Option<LoanRecord>> {
        let sql = format!(
            "{LOAN_SELECT_SQL}
             WHERE l.borrower_id = ?1
               AND b.id = ?2;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user.id, book_id])?;
        let records = collect_loan_records(&mut rows)?;
        Ok(records.into_iter().next())
    }

    fn requests_by_borrower(&self, user: &UserProfile) -> RepoResult<Vec<LoanRecord>> {
        let sql = format!(
            "{LOAN_SELECT_SQL}
             WHERE l.borrower_id = ?1
             ORDER BY l.request_date DESC, l.id DESC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([user.id])?;
        collect_loan_records(&mut rows)
    }

    fn requests_by_borrower_excluding(
        &self,
        user: &UserProfile,
        excluded: LoanId,
    ) -> RepoResult<Vec<LoanRecord>> {
        let sql = format!(
            "{LOAN_SELECT_SQL}
             WHERE l.borrower_id = ?1
               AND NOT l.id = ?2
             ORDER BY l.request_date DESC, l.id DESC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user.id, excluded])?;
        collect_loan_records(&mut rows)
    }

    fn requests_for_owner(&self, user: &UserProfile) -> RepoResult<Vec<LoanRecord>> {
        let sql = format!(
            "{LOAN_SELECT_SQL}
             WHERE b.owner_id = ?1
               AND b.is_deleted = 0
               AND lower(ls.status) NOT IN ('{STATUS_DENIED}', '{STATUS_RETURNED}')
             ORDER BY l.request_date DESC, l.id DESC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([user.id])?;
        collect_loan_records(&mut rows)
    }
}

fn epoch_seconds_to_ms(seconds: i64) -> i64 {
    seconds * 1000
}

/// Scans the full status lookup set for a case-insensitive name match.
///
/// The set is data, not an enum: rows added by operators resolve the same
/// way as the seeded ones.
fn resolve_status(tx: &Transaction<'_>, name: &str) -> RepoResult<LoanStatus> {
    let mut stmt = tx.prepare("SELECT id, status FROM loan_statuses;")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let status: String = row.get("status")?;
        if status.eq_ignore_ascii_case(name) {
            return Ok(LoanStatus {
                id: row.get("id")?,
                status,
            });
        }
    }
    Err(RepoError::UnknownStatus(name.to_string()))
}

/// Flattens joined rows into loan records grouped by loan id.
///
/// First-seen order is preserved: the first row for a loan id
/// materializes the record and its nested objects, every later row for
/// the same id only appends authors not seen yet. A NULL author join
/// (book without authors) contributes nothing.
fn collect_loan_records(rows: &mut Rows<'_>) -> RepoResult<Vec<LoanRecord>> {
    let mut records: Vec<LoanRecord> = Vec::new();

    while let Some(row) = rows.next()? {
        let loan_id: LoanId = row.get("loan_id")?;
        let position = match records.iter().position(|record| record.id == loan_id) {
            Some(position) => position,
            None => {
                records.push(parse_loan_row(row)?);
                records.len() - 1
            }
        };

        if let Some(author_id) = row.get::<_, Option<AuthorId>>("author_id")? {
            let record = &mut records[position];
            if !record.authors.iter().any(|author| author.id == author_id) {
                record.authors.push(Author {
                    id: author_id,
                    name: row.get("author_name")?,
                });
            }
        }
    }

    Ok(records)
}

fn parse_loan_row(row: &Row<'_>) -> RepoResult<LoanRecord> {
    let book = Book {
        id: row.get("book_id")?,
        owner_id: row.get("book_owner_id")?,
        title: row.get("title")?,
        thumbnail_url: row.get("thumbnail_url")?,
        description: row.get("description")?,
        average_rating: row.get("average_rating")?,
        on_shelf: int_to_bool(row.get("on_shelf")?, "books.on_shelf")?,
        is_deleted: int_to_bool(row.get("book_is_deleted")?, "books.is_deleted")?,
    };

    let borrower = UserProfile {
        id: row.get("borrower_id")?,
        email: row.get("borrower_email")?,
        first_name: row.get("borrower_first_name")?,
        last_name: row.get("borrower_last_name")?,
        image_url: row.get("borrower_image_url")?,
        city: row.get("borrower_city")?,
        state: row.get("borrower_state")?,
    };

    let owner = UserProfile {
        id: row.get("owner_id")?,
        email: row.get("owner_email")?,
        first_name: row.get("owner_first_name")?,
        last_name: row.get("owner_last_name")?,
        image_url: row.get("owner_image_url")?,
        city: row.get("owner_city")?,
        state: row.get("owner_state")?,
    };

    Ok(LoanRecord {
        id: row.get("loan_id")?,
        book,
        authors: Vec::new(),
        borrower,
        owner,
        request_date: row.get("request_date")?,
        response_date: row.get("response_date")?,
        due_date: row.get("due_date")?,
        return_date: row.get("return_date")?,
        status: LoanStatus {
            id: row.get("status_id")?,
            status: row.get("status_name")?,
        },
    })
}
