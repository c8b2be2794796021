use bookswap_core::db::open_db_in_memory;
use bookswap_core::{
    Author, Book, BookRepository, Loan, LoanRepository, LoanService, LoanServiceError,
    LoanStatus, RepoError, SqliteBookRepository, SqliteLoanRepository,
    SqliteUserProfileRepository, UserProfile, UserProfileRepository, REQUESTED_STATUS_ID,
    STATUS_APPROVED, STATUS_DENIED,
};
use rusqlite::Connection;

const DUE_DATE_UNIX: i64 = 1_735_689_600;
const LATER_DUE_DATE_UNIX: i64 = 1_738_368_000;

#[test]
fn add_creates_requested_loan_for_the_acting_borrower() {
    let mut conn = open_db_in_memory().unwrap();
    let fixture = setup(&mut conn);

    let mut loan = Loan::request(fixture.book.id, fixture.owner.id, DUE_DATE_UNIX);
    // Borrower identity comes from the acting user, never from input.
    loan.borrower_id = 9_999;

    let repo = SqliteLoanRepository::try_new(&mut conn).unwrap();
    let loan_id = repo.add(&mut loan, &fixture.borrower).unwrap();
    drop(repo);

    assert!(loan_id > 0);
    assert_eq!(loan.id, loan_id);
    assert_eq!(loan.borrower_id, fixture.borrower.id);
    assert_eq!(loan.status, LoanStatus::requested());

    let (borrower_id, status_id, request_date, due_date, response_date) = conn
        .query_row(
            "SELECT borrower_id, loan_status_id, request_date, due_date, response_date
             FROM loans WHERE id = ?1;",
            [loan_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                ))
            },
        )
        .unwrap();

    assert_eq!(borrower_id, fixture.borrower.id);
    assert_eq!(status_id, REQUESTED_STATUS_ID);
    assert!(request_date > 0);
    assert_eq!(due_date, DUE_DATE_UNIX * 1000);
    assert_eq!(response_date, None);
}

#[test]
fn approve_sets_response_date_and_overwrites_due_date() {
    let mut conn = open_db_in_memory().unwrap();
    let fixture = setup(&mut conn);
    let loan = create_loan(&mut conn, &fixture, DUE_DATE_UNIX);

    let mut change = Loan::status_change(loan.id, "Approved");
    change.due_date_unix = LATER_DUE_DATE_UNIX;
    let mut repo = SqliteLoanRepository::try_new(&mut conn).unwrap();
    repo.update_status(&mut change).unwrap();
    drop(repo);

    // Resolution mutates the carrier with the looked-up status row.
    assert_eq!(change.status.id, 2);
    assert_eq!(change.status.status, STATUS_APPROVED);

    let (status_id, response_date, due_date, return_date) = loan_dates(&conn, loan.id);
    assert_eq!(status_id, 2);
    assert!(response_date.is_some());
    assert_eq!(due_date, Some(LATER_DUE_DATE_UNIX * 1000));
    assert_eq!(return_date, None);
}

#[test]
fn returned_sets_return_date_and_leaves_due_date_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    let fixture = setup(&mut conn);
    let loan = create_loan(&mut conn, &fixture, DUE_DATE_UNIX);

    {
        let mut repo = SqliteLoanRepository::try_new(&mut conn).unwrap();
        let mut approve = Loan::status_change(loan.id, STATUS_APPROVED);
        approve.due_date_unix = LATER_DUE_DATE_UNIX;
        repo.update_status(&mut approve).unwrap();

        let mut returned = Loan::status_change(loan.id, "RETURNED");
        repo.update_status(&mut returned).unwrap();
        assert_eq!(returned.status.id, 4);
    }

    let (status_id, response_date, due_date, return_date) = loan_dates(&conn, loan.id);
    assert_eq!(status_id, 4);
    assert!(response_date.is_some());
    assert_eq!(due_date, Some(LATER_DUE_DATE_UNIX * 1000));
    assert!(return_date.is_some());
}

#[test]
fn other_statuses_set_only_the_response_date() {
    let mut conn = open_db_in_memory().unwrap();
    let fixture = setup(&mut conn);
    let loan = create_loan(&mut conn, &fixture, DUE_DATE_UNIX);

    let mut repo = SqliteLoanRepository::try_new(&mut conn).unwrap();
    let mut deny = Loan::status_change(loan.id, STATUS_DENIED);
    repo.update_status(&mut deny).unwrap();
    drop(repo);

    let (status_id, response_date, due_date, return_date) = loan_dates(&conn, loan.id);
    assert_eq!(status_id, 3);
    assert!(response_date.is_some());
    assert_eq!(due_date, Some(DUE_DATE_UNIX * 1000));
    assert_eq!(return_date, None);
}

#[test]
fn unknown_status_name_is_an_error_and_writes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let fixture = setup(&mut conn);
    let loan = create_loan(&mut conn, &fixture, DUE_DATE_UNIX);

    let mut repo = SqliteLoanRepository::try_new(&mut conn).unwrap();
    let mut change = Loan::status_change(loan.id, "lost");
    let err = repo.update_status(&mut change).unwrap_err();
    assert!(matches!(err, RepoError::UnknownStatus(name) if name == "lost"));
    drop(repo);

    let (status_id, response_date, _, _) = loan_dates(&conn, loan.id);
    assert_eq!(status_id, REQUESTED_STATUS_ID);
    assert_eq!(response_date, None);
}

#[test]
fn updating_a_missing_loan_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    setup(&mut conn);

    let mut repo = SqliteLoanRepository::try_new(&mut conn).unwrap();
    let mut change = Loan::status_change(9_999, STATUS_DENIED);
    let err = repo.update_status(&mut change).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(9_999)));
}

#[test]
fn delete_removes_a_loan_only_for_its_borrower() {
    let mut conn = open_db_in_memory().unwrap();
    let fixture = setup(&mut conn);
    let loan = create_loan(&mut conn, &fixture, DUE_DATE_UNIX);

    {
        let repo = SqliteLoanRepository::try_new(&mut conn).unwrap();
        // Wrong borrower: silent no-op by contract.
        repo.delete(loan.id, &fixture.owner).unwrap();
    }
    assert_eq!(loan_count(&conn, loan.id), 1);

    {
        let repo = SqliteLoanRepository::try_new(&mut conn).unwrap();
        repo.delete(loan.id, &fixture.borrower).unwrap();
        // Already gone: still success.
        repo.delete(loan.id, &fixture.borrower).unwrap();
    }
    assert_eq!(loan_count(&conn, loan.id), 0);
}

fn loan_count(conn: &Connection, loan_id: i64) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM loans WHERE id = ?1;", [loan_id], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn loan_service_names_the_lifecycle_transitions() {
    let mut conn = open_db_in_memory().unwrap();
    let fixture = setup(&mut conn);

    let repo = SqliteLoanRepository::try_new(&mut conn).unwrap();
    let mut service = LoanService::new(repo);

    let err = service
        .request_loan(fixture.book.id, fixture.owner.id, 0, &fixture.borrower)
        .unwrap_err();
    assert!(matches!(err, LoanServiceError::InvalidDueDate(0)));

    let loan = service
        .request_loan(
            fixture.book.id,
            fixture.owner.id,
            DUE_DATE_UNIX,
            &fixture.borrower,
        )
        .unwrap();
    assert_eq!(loan.status, LoanStatus::requested());

    let err = service.approve(loan.id, -5).unwrap_err();
    assert!(matches!(err, LoanServiceError::InvalidDueDate(-5)));

    let approved = service.approve(loan.id, LATER_DUE_DATE_UNIX).unwrap();
    assert_eq!(approved.status.status, STATUS_APPROVED);

    let returned = service.mark_returned(loan.id).unwrap();
    assert_eq!(returned.status.id, 4);

    let err = service.deny(4_242).unwrap_err();
    assert!(matches!(err, LoanServiceError::LoanNotFound(4_242)));

    service.cancel(loan.id, &fixture.borrower).unwrap();
}

struct Fixture {
    owner: UserProfile,
    borrower: UserProfile,
    book: Book,
}

fn setup(conn: &mut Connection) -> Fixture {
    let owner = add_profile(conn, "owner@example.com");
    let borrower = add_profile(conn, "borrower@example.com");
    let book = add_book(conn, &owner, "The Dispossessed", &["Ursula K. Le Guin"]);
    Fixture {
        owner,
        borrower,
        book,
    }
}

fn add_profile(conn: &Connection, email: &str) -> UserProfile {
    let repo = SqliteUserProfileRepository::try_new(conn).unwrap();
    let mut profile = UserProfile::new(email, "Robin", "Reader", "Nashville", "TN");
    repo.add(&mut profile).unwrap();
    profile
}

fn add_book(
    conn: &mut Connection,
    owner: &UserProfile,
    title: &str,
    author_names: &[&str],
) -> Book {
    let mut repo = SqliteBookRepository::try_new(conn).unwrap();
    let mut book = Book::new(owner.id, title);
    let mut authors: Vec<Author> = author_names.iter().map(|name| Author::new(*name)).collect();
    repo.add(&mut book, &mut authors).unwrap();
    book
}

fn create_loan(conn: &mut Connection, fixture: &Fixture, due_date_unix: i64) -> Loan {
    let repo = SqliteLoanRepository::try_new(conn).unwrap();
    let mut loan = Loan::request(fixture.book.id, fixture.owner.id, due_date_unix);
    repo.add(&mut loan, &fixture.borrower).unwrap();
    loan
}

fn loan_dates(conn: &Connection, loan_id: i64) -> (i64, Option<i64>, Option<i64>, Option<i64>) {
    conn.query_row(
        "SELECT loan_status_id, response_date, due_date, return_date
         FROM loans WHERE id = ?1;",
        [loan_id],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        },
    )
    .unwrap()
}
