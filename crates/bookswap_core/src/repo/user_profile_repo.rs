//! User profile repository contract and SQLite implementation.

use crate::model::user_profile::{UserId, UserProfile};
use crate::repo::{ensure_connection_ready, RepoResult, TableRequirement};
use rusqlite::{params, Connection};

const PROFILE_TABLES: &[TableRequirement] = &[TableRequirement {
    table: "user_profiles",
    columns: &[
        "id",
        "email",
        "first_name",
        "last_name",
        "image_url",
        "city",
        "state",
    ],
}];

/// Repository interface for user profile persistence.
pub trait UserProfileRepository {
    /// Inserts one profile row, capturing the generated id onto the input.
    fn add(&self, profile: &mut UserProfile) -> RepoResult<UserId>;
    /// Gets one profile by id.
    fn get(&self, id: UserId) -> RepoResult<Option<UserProfile>>;
}

/// SQLite-backed user profile repository.
pub struct SqliteUserProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserProfileRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, PROFILE_TABLES)?;
        Ok(Self { conn })
    }
}

impl UserProfileRepository for SqliteUserProfileRepository<'_> {
    fn add(&self, profile: &mut UserProfile) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO user_profiles (
                email,
                first_name,
                last_name,
                image_url,
                city,
                state
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                profile.email.as_str(),
                profile.first_name.as_str(),
                profile.last_name.as_str(),
                profile.image_url.as_deref(),
                profile.city.as_str(),
                profile.state.as_str(),
            ],
        )?;

        profile.id = self.conn.last_insert_rowid();
        Ok(profile.id)
    }

    fn get(&self, id: UserId) -> RepoResult<Option<UserProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                email,
                first_name,
                last_name,
                image_url,
                city,
                state
             FROM user_profiles
             WHERE id = ?1;",
        )?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(UserProfile {
                id: row.get("id")?,
                email: row.get("email")?,
                first_name: row.get("first_name")?,
                last_name: row.get("last_name")?,
                image_url: row.get("image_url")?,
                city: row.get("city")?,
                state: row.get("state")?,
            }));
        }

        Ok(None)
    }
}
