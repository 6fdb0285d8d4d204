use tokio_postgres::Error as PgError;
use tokio_postgres::error::SqlState;

/// returns the name of the violated unique constraint if the given error is a
/// unique violation
pub fn unique_constraint_error(error: &PgError) -> Option<&str> {
    error.as_db_error()
        .filter(|db| *db.code() == SqlState::UNIQUE_VIOLATION)
        .and_then(|db| db.constraint())
}
