use deadpool_postgres::GenericClient;
use tokio_postgres::Error as PgError;

use tfa_lib::ids;

pub struct User {
    id: ids::UserId,
    email: String,
}

impl User {
    pub fn id(&self) -> &ids::UserId {
        &self.id
    }

    pub fn email(&self) -> &String {
        &self.email
    }

    /// inserts the new user and returns the created record.
    ///
    /// a duplicate email will surface as a unique violation on the
    /// users_email_key constraint
    pub async fn create(conn: &impl GenericClient, email: &str) -> Result<User, PgError> {
        let row = conn.query_one(
            "\
            insert into users (email) \
            values ($1) \
            returning id, email",
            &[&email],
        ).await?;

        Ok(User {
            id: row.get(0),
            email: row.get(1),
        })
    }

    pub async fn query_with_id(conn: &impl GenericClient, id: &ids::UserId) -> Result<Option<User>, PgError> {
        let found = conn.query_opt(
            "\
            select users.id, \
                   users.email \
            from users \
            where users.id = $1",
            &[id],
        ).await?;

        Ok(found.map(|row| User {
            id: row.get(0),
            email: row.get(1),
        }))
    }

    pub async fn query_with_email(conn: &impl GenericClient, email: &str) -> Result<Option<User>, PgError> {
        let found = conn.query_opt(
            "\
            select users.id, \
                   users.email \
            from users \
            where users.email = $1",
            &[&email],
        ).await?;

        Ok(found.map(|row| User {
            id: row.get(0),
            email: row.get(1),
        }))
    }
}
