use argon2::Variant;
use deadpool_postgres::GenericClient;
use rand::RngCore;
use tokio_postgres::Error as PgError;

use tfa_lib::ids;

use crate::net::error::Error as NetError;

const SALT_SIZE: usize = 32;

type Salt = [u8; SALT_SIZE];

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to store password")]
    CreateFailed,

    #[error(transparent)]
    Hash(#[from] argon2::Error),

    #[error(transparent)]
    Entropy(#[from] rand::Error),

    #[error(transparent)]
    Sql(#[from] PgError),
}

impl From<PasswordError> for NetError {
    fn from(value: PasswordError) -> Self {
        NetError::new().source(value)
    }
}

fn make_salt() -> Result<Salt, rand::Error> {
    let mut salt: Salt = [0; SALT_SIZE];
    let mut rng = rand::thread_rng();

    rng.try_fill_bytes(&mut salt)?;

    Ok(salt)
}

fn hash_password(password: &str, salt: &[u8]) -> Result<String, argon2::Error> {
    let config = argon2::Config {
        mem_cost: 19456,
        variant: Variant::Argon2id,
        ..argon2::Config::default()
    };

    argon2::hash_encoded(password.as_bytes(), salt, &config)
}

pub struct Password {
    pub user_id: ids::UserId,
    pub hash: String,
}

impl Password {
    pub async fn retrieve(conn: &impl GenericClient, user_id: &ids::UserId) -> Result<Option<Password>, PgError> {
        let found = conn.query_opt(
            "select auth_password.user_id, auth_password.hash \
            from auth_password \
            where auth_password.user_id = $1",
            &[user_id],
        ).await?;

        Ok(found.map(|row| Password {
            user_id: row.get(0),
            hash: row.get(1),
        }))
    }

    pub async fn create(conn: &impl GenericClient, user_id: &ids::UserId, password: String) -> Result<Self, PasswordError> {
        let salt = make_salt()?;
        let hash = hash_password(&password, &salt)?;

        let inserted = conn.execute(
            "insert into auth_password (user_id, hash) values ($1, $2)",
            &[user_id, &hash],
        ).await?;

        match inserted {
            1 => Ok(Password {
                user_id: *user_id,
                hash,
            }),
            _ => Err(PasswordError::CreateFailed),
        }
    }

    pub fn verify<C: AsRef<[u8]>>(&self, check: C) -> Result<bool, PasswordError> {
        Ok(argon2::verify_encoded_ext(&self.hash, check.as_ref(), &[], &[])?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verify_checks_hash() {
        let salt = make_salt().expect("failed to create salt");
        let hash = hash_password("Quartz Lantern Orbit", &salt)
            .expect("failed to create hash");

        let password = Password {
            user_id: 83,
            hash,
        };

        assert!(password.verify("Quartz Lantern Orbit").expect("failed to verify"));
        assert!(!password.verify("quartz lantern orbit").expect("failed to verify"));
    }
}
