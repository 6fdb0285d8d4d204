use chrono::{DateTime, Utc};
use deadpool_postgres::GenericClient;
use tokio_postgres::Error as PgError;
use totp_rs::{Algorithm, Secret, TOTP};

use tfa_lib::ids;
use tfa_lib::sec::authn::totp::CODE_DIGITS;

use crate::net::error::Error as NetError;

pub const SKEW: u8 = 1;
pub const STEP: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum TotpError {
    #[error("invalid totp secret")]
    BadSecret,

    #[error("invalid totp url: {0}")]
    Url(String),

    #[error("failed to render totp qr code: {0}")]
    Qr(String),

    #[error(transparent)]
    Clock(#[from] std::time::SystemTimeError),
}

impl From<TotpError> for NetError {
    fn from(err: TotpError) -> Self {
        NetError::new().source(err)
    }
}

/// creates a new base32 encoded totp secret
pub fn create_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

fn build(secret: &str, issuer: Option<String>, account: String) -> Result<TOTP, TotpError> {
    let bytes = Secret::Encoded(secret.to_owned())
        .to_bytes()
        .map_err(|_| TotpError::BadSecret)?;

    TOTP::new(Algorithm::SHA1, CODE_DIGITS, SKEW, STEP, bytes, issuer, account)
        .map_err(|err| TotpError::Url(err.to_string()))
}

#[derive(Debug)]
pub struct Enrollment {
    pub uri: String,
    pub qr: String,
}

pub fn enrollment(issuer: &str, email: &str, secret: &str) -> Result<Enrollment, TotpError> {
    let totp = build(secret, Some(issuer.to_owned()), email.to_owned())?;

    let qr = totp.get_qr_base64()
        .map_err(TotpError::Qr)?;

    Ok(Enrollment {
        uri: totp.get_url(),
        qr: format!("data:image/png;base64,{qr}"),
    })
}

/// checks the given code against the current time window with one step of skew
/// on either side
pub fn verify_code(secret: &str, code: &str) -> Result<bool, TotpError> {
    let totp = build(secret, None, String::from("user"))?;

    Ok(totp.check_current(code)?)
}

pub struct Totp {
    pub user_id: ids::UserId,
    pub secret: String,
    pub confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Totp {
    pub async fn retrieve(
        conn: &impl GenericClient,
        user_id: &ids::UserId,
    ) -> Result<Option<Totp>, PgError> {
        let found = conn.query_opt(
            "\
            select auth_totp.secret, \
                   auth_totp.confirmed, \
                   auth_totp.confirmed_at \
            from auth_totp \
            where auth_totp.user_id = $1",
            &[user_id],
        ).await?;

        Ok(found.map(|row| Totp {
            user_id: *user_id,
            secret: row.get(0),
            confirmed: row.get(1),
            confirmed_at: row.get(2),
        }))
    }

    /// stores a fresh unconfirmed secret for the user. any previously staged
    /// or confirmed secret is replaced
    pub async fn stage(
        conn: &impl GenericClient,
        user_id: &ids::UserId,
        secret: &str,
    ) -> Result<(), PgError> {
        conn.execute(
            "\
            insert into auth_totp (user_id, secret) values ($1, $2) \
            on conflict (user_id) do update \
            set secret = excluded.secret, \
                confirmed = false, \
                confirmed_at = null",
            &[user_id, &secret],
        ).await.map(|_| ())
    }

    pub async fn confirm(
        &mut self,
        conn: &impl GenericClient,
        confirmed_at: DateTime<Utc>,
    ) -> Result<(), PgError> {
        conn.execute(
            "\
            update auth_totp \
            set confirmed = true, \
                confirmed_at = $2 \
            where user_id = $1",
            &[&self.user_id, &confirmed_at],
        ).await?;

        self.confirmed = true;
        self.confirmed_at = Some(confirmed_at);

        Ok(())
    }

    pub async fn delete(
        conn: &impl GenericClient,
        user_id: &ids::UserId,
    ) -> Result<(), PgError> {
        conn.execute("delete from auth_totp where user_id = $1", &[user_id])
            .await
            .map(|_| ())
    }

    pub async fn enabled(
        conn: &impl GenericClient,
        user_id: &ids::UserId,
    ) -> Result<bool, PgError> {
        let found = conn.query_opt(
            "select auth_totp.confirmed from auth_totp where auth_totp.user_id = $1",
            &[user_id],
        ).await?;

        Ok(found.map(|row| row.get(0)).unwrap_or(false))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verifies_codes_within_skew() {
        let secret = create_secret();
        let totp = build(&secret, None, String::from("user"))
            .expect("failed to build totp");

        let time = 1_700_000_000u64;
        let code = totp.generate(time);

        assert!(totp.check(&code, time));
        assert!(totp.check(&code, time + STEP));
        assert!(!totp.check(&code, time + STEP * 3));
    }

    #[test]
    fn enrollment_artifacts() {
        let secret = create_secret();
        let enrollment = enrollment("tfa", "user@example.com", &secret)
            .expect("failed to create enrollment");

        assert!(enrollment.uri.starts_with("otpauth://totp/"));
        assert!(enrollment.uri.contains("issuer=tfa"));
        assert!(enrollment.qr.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn rejects_malformed_secret() {
        match verify_code("not a base32 secret !!!", "000000") {
            Err(TotpError::BadSecret) => {},
            other => panic!("expected a bad secret: {other:?}")
        }
    }
}
