use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::header::{GetAll, HeaderMap, HeaderValue, ToStrError};
use axum::http::request::Parts;
use deadpool_postgres::{Pool, PoolError};

use crate::{net::error, sec::state, user};

use super::session::ACCESS_TOKEN_COOKIE;
use super::token::{self, TokenError, TokenKind};

/// the user a request was made by, resolved from its access token
pub struct Initiator {
    user: user::User,
}

impl Initiator {
    pub fn user(&self) -> &user::User {
        &self.user
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitiatorError {
    #[error("no access token was found")]
    TokenNotFound,

    #[error("access token is invalid")]
    TokenInvalid,

    #[error("access token has expired")]
    TokenExpired,

    #[error("no user matches the access token")]
    UserNotFound,

    #[error(transparent)]
    Token(TokenError),

    #[error(transparent)]
    Sql(#[from] tokio_postgres::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Header(#[from] ToStrError),
}

impl From<TokenError> for InitiatorError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => InitiatorError::TokenInvalid,
            TokenError::Expired => InitiatorError::TokenExpired,
            err => InitiatorError::Token(err),
        }
    }
}

impl From<InitiatorError> for error::Error {
    fn from(err: InitiatorError) -> Self {
        match err {
            InitiatorError::TokenNotFound |
            InitiatorError::TokenInvalid |
            InitiatorError::TokenExpired => error::Error::api(tfa_api::error::AuthKind::Unauthenticated),

            InitiatorError::UserNotFound => error::Error::new()
                .kind(tfa_api::error::AuthKind::Unauthenticated)
                .context("access token referenced an unknown user"),

            InitiatorError::Token(err) => err.into(),
            InitiatorError::Sql(err) => err.into(),
            InitiatorError::Pool(err) => err.into(),
            InitiatorError::Header(err) => err.into(),
        }
    }
}

fn find_access_token<'a>(cookies: GetAll<'a, HeaderValue>) -> Result<Option<&'a str>, InitiatorError> {
    for header in cookies {
        let found = header.to_str()?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find_map(|(name, value)| (name == ACCESS_TOKEN_COOKIE).then_some(value));

        if found.is_some() {
            return Ok(found);
        }
    }

    Ok(None)
}

/// resolves the access token from the given headers into the user it was
/// issued to.
///
/// the cookie and token are checked before a connection is taken from the
/// pool so unauthenticated requests never wait on the database
pub async fn lookup_headers(
    auth: &state::Sec,
    pool: &Pool,
    headers: &HeaderMap,
) -> Result<Initiator, InitiatorError> {
    let Some(found) = find_access_token(headers.get_all("cookie"))? else {
        return Err(InitiatorError::TokenNotFound);
    };

    let claims = token::verify(auth.sessions().keys(), TokenKind::Access, found)?;

    let conn = pool.get().await?;

    match user::User::query_with_id(&conn, &claims.sub).await? {
        Some(user) => Ok(Initiator { user }),
        None => Err(InitiatorError::UserNotFound),
    }
}

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for Initiator
where
    S: Deref<Target = T> + Sync,
    T: AsRef<Pool> + AsRef<state::Sec> + Sync,
{
    type Rejection = error::Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let target = state.deref();

        let auth: &state::Sec = target.as_ref();
        let pool: &Pool = target.as_ref();

        Ok(lookup_headers(auth, pool, &parts.headers).await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cookie_headers(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for value in values {
            headers.append("cookie", HeaderValue::from_str(value).unwrap());
        }

        headers
    }

    #[test]
    fn finds_token_among_other_cookies() {
        let headers = cookie_headers(&[
            "theme=dark; access_token=abc.def.ghi; refresh_token=zzz"
        ]);

        let found = find_access_token(headers.get_all("cookie")).unwrap();

        assert_eq!(found, Some("abc.def.ghi"));
    }

    #[test]
    fn finds_token_in_second_header() {
        let headers = cookie_headers(&[
            "theme=dark",
            "access_token=abc.def.ghi"
        ]);

        let found = find_access_token(headers.get_all("cookie")).unwrap();

        assert_eq!(found, Some("abc.def.ghi"));
    }

    #[test]
    fn ignores_unrelated_cookies() {
        let headers = cookie_headers(&[
            "refresh_token=zzz; theme=dark"
        ]);

        let found = find_access_token(headers.get_all("cookie")).unwrap();

        assert_eq!(found, None);
    }
}
