use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use tfa_lib::ids;
use tfa_lib::sec::secrets::TOKEN_KEY_LEN;

use crate::net::error::Error as NetError;

type HmacSha256 = Hmac<Sha256>;

const HEADER_JSON: &[u8] = b"{\"alg\":\"HS256\",\"typ\":\"JWT\"}";

/// expanded signing keys for the two token kinds. the access and refresh keys
/// are derived separately so one cannot stand in for the other
#[derive(Debug)]
pub struct TokenKeys {
    pub access: [u8; TOKEN_KEY_LEN],
    pub refresh: [u8; TOKEN_KEY_LEN],
}

#[derive(Debug, Clone, Copy)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn duration(&self) -> Duration {
        match self {
            TokenKind::Access => Duration::minutes(15),
            TokenKind::Refresh => Duration::days(7),
        }
    }

    fn key<'a>(&self, keys: &'a TokenKeys) -> &'a [u8] {
        match self {
            TokenKind::Access => keys.access.as_slice(),
            TokenKind::Refresh => keys.refresh.as_slice(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: ids::UserId,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,

    #[error("expired token")]
    Expired,

    #[error("date time value overflowed")]
    UtcOverflow,

    #[error("invalid token key length")]
    Key,

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<TokenError> for NetError {
    fn from(err: TokenError) -> Self {
        NetError::new().source(err)
    }
}

pub fn issue(keys: &TokenKeys, kind: TokenKind, user_id: ids::UserId) -> Result<String, TokenError> {
    issue_at(keys, kind, user_id, Utc::now())
}

fn issue_at(
    keys: &TokenKeys,
    kind: TokenKind,
    user_id: ids::UserId,
    issued: DateTime<Utc>
) -> Result<String, TokenError> {
    let Some(expires) = issued.checked_add_signed(kind.duration()) else {
        return Err(TokenError::UtcOverflow);
    };

    let claims = Claims {
        sub: user_id,
        iat: issued.timestamp(),
        exp: expires.timestamp(),
    };

    let header = URL_SAFE_NO_PAD.encode(HEADER_JSON);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let signing_input = format!("{header}.{payload}");

    let mut mac = HmacSha256::new_from_slice(kind.key(keys))
        .map_err(|_| TokenError::Key)?;
    mac.update(signing_input.as_bytes());

    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

/// checks the signature before anything else. the claims of a token that does
/// not verify are never parsed
pub fn verify(keys: &TokenKeys, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
    verify_at(keys, kind, token, Utc::now())
}

fn verify_at(
    keys: &TokenKeys,
    kind: TokenKind,
    token: &str,
    now: DateTime<Utc>
) -> Result<Claims, TokenError> {
    let mut parts = token.splitn(3, '.');

    let (Some(header), Some(payload), Some(signature)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(TokenError::Invalid);
    };

    let Ok(given) = URL_SAFE_NO_PAD.decode(signature) else {
        return Err(TokenError::Invalid);
    };

    let signing_input = &token[..(header.len() + payload.len() + 1)];

    let mut mac = HmacSha256::new_from_slice(kind.key(keys))
        .map_err(|_| TokenError::Key)?;
    mac.update(signing_input.as_bytes());

    if mac.verify_slice(&given).is_err() {
        return Err(TokenError::Invalid);
    }

    let Ok(decoded) = URL_SAFE_NO_PAD.decode(payload) else {
        return Err(TokenError::Invalid);
    };

    let claims: Claims = serde_json::from_slice(&decoded)
        .map_err(|_| TokenError::Invalid)?;

    if claims.exp <= now.timestamp() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_keys() -> TokenKeys {
        TokenKeys {
            access: [1; TOKEN_KEY_LEN],
            refresh: [2; TOKEN_KEY_LEN],
        }
    }

    #[test]
    fn issue_verify_roundtrip() {
        let keys = test_keys();

        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let token = issue(&keys, kind, 83)
                .expect("failed to issue token");
            let claims = verify(&keys, kind, &token)
                .expect("failed to verify token");

            assert_eq!(claims.sub, 83);
            assert_eq!(claims.exp - claims.iat, kind.duration().num_seconds());
        }
    }

    #[test]
    fn rejects_expired() {
        let keys = test_keys();
        let issued = Utc::now() - Duration::minutes(16);

        let token = issue_at(&keys, TokenKind::Access, 83, issued)
            .expect("failed to issue token");

        match verify(&keys, TokenKind::Access, &token) {
            Err(TokenError::Expired) => {},
            other => panic!("expected an expired token: {other:?}")
        }
    }

    #[test]
    fn rejects_wrong_kind() {
        let keys = test_keys();

        let token = issue(&keys, TokenKind::Refresh, 83)
            .expect("failed to issue token");

        match verify(&keys, TokenKind::Access, &token) {
            Err(TokenError::Invalid) => {},
            other => panic!("expected an invalid token: {other:?}")
        }
    }

    #[test]
    fn rejects_tampered_claims() {
        let keys = test_keys();

        let token = issue(&keys, TokenKind::Access, 83)
            .expect("failed to issue token");
        let mut parts = token.splitn(3, '.');

        let header = parts.next().unwrap();
        let payload = parts.next().unwrap();
        let signature = parts.next().unwrap();

        let mut claims: Claims = serde_json::from_slice(
            &URL_SAFE_NO_PAD.decode(payload).unwrap()
        ).unwrap();
        claims.sub = 84;

        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let forged = format!("{header}.{forged_payload}.{signature}");

        match verify(&keys, TokenKind::Access, &forged) {
            Err(TokenError::Invalid) => {},
            other => panic!("expected an invalid token: {other:?}")
        }
    }

    #[test]
    fn rejects_garbage() {
        let keys = test_keys();

        match verify(&keys, TokenKind::Access, "not a token") {
            Err(TokenError::Invalid) => {},
            other => panic!("expected an invalid token: {other:?}")
        }
    }
}
