use tfa_lib::ids;

use crate::net::cookie::{SameSite, SetCookie};
use crate::sec::state;

use super::token::{self, TokenError, TokenKind};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

fn base_cookie<V: Into<String>>(auth: &state::Sec, name: &str, value: V) -> SetCookie {
    let info = auth.sessions();

    let cookie = SetCookie::new(name, value)
        .with_path("/")
        .with_http_only(true)
        .with_secure(info.secure())
        .with_same_site(SameSite::Strict);

    match info.domain() {
        Some(domain) => cookie.with_domain(domain),
        None => cookie,
    }
}

/// builds the access and refresh cookies for the given user.
///
/// the cookies themselves carry no lifetime. the tokens inside them expire
/// on their own and the pair is replaced wholesale on the next login.
pub fn create_session_cookies(
    auth: &state::Sec,
    user_id: ids::UserId,
) -> Result<(SetCookie, SetCookie), TokenError> {
    let keys = auth.sessions().keys();

    let access = token::issue(keys, TokenKind::Access, user_id)?;
    let refresh = token::issue(keys, TokenKind::Refresh, user_id)?;

    Ok((
        base_cookie(auth, ACCESS_TOKEN_COOKIE, access),
        base_cookie(auth, REFRESH_TOKEN_COOKIE, refresh),
    ))
}

pub fn expire_session_cookies(auth: &state::Sec) -> (SetCookie, SetCookie) {
    let expire = |name| {
        base_cookie(auth, name, "")
            .with_max_age(std::time::Duration::new(0, 0))
    };

    (
        expire(ACCESS_TOKEN_COOKIE),
        expire(REFRESH_TOKEN_COOKIE),
    )
}
