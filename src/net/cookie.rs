use std::fmt::{Display, Formatter};
use std::time::Duration;

use axum::http::HeaderValue;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponseParts, ResponseParts};

use crate::net::error::Error;

#[derive(Debug, Clone, Copy)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// a Set-Cookie header in the making. attach it to a response tuple and axum
/// will append the rendered header
#[derive(Debug)]
pub struct SetCookie {
    name: String,
    value: String,
    domain: Option<String>,
    path: Option<String>,
    max_age: Option<Duration>,
    same_site: Option<SameSite>,
    http_only: bool,
    secure: bool,
}

impl SetCookie {
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>
    {
        SetCookie {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            max_age: None,
            same_site: None,
            http_only: false,
            secure: false,
        }
    }

    pub fn with_domain<D>(mut self, domain: D) -> Self
    where
        D: Into<String>
    {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path<P>(mut self, path: P) -> Self
    where
        P: Into<String>
    {
        self.path = Some(path.into());
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

}

impl Display for SetCookie {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;

        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }

        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }

        if let Some(max_age) = &self.max_age {
            write!(f, "; Max-Age={}", max_age.as_secs())?;
        }

        if let Some(same_site) = &self.same_site {
            write!(f, "; SameSite={}", same_site.as_str())?;
        }

        if self.http_only {
            f.write_str("; HttpOnly")?;
        }

        if self.secure {
            f.write_str("; Secure")?;
        }

        Ok(())
    }
}

impl TryFrom<&SetCookie> for HeaderValue {
    type Error = axum::http::header::InvalidHeaderValue;

    fn try_from(cookie: &SetCookie) -> Result<Self, Self::Error> {
        HeaderValue::from_str(&cookie.to_string())
    }
}

impl IntoResponseParts for SetCookie {
    type Error = Error;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let value = HeaderValue::try_from(&self)?;

        res.headers_mut().append(SET_COOKIE, value);

        Ok(res)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renders_attributes() {
        let cookie = SetCookie::new("access_token", "abc123")
            .with_domain("example.com")
            .with_path("/")
            .with_http_only(true)
            .with_secure(true)
            .with_same_site(SameSite::Strict);

        assert_eq!(
            cookie.to_string(),
            "access_token=abc123; Domain=example.com; Path=/; SameSite=Strict; HttpOnly; Secure"
        );
    }

    #[test]
    fn renders_removal() {
        let cookie = SetCookie::new("access_token", "")
            .with_max_age(Duration::new(0, 0))
            .with_path("/")
            .with_http_only(true)
            .with_secure(false)
            .with_same_site(SameSite::Strict);

        assert_eq!(
            cookie.to_string(),
            "access_token=; Path=/; Max-Age=0; SameSite=Strict; HttpOnly"
        );
    }
}
