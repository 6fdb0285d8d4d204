use std::fmt;

use http::StatusCode;
use axum_core::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::response::{serialize_json, error_json};

#[derive(Debug, Clone, PartialEq, Eq, AsRefStr, Serialize, Deserialize)]
pub enum AuthKind {
    Unauthenticated,

    InvalidCredentials,
    InvalidTotp,

    CaptchaFailed,
    TicketInvalid,

    TotpNotEnabled,
    TotpNotPending,
    TotpCodeMismatch,
}

impl AuthKind {
    fn status(&self) -> StatusCode {
        match self {
            AuthKind::Unauthenticated |
            AuthKind::InvalidCredentials |
            AuthKind::InvalidTotp => StatusCode::UNAUTHORIZED,
            AuthKind::CaptchaFailed |
            AuthKind::TicketInvalid |
            AuthKind::TotpNotEnabled |
            AuthKind::TotpNotPending |
            AuthKind::TotpCodeMismatch => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, AsRefStr, Serialize, Deserialize)]
pub enum UserKind {
    EmailInUse,
}

impl UserKind {
    fn status(&self) -> StatusCode {
        match self {
            UserKind::EmailInUse => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, AsRefStr, Serialize, Deserialize)]
pub enum GeneralKind {
    InternalFailure,
    Timeout,
    TooManyRequests,

    NotFound,

    ValidationFailed,
    InvalidHeaderValue,
}

impl GeneralKind {
    fn status(&self) -> StatusCode {
        match self {
            GeneralKind::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
            GeneralKind::Timeout => StatusCode::REQUEST_TIMEOUT,
            GeneralKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            GeneralKind::NotFound => StatusCode::NOT_FOUND,
            GeneralKind::ValidationFailed |
            GeneralKind::InvalidHeaderValue => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorKind {
    General(GeneralKind),
    Auth(AuthKind),
    User(UserKind),
}

impl ApiErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorKind::General(v) => v.status(),
            ApiErrorKind::Auth(v) => v.status(),
            ApiErrorKind::User(v) => v.status(),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            ApiErrorKind::General(v) => v.as_ref(),
            ApiErrorKind::Auth(v) => v.as_ref(),
            ApiErrorKind::User(v) => v.as_ref(),
        }
    }
}

impl Default for ApiErrorKind {
    fn default() -> Self {
        ApiErrorKind::General(GeneralKind::InternalFailure)
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! kind_impls {
    ($t:ident, $variant:ident) => {
        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$t> for ApiErrorKind {
            fn from(v: $t) -> Self {
                ApiErrorKind::$variant(v)
            }
        }
    };
}

kind_impls!(AuthKind, Auth);
kind_impls!(UserKind, User);
kind_impls!(GeneralKind, General);

/// names the request fields an error is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Detail {
    Fields(Vec<String>),
}

impl Detail {
    pub fn with_field<F: Into<String>>(field: F) -> Self {
        Detail::Fields(vec![field.into()])
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detail::Fields(list) => f.write_str(&list.join(",")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    kind: ApiErrorKind,
    detail: Option<Detail>,
    message: Option<String>,
}

impl ApiError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    pub fn with_kind<K: Into<ApiErrorKind>>(self, kind: K) -> Self {
        ApiError { kind: kind.into(), ..self }
    }

    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    pub fn with_detail(self, detail: Detail) -> Self {
        ApiError { detail: Some(detail), ..self }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn with_message<M: Into<String>>(self, message: M) -> Self {
        ApiError { message: Some(message.into()), ..self }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;

        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        Ok(())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status();

        match serialize_json(status, &self) {
            Ok(res) => res,
            Err(err) => {
                tracing::error!("failed to serialize error response: {err}");

                error_json()
            }
        }
    }
}

impl<K: Into<ApiErrorKind>> From<K> for ApiError {
    fn from(kind: K) -> Self {
        ApiError::new().with_kind(kind)
    }
}

impl<K: Into<ApiErrorKind>, M: Into<String>> From<(K, M)> for ApiError {
    fn from((kind, message): (K, M)) -> Self {
        ApiError::new().with_kind(kind).with_message(message)
    }
}

impl<K: Into<ApiErrorKind>> From<(K, Detail)> for ApiError {
    fn from((kind, detail): (K, Detail)) -> Self {
        ApiError::new().with_kind(kind).with_detail(detail)
    }
}

impl<K: Into<ApiErrorKind>, M: Into<String>> From<(K, Detail, M)> for ApiError {
    fn from((kind, detail, message): (K, Detail, M)) -> Self {
        ApiError::new()
            .with_kind(kind)
            .with_detail(detail)
            .with_message(message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_serializes_flat() {
        let error = ApiError::from(AuthKind::CaptchaFailed);
        let value = serde_json::to_value(&error).unwrap();

        assert_eq!(value["kind"], "CaptchaFailed");
    }

    #[test]
    fn kind_statuses() {
        let checks = [
            (ApiErrorKind::from(AuthKind::Unauthenticated), StatusCode::UNAUTHORIZED),
            (ApiErrorKind::from(AuthKind::TicketInvalid), StatusCode::BAD_REQUEST),
            (ApiErrorKind::from(AuthKind::TotpCodeMismatch), StatusCode::BAD_REQUEST),
            (ApiErrorKind::from(AuthKind::InvalidTotp), StatusCode::UNAUTHORIZED),
            (ApiErrorKind::from(UserKind::EmailInUse), StatusCode::CONFLICT),
            (ApiErrorKind::from(GeneralKind::TooManyRequests), StatusCode::TOO_MANY_REQUESTS),
        ];

        for (kind, expected) in checks {
            assert_eq!(kind.status(), expected, "{kind}");
        }
    }
}
