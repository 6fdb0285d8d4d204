use std::convert::Infallible;
use std::fmt;

use axum::response::{IntoResponse, Response};
use deadpool_postgres::{HookError, HookErrorCause, PoolError};

pub use tfa_api::error::{ApiError, ApiErrorKind, Detail};

type BoxDynError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

/// request level error pairing the response to send with the failure that
/// caused it. the response goes to the client, the cause only to the log
#[derive(Debug, Default)]
pub struct Error {
    api: ApiError,
    context: Option<String>,
    cause: Option<BoxDynError>,
}

fn log_cause(error: &Error) {
    if let Some(err) = error.cause.as_ref() {
        match error.context.as_ref() {
            Some(cxt) => tracing::error!(
                "unhandled error when processing request: {cxt}\n{err:#?}"
            ),
            None => tracing::error!(
                "unhandled error when processing request: {err:#?}"
            ),
        }
    }
}

pub async fn handle_error<E: Into<Error>>(error: E) -> Response {
    let error = error.into();

    log_cause(&error);

    error.api.into_response()
}

impl Error {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api<T: Into<ApiError>>(value: T) -> Self {
        Error { api: value.into(), ..Self::default() }
    }

    pub fn kind<K: Into<ApiErrorKind>>(self, kind: K) -> Self {
        Error { api: self.api.with_kind(kind.into()), ..self }
    }

    pub fn context<C: Into<String>>(self, cxt: C) -> Self {
        Error { context: Some(cxt.into()), ..self }
    }

    pub fn source<S: Into<BoxDynError>>(self, source: S) -> Self {
        Error { cause: Some(source.into()), ..self }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "api: {}", self.api)?;

        if let Some(cxt) = &self.context {
            write!(f, "\ncxt: {cxt}")?;
        }

        if let Some(err) = &self.cause {
            if f.alternate() {
                write!(f, "\nerr: {err:#?}")?;
            } else {
                write!(f, "\nerr: {err:?}")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|v| v as _)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        log_cause(&self);

        self.api.into_response()
    }
}

impl From<ApiError> for Error {
    fn from(value: ApiError) -> Self {
        Error::api(value)
    }
}

impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        Error::new().source("infallible error was produced")
    }
}

impl From<HookErrorCause> for Error {
    fn from(cause: HookErrorCause) -> Self {
        match cause {
            HookErrorCause::Backend(e) => Self::from(e),
            HookErrorCause::Message(msg) => Error::new().source(msg),
            HookErrorCause::StaticMessage(msg) => Error::new().source(msg.to_owned()),
        }
    }
}

impl From<HookError> for Error {
    fn from(err: HookError) -> Self {
        match err {
            HookError::Continue(Some(cause)) | HookError::Abort(cause) => Self::from(cause),
            HookError::Continue(None) => Error::new()
                .source("connection pool hook failed with no cause"),
        }
    }
}

impl From<PoolError> for Error {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Backend(e) => Self::from(e),
            PoolError::PostCreateHook(e)
            | PoolError::PreRecycleHook(e)
            | PoolError::PostRecycleHook(e) => Self::from(e),
            other => Error::new().source(other),
        }
    }
}

macro_rules! api_from {
    ($e:path) => {
        impl From<$e> for Error {
            fn from(err: $e) -> Self {
                Error::new().source(err)
            }
        }
    };
    ($k:expr, $e:path) => {
        impl From<$e> for Error {
            fn from(err: $e) -> Self {
                Error::new().kind($k).source(err)
            }
        }
    };
}

api_from!(std::io::Error);
api_from!(axum::Error);
api_from!(axum::http::Error);
api_from!(tokio_postgres::Error);
api_from!(serde_json::Error);
api_from!(rand::Error);
api_from!(argon2::Error);

api_from!(
    tfa_api::error::GeneralKind::InvalidHeaderValue,
    axum::http::header::ToStrError
);
api_from!(
    tfa_api::error::GeneralKind::InvalidHeaderValue,
    axum::http::header::InvalidHeaderValue
);

use tfa_lib::context_trait;

context_trait!(Error);

impl<T, E: Into<BoxDynError>> Context<T, E> for std::result::Result<T, E> {
    fn context<C: Into<String>>(self, cxt: C) -> Result<T> {
        self.map_err(|err| Error::new().context(cxt).source(err))
    }
}

impl<T> Context<T, ()> for Option<T> {
    fn context<C: Into<String>>(self, cxt: C) -> Result<T> {
        self.ok_or_else(|| Error::new().context(cxt))
    }
}
