type BoxDynError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

/// process level error carrying a named kind with optional context
#[derive(Debug)]
pub struct Error {
    kind: String,
    message: Option<String>,
    cause: Option<BoxDynError>,
}

impl Error {
    pub fn new() -> Error {
        Self::default()
    }

    pub fn kind<K: Into<String>>(self, kind: K) -> Self {
        Error { kind: kind.into(), ..self }
    }

    pub fn message<M: Into<String>>(self, message: M) -> Self {
        Error { message: Some(message.into()), ..self }
    }

    pub fn source<S: Into<BoxDynError>>(self, source: S) -> Self {
        Error { cause: Some(source.into()), ..self }
    }
}

impl Default for Error {
    fn default() -> Self {
        Error {
            kind: "Error".into(),
            message: None,
            cause: None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.kind)?;

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n{cause}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|v| v as _)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::new().message(message)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::new().message(message)
    }
}

impl From<deadpool_postgres::BuildError> for Error {
    fn from(err: deadpool_postgres::BuildError) -> Self {
        match err {
            deadpool_postgres::BuildError::Backend(e) => Self::from(e),
            deadpool_postgres::BuildError::NoRuntimeSpecified(message) => {
                Error::new().kind("deadpool::managed::BuildError").message(message)
            }
        }
    }
}

macro_rules! from_err {
    ($k:expr, $e:path) => {
        impl From<$e> for Error {
            fn from(err: $e) -> Self {
                Error::new().kind($k).source(err)
            }
        }
    };
}

from_err!("std::io::Error", std::io::Error);
from_err!("std::net::AddrParseError", std::net::AddrParseError);
from_err!("tokio_postgres::Error", tokio_postgres::Error);
from_err!("serde_json::Error", serde_json::Error);
from_err!("serde_yaml::Error", serde_yaml::Error);
from_err!("reqwest::Error", reqwest::Error);

use tfa_lib::context_trait;

context_trait!(Error);

impl<T, E: Into<BoxDynError>> Context<T, E> for std::result::Result<T, E> {
    fn context<C: Into<String>>(self, cxt: C) -> Result<T> {
        self.map_err(|err| Error::new().message(cxt).source(err))
    }
}

impl<T> Context<T, ()> for Option<T> {
    fn context<C: Into<String>>(self, cxt: C) -> Result<T> {
        self.ok_or_else(|| Error::new().message(cxt))
    }
}
