use std::future::{ready, Ready};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures::future::Either;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tower::{Layer, Service};

use tfa_api::error::{ApiError, GeneralKind};

use crate::config;
use crate::error;

type IpLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<IpLimiter>,
}

impl<S, B> Service<Request<B>> for RateLimitService<S>
where
    S: Service<Request<B>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let Some(ConnectInfo(remote)) = request.extensions().get::<ConnectInfo<SocketAddr>>() else {
            tracing::error!("missing remote address for rate limited request");

            return Either::Left(ready(Ok(
                ApiError::from(GeneralKind::InternalFailure).into_response()
            )));
        };

        if self.limiter.check_key(&remote.ip()).is_err() {
            return Either::Left(ready(Ok(
                ApiError::from(GeneralKind::TooManyRequests).into_response()
            )));
        }

        Either::Right(self.inner.call(request))
    }
}

/// per client quota enforcement keyed on the remote address of the
/// connection.
///
/// requests over the quota are answered directly with a too many requests
/// error and never reach the inner service.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<IpLimiter>,
}

impl RateLimitLayer {
    pub fn from_config(config: &config::Config) -> error::Result<Self> {
        let window = config.settings.rate_limit.window;
        let limit = config.settings.rate_limit.limit;

        let Some(burst) = NonZeroU32::new(limit) else {
            return Err(error::Error::new()
                .message("rate_limit.limit must be greater than zero"));
        };

        let replenish = Duration::from_millis(window * 1000 / u64::from(limit));

        let Some(quota) = Quota::with_period(replenish) else {
            return Err(error::Error::new()
                .message("rate_limit.window is too small for the given limit"));
        };

        Ok(RateLimitLayer {
            limiter: Arc::new(RateLimiter::keyed(quota.allow_burst(burst))),
        })
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService {
            inner: service,
            limiter: self.limiter.clone(),
        }
    }
}
