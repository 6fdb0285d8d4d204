use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use pin_project::pin_project;
use tokio::time::Sleep;
use tower::{Layer, Service};

use crate::net::error;

pub enum TimeoutError<E> {
    Inner(E),
    Elapsed,
}

impl<E: Into<error::Error>> From<TimeoutError<E>> for error::Error {
    fn from(err: TimeoutError<E>) -> Self {
        match err {
            TimeoutError::Inner(e) => e.into(),
            TimeoutError::Elapsed => error::Error::api(tfa_api::error::GeneralKind::Timeout),
        }
    }
}

/// fails requests that run longer than the configured window
#[derive(Debug, Clone)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    pub fn new(timeout: Duration) -> Self {
        TimeoutLayer { timeout }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = Timeout<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Timeout {
            timeout: self.timeout,
            inner,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Timeout<S> {
    timeout: Duration,
    inner: S,
}

impl<Request, S: Service<Request>> Service<Request> for Timeout<S> {
    type Response = S::Response;
    type Error = TimeoutError<S::Error>;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(TimeoutError::Inner)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        ResponseFuture {
            inner: self.inner.call(request),
            deadline: tokio::time::sleep(self.timeout),
        }
    }
}

/// resolves with the inner response unless the deadline lapses first
#[pin_project]
pub struct ResponseFuture<F> {
    #[pin]
    inner: F,
    #[pin]
    deadline: Sleep,
}

impl<F, Response, Error> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response, Error>>,
{
    type Output = Result<Response, TimeoutError<Error>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Poll::Ready(result) = this.inner.poll(cx) {
            return Poll::Ready(result.map_err(TimeoutError::Inner));
        }

        this.deadline.poll(cx).map(|()| Err(TimeoutError::Elapsed))
    }
}
