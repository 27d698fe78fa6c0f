use std::time::Duration;
use std::task::{Context, Poll};
use std::pin::Pin;
use std::future::Future;

use tower::{Layer, Service};
use tokio::time::Sleep;
use pin_project::pin_project;

use crate::net::error;

pub enum TimeoutError<E> {
    Service(E),
    Elapsed(Duration),
}

impl<E> From<TimeoutError<E>> for error::Error
where
    E: Into<error::Error>
{
    fn from(err: TimeoutError<E>) -> Self {
        match err {
            TimeoutError::Service(e) => e.into(),
            TimeoutError::Elapsed(limit) => error::Error::api((
                error::GeneralKind::Timeout,
                format!("request did not finish within {}s", limit.as_secs())
            ))
        }
    }
}

#[pin_project]
pub struct DeadlineFuture<F> {
    #[pin]
    inner: F,
    #[pin]
    deadline: Sleep,
    limit: Duration,
}

impl<F, T, E> Future for DeadlineFuture<F>
where
    F: Future<Output = Result<T, E>>,
{
    type Output = Result<T, TimeoutError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Poll::Ready(result) = this.inner.poll(cx) {
            return Poll::Ready(result.map_err(TimeoutError::Service));
        }

        this.deadline.poll(cx).map(|()| {
            tracing::warn!("request deadline of {:?} reached", this.limit);

            Err(TimeoutError::Elapsed(*this.limit))
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeadlineService<S> {
    inner: S,
    limit: Duration,
}

impl<S, R> Service<R> for DeadlineService<S>
where
    S: Service<R>,
{
    type Response = S::Response;
    type Error = TimeoutError<S::Error>;
    type Future = DeadlineFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(TimeoutError::Service)
    }

    fn call(&mut self, request: R) -> Self::Future {
        DeadlineFuture {
            inner: self.inner.call(request),
            deadline: tokio::time::sleep(self.limit),
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimeoutLayer {
    limit: Duration,
}

impl TimeoutLayer {
    pub fn new(limit: Duration) -> Self {
        TimeoutLayer { limit }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = DeadlineService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DeadlineService {
            inner,
            limit: self.limit,
        }
    }
}
