use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::{HeaderName, HeaderValue, Request, Response};
use pin_project::pin_project;
use tower::{Layer, Service};

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Debug, Clone, Copy)]
pub struct RequestId(u64);

impl RequestId {
    pub fn try_get<B>(req: &Request<B>) -> Option<&Self> {
        req.extensions().get()
    }

    pub fn id(&self) -> &u64 {
        &self.0
    }
}

#[pin_project]
pub struct RIDFuture<F> {
    #[pin]
    response: F,
    rid: RequestId,
}

impl<F, B, E> Future for RIDFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let mut response = match this.response.poll(cx) {
            Poll::Ready(Ok(res)) => res,
            other => return other,
        };

        response.headers_mut().insert(
            REQUEST_ID_HEADER.clone(),
            HeaderValue::from(this.rid.0)
        );

        Poll::Ready(Ok(response))
    }
}

#[derive(Debug, Clone)]
pub struct RIDService<S> {
    inner: S,
    next: Arc<AtomicU64>,
}

impl<S, B, ResBody> Service<Request<B>> for RIDService<S>
where
    S: Service<Request<B>, Response = Response<ResBody>>
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = RIDFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        let rid = RequestId(self.next.fetch_add(1, Ordering::Relaxed));

        request.extensions_mut().insert(rid);

        RIDFuture {
            response: self.inner.call(request),
            rid,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RIDLayer {
    next: Arc<AtomicU64>,
}

impl RIDLayer {
    pub fn new() -> Self {
        RIDLayer {
            next: Arc::new(AtomicU64::new(1))
        }
    }
}

impl<S> Layer<S> for RIDLayer {
    type Service = RIDService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RIDService {
            inner,
            next: Arc::clone(&self.next),
        }
    }
}
