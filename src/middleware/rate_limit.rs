//! Submission rate limiting using the Governor crate
//!
//! Applied only to the routes that create tasks, so clients polling for
//! status and results are never throttled.

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    num::NonZeroU32,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::warn;

use crate::config::RateLimitConfig;
use crate::error::AppError;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>;

const FALLBACK_RPS: NonZeroU32 = match NonZeroU32::new(5) {
    Some(v) => v,
    None => unreachable!(),
};

/// Rate limiting layer for task submission
#[derive(Clone)]
pub struct SubmissionRateLimitLayer {
    limiter: SharedRateLimiter,
}

impl SubmissionRateLimitLayer {
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(FALLBACK_RPS);
        let burst = NonZeroU32::new(burst_size).unwrap_or(rps);
        let quota = Quota::per_second(rps).allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_second, config.burst_size)
    }
}

impl<S> Layer<S> for SubmissionRateLimitLayer {
    type Service = SubmissionRateLimit<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SubmissionRateLimit {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

/// Rate limiting middleware service
#[derive(Clone)]
pub struct SubmissionRateLimit<S> {
    inner: S,
    limiter: SharedRateLimiter,
}

impl<S> Service<Request<Body>> for SubmissionRateLimit<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        if self.limiter.check().is_err() {
            warn!(path = %request.uri().path(), "Submission rate limit exceeded");
            return Box::pin(async { Ok(AppError::RateLimitExceeded.into_response()) });
        }

        let future = self.inner.call(request);
        Box::pin(future)
    }
}
