//! Per-client request-rate limiting.
//!
//! Clients are keyed by peer IP address. A keyed GCRA limiter admits a
//! burst, then one request per replenish interval. Refusals use the failure
//! envelope with code `rate_limited` and the wait in `data.retryAfterSecs`.
//! This is independent of the monthly allowance.

use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use actix_web::Error;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde_json::json;
use tracing::warn;

use crate::domain::Error as DomainError;

/// Tracked clients before idle entries are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// Middleware factory; wrap a scope with it.
///
/// # Examples
/// ```
/// use std::num::NonZeroU32;
/// use std::time::Duration;
///
/// use actix_web::web;
/// use careline::middleware::ClientRateLimit;
///
/// let burst = NonZeroU32::new(10).expect("non-zero");
/// let limit = ClientRateLimit::new(burst, Duration::from_secs(6)).expect("non-zero interval");
/// let scope = web::scope("/ai").wrap(limit);
/// ```
#[derive(Clone, Default)]
pub struct ClientRateLimit {
    limiter: Option<Arc<DefaultKeyedRateLimiter<IpAddr>>>,
}

impl ClientRateLimit {
    /// Admit `burst` requests at once, then one every `replenish_every`.
    ///
    /// Returns `None` when `replenish_every` is zero.
    #[must_use]
    pub fn new(burst: NonZeroU32, replenish_every: Duration) -> Option<Self> {
        let quota = Quota::with_period(replenish_every)?.allow_burst(burst);
        Some(Self {
            limiter: Some(Arc::new(RateLimiter::keyed(quota))),
        })
    }

    /// Admit every request.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    fn check(&self, client: IpAddr) -> Result<(), DomainError> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };
        if limiter.len() > PRUNE_THRESHOLD {
            limiter.retain_recent();
        }
        limiter.check_key(&client).map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after_secs = wait.as_secs().max(1);
            warn!(%client, retry_after_secs, "client rate limited");
            DomainError::rate_limited("Too many AI requests. Please slow down.")
                .with_details(json!({ "retryAfterSecs": retry_after_secs }))
        })
    }
}

impl<S, B> Transform<S, ServiceRequest> for ClientRateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientRateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientRateLimitMiddleware {
            service,
            limit: self.clone(),
        }))
    }
}

/// Service wrapper produced by [`ClientRateLimit`].
pub struct ClientRateLimitMiddleware<S> {
    service: S,
    limit: ClientRateLimit,
}

impl<S, B> Service<ServiceRequest> for ClientRateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Requests without a peer address share one bucket.
        let client = req
            .peer_addr()
            .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |addr| addr.ip());
        if let Err(err) = self.limit.check(client) {
            let refused = req.error_response(err).map_into_right_body();
            return Box::pin(ready(Ok(refused)));
        }
        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
