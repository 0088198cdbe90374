use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Window {
    opened: Instant,
    served: u32,
}

/// Fixed-window limiter shared across the dashboard routes. Coarse on
/// purpose; its job is to keep a misbehaving dashboard tab from hammering
/// the API, not to meter tenants individually.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    fn new(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            window: Arc::new(Mutex::new(Window {
                opened: Instant::now(),
                served: 0,
            })),
        }
    }

    fn admit(&self) -> bool {
        let mut window = self.window.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();
        if now.duration_since(window.opened) >= WINDOW {
            window.opened = now;
            window.served = 0;
        }
        if window.served >= self.rps {
            return false;
        }
        window.served += 1;
        true
    }
}

pub async fn rps_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.admit() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded").into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32) -> RateLimiter {
    RateLimiter::new(rps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_rps_then_rejects() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.admit());
        assert!(limiter.admit());
        assert!(limiter.admit());
        assert!(!limiter.admit());
    }

    #[test]
    fn zero_rps_still_admits_one_request() {
        let limiter = RateLimiter::new(0);
        assert!(limiter.admit());
        assert!(!limiter.admit());
    }
}
