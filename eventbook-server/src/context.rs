use std::sync::Arc;

use axum::extract::FromRef;
use eventbook_core::{Eventbook, PgDatabase, RateLimiter};

/// Shared state handed to every handler
#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub eventbook: Arc<Eventbook<PgDatabase>>,
    /// 100 requests per 15 minutes, applied to everything
    #[from_ref(skip)]
    pub general_limiter: Arc<RateLimiter>,
    /// 5 requests per hour, applied to password reset requests
    #[from_ref(skip)]
    pub reset_limiter: Arc<RateLimiter>,
}

impl ServerContext {
    pub fn new(eventbook: Arc<Eventbook<PgDatabase>>) -> Self {
        Self {
            eventbook,
            general_limiter: Arc::new(RateLimiter::general()),
            reset_limiter: Arc::new(RateLimiter::password_reset()),
        }
    }
}
