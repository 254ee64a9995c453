use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A fixed-window request limiter keyed by client address.
///
/// The first request from an address opens a window. Requests past the
/// maximum are refused until the window expires, at which point the count
/// starts over.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    /// The message returned to refused callers
    message: &'static str,
    windows: Mutex<HashMap<IpAddr, FixedWindow>>,
}

struct FixedWindow {
    count: u32,
    started_at: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, message: &'static str) -> Self {
        Self {
            max_requests,
            window,
            message,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// 100 requests per 15 minutes, applied to the whole api surface
    pub fn general() -> Self {
        Self::new(
            100,
            Duration::from_secs(15 * 60),
            "Too many requests from this IP, please try again after 15 minutes",
        )
    }

    /// 5 requests per hour, applied to password resets
    pub fn password_reset() -> Self {
        Self::new(
            5,
            Duration::from_secs(60 * 60),
            "Too many password reset attempts, please try again later.",
        )
    }

    /// Counts a request from `ip`. Returns the refusal message if the
    /// address has exhausted its window.
    pub fn check(&self, ip: IpAddr) -> Result<(), &'static str> {
        let mut windows = self.windows.lock();

        let window = windows.entry(ip).or_insert(FixedWindow {
            count: 0,
            started_at: Instant::now(),
        });

        if window.started_at.elapsed() > self.window {
            window.count = 0;
            window.started_at = Instant::now();
        }

        if window.count >= self.max_requests {
            return Err(self.message);
        }

        window.count += 1;
        Ok(())
    }
}
