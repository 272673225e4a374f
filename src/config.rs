//! Client configuration.
//!
//! Provides a type-safe interface for configuring the client: endpoint URL,
//! connection and per-request timeouts, and reconnect backoff parameters.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use ogmios_client::ClientConfig;
//!
//! let config = ClientConfig::new("ws://127.0.0.1:1337".parse()?)
//!     .with_request_timeout(Duration::from_secs(10))
//!     .with_backoff(BackoffOptions::new().with_max_attempts(5));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for the WebSocket dial.
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for a single request/response exchange.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default initial reconnect delay.
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(250);

/// Default reconnect delay multiplier.
const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Default cap on the reconnect delay.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

// ============================================================================
// BackoffOptions
// ============================================================================

/// Exponential backoff parameters for the reconnect loop.
///
/// The delay before attempt `n` is `initial_delay * multiplier^(n-1)`,
/// capped at `max_delay`. `max_attempts = None` retries indefinitely.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffOptions {
    /// Delay before the first reconnect attempt.
    pub initial_delay: Duration,

    /// Factor applied to the delay after each failed attempt.
    pub multiplier: f64,

    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,

    /// Maximum number of attempts before giving up (None = unbounded).
    pub max_attempts: Option<u32>,
}

impl Default for BackoffOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl BackoffOptions {
    /// Creates backoff options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: None,
        }
    }

    /// Sets the initial reconnect delay.
    #[inline]
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the delay multiplier.
    #[inline]
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the maximum delay between attempts.
    #[inline]
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Bounds the number of reconnect attempts.
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Returns the delay to wait before the given attempt (1-based).
    ///
    /// Saturates at `max_delay`: the scaled delay is computed in `f64` and
    /// compared against the cap before it is ever turned back into a
    /// `Duration`, so large attempt counts cannot overflow.
    ///
    /// Slot and amount arithmetic stays in integers everywhere; the float
    /// multiplier only ever scales durations here.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.multiplier.powi(exponent);
        let scaled = self.initial_delay.as_secs_f64() * factor;

        if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }

        Duration::from_secs_f64(scaled.max(0.0))
    }
}

// ============================================================================
// ClientConfig
// ============================================================================

/// Configuration for [`Client`](crate::Client).
///
/// Controls the endpoint to dial, the dial and per-request timeouts, and
/// the reconnect backoff policy.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the node bridge (`ws://` or `wss://`).
    pub endpoint: Url,

    /// Timeout for establishing the WebSocket connection.
    pub connection_timeout: Duration,

    /// Timeout for a single request/response exchange.
    pub request_timeout: Duration,

    /// Reconnect backoff parameters.
    pub backoff: BackoffOptions,
}

impl ClientConfig {
    /// Creates a configuration for the given endpoint with default settings.
    #[inline]
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            backoff: BackoffOptions::new(),
        }
    }

    /// Sets the connection timeout.
    #[inline]
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the per-request timeout.
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the reconnect backoff parameters.
    #[inline]
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffOptions) -> Self {
        self.backoff = backoff;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        "ws://127.0.0.1:1337".parse().expect("valid url")
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(endpoint());

        assert_eq!(config.connection_timeout, DEFAULT_CONNECTION_TIMEOUT);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.backoff.max_attempts, None);
    }

    #[test]
    fn test_builder_methods() {
        let config = ClientConfig::new(endpoint())
            .with_connection_timeout(Duration::from_secs(5))
            .with_request_timeout(Duration::from_secs(10))
            .with_backoff(BackoffOptions::new().with_max_attempts(3));

        assert_eq!(config.connection_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.backoff.max_attempts, Some(3));
    }

    #[test]
    fn test_backoff_growth() {
        let backoff = BackoffOptions::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_multiplier(2.0)
            .with_max_delay(Duration::from_millis(350));

        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_millis(200));
        // Capped at max_delay from the third attempt on.
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_millis(350));
        assert_eq!(backoff.delay_for_attempt(10), Duration::from_millis(350));
    }

    #[test]
    fn test_backoff_saturates_at_large_attempt_counts() {
        let backoff = BackoffOptions::new();

        // 2^99 * 250ms is far beyond any representable Duration; the delay
        // must saturate at the cap instead of overflowing.
        assert_eq!(backoff.delay_for_attempt(100), DEFAULT_MAX_DELAY);
        assert_eq!(backoff.delay_for_attempt(u32::MAX), DEFAULT_MAX_DELAY);
    }

    #[test]
    fn test_backoff_zero_initial_delay() {
        let backoff = BackoffOptions::new().with_initial_delay(Duration::ZERO);

        assert_eq!(backoff.delay_for_attempt(1), Duration::ZERO);
        assert_eq!(backoff.delay_for_attempt(50), Duration::ZERO);
    }
}
