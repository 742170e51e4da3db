//! Per-request deadline carried into every outbound backend call.

use std::time::Duration;

use tokio::time::Instant;

/// Deadline derived when a request enters the gateway.
///
/// Passed by value down the call chain so proxying, forwarding and health
/// probing never wait on a backend past the inbound request's budget.
/// Cancellation rides on the request lifetime: when the client goes away the
/// handler future (or response body) is dropped along with the outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamContext {
    deadline: Instant,
}

impl UpstreamContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// The smaller of `limit` and the time left.
    pub fn bounded(&self, limit: Duration) -> Duration {
        self.remaining().min(limit)
    }
}
