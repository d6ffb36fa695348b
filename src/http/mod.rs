//! HTTP reachability probe with retry logic and error handling.

mod client;
mod retry;

#[cfg(test)]
pub use client::MockProbe;
pub use client::{HttpClient, Probe, wants_github_token};
pub use retry::{MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, classify_status};
