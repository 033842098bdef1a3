use std::future::pending;
use std::time::Duration;
use tokio::time::Instant;

/// Sleeps for the given duration, or forever if there is none. Useful in
/// `select!` arms where a timeout may or may not apply.
pub async fn maybe_sleep(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => pending().await,
    }
}

/// Sleeps until the given instant, or forever if there is none.
pub async fn maybe_sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}
