use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// A byte-counted token bucket shared across connections (§4.5 Rate
/// limiting). `governor` handles the internal synchronization; callers
/// only need [`acquire`].
pub type TokenBucket = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Builds a bucket that sustains `bytes_per_second`, with a burst equal to
/// one second's worth of tokens.
pub fn bucket(bytes_per_second: u32) -> TokenBucket {
    let rate = NonZeroU32::new(bytes_per_second.max(1)).expect("clamped to at least 1");
    RateLimiter::direct(Quota::per_second(rate))
}

/// Blocks until `n` bytes worth of tokens are available. Loops because a
/// single request for a large `n` may need to wait past more than one
/// replenishment interval.
pub async fn acquire(bucket: &TokenBucket, n: u32) {
    let Some(n) = NonZeroU32::new(n) else {
        return;
    };

    let clock = DefaultClock::default();
    loop {
        match bucket.check_n(n) {
            Ok(Ok(())) => return,
            Ok(Err(not_until)) => {
                tokio::time::sleep(not_until.wait_time_from(clock.now())).await;
            }
            Err(_insufficient_capacity) => {
                // `n` exceeds the bucket's maximum burst outright; there is
                // no wait time after which it would succeed in one shot.
                // Wait out one interval and let the caller retry with
                // whatever it has left rather than spin indefinitely.
                tokio::time::sleep(Duration::from_millis(50)).await;
                return;
            }
        }
    }
}
