use std::num::NonZeroU32;
use std::thread;

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Blocking pacer in front of the Amap endpoints. The free tier allows 3
/// requests per second; one `wait()` call before each request keeps us under
/// that without any explicit sleep at the call sites.
pub struct Pacer {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    clock: DefaultClock,
}

impl Pacer {
    pub fn per_second(requests: u32) -> Self {
        let clock = DefaultClock::default();
        let quota = Quota::per_second(NonZeroU32::new(requests).unwrap());
        Self {
            limiter: RateLimiter::direct_with_clock(quota, &clock),
            clock,
        }
    }

    /// Blocks until the next request is allowed to go out.
    pub fn wait(&self) {
        while let Err(not_until) = self.limiter.check() {
            thread::sleep(not_until.wait_time_from(self.clock.now()));
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::per_second(3)
    }
}
