use embassy_time::Instant;

/// Monotonic time source the blink loop schedules its edges against.
///
/// Waiting for an absolute deadline, rather than for a duration, keeps
/// whatever runs between two edges from pushing the later edges back.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now(&self) -> Instant;

    /// Returns once `deadline` has passed; immediately if it already has.
    async fn wait_until(&mut self, deadline: Instant);
}

/// The embassy time driver (RP2040 TIMER peripheral).
#[cfg(target_os = "none")]
pub struct SystemClock;

#[cfg(target_os = "none")]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn wait_until(&mut self, deadline: Instant) {
        embassy_time::Timer::at(deadline).await
    }
}
