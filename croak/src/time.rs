use embedded_time::Instant;

/// A duration, in milliseconds
pub type Millis = embedded_time::duration::Milliseconds<u64>;

/// Supertrait of [`embedded_time::Clock`] pinning the
/// type of "ticks" to u64
pub trait Clock: embedded_time::Clock<T = u64> {}
impl<C: embedded_time::Clock<T = u64>> Clock for C {}

/// A one-shot, resettable deadline.
///
/// The timer holds no thread or callback; readiness is a question the
/// owner asks ([`Timer::ready`]) with a current [`Instant`], which is
/// what lets it share a poll loop with a non-blocking socket.
///
/// - [`arm`](Timer::arm) sets the deadline to `now + dur`, replacing
///   any earlier deadline
/// - [`ready`](Timer::ready) answers whether the deadline has elapsed
/// - [`acknowledge`](Timer::acknowledge) drains the expiry so `ready`
///   answers `false` until the timer is armed again
#[derive(Debug, Clone, Copy)]
pub struct Timer<C: Clock> {
  armed: Option<(Instant<C>, Millis)>,
}

impl<C: Clock> Default for Timer<C> {
  fn default() -> Self {
    Self::new()
  }
}

impl<C: Clock> Timer<C> {
  /// Create a new, unarmed timer
  pub fn new() -> Self {
    Self { armed: None }
  }

  /// Set the deadline to `now + dur`, replacing any prior deadline
  pub fn arm(&mut self, now: Instant<C>, dur: Millis) {
    self.armed = Some((now, dur));
  }

  /// Whether the deadline has elapsed.
  ///
  /// An unarmed (or acknowledged) timer is never ready.
  pub fn ready(&self, now: Instant<C>) -> bool {
    match self.armed {
      | Some((start, dur)) => Millis::try_from(now - start).map(|elapsed| elapsed >= dur)
                                                           .unwrap_or(false),
      | None => false,
    }
  }

  /// Clear the deadline and any pending expiry
  pub fn acknowledge(&mut self) {
    self.armed = None;
  }

  /// Whether the timer currently holds a deadline
  pub fn is_armed(&self) -> bool {
    self.armed.is_some()
  }
}
