use core::fmt;

use croak_msg::{Id, Token};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::time::{Clock, Millis};

/// A client-scoped source of weak randomness.
///
/// Message ids and tokens only need to be unpredictable enough to not
/// collide over the lifetime of an exchange, so a small non-crypto
/// generator seeded once from the monotonic clock is plenty. Scoping
/// the source to the client (instead of a process-wide seed) keeps
/// exchanges independent and makes tests deterministic via
/// [`Entropy::seeded`].
pub struct Entropy(SmallRng);

impl fmt::Debug for Entropy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Entropy").finish_non_exhaustive()
  }
}

impl Entropy {
  /// Seed from the current reading of a monotonic clock
  pub fn from_clock<C: Clock>(clock: &C) -> Result<Self, embedded_time::clock::Error> {
    clock.try_now().map(|now| {
                     let ms = Millis::try_from(now.duration_since_epoch()).unwrap_or(Millis::new(0));
                     Self::seeded(ms.0)
                   })
  }

  /// Seed explicitly; same seed, same draws
  pub fn seeded(seed: u64) -> Self {
    Self(SmallRng::seed_from_u64(seed))
  }

  /// Draw a fresh message id from 2 random bytes
  pub fn id(&mut self) -> Id {
    let mut bytes = [0u8; 2];
    self.0.fill_bytes(&mut bytes);
    Id(u16::from_le_bytes(bytes))
  }

  /// Draw a fresh 4-byte token
  pub fn token(&mut self) -> Token {
    let mut bytes = [0u8; 4];
    self.0.fill_bytes(&mut bytes);
    Token(bytes.iter().copied().collect())
  }

  /// Draw a duration uniformly from `[lo, hi)`
  ///
  /// `hi <= lo` collapses to `lo`.
  pub fn range_millis(&mut self, lo: Millis, hi: Millis) -> Millis {
    match hi.0.saturating_sub(lo.0) {
      | 0 => lo,
      | span => Millis::new(lo.0 + self.0.next_u64() % span),
    }
  }
}
