use crate::retry::Attempts;
use crate::time::Millis;

/// Configuration for outbound confirmable (CON) requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Con {
  /// Lower bound of the initial acknowledgement timeout;
  /// the RFC's `ACK_TIMEOUT`.
  ///
  /// Defaults to 2 seconds:
  /// ```
  /// use croak::config::Con;
  /// use croak::time::Millis;
  ///
  /// assert_eq!(Con::default().init_timeout_min, Millis::new(2_000));
  /// ```
  pub init_timeout_min: Millis,

  /// Exclusive upper bound of the initial acknowledgement timeout;
  /// `ACK_TIMEOUT * ACK_RANDOM_FACTOR` with the RFC's factor of 1.5.
  ///
  /// The actual timeout for each request is drawn uniformly from
  /// `[init_timeout_min, init_timeout_max)`, and that jitter survives
  /// every doubling.
  ///
  /// Defaults to 3 seconds:
  /// ```
  /// use croak::config::Con;
  /// use croak::time::Millis;
  ///
  /// assert_eq!(Con::default().init_timeout_max, Millis::new(3_000));
  /// ```
  pub init_timeout_max: Millis,

  /// Number of times an unacknowledged request is retransmitted
  /// before the exchange fails; the RFC's `MAX_RETRANSMIT`.
  ///
  /// Defaults to 4 (so 5 transmissions in total):
  /// ```
  /// use croak::config::Con;
  /// use croak::retry::Attempts;
  ///
  /// assert_eq!(Con::default().max_attempts, Attempts(4));
  /// ```
  pub max_attempts: Attempts,
}

impl Default for Con {
  fn default() -> Self {
    Con { init_timeout_min: Millis::new(2_000),
          init_timeout_max: Millis::new(3_000),
          max_attempts: Attempts(4) }
  }
}

/// Runtime config for one client
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Config {
  /// See [`Con`]
  pub con: Con,

  /// How long to wait for a response once the request is out
  /// (for NON requests) or acknowledged (for CON requests).
  /// Never randomized.
  ///
  /// Defaults to 30 seconds:
  /// ```
  /// use croak::config::Config;
  /// use croak::time::Millis;
  ///
  /// assert_eq!(Config::default().resp_timeout, Millis::new(30_000));
  /// ```
  pub resp_timeout: Millis,
}

impl Default for Config {
  fn default() -> Self {
    Config { con: Con::default(),
             resp_timeout: Millis::new(30_000) }
  }
}
