//! `croak` is a blocking CoAP client engine.
//!
//! One [`client::Client`] talks to one server over a connected,
//! non-blocking datagram socket. [`client::Client::exchange`] sends a
//! request and blocks until the response arrives (or the exchange fails),
//! taking care of everything RFC 7252 asks of a client along the way:
//!
//! - message id & token assignment from a client-scoped random source
//! - retransmission of confirmable requests with jittered exponential
//!   backoff (initial timeout uniform in \[2, 3) seconds, doubling,
//!   4 retransmissions)
//! - piggy-backed responses, and separate responses arriving up to
//!   30 seconds after the acknowledgement
//! - acknowledging confirmable responses, rejecting strays with Reset,
//!   and Reset-ing malformed confirmable datagrams
//!
//! Internally nothing blocks but the wait itself: the socket is
//! non-blocking and the engine multiplexes "socket readable" and "timer
//! expired" through one [`nb`]-style poll point
//! ([`client::Exchange::poll`]), which is also how the state machine is
//! driven deterministically in tests.
//!
//! Out of scope: observe, block-wise transfer, multicast, proxying and
//! everything server-side.

// docs
#![doc(html_root_url = "https://docs.rs/croak/0.1.0")]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]

use tinyvec::ArrayVec;

/// The CoAP client
pub mod client;

/// Runtime configuration
pub mod config;

/// Sockets
pub mod net;

/// Client-scoped randomness
pub mod rand;

/// Retransmission backoff
pub mod retry;

/// Clocks & the one-shot timer
pub mod time;

/// `std` implementations of the socket & clock capabilities
pub mod std;


/// Size of every datagram buffer in the engine.
///
/// 1024 bytes comfortably fits any message this client sends or
/// accepts; RFC 7252 §4.6 asks for 1152 only when block-wise transfer
/// is on the table.
pub const MAX_DGRAM_LEN: usize = 1024;

/// A datagram's worth of bytes, on the stack
pub type Dgram = ArrayVec<[u8; MAX_DGRAM_LEN]>;

/// The fixed-capacity [`croak_msg::Message`] the engine speaks:
/// 1024-byte payloads, 16 options of up to 256 value bytes each
pub type Message = croak_msg::ArrayVecMessage<MAX_DGRAM_LEN, 256, 16>;
