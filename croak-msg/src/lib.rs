//! Low-level representation of CoAP messages.
//!
//! The most notable item in `croak_msg` is [`Message`]:
//! a CoAP message very close to the actual byte layout.
//!
//! ## Allocation
//! CoAP messages have some attributes whose size is dynamic:
//! - The message payload (in http terms: the request/response body)
//! - the number of options (in http terms: headers)
//! - the value of an option (in http terms: header value)
//!
//! `Message` does not require an allocator and has no opinions about what
//! kind of collection it uses internally to store these values; it is generic
//! over the collections it needs and uses the
//! [`Array`](croak_common::Array) trait to capture its idea of what makes a
//! collection useful.
//!
//! This means that you may use either of the provided implementations
//! (`Vec` or `tinyvec::ArrayVec`) or provide your own collection.
//!
//! ```
//! use croak_msg::{Message, Opt};
//!
//! //                      Message Payload byte buffer
//! //                      |
//! //                      |        Collection of options in the message
//! //                      vvvvvvv  vvvvvvvvvvvvvvvvv
//! type VecMessage = Message<Vec<u8>, Vec<Opt<Vec<u8>>>>;
//!
//! // Used like: `ArrayVecMessage<1024, 256, 16>`; a message that can store
//! // a payload up to 1024 bytes, and up to 16 options each with up to a
//! // 256 byte value, all on the stack.
//! ```
//!
//! ## Wire format
//! [`TryFromBytes`] parses a datagram, [`TryIntoBytes`] serializes a message.
//! The codec is pure; it does no I/O and allocates nothing beyond the
//! collections above.

// docs
#![doc(html_root_url = "https://docs.rs/croak-msg/0.1.0")]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]
// -
// features
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc as std_alloc;

/// Parsing messages from bytes
pub mod from_bytes;

/// Serializing messages to bytes
pub mod to_bytes;

/// The message struct & its fields
pub mod msg;

pub use from_bytes::*;
pub use msg::*;
pub use to_bytes::*;

#[cfg(feature = "alloc")]
use std_alloc::vec::Vec;
use tinyvec::ArrayVec;

/// [`Message`] that uses [`Vec`] as the backing collection for payload,
/// option values and the option list
#[cfg(feature = "alloc")]
pub type VecMessage = Message<Vec<u8>, Vec<Opt<Vec<u8>>>>;

/// [`Message`] that lives entirely on the stack:
/// - `PAYLOAD_CAP`: payload capacity in bytes
/// - `OPT_CAP`: per-option value capacity in bytes
/// - `N_OPTS`: maximum number of options
pub type ArrayVecMessage<const PAYLOAD_CAP: usize, const OPT_CAP: usize, const N_OPTS: usize> =
  Message<ArrayVec<[u8; PAYLOAD_CAP]>, ArrayVec<[Opt<ArrayVec<[u8; OPT_CAP]>>; N_OPTS]>>;

#[cfg(test)]
pub(crate) fn test_msg() -> (VecMessage, Vec<u8>) {
  let content_format: &[u8] = b"application/json";

  //                       version  token len  code (2.05 Content)
  //                       |        |          /
  //                       |  type  |         /  message ID
  //                       |  |     |        |   |
  //                       vv vv vvvv vvvvvvvv vvvvvvvvvvvvvvvv
  let header: [u8; 4] = 0b_01_00_0001_01000101_0000000000000001u32.to_be_bytes();
  let token: [u8; 1] = [254u8];
  let opts: [&[u8]; 2] = [&[0b_1100_1101u8, 0b00000011u8], content_format];
  let payload: [&[u8]; 2] = [&[0b_11111111u8], b"hello, world!"];
  let bytes = [header.as_ref(),
               token.as_ref(),
               opts.concat().as_ref(),
               payload.concat().as_ref()].concat();

  let msg = VecMessage { id: Id(1),
                         ty: Type::Con,
                         ver: Version(1),
                         token: Token::try_from_slice(&[254]).unwrap(),
                         code: Code::new(2, 5),
                         opts: vec![Opt { number: OptNumber(12),
                                          value: OptValue(content_format.to_vec()) }],
                         payload: Payload(b"hello, world!".to_vec()) };

  (msg, bytes)
}
