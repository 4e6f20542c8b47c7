use croak_common::{Array, Cursor, GetSize};

use super::parse_error::OptParseError;
use crate::to_bytes::{encode_ext, MessageToBytesError, MAX_OPT_FIELD};

/// The number identifying which option this is
/// (e.g. Content-Format has a Number of 12).
///
/// On the wire an option's number is encoded as the delta from the
/// previous option's number; in memory the absolute number is stored
/// and deltas only exist during (de)serialization.
///
/// # Related
/// - [RFC7252#section-3.1 Option Format](https://datatracker.ietf.org/doc/html/rfc7252#section-3.1)
/// - [RFC7252#section-12.2 Core CoAP Option Numbers](https://datatracker.ietf.org/doc/html/rfc7252#section-12.2)
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct OptNumber(pub u32);

/// The value of an option; an opaque sequence of bytes
///
/// # Related
/// - [RFC7252#section-3.2 Option Value Formats](https://datatracker.ietf.org/doc/html/rfc7252#section-3.2)
#[derive(Clone, Hash, PartialEq, PartialOrd, Debug, Default)]
pub struct OptValue<C>(pub C);

/// A single option: a number and an opaque value
///
/// Options live in an ordered collection on [`Message`](crate::Message);
/// [`Message::add_opt`](crate::Message::add_opt) keeps that collection
/// sorted by number (insertion order preserved per number), which is the
/// order the wire format requires.
#[derive(Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Opt<C> {
  /// See [`OptNumber`]
  pub number: OptNumber,
  /// See [`OptValue`]
  pub value: OptValue<C>,
}

impl<C: Array<Item = u8>> Opt<C> {
  /// The number of bytes this option occupies on the wire,
  /// delta-encoded against the previously serialized option's number.
  pub fn wire_size(&self, prev: OptNumber) -> usize {
    let ext_size = |n: u32| match n {
      | n if n >= 269 => 2,
      | n if n >= 13 => 1,
      | _ => 0,
    };

    let delta = self.number.0.saturating_sub(prev.0);
    let len = self.value.0.get_size();

    1 + ext_size(delta) + ext_size(len as u32) + len
  }

  /// Emit this option's bytes, delta-encoded against the previously
  /// emitted option's number.
  ///
  /// Returns this option's number, to be fed back in as `prev` for the
  /// next option. Callers must emit options in ascending number order.
  pub fn extend_bytes(self,
                      prev: OptNumber,
                      bytes: &mut impl Extend<u8>)
                      -> Result<OptNumber, MessageToBytesError> {
    let number = self.number;
    let delta = number.0.saturating_sub(prev.0);
    let len = self.value.0.get_size();

    if len as u32 > MAX_OPT_FIELD {
      return Err(MessageToBytesError::OptionValueTooLong { actual: len });
    }

    if delta > MAX_OPT_FIELD {
      return Err(MessageToBytesError::OptionDeltaTooLarge { delta });
    }

    let (del, del_ext) = encode_ext(delta);
    let (len_nibble, len_ext) = encode_ext(len as u32);

    bytes.extend(Some(del << 4 | len_nibble));
    bytes.extend(del_ext);
    bytes.extend(len_ext);
    bytes.extend(self.value.0);

    Ok(number)
  }
}

/// Read a 4-bit delta or length field, consuming its extension bytes:
/// 0-12 literal, 13 means +1 byte holding `n - 13`,
/// 14 means +2 big-endian bytes holding `n - 269`, 15 is reserved.
pub(crate) fn parse_ext_len_or_delta<A: AsRef<[u8]>>(head: u8,
                                                     bytes: &mut Cursor<A>,
                                                     reserved_err: OptParseError)
                                                     -> Result<u32, OptParseError> {
  match head {
    | 13 => bytes.take_u8()
                 .map(|n| n as u32 + 13)
                 .ok_or_else(OptParseError::eof),
    | 14 => bytes.take_u16()
                 .map(|n| n as u32 + 269)
                 .ok_or_else(OptParseError::eof),
    | 15 => Err(reserved_err),
    | _ => Ok(head as u32),
  }
}

/// Consume options until the payload marker or the end of the datagram.
///
/// The running sum of deltas becomes each option's absolute number.
/// The returned flag is whether a payload marker (`0xFF`) was consumed.
pub(crate) fn try_consume_opts<V, O, B>(bytes: &mut Cursor<B>) -> Result<(O, bool), OptParseError>
  where V: Array<Item = u8>,
        O: Array<Item = Opt<V>>,
        B: AsRef<[u8]>
{
  let mut opts = O::default();
  let mut number = 0u32;

  loop {
    let head = match bytes.next() {
      | None => return Ok((opts, false)),
      | Some(0b11111111) => return Ok((opts, true)),
      | Some(b) => b,
    };

    // NOTE: the delta field must be consumed before the length field
    let delta = parse_ext_len_or_delta(head >> 4, bytes, OptParseError::OptionDeltaReservedValue(15))?;
    let len =
      parse_ext_len_or_delta(head & 0b1111, bytes, OptParseError::ValueLengthReservedValue(15))?
      as usize;

    number += delta;

    let mut value = V::reserve(len);
    match bytes.take_exact(len) {
      | Some(bs) => value.extend(bs.iter().copied()),
      | None => return Err(OptParseError::UnexpectedEndOfStream),
    }

    if opts.is_full() {
      return Err(OptParseError::TooManyOptions(opts.get_size()));
    }

    opts.push(Opt { number: OptNumber(number),
                    value: OptValue(value) });
  }
}
