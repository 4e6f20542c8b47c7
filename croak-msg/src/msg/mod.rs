use croak_common::{Array, Cursor, GetSize};

/// Message Code
pub mod code;

/// Message parsing errors
pub mod parse_error;

/// Message ID
pub mod id;

/// Message Options
pub mod opt;

/// Message Type
pub mod ty;

/// Message Token
pub mod token;

/// Message Version
pub mod ver;

pub use code::*;
pub use id::*;
pub use opt::*;
pub use parse_error::*;
pub use token::*;
pub use ty::*;
pub use ver::*;

use crate::from_bytes::TryFromBytes;

/// The request/response body of a message
///
/// On the wire the payload is prefixed with the marker byte `0xFF`
/// and runs to the end of the datagram; an absent marker means an
/// empty payload.
#[derive(Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Payload<C>(pub C);

/// Struct representing the first byte of a message.
///
/// ```text
/// CoAP version
/// |
/// |  Message type (request, response, empty)
/// |  |
/// |  |  Length of token, in bytes. (4-bit integer)
/// |  |  |
/// vv vv vvvv
/// 01 00 0000
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub(crate) struct Byte1 {
  pub(crate) ver: Version,
  pub(crate) ty: Type,
  pub(crate) tkl: u8,
}

impl From<u8> for Byte1 {
  fn from(b: u8) -> Self {
    let ver = b >> 6; // bits 0 & 1
    let ty = b >> 4 & 0b11; // bits 2 & 3
    let tkl = b & 0b1111u8; // last 4 bits

    Byte1 { ver: Version(ver),
            ty: Type::from_wire(ty),
            tkl }
  }
}

impl From<Byte1> for u8 {
  fn from(b: Byte1) -> u8 {
    let ver = b.ver.0 << 6;
    let ty = u8::from(b.ty) << 4;
    let tkl = b.tkl;

    ver | ty | tkl
  }
}

/// # `Message` struct
/// Low-level representation of a message that has been parsed from the
/// raw binary format, or is about to be serialized into it.
///
/// Note that `Message` is generic over 3 [`Array`]s:
///  - `PayloadBytes`: the byte buffer used to store the message's [`Payload`]
///  - `OptionValue`: byte buffer used to store each [`Opt`]ion's [`OptValue`]
///  - `Options`: collection of [`Opt`]ions in the message
///
/// Messages support both serializing to bytes and parsing from bytes, via
/// [`TryIntoBytes`](crate::TryIntoBytes) and [`TryFromBytes`].
///
/// ```
/// use croak_msg::{TryFromBytes, VecMessage};
///
/// # //                       version  token len  code (2.05 Content)
/// # //                       |        |          /
/// # //                       |  type  |         /  message ID
/// # //                       |  |     |        |   |
/// # //                       vv vv vvvv vvvvvvvv vvvvvvvvvvvvvvvv
/// # let header: [u8; 4] = 0b_01_00_0001_01000101_0000000000000001u32.to_be_bytes();
/// # let token: [u8; 1] = [254u8];
/// # let payload: [&[u8]; 2] = [&[0b_11111111u8], b"hello, world!"];
/// let packet: Vec<u8> = /* bytes! */
/// # [header.as_ref(), token.as_ref(), payload.concat().as_ref()].concat();
///
/// let msg = VecMessage::try_from_bytes(&packet).unwrap();
///
/// assert_eq!(msg.code, croak_msg::Code::new(2, 5));
/// assert_eq!(msg.payload.0, b"hello, world!".to_vec());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Message<PayloadBytes, Options> {
  /// see [`Id`] for details
  pub id: Id,
  /// see [`Type`] for details
  pub ty: Type,
  /// see [`Version`] for details
  pub ver: Version,
  /// see [`Token`] for details
  pub token: Token,
  /// see [`Code`] for details
  pub code: Code,
  /// see [`opt::Opt`] for details
  pub opts: Options,
  /// see [`Payload`]
  pub payload: Payload<PayloadBytes>,
}

impl<P: Array<Item = u8>, V: Array<Item = u8>, O: Array<Item = Opt<V>>> Message<P, O> {
  /// Create a fresh request with the given type and code.
  ///
  /// The id and token are left zeroed; the client assigns
  /// both when the request is sent.
  pub fn request(ty: Type, code: Code) -> Self {
    Message { id: Id(0),
              ty,
              ver: Default::default(),
              token: Token(Default::default()),
              code,
              opts: Default::default(),
              payload: Payload(Default::default()) }
  }

  /// Create the message that acknowledges transmission `id`:
  /// type [`Ack`](Type::Ack), code `0.00`, no token, options or payload.
  pub fn ack(id: Id) -> Self {
    Message { id,
              ty: Type::Ack,
              ver: Default::default(),
              token: Token(Default::default()),
              code: Code::EMPTY,
              opts: Default::default(),
              payload: Payload(Default::default()) }
  }

  /// Create the message that rejects transmission `id`:
  /// type [`Reset`](Type::Reset), code `0.00`, no token, options or payload.
  pub fn reset(id: Id) -> Self {
    Message { ty: Type::Reset,
              ..Self::ack(id) }
  }

  /// Whether this is the empty message (code `0.00`)
  pub fn is_empty(&self) -> bool {
    self.code == Code::EMPTY
  }

  /// Replace the payload with the given bytes
  pub fn set_payload(&mut self, bytes: impl IntoIterator<Item = u8>) {
    self.payload = Payload(bytes.into_iter().collect());
  }

  /// Insert an option, keeping the option list sorted by number.
  ///
  /// Repeated numbers are inserted after their peers, so insertion
  /// order is preserved per number.
  ///
  /// Returns the option back when the collection has no room left.
  pub fn add_opt(&mut self, number: OptNumber, value: V) -> Result<(), Opt<V>> {
    let opt = Opt { number,
                    value: OptValue(value) };

    if self.opts.is_full() {
      return Err(opt);
    }

    let ix = self.opts.iter().take_while(|o| o.number <= number).count();
    self.opts.insert_at(ix, opt);
    Ok(())
  }

  /// Find the first option with the given number
  pub fn get_opt(&self, number: OptNumber) -> Option<&Opt<V>> {
    self.opts.iter().find(|o| o.number == number)
  }
}

impl<P: Array<Item = u8>, V: Array<Item = u8>, O: Array<Item = Opt<V>>> GetSize
  for Message<P, O>
{
  fn get_size(&self) -> usize {
    let header_size = 4;
    let token_size = self.token.len();
    let opts_size = self.opts
                        .iter()
                        .fold((0usize, OptNumber(0)), |(size, prev), o| {
                          (size + o.wire_size(prev), o.number)
                        })
                        .0;
    let payload_size = if self.payload.0.size_is_zero() {
      0
    } else {
      1 + self.payload.0.get_size()
    };

    header_size + token_size + opts_size + payload_size
  }

  fn max_size(&self) -> Option<usize> {
    None
  }

  fn is_full(&self) -> bool {
    false
  }
}

impl<Bytes: AsRef<[u8]>,
      P: Array<Item = u8>,
      V: Array<Item = u8>,
      O: Array<Item = Opt<V>>> TryFromBytes<Bytes> for Message<P, O>
{
  type Error = MessageParseError;

  fn try_from_bytes(bytes: Bytes) -> Result<Self, Self::Error> {
    let mut bytes = Cursor::new(bytes);

    let (b1, code, id) = match bytes.take_exact(4) {
      | Some(&[b1, code, id_a, id_b]) => {
        (Byte1::from(b1), Code::from(code), Id::from_be_bytes([id_a, id_b]))
      },
      | _ => return Err(MessageParseError::ShortHeader),
    };

    let Byte1 { ver, ty, tkl } = b1;

    if ver.0 != 1 {
      return Err(MessageParseError::InvalidVersion(ver.0));
    }

    if tkl > 8 {
      return Err(MessageParseError::InvalidTokenLength(tkl));
    }

    let token = bytes.take_exact(tkl as usize)
                     .ok_or(MessageParseError::TruncatedToken)?;
    let token = Token(token.iter().copied().collect());

    let (opts, saw_marker) =
      opt::try_consume_opts::<V, O, _>(&mut bytes).map_err(MessageParseError::OptParseError)?;

    if saw_marker && bytes.remaining() == 0 {
      return Err(MessageParseError::MissingPayloadAfterMarker);
    }

    let mut payload = P::reserve(bytes.remaining());
    payload.extend(bytes.take_until_end().iter().copied());

    Ok(Message { id,
                 ty,
                 ver,
                 code,
                 token,
                 opts,
                 payload: Payload(payload) })
  }
}

/// Partial parse of a datagram's 4-byte fixed header into its type and
/// message id.
///
/// This succeeds whenever the header is present and carries a valid
/// version, regardless of whether the rest of the datagram would parse;
/// it is how a receiver rejects a malformed confirmable message with a
/// reset carrying the right id.
///
/// ```
/// use croak_msg::{parse_type_and_id, Id, Type};
///
/// // token length nibble of 9 is invalid, but the header is intact
/// let (ty, id) = parse_type_and_id(&[0b_01_00_1001, 0x45, 0x12, 0x34]).unwrap();
/// assert_eq!((ty, id), (Type::Con, Id(0x1234)));
/// ```
pub fn parse_type_and_id(bytes: &[u8]) -> Result<(Type, Id), MessageParseError> {
  match bytes {
    | &[b1, _, id_a, id_b, ..] => {
      let Byte1 { ver, ty, .. } = Byte1::from(b1);

      if ver.0 != 1 {
        Err(MessageParseError::InvalidVersion(ver.0))
      } else {
        Ok((ty, Id::from_be_bytes([id_a, id_b])))
      }
    },
    | _ => Err(MessageParseError::ShortHeader),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::VecMessage;

  #[test]
  fn parse_msg() {
    let (expect, bytes) = crate::test_msg();
    assert_eq!(VecMessage::try_from_bytes(&bytes).unwrap(), expect)
  }

  #[test]
  fn parse_byte1() {
    let byte = 0b_01_10_0011u8;
    let byte = Byte1::from(byte);
    assert_eq!(byte,
               Byte1 { ver: Version(1),
                       ty: Type::Ack,
                       tkl: 3 })
  }

  #[test]
  fn short_header() {
    assert_eq!(VecMessage::try_from_bytes(&[0x41u8, 0x01, 0x00]),
               Err(MessageParseError::ShortHeader));
  }

  #[test]
  fn bad_version() {
    assert_eq!(VecMessage::try_from_bytes(&[0b_11_00_0000u8, 0x01, 0x00, 0x01]),
               Err(MessageParseError::InvalidVersion(3)));
  }

  #[test]
  fn reserved_token_lengths() {
    for tkl in 9..=15u8 {
      assert_eq!(VecMessage::try_from_bytes(&[0b_0100_0000 | tkl, 0x01, 0x00, 0x01]),
                 Err(MessageParseError::InvalidTokenLength(tkl)));
    }
  }

  #[test]
  fn truncated_token() {
    // token length says 2, only 1 byte follows
    assert_eq!(VecMessage::try_from_bytes(&[0b_0100_0010u8, 0x01, 0x00, 0x01, 0xAA]),
               Err(MessageParseError::TruncatedToken));
  }

  #[test]
  fn marker_without_payload() {
    assert_eq!(VecMessage::try_from_bytes(&[0x40u8, 0x01, 0x00, 0x01, 0xFF]),
               Err(MessageParseError::MissingPayloadAfterMarker));
  }

  #[test]
  fn no_marker_means_empty_payload() {
    let msg = VecMessage::try_from_bytes(&[0x40u8, 0x01, 0x00, 0x01]).unwrap();
    assert!(msg.payload.0.is_empty());
    assert!(msg.opts.is_empty());
  }

  #[test]
  fn empty_ack_and_reset() {
    let ack = VecMessage::ack(Id(77));
    assert!(ack.is_empty());
    assert_eq!(ack.ty, Type::Ack);
    assert_eq!(ack.token.len(), 0);

    let rst = VecMessage::reset(Id(77));
    assert!(rst.is_empty());
    assert_eq!(rst.ty, Type::Reset);
    assert_eq!(rst.id, Id(77));
  }

  #[test]
  fn add_opt_sorts_and_preserves_insertion_order_per_number() {
    let mut msg = VecMessage::request(Type::Con, Code::GET);
    msg.add_opt(OptNumber(11), vec![1]).unwrap();
    msg.add_opt(OptNumber(4), vec![2]).unwrap();
    msg.add_opt(OptNumber(11), vec![3]).unwrap();

    let numbers_and_firsts = msg.opts
                                .iter()
                                .map(|o| (o.number.0, o.value.0[0]))
                                .collect::<Vec<_>>();
    assert_eq!(numbers_and_firsts, vec![(4, 2), (11, 1), (11, 3)]);
  }

  #[test]
  fn get_opt_finds_first_match() {
    let mut msg = VecMessage::request(Type::Con, Code::GET);
    msg.add_opt(OptNumber(12), vec![40]).unwrap();
    assert_eq!(msg.get_opt(OptNumber(12)).map(|o| &o.value.0[..]),
               Some(&[40u8][..]));
    assert_eq!(msg.get_opt(OptNumber(13)), None);
  }

  #[test]
  fn partial_parse_succeeds_when_full_parse_fails() {
    // token length nibble 9 fails the full parse
    let bytes = [0b_01_00_1001u8, 0x45, 0xBE, 0xEF];
    assert!(VecMessage::try_from_bytes(&bytes).is_err());
    assert_eq!(parse_type_and_id(&bytes), Ok((Type::Con, Id(0xBEEF))));
  }

  #[test]
  fn partial_parse_requires_header_and_version() {
    assert_eq!(parse_type_and_id(&[0x41, 0x01, 0x00]),
               Err(MessageParseError::ShortHeader));
    assert_eq!(parse_type_and_id(&[0b_10_00_0000, 0x01, 0x00, 0x01]),
               Err(MessageParseError::InvalidVersion(2)));
  }

  #[test]
  fn partial_parse_of_every_valid_header() {
    // any 4-byte prefix with version 1 partially parses
    for ty in 0..4u8 {
      for tkl in 0..16u8 {
        let b1 = 0b_0100_0000 | ty << 4 | tkl;
        assert!(parse_type_and_id(&[b1, 0xFF, 0x00, 0x00]).is_ok());
      }
    }
  }
}
