use croak_common::{Array, GetSize};
use tinyvec::ArrayVec;

use crate::msg::{Byte1, Message, Opt, OptNumber};

/// The largest value a 4-bit option field can carry with the 2-byte
/// extension: `65535 + 269`
pub(crate) const MAX_OPT_FIELD: u32 = 65535 + 269;

/// Trait allowing fallible conversion into bytes
pub trait TryIntoBytes {
  /// Error yielded when `Self` cannot be serialized
  type Error;

  /// Try to convert into a collection of bytes
  ///
  /// ```
  /// use croak_msg::{ArrayVecMessage, Code, TryIntoBytes, Type};
  ///
  /// let msg = ArrayVecMessage::<1024, 128, 16>::request(Type::Con, Code::GET);
  ///
  /// let bytes: tinyvec::ArrayVec<[u8; 1024]> = msg.try_into_bytes().unwrap();
  ///
  /// // This one uses Vec
  /// let msg = croak_msg::VecMessage::request(Type::Con, Code::GET);
  ///
  /// let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
  /// ```
  fn try_into_bytes<C: Array<Item = u8>>(self) -> Result<C, Self::Error>;
}

/// Errors encounterable serializing to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageToBytesError {
  /// Reserved capacity was not enough for size of message
  TooLong {
    /// Size of the output buffer
    capacity: usize,
    /// Wire size of the message
    size: usize,
  },

  /// An option value was longer than the wire format can express
  /// (65535 + 269 bytes)
  OptionValueTooLong {
    /// Length of the offending value
    actual: usize,
  },

  /// The gap between two consecutive option numbers was wider than
  /// the wire format can express (65535 + 269)
  OptionDeltaTooLarge {
    /// The unencodable delta
    delta: u32,
  },
}

/// Encode a delta or length field: the 4-bit nibble plus 0-2 extension
/// bytes. Callers check `val <= MAX_OPT_FIELD` first.
pub(crate) fn encode_ext(val: u32) -> (u8, ArrayVec<[u8; 2]>) {
  match val {
    | n if n >= 269 => {
      let mut bytes = ArrayVec::new();
      bytes.extend(((n - 269) as u16).to_be_bytes());
      (14, bytes)
    },
    | n if n >= 13 => {
      let mut bytes = ArrayVec::new();
      bytes.push((n - 13) as u8);
      (13, bytes)
    },
    | n => (n as u8, ArrayVec::new()),
  }
}

/// Stable insertion sort; options with equal numbers keep their
/// relative order, which is what gives repeated options a
/// deterministic wire order.
fn sort_opts<V: Array<Item = u8>>(opts: &mut [Opt<V>]) {
  for i in 1..opts.len() {
    let mut j = i;
    while j > 0 && opts[j - 1].number > opts[j].number {
      opts.swap(j - 1, j);
      j -= 1;
    }
  }
}

impl<P: Array<Item = u8>, V: Array<Item = u8>, O: Array<Item = Opt<V>>> TryIntoBytes
  for Message<P, O>
{
  type Error = MessageToBytesError;

  fn try_into_bytes<C: Array<Item = u8>>(mut self) -> Result<C, Self::Error> {
    // options may have been stored out of order (e.g. by writing the
    // `opts` field directly); the wire requires ascending numbers
    sort_opts(&mut self.opts);

    let size: usize = self.get_size();
    let mut bytes = C::reserve(size);

    if let Some(max) = bytes.max_size() {
      if max < size {
        return Err(MessageToBytesError::TooLong { capacity: max,
                                                  size });
      }
    }

    let byte1: u8 = Byte1 { ver: self.ver,
                            ty: self.ty,
                            tkl: self.token.len() as u8 }.into();

    bytes.extend(Some(byte1));
    bytes.extend(Some(u8::from(self.code)));
    bytes.extend(self.id.0.to_be_bytes());
    bytes.extend(self.token.0);

    let mut prev = OptNumber(0);
    for opt in self.opts {
      prev = opt.extend_bytes(prev, &mut bytes)?;
    }

    if !self.payload.0.size_is_zero() {
      bytes.extend(Some(0b11111111));
      bytes.extend(self.payload.0);
    }

    Ok(bytes)
  }
}
