/// Errors encounterable while parsing a message from bytes
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub enum MessageParseError {
  /// The datagram was shorter than the 4-byte fixed header
  ShortHeader,

  /// The version bits were not `01`
  InvalidVersion(u8),

  /// The token length nibble was > 8 (9-15 are reserved)
  InvalidTokenLength(u8),

  /// The datagram ended before the token did
  TruncatedToken,

  /// Error parsing an option
  OptParseError(OptParseError),

  /// A payload marker (`0xFF`) was seen with zero bytes after it
  MissingPayloadAfterMarker,
}

/// Errors encounterable while parsing an option from bytes
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub enum OptParseError {
  /// The datagram ended in the middle of an option's
  /// header, extension bytes or value
  UnexpectedEndOfStream,

  /// The reserved delta nibble 15 was used outside of a payload marker
  OptionDeltaReservedValue(u8),

  /// The reserved length nibble 15 was used
  ValueLengthReservedValue(u8),

  /// There were more options than there was capacity to store them
  TooManyOptions(usize),
}

impl OptParseError {
  /// Shorthand for [`OptParseError::UnexpectedEndOfStream`]
  pub fn eof() -> Self {
    Self::UnexpectedEndOfStream
  }
}
