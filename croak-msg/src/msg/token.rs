use tinyvec::ArrayVec;

#[allow(unused_imports)]
use crate::Id;

/// # Token
///
/// 0-8 byte opaque value correlating a response with its request.
///
/// Note that this is different from [`Id`], which matches an
/// Acknowledgement or Reset to the specific transmission it answers;
/// a separate response arrives under a fresh [`Id`] but carries the
/// request's token.
///
/// See [RFC7252 - Message Details](https://datatracker.ietf.org/doc/html/rfc7252#section-3) for context
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Token(pub ArrayVec<[u8; 8]>);

/// A token was created from more than 8 bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct InvalidTokenLength(pub usize);

impl Token {
  /// Create a token from a byte slice,
  /// failing for slices longer than 8 bytes
  ///
  /// ```
  /// use croak_msg::Token;
  ///
  /// assert_eq!(Token::try_from_slice(&[1, 2, 3, 4]).unwrap().len(), 4);
  /// assert!(Token::try_from_slice(&[0; 9]).is_err());
  /// ```
  pub fn try_from_slice(bytes: &[u8]) -> Result<Token, InvalidTokenLength> {
    if bytes.len() > 8 {
      Err(InvalidTokenLength(bytes.len()))
    } else {
      Ok(Token(bytes.iter().copied().collect()))
    }
  }

  /// Length of the token, in bytes
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Whether the token is the 0-byte empty token
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
