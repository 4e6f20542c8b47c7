/// Trait for fallibly converting a byte buffer into some type
pub trait TryFromBytes<T>: Sized {
  /// Error yielded when the bytes do not describe a valid `Self`
  type Error;

  /// Try to convert a buffer of bytes into `Self`
  fn try_from_bytes(bytes: T) -> Result<Self, Self::Error>;
}
