/// A connected CoAP network socket.
///
/// This mirrors the Udp socket traits in embedded-nal, but allows us to
/// implement them for foreign types (like `std::net::UdpSocket`).
///
/// The contract is a *connected* datagram peer: the socket already
/// knows who it is talking to, both operations are non-blocking, and
/// "nothing to read" is [`nb::Error::WouldBlock`], which is what lets
/// the exchange engine multiplex the socket with its timers from a
/// single poll point.
pub trait Socket {
  /// The error yielded by socket operations
  type Error: core::fmt::Debug;

  /// Send one whole datagram to the connected peer.
  ///
  /// Datagrams are atomic; a short write is an error, not a partial
  /// success.
  fn send(&self, msg: &[u8]) -> nb::Result<(), Self::Error>;

  /// Receive one datagram from the connected peer into `buffer`,
  /// returning how many bytes were written.
  ///
  /// A datagram larger than `buffer` may be silently truncated (like
  /// [`std::net::UdpSocket`]); the caller treats whatever arrives as
  /// the whole message.
  fn recv(&self, buffer: &mut [u8]) -> nb::Result<usize, Self::Error>;
}
