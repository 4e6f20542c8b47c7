use std::io;
use std::net::UdpSocket;

use crate::net::Socket;

impl Socket for UdpSocket {
  type Error = io::Error;

  fn send(&self, msg: &[u8]) -> nb::Result<(), Self::Error> {
    match UdpSocket::send(self, msg) {
      | Ok(n) if n == msg.len() => Ok(()),
      | Ok(n) => Err(nb::Error::Other(io::Error::new(io::ErrorKind::WriteZero,
                                                     format!("short datagram write: {} of {}",
                                                             n,
                                                             msg.len())))),
      | Err(e) => Err(io_to_nb(e)),
    }
  }

  fn recv(&self, buffer: &mut [u8]) -> nb::Result<usize, Self::Error> {
    UdpSocket::recv(self, buffer).map_err(io_to_nb)
  }
}

fn io_to_nb(err: io::Error) -> nb::Error<io::Error> {
  match err.kind() {
    | io::ErrorKind::WouldBlock => nb::Error::WouldBlock,
    | _ => nb::Error::Other(err),
  }
}
