use croak_msg::{parse_type_and_id, Id, Token, Type, TryFromBytes, TryIntoBytes};
use embedded_time::Instant;
use log::{debug, info};
use no_std_net::SocketAddr;

use crate::config::Config;
use crate::net::Socket;
use crate::rand::Entropy;
use crate::retry::{Attempts, Backoff};
use crate::time::{Clock, Timer};
use crate::{Dgram, Message, MAX_DGRAM_LEN};

/// Errors yielded by an exchange
#[derive(Debug, Clone, PartialEq)]
pub enum Error<E> {
  /// The request was not something this client can send: wrong message
  /// type (only CON and NON requests go out), a code outside the
  /// request class, an unparseable host, or a message too large for
  /// the datagram buffer
  InvalidArgument,

  /// The transport failed; the exchange is aborted immediately
  Io(E),

  /// A received message could not be parsed and the exchange could not
  /// continue.
  ///
  /// The engine itself absorbs parse failures (they are logged, and a
  /// malformed confirmable datagram is answered with Reset), so this
  /// variant is left to callers driving [`Exchange`] by hand behind
  /// transports that cannot keep going after a bad datagram.
  FormatError,

  /// The retransmission budget was spent without an acknowledgement,
  /// or the response never arrived
  Timeout,

  /// The peer rejected the request with a Reset
  PeerReset,

  /// [`Exchange::cancel`] was observed mid-wait
  Cancelled,

  /// The monotonic clock failed to produce a reading
  Clock,
}

/// A blocking CoAP client for a single server peer.
///
/// One client owns one connected socket and one clock, and runs one
/// exchange at a time; for concurrent requests, create more clients.
#[allow(missing_debug_implementations)]
pub struct Client<Sock: Socket, C: Clock> {
  sock: Sock,
  clock: C,
  peer: SocketAddr,
  entropy: Entropy,
  config: Config,
}

impl Client<std::net::UdpSocket, crate::std::Clock> {
  /// Create a client talking UDP/IPv6 to `host:port`.
  ///
  /// `host` must be an IPv6 literal (the reference transport is
  /// AF_INET6; use [`Client::new`] with your own socket for anything
  /// else). The socket is bound to an ephemeral port, connected, and
  /// switched to non-blocking mode. Everything is released on drop.
  ///
  /// ```no_run
  /// use croak::client::Client;
  /// use croak::Message;
  /// use croak_msg::{Code, Type};
  ///
  /// let mut client = Client::new_std("::1", 5683).unwrap();
  /// let resp = client.exchange(Message::request(Type::Con, Code::GET)).unwrap();
  /// ```
  pub fn new_std(host: &str, port: u16) -> Result<Self, Error<std::io::Error>> {
    let ip: std::net::Ipv6Addr = host.parse().map_err(|_| Error::InvalidArgument)?;

    let sock =
      std::net::UdpSocket::bind((std::net::Ipv6Addr::UNSPECIFIED, 0)).map_err(Error::Io)?;
    sock.connect((ip, port)).map_err(Error::Io)?;
    sock.set_nonblocking(true).map_err(Error::Io)?;

    let [a, b, c, d, e, f, g, h] = ip.segments();
    let peer =
      SocketAddr::V6(no_std_net::SocketAddrV6::new(no_std_net::Ipv6Addr::new(a, b, c, d, e, f,
                                                                             g, h),
                                                   port,
                                                   0,
                                                   0));

    Self::new(sock, crate::std::Clock::new(), peer, Config::default())
  }
}

impl<Sock: Socket, C: Clock> Client<Sock, C> {
  /// Create a client from an already-connected socket and a clock.
  ///
  /// `peer` is only used for diagnostics; the socket is assumed to be
  /// connected to it. The client's random source is seeded from the
  /// clock here, once.
  pub fn new(sock: Sock, clock: C, peer: SocketAddr, config: Config) -> Result<Self, Error<Sock::Error>> {
    let entropy = Entropy::from_clock(&clock).map_err(|_| Error::Clock)?;

    info!(target: "croak", "connected to {}", peer);

    Ok(Self { sock,
              clock,
              peer,
              entropy,
              config })
  }

  /// Send `req` and block until its response arrives.
  ///
  /// The request's message id and token are overwritten with fresh
  /// random values. `req` must be of type [`Con`](Type::Con) or
  /// [`Non`](Type::Non) and carry a request-class code.
  ///
  /// A confirmable request is retransmitted on a jittered, doubling
  /// timeout until acknowledged; the response may ride piggy-backed on
  /// the acknowledgement or arrive separately later (in which case a
  /// confirmable response is acknowledged before this returns).
  pub fn exchange(&mut self, req: Message) -> Result<Message, Error<Sock::Error>> {
    let mut exchange = self.begin(req)?;
    nb::block!(exchange.poll())
  }

  /// Validate and send `req`, returning the in-flight [`Exchange`].
  ///
  /// This is `exchange` without the blocking wait: callers that need
  /// cancellation or their own scheduling drive [`Exchange::poll`]
  /// themselves.
  pub fn begin(&mut self, mut req: Message) -> Result<Exchange<'_, Sock, C>, Error<Sock::Error>> {
    match req.ty {
      | Type::Con | Type::Non => (),
      | _ => return Err(Error::InvalidArgument),
    }

    if req.code.class != 0 {
      return Err(Error::InvalidArgument);
    }

    let id = self.entropy.id();
    let token = self.entropy.token();
    req.id = id;
    req.token = token;

    let confirmable = req.ty == Type::Con;

    match req.ty {
      | Type::Con => info!(target: "croak", "sending confirmable request to {}", self.peer),
      | _ => info!(target: "croak", "sending non-confirmable request to {}", self.peer),
    }

    let req_bytes = req.try_into_bytes::<Dgram>().map_err(|_| Error::InvalidArgument)?;
    self.send_bytes(&req_bytes)?;

    let now = self.clock.try_now().map_err(|_| Error::Clock)?;
    let mut timer = Timer::new();

    let (state, backoff) = if confirmable {
      let initial = self.entropy.range_millis(self.config.con.init_timeout_min,
                                              self.config.con.init_timeout_max);
      debug!(target: "croak", "acknowledgement timeout initialised to {} ms", initial.0);
      info!(target: "croak", "expecting acknowledgement from {}", self.peer);
      timer.arm(now, initial);
      (State::AckWait, Backoff::new(initial, self.config.con.max_attempts))
    } else {
      debug!(target: "croak", "response timeout initialised to {} ms", self.config.resp_timeout.0);
      info!(target: "croak", "expecting response from {}", self.peer);
      timer.arm(now, self.config.resp_timeout);
      (State::RespWait, Backoff::new(self.config.resp_timeout, Attempts(0)))
    };

    Ok(Exchange { client: self,
                  req_bytes,
                  id,
                  token,
                  state,
                  timer,
                  backoff,
                  cancelled: false })
  }

  fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), Error<Sock::Error>> {
    nb::block!(self.sock.send(bytes)).map_err(Error::Io)?;
    debug!(target: "croak", "sent {} bytes to {}", bytes.len(), self.peer);
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  AckWait,
  RespWait,
}

/// An in-flight request/response exchange.
///
/// The exchange owns the serialized request (for retransmission), the
/// correlation state (message id & token) and the timer. The only wait
/// point is [`poll`](Exchange::poll): it checks the socket, then the
/// timer, and reports [`nb::Error::WouldBlock`] when neither has
/// anything to say. A plain `nb::block!` gives the blocking behavior
/// of [`Client::exchange`], and anything fancier (cancellation,
/// integrating with another event loop) stays possible.
#[allow(missing_debug_implementations)]
pub struct Exchange<'a, Sock: Socket, C: Clock> {
  client: &'a mut Client<Sock, C>,
  req_bytes: Dgram,
  id: Id,
  token: Token,
  state: State,
  timer: Timer<C>,
  backoff: Backoff,
  cancelled: bool,
}

impl<'a, Sock: Socket, C: Clock> Exchange<'a, Sock, C> {
  /// Drive the exchange one step.
  ///
  /// Returns the response on completion, `WouldBlock` while the
  /// exchange is still waiting on the peer or a timer, and any of the
  /// terminal [`Error`]s otherwise.
  pub fn poll(&mut self) -> nb::Result<Message, Error<Sock::Error>> {
    if self.cancelled {
      return Err(nb::Error::Other(Error::Cancelled));
    }

    let mut buf = [0u8; MAX_DGRAM_LEN];
    match self.client.sock.recv(&mut buf) {
      | Ok(n) => {
        debug!(target: "croak", "received {} bytes from {}", n, self.client.peer);
        return match self.handle_dgram(&buf[..n]).map_err(nb::Error::Other)? {
          | Some(resp) => Ok(resp),
          | None => Err(nb::Error::WouldBlock),
        };
      },
      | Err(nb::Error::WouldBlock) => (),
      | Err(nb::Error::Other(e)) => return Err(nb::Error::Other(Error::Io(e))),
    }

    let now = self.try_now().map_err(nb::Error::Other)?;

    if self.timer.ready(now) {
      self.timer.acknowledge();

      match self.state {
        | State::AckWait => {
          debug!(target: "croak", "transaction expired for {}", self.client.peer);
          match self.backoff.next() {
            | Some(dur) => {
              self.timer.arm(now, dur);
              debug!(target: "croak", "timeout doubled to {} ms", dur.0);
              debug!(target: "croak", "retransmitting to {}", self.client.peer);
              self.client.send_bytes(&self.req_bytes).map_err(nb::Error::Other)?;
            },
            | None => {
              info!(target: "croak", "no acknowledgement received from {}", self.client.peer);
              return Err(nb::Error::Other(Error::Timeout));
            },
          }
        },
        | State::RespWait => {
          info!(target: "croak", "no response received from {}", self.client.peer);
          return Err(nb::Error::Other(Error::Timeout));
        },
      }
    }

    Err(nb::Error::WouldBlock)
  }

  /// Ask the exchange to stop.
  ///
  /// The next [`poll`](Exchange::poll) reports [`Error::Cancelled`];
  /// nothing further is sent and the request is not mutated.
  pub fn cancel(&mut self) {
    self.cancelled = true;
  }

  fn try_now(&self) -> Result<Instant<C>, Error<Sock::Error>> {
    self.client.clock.try_now().map_err(|_| Error::Clock)
  }

  fn handle_dgram(&mut self, dgram: &[u8]) -> Result<Option<Message>, Error<Sock::Error>> {
    let msg = match Message::try_from_bytes(dgram) {
      | Ok(msg) => msg,
      | Err(e) => {
        debug!(target: "croak", "dropping malformed datagram from {}: {:?}", self.client.peer, e);

        // a malformed CON still gets a Reset; anything else is
        // dropped without an answer
        if let Ok((Type::Con, id)) = parse_type_and_id(dgram) {
          self.send_reset(id)?;
        }

        return Ok(None);
      },
    };

    match self.state {
      | State::AckWait => self.handle_ack_wait(msg),
      | State::RespWait => self.handle_resp_wait(msg),
    }
  }

  /// Waiting for the acknowledgement of a confirmable request:
  /// piggy-backed response, empty ack + separate response, reset, or a
  /// response that overtook the ack.
  fn handle_ack_wait(&mut self, msg: Message) -> Result<Option<Message>, Error<Sock::Error>> {
    if msg.id == self.id {
      match msg.ty {
        | Type::Ack if msg.is_empty() => {
          info!(target: "croak", "received acknowledgement from {}", self.client.peer);
          self.enter_resp_wait()?;
          return Ok(None);
        },
        | Type::Ack if msg.token == self.token => {
          info!(target: "croak", "received acknowledgement and response from {}", self.client.peer);
          return Ok(Some(msg));
        },
        | Type::Reset => {
          info!(target: "croak", "received reset from {}", self.client.peer);
          return Err(Error::PeerReset);
        },
        | _ => (),
      }
    } else if msg.token == self.token {
      // the transport may not preserve order: the confirmable message
      // carrying the response can arrive before the acknowledgement,
      // and then it also terminates the retransmission sequence
      match msg.ty {
        | Type::Con => {
          info!(target: "croak", "received confirmable response from {}", self.client.peer);
          self.send_ack(msg.id)?;
          return Ok(Some(msg));
        },
        | Type::Non => {
          info!(target: "croak", "received non-confirmable response from {}", self.client.peer);
          return Ok(Some(msg));
        },
        | _ => (),
      }
    }

    self.reject(&msg)?;
    Ok(None)
  }

  /// Waiting for the response proper: after the empty ack of a
  /// confirmable request, or from the start for a non-confirmable one.
  fn handle_resp_wait(&mut self, msg: Message) -> Result<Option<Message>, Error<Sock::Error>> {
    if msg.id == self.id && msg.ty == Type::Reset {
      info!(target: "croak", "received reset from {}", self.client.peer);
      return Err(Error::PeerReset);
    }

    if msg.token == self.token {
      match msg.ty {
        | Type::Con => {
          info!(target: "croak", "received confirmable response from {}", self.client.peer);
          self.send_ack(msg.id)?;
          return Ok(Some(msg));
        },
        | Type::Non => {
          info!(target: "croak", "received non-confirmable response from {}", self.client.peer);
          return Ok(Some(msg));
        },
        | _ => (),
      }
    }

    self.reject(&msg)?;
    Ok(None)
  }

  fn enter_resp_wait(&mut self) -> Result<(), Error<Sock::Error>> {
    let now = self.try_now()?;
    let dur = self.client.config.resp_timeout;

    self.timer.arm(now, dur);
    debug!(target: "croak", "response timeout initialised to {} ms", dur.0);
    info!(target: "croak", "expecting response from {}", self.client.peer);

    self.state = State::RespWait;
    Ok(())
  }

  /// An unexpected message is answered with Reset when confirmable and
  /// dropped otherwise; Reset in response to an unsolicited NON is not
  /// allowed.
  fn reject(&mut self, msg: &Message) -> Result<(), Error<Sock::Error>> {
    match msg.ty {
      | Type::Con => {
        info!(target: "croak", "rejecting confirmable message from {}", self.client.peer);
        self.send_reset(msg.id)
      },
      | _ => {
        info!(target: "croak", "rejecting non-confirmable message from {}", self.client.peer);
        Ok(())
      },
    }
  }

  fn send_ack(&mut self, id: Id) -> Result<(), Error<Sock::Error>> {
    info!(target: "croak", "acknowledging confirmable message from {}", self.client.peer);
    self.send_empty(Message::ack(id))
  }

  fn send_reset(&mut self, id: Id) -> Result<(), Error<Sock::Error>> {
    self.send_empty(Message::reset(id))
  }

  fn send_empty(&mut self, msg: Message) -> Result<(), Error<Sock::Error>> {
    let bytes = msg.try_into_bytes::<Dgram>().map_err(|_| Error::InvalidArgument)?;
    self.client.send_bytes(&bytes)
  }
}

#[cfg(test)]
mod tests {
  use croak_msg::Code;

  use super::*;
  use crate::test::{ClockMock, SockMock};
  use crate::time::Millis;

  fn test_peer() -> SocketAddr {
    let localhost = no_std_net::Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1);
    SocketAddr::V6(no_std_net::SocketAddrV6::new(localhost, 5683, 0, 0))
  }

  fn setup() -> (Client<SockMock, ClockMock>, SockMock, ClockMock) {
    let sock = SockMock::new();
    let clock = ClockMock::new();
    let (sock_handle, clock_handle) = (sock.clone(), clock.clone());

    let client = Client::new(sock, clock, test_peer(), Config::default()).unwrap();
    (client, sock_handle, clock_handle)
  }

  /// Replay the draws the client makes for its first exchange:
  /// (message id, token, initial ack timeout in ms)
  fn first_draws() -> (Id, Token, u64) {
    let mut entropy = Entropy::seeded(0);
    let id = entropy.id();
    let token = entropy.token();
    let jitter = entropy.range_millis(Millis::new(2_000), Millis::new(3_000));
    (id, token, jitter.0)
  }

  fn bytes_of(msg: Message) -> Vec<u8> {
    msg.try_into_bytes::<Dgram>().unwrap().to_vec()
  }

  fn parse(bytes: &[u8]) -> Message {
    Message::try_from_bytes(bytes).unwrap()
  }

  #[test]
  fn request_must_be_con_or_non() {
    let (mut client, ..) = setup();

    for ty in [Type::Ack, Type::Reset] {
      assert_eq!(client.begin(Message::request(ty, Code::GET)).err(),
                 Some(Error::InvalidArgument));
    }
  }

  #[test]
  fn request_code_must_be_request_class() {
    let (mut client, sock, _) = setup();

    assert_eq!(client.begin(Message::request(Type::Con, Code::new(2, 5))).err(),
               Some(Error::InvalidArgument));
    assert_eq!(sock.sent_count(), 0);
  }

  #[test]
  fn request_gets_fresh_id_and_token() {
    let (mut client, sock, _) = setup();
    let (id, token, _) = first_draws();

    let mut req = Message::request(Type::Con, Code::GET);
    req.id = Id(42);

    client.begin(req).unwrap();

    let sent = parse(&sock.sent()[0]);
    assert_eq!(sent.id, id);
    assert_eq!(sent.token, token);
    assert_eq!(sent.token.len(), 4);
    assert_ne!(sent.id, Id(42));
  }

  #[test]
  fn piggy_backed_response() {
    let (mut client, sock, _) = setup();
    let (id, token, _) = first_draws();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();
    assert_eq!(sock.sent_count(), 1);

    let mut resp = Message::request(Type::Ack, Code::new(2, 5));
    resp.id = id;
    resp.token = token;
    resp.set_payload(*b"OK");
    sock.push_rx(bytes_of(resp));

    let got = ex.poll().unwrap();
    assert_eq!(got.code, Code::new(2, 5));
    assert_eq!(&got.payload.0[..], b"OK");

    // no retransmission, and a piggy-backed response is not acked
    assert_eq!(sock.sent_count(), 1);
  }

  #[test]
  fn separate_response_is_acked() {
    let (mut client, sock, clock) = setup();
    let (id, token, _) = first_draws();

    let mut ex = client.begin(Message::request(Type::Con, Code::PUT)).unwrap();

    // empty ack: the response will arrive separately
    sock.push_rx(bytes_of(Message::ack(id)));
    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));
    assert_eq!(sock.sent_count(), 1);

    // response shows up 5 seconds later as a fresh CON with our token
    clock.set(5_000);
    let mut resp = Message::request(Type::Con, Code::new(2, 4));
    resp.id = Id(0x0999);
    resp.token = token;
    sock.push_rx(bytes_of(resp));

    let got = ex.poll().unwrap();
    assert_eq!(got.code, Code::new(2, 4));

    // the separate CON response was acked with its own id
    let ack = parse(&sock.sent()[1]);
    assert_eq!(ack.ty, Type::Ack);
    assert_eq!(ack.id, Id(0x0999));
    assert!(ack.is_empty());
    assert_eq!(ack.token.len(), 0);
  }

  #[test]
  fn empty_ack_switches_to_the_response_timeout() {
    let (mut client, sock, clock) = setup();
    let (id, ..) = first_draws();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();

    clock.set(1_000);
    sock.push_rx(bytes_of(Message::ack(id)));
    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));

    // no retransmissions once acked, even way past the backoff schedule
    clock.set(30_999);
    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));
    assert_eq!(sock.sent_count(), 1);

    // the 30 s response timer runs from the ack
    clock.set(31_000);
    assert_eq!(ex.poll(), Err(nb::Error::Other(Error::Timeout)));
  }

  #[test]
  fn non_request_times_out_after_30s_with_one_send() {
    let (mut client, sock, clock) = setup();

    let mut ex = client.begin(Message::request(Type::Non, Code::POST)).unwrap();
    assert_eq!(sock.sent_count(), 1);

    clock.set(29_999);
    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));

    clock.set(30_000);
    assert_eq!(ex.poll(), Err(nb::Error::Other(Error::Timeout)));
    assert_eq!(sock.sent_count(), 1);
  }

  #[test]
  fn non_request_accepts_a_non_response() {
    let (mut client, sock, _) = setup();
    let (_, token, _) = first_draws();

    let mut ex = client.begin(Message::request(Type::Non, Code::GET)).unwrap();

    let mut resp = Message::request(Type::Non, Code::new(2, 5));
    resp.id = Id(7);
    resp.token = token;
    sock.push_rx(bytes_of(resp));

    assert_eq!(ex.poll().unwrap().code, Code::new(2, 5));
    // NON responses are not acked
    assert_eq!(sock.sent_count(), 1);
  }

  #[test]
  fn retransmission_schedule_doubles_the_jittered_timeout() {
    let (mut client, sock, clock) = setup();
    let (_, _, d) = first_draws();
    assert!((2_000..3_000).contains(&d));

    let mut ex = client.begin(Message::request(Type::Con, Code::DELETE)).unwrap();

    // sends happen at t0, t0+d, t0+3d, t0+7d, t0+15d
    let send_times = [d, 3 * d, 7 * d, 15 * d];

    for (n, at) in send_times.into_iter().enumerate() {
      clock.set(at - 1);
      assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));
      assert_eq!(sock.sent_count(), n + 1, "no early send before t={}", at);

      clock.set(at);
      assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));
      assert_eq!(sock.sent_count(), n + 2, "retransmission at t={}", at);
    }

    // every transmission is byte-identical
    let sent = sock.sent();
    assert!(sent.iter().all(|dgram| dgram == &sent[0]));

    // the 5th interval (16d) expires the exchange
    clock.set(31 * d - 1);
    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));

    clock.set(31 * d);
    assert_eq!(ex.poll(), Err(nb::Error::Other(Error::Timeout)));
    assert_eq!(sock.sent_count(), 5);
  }

  #[test]
  fn reset_from_peer_fails_the_exchange() {
    let (mut client, sock, _) = setup();
    let (id, ..) = first_draws();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();

    sock.push_rx(bytes_of(Message::reset(id)));
    assert_eq!(ex.poll(), Err(nb::Error::Other(Error::PeerReset)));
  }

  #[test]
  fn reset_while_waiting_for_separate_response() {
    let (mut client, sock, _) = setup();
    let (id, ..) = first_draws();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();

    sock.push_rx(bytes_of(Message::ack(id)));
    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));

    sock.push_rx(bytes_of(Message::reset(id)));
    assert_eq!(ex.poll(), Err(nb::Error::Other(Error::PeerReset)));
  }

  #[test]
  fn reordered_con_response_ends_retransmission() {
    let (mut client, sock, _) = setup();
    let (_, token, _) = first_draws();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();

    // the CON response overtakes the ack: different id, our token
    let mut resp = Message::request(Type::Con, Code::new(2, 5));
    resp.id = Id(0x0ACE);
    resp.token = token;
    sock.push_rx(bytes_of(resp));

    let got = ex.poll().unwrap();
    assert_eq!(got.id, Id(0x0ACE));

    // request + ack of the response, and no retransmission ever fired
    assert_eq!(sock.sent_count(), 2);
    assert_eq!(parse(&sock.sent()[1]).ty, Type::Ack);
  }

  #[test]
  fn token_mismatch_in_piggy_backed_ack_is_dropped() {
    let (mut client, sock, _) = setup();
    let (id, ..) = first_draws();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();

    let mut resp = Message::request(Type::Ack, Code::new(2, 5));
    resp.id = id;
    resp.token = Token::try_from_slice(&[9, 9, 9, 9]).unwrap();
    sock.push_rx(bytes_of(resp));

    // an ack is not confirmable, so the reject is a silent drop
    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));
    assert_eq!(sock.sent_count(), 1);
  }

  #[test]
  fn stray_con_is_rejected_with_reset_and_the_wait_continues() {
    let (mut client, sock, _) = setup();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();

    // a CON that matches neither our id nor our token
    let mut stray = Message::request(Type::Con, Code::new(2, 5));
    stray.id = Id(0x0BAD);
    stray.token = Token::try_from_slice(&[1, 2]).unwrap();
    sock.push_rx(bytes_of(stray));

    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));

    let rst = parse(&sock.sent()[1]);
    assert_eq!(rst.ty, Type::Reset);
    assert_eq!(rst.id, Id(0x0BAD));
    assert!(rst.is_empty());
  }

  #[test]
  fn stray_non_is_dropped_silently() {
    let (mut client, sock, _) = setup();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();

    let mut stray = Message::request(Type::Non, Code::new(2, 5));
    stray.id = Id(0x0BAD);
    stray.token = Token::try_from_slice(&[1, 2]).unwrap();
    sock.push_rx(bytes_of(stray));

    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));
    assert_eq!(sock.sent_count(), 1);
  }

  #[test]
  fn malformed_con_datagram_gets_a_reset_with_its_id() {
    let (mut client, sock, clock) = setup();
    let (_, _, d) = first_draws();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();

    // version 1, type CON, token length nibble 9 (reserved): parse fails
    sock.push_rx(vec![0b_01_00_1001u8, 0x45, 0x12, 0x34]);

    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));

    let rst = parse(&sock.sent()[1]);
    assert_eq!(rst.ty, Type::Reset);
    assert_eq!(rst.id, Id(0x1234));

    // the exchange keeps waiting and eventually retransmits on schedule
    clock.set(d);
    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));
    assert_eq!(sock.sent_count(), 3);
  }

  #[test]
  fn malformed_non_datagram_is_dropped_without_a_reset() {
    let (mut client, sock, _) = setup();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();

    // version 1, type NON, token length nibble 9
    sock.push_rx(vec![0b_01_01_1001u8, 0x45, 0x12, 0x34]);

    assert_eq!(ex.poll(), Err(nb::Error::WouldBlock));
    assert_eq!(sock.sent_count(), 1);
  }

  #[test]
  fn cancel_surfaces_on_the_next_poll() {
    let (mut client, sock, _) = setup();

    let mut ex = client.begin(Message::request(Type::Con, Code::GET)).unwrap();
    ex.cancel();

    assert_eq!(ex.poll(), Err(nb::Error::Other(Error::Cancelled)));
    assert_eq!(sock.sent_count(), 1);
  }

  #[test]
  fn io_error_aborts_immediately() {
    struct BrokenSock;
    impl Socket for BrokenSock {
      type Error = &'static str;

      fn send(&self, _: &[u8]) -> nb::Result<(), Self::Error> {
        Err(nb::Error::Other("wire cut"))
      }

      fn recv(&self, _: &mut [u8]) -> nb::Result<usize, Self::Error> {
        Err(nb::Error::Other("wire cut"))
      }
    }

    let mut client =
      Client::new(BrokenSock, ClockMock::new(), test_peer(), Config::default()).unwrap();

    assert_eq!(client.exchange(Message::request(Type::Con, Code::GET)).err(),
               Some(Error::Io("wire cut")));
  }

  #[test]
  fn initial_timeouts_are_jittered_within_the_rfc_window() {
    for seed in 0..1_000u64 {
      let mut entropy = Entropy::seeded(seed);
      entropy.id();
      entropy.token();

      let d = entropy.range_millis(Millis::new(2_000), Millis::new(3_000)).0;
      assert!((2_000..3_000).contains(&d), "seed {} drew {}", seed, d);
    }
  }

  #[test]
  fn exchange_blocks_until_the_piggy_backed_response() {
    let (mut client, sock, _) = setup();
    let (id, token, _) = first_draws();

    // queue the response before the request goes out; `exchange` will
    // block-poll straight through to it
    let mut resp = Message::request(Type::Ack, Code::new(2, 5));
    resp.id = id;
    resp.token = token;
    sock.push_rx(bytes_of(resp));

    let got = client.exchange(Message::request(Type::Con, Code::GET)).unwrap();
    assert_eq!(got.code, Code::new(2, 5));
  }
}
