/// # Message Code
///
/// 8-bit value split into a 3-bit class and a 5-bit detail,
/// written `c.dd` (e.g. `2.05` Content, `4.04` Not Found).
///
/// See [RFC7252 - Message Details](https://datatracker.ietf.org/doc/html/rfc7252#section-3) for context
///
/// # Examples
/// ```
/// use croak_msg::Code;
///
/// let chars = Code { class: 2, detail: 5 }.to_human();
/// assert_eq!(String::from_iter(chars), "2.05".to_string());
/// ```
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Code {
  /// The "class" of message codes identify it as a request or response, and provides the class of response status:
  ///
  /// |class|meaning|
  /// |---|---|
  /// |`0`|Message is a request (or empty, when detail is also 0)|
  /// |`2`|Message is a success response|
  /// |`4`|Message is a client error response|
  /// |`5`|Message is a server error response|
  pub class: u8,

  /// 2-digit integer (range `[0, 32)`) that provides granular information about the response status.
  pub detail: u8,
}

/// What a [`Code`] identifies its message as
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CodeKind {
  /// `0.00`; carries no request or response, e.g. an
  /// acknowledgement or reset
  Empty,
  /// Class 0 with a non-zero detail; a request method
  Request,
  /// Class 2, 4 or 5; a response status
  Response,
  /// Class 1, 3, 6 or 7; reserved by the RFC
  Reserved,
}

impl Code {
  /// The empty code `0.00`
  pub const EMPTY: Code = Code::new(0, 0);

  /// Method GET (`0.01`)
  pub const GET: Code = Code::new(0, 1);

  /// Method POST (`0.02`)
  pub const POST: Code = Code::new(0, 2);

  /// Method PUT (`0.03`)
  pub const PUT: Code = Code::new(0, 3);

  /// Method DELETE (`0.04`)
  pub const DELETE: Code = Code::new(0, 4);

  /// Create a new Code
  ///
  /// ```
  /// use croak_msg::Code;
  ///
  /// let content = Code::new(2, 05);
  /// ```
  pub const fn new(class: u8, detail: u8) -> Self {
    Self { class, detail }
  }

  /// Classify this code as empty, a request method, a response status
  /// or a reserved value
  ///
  /// ```
  /// use croak_msg::{Code, CodeKind};
  ///
  /// assert_eq!(Code::GET.kind(), CodeKind::Request);
  /// assert_eq!(Code::new(2, 5).kind(), CodeKind::Response);
  /// assert_eq!(Code::EMPTY.kind(), CodeKind::Empty);
  /// assert_eq!(Code::new(1, 0).kind(), CodeKind::Reserved);
  /// ```
  pub fn kind(&self) -> CodeKind {
    match (self.class, self.detail) {
      | (0, 0) => CodeKind::Empty,
      | (0, _) => CodeKind::Request,
      | (2 | 4 | 5, _) => CodeKind::Response,
      | _ => CodeKind::Reserved,
    }
  }

  /// Get the human string representation of a message code
  ///
  /// # Returns
  /// A `char` array
  ///
  /// This is to avoid unnecessary heap allocation;
  /// you can create a `String` with `String::from_iter`.
  pub fn to_human(&self) -> [char; 4] {
    let to_char = |d: u8| char::from_digit(d.into(), 10).unwrap_or('?');
    [to_char(self.class),
     '.',
     to_char(self.detail / 10),
     to_char(self.detail % 10)]
  }
}

impl From<u8> for Code {
  fn from(b: u8) -> Self {
    let class = b >> 5;
    let detail = b & 0b00011111;

    Code { class, detail }
  }
}

impl From<Code> for u8 {
  fn from(code: Code) -> u8 {
    let class = code.class << 5;
    let detail = code.detail;

    class | detail
  }
}
