//! Account protocol frames.
//!
//! Request layout (131 bytes):
//!
//! ```text
//! 0x00  username            16
//! 0x10  password            16
//! 0x20  email               32   (new password: 16)
//! 0x40  security answer     64
//! 0x80  security question    2   decimal string, e.g. "3\0"
//! 0x82  opcode               1
//! ```
//!
//! Response layout (32 bytes): status at 0x00, a `u32` at 0x10 that is the
//! account id or the security-question id depending on the status.

use byteorder::{ByteOrder, LittleEndian};

use crate::{ProtocolError, RequestOpcode, SecurityQuestion, Status};

/// Length of every request frame.
pub const REQUEST_FRAME_LEN: usize = 131;

/// Length of every response frame.
pub const RESPONSE_FRAME_LEN: usize = 32;

const USERNAME: (usize, usize) = (0x00, 16);
const PASSWORD: (usize, usize) = (0x10, 16);
const EMAIL: (usize, usize) = (0x20, 32);
const NEW_PASSWORD: (usize, usize) = (0x20, 16);
const ANSWER: (usize, usize) = (0x40, 64);
const QUESTION: (usize, usize) = (0x80, 2);
const OPCODE: usize = 0x82;

const RESPONSE_VALUE: usize = 0x10;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// What occupies the region at 0x20.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmailSlot {
    #[default]
    Empty,
    /// An email address, up to 32 bytes.
    Email(String),
    /// A replacement password, up to 16 bytes.
    NewPassword(String),
}

/// Security answer plus the question it answers.
///
/// `question_id` stays a raw number because during recovery it comes from
/// the server rather than from the fixed menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityField {
    pub question_id: u32,
    pub answer: String,
}

/// A request to the auth server.
///
/// Build one with the constructor matching the operation, then call
/// [`encode`](Self::encode) to get the wire bytes. Unused regions are
/// zero-filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRequest {
    pub opcode: RequestOpcode,
    pub username: String,
    pub password: String,
    pub email_slot: EmailSlot,
    pub security: Option<SecurityField>,
}

impl AccountRequest {
    fn bare(opcode: RequestOpcode) -> Self {
        Self {
            opcode,
            username: String::new(),
            password: String::new(),
            email_slot: EmailSlot::Empty,
            security: None,
        }
    }

    /// `LOGIN_ATTEMPT`: username, password, email.
    pub fn login(username: &str, password: &str, email: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            email_slot: EmailSlot::Email(email.to_string()),
            ..Self::bare(RequestOpcode::LoginAttempt)
        }
    }

    /// `LOGIN_CREATE`. The security question is only carried when an
    /// answer was given; an empty answer means the user opted out.
    pub fn create(
        username: &str,
        password: &str,
        email: &str,
        security: Option<(SecurityQuestion, &str)>,
    ) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            email_slot: EmailSlot::Email(email.to_string()),
            security: security
                .filter(|(_, answer)| !answer.is_empty())
                .map(|(question, answer)| SecurityField {
                    question_id: u32::from(question.id()),
                    answer: answer.to_string(),
                }),
            ..Self::bare(RequestOpcode::LoginCreate)
        }
    }

    /// `LOGIN_RECOVER`: only the username.
    pub fn recover(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Self::bare(RequestOpcode::LoginRecover)
        }
    }

    /// `LOGIN_SQATTEMPT`: username, the answer, and the id the server
    /// reported for the account.
    pub fn answer_security_question(username: &str, question_id: u32, answer: &str) -> Self {
        Self {
            username: username.to_string(),
            security: Some(SecurityField {
                question_id,
                answer: answer.to_string(),
            }),
            ..Self::bare(RequestOpcode::LoginSqAttempt)
        }
    }

    /// `LOGIN_PASS`: the new password travels in the email slot, 16 bytes wide.
    pub fn change_password(username: &str, password: &str, new_password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            email_slot: EmailSlot::NewPassword(new_password.to_string()),
            ..Self::bare(RequestOpcode::LoginPass)
        }
    }

    /// `LOGIN_EMAIL`.
    pub fn change_email(username: &str, password: &str, email: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            email_slot: EmailSlot::Email(email.to_string()),
            ..Self::bare(RequestOpcode::LoginEmail)
        }
    }

    /// `LOGIN_SEC_CODE`.
    pub fn set_security_question(
        username: &str,
        password: &str,
        question: SecurityQuestion,
        answer: &str,
    ) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            security: Some(SecurityField {
                question_id: u32::from(question.id()),
                answer: answer.to_string(),
            }),
            ..Self::bare(RequestOpcode::LoginSecCode)
        }
    }

    /// `SHUTDOWN`: only the opcode is set.
    pub fn shutdown() -> Self {
        Self::bare(RequestOpcode::Shutdown)
    }

    /// Encodes the request into its fixed 131-byte frame.
    pub fn encode(&self) -> [u8; REQUEST_FRAME_LEN] {
        let mut buf = [0u8; REQUEST_FRAME_LEN];

        write_field(&mut buf, USERNAME, &self.username);
        write_field(&mut buf, PASSWORD, &self.password);
        match &self.email_slot {
            EmailSlot::Empty => {}
            EmailSlot::Email(email) => write_field(&mut buf, EMAIL, email),
            EmailSlot::NewPassword(new) => write_field(&mut buf, NEW_PASSWORD, new),
        }
        if let Some(security) = &self.security {
            write_field(&mut buf, ANSWER, &security.answer);
            write_field(&mut buf, QUESTION, &security.question_id.to_string());
        }
        buf[OPCODE] = self.opcode.as_u8();

        buf
    }

    /// Decodes a request frame, as an auth server would.
    ///
    /// The meaning of the 0x20 region is taken from the opcode.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < REQUEST_FRAME_LEN {
            return Err(ProtocolError::FrameTooShort {
                frame: "account request",
                expected: REQUEST_FRAME_LEN,
                actual: data.len(),
            });
        }

        let opcode = RequestOpcode::from_u8(data[OPCODE])
            .ok_or(ProtocolError::UnknownOpcode(data[OPCODE]))?;

        let email_slot = match opcode {
            RequestOpcode::LoginPass => {
                non_empty(read_field(data, NEW_PASSWORD)).map(EmailSlot::NewPassword)
            }
            _ => non_empty(read_field(data, EMAIL)).map(EmailSlot::Email),
        }
        .unwrap_or_default();

        let answer = read_field(data, ANSWER);
        let question_id = read_field(data, QUESTION).parse::<u32>().unwrap_or(0);
        let security = (!answer.is_empty() || question_id != 0).then_some(SecurityField {
            question_id,
            answer,
        });

        Ok(Self {
            opcode,
            username: read_field(data, USERNAME),
            password: read_field(data, PASSWORD),
            email_slot,
            security,
        })
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A response from the auth server.
///
/// The status is kept as a raw byte so an unknown value can be reported
/// rather than lost; [`status`](Self::status) interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    pub status_byte: u8,
    /// Account id for `SUCCESS_LOGIN`/`SUCCESS_CREATE`, question id for
    /// `SUCCESS_USERFOUND`, otherwise whatever the server left there.
    pub value: u32,
}

impl ResponseFrame {
    /// Builds a response with a known status.
    pub fn new(status: Status, value: u32) -> Self {
        Self {
            status_byte: status.as_u8(),
            value,
        }
    }

    /// Interprets the status byte.
    pub fn status(&self) -> Option<Status> {
        Status::from_u8(self.status_byte)
    }

    /// Encodes the response into its fixed 32-byte frame.
    pub fn encode(&self) -> [u8; RESPONSE_FRAME_LEN] {
        let mut buf = [0u8; RESPONSE_FRAME_LEN];
        buf[0] = self.status_byte;
        LittleEndian::write_u32(&mut buf[RESPONSE_VALUE..RESPONSE_VALUE + 4], self.value);
        buf
    }

    /// Decodes a response frame.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < RESPONSE_FRAME_LEN {
            return Err(ProtocolError::FrameTooShort {
                frame: "account response",
                expected: RESPONSE_FRAME_LEN,
                actual: data.len(),
            });
        }
        Ok(Self {
            status_byte: data[0],
            value: LittleEndian::read_u32(&data[RESPONSE_VALUE..RESPONSE_VALUE + 4]),
        })
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Copies `value` into a fixed-width field, truncating to the width.
/// The rest of the field keeps its zero fill.
fn write_field(buf: &mut [u8], (offset, width): (usize, usize), value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(width);
    buf[offset..offset + len].copy_from_slice(&bytes[..len]);
}

/// Reads a NUL-padded field up to its first NUL.
fn read_field(buf: &[u8], (offset, width): (usize, usize)) -> String {
    let field = &buf[offset..offset + width];
    let end = field.iter().position(|&b| b == 0).unwrap_or(width);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_frame_layout() {
        let frame = AccountRequest::login("alice", "hunter22", "a@b.c").encode();

        assert_eq!(frame.len(), 131);
        assert_eq!(frame[0x82], 0x10);
        assert_eq!(&frame[0x00..0x05], b"alice");
        assert!(frame[0x05..0x10].iter().all(|&b| b == 0));
        assert_eq!(&frame[0x10..0x18], b"hunter22");
        assert!(frame[0x18..0x20].iter().all(|&b| b == 0));
        assert_eq!(&frame[0x20..0x25], b"a@b.c");
        assert!(frame[0x25..0x82].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_long_fields_are_truncated_not_rejected() {
        let user = "u".repeat(40);
        let pass = "p".repeat(40);
        let email = "e".repeat(80);
        let frame = AccountRequest::login(&user, &pass, &email).encode();

        assert!(frame[0x00..0x10].iter().all(|&b| b == b'u'));
        assert!(frame[0x10..0x20].iter().all(|&b| b == b'p'));
        assert!(frame[0x20..0x40].iter().all(|&b| b == b'e'));
        assert!(frame[0x40..0x82].iter().all(|&b| b == 0));
        assert_eq!(frame[0x82], 0x10);
    }

    #[test]
    fn test_create_with_security_question() {
        let frame = AccountRequest::create(
            "bob",
            "secret1",
            "bob@example.com",
            Some((SecurityQuestion::FirstJobTown, "Bastok")),
        )
        .encode();

        assert_eq!(frame[0x82], 0x20);
        assert_eq!(&frame[0x40..0x46], b"Bastok");
        assert_eq!(&frame[0x80..0x82], b"3\0");
    }

    #[test]
    fn test_create_opted_out_sends_no_question() {
        let opted_out = AccountRequest::create("bob", "secret1", "b@e.c", None);
        let empty_answer = AccountRequest::create(
            "bob",
            "secret1",
            "b@e.c",
            Some((SecurityQuestion::PetName, "")),
        );
        assert_eq!(opted_out, empty_answer);

        let frame = empty_answer.encode();
        assert!(frame[0x40..0x82].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_change_password_uses_sixteen_byte_slot() {
        let frame =
            AccountRequest::change_password("bob", "old", &"n".repeat(30)).encode();
        assert_eq!(frame[0x82], 0x40);
        assert!(frame[0x20..0x30].iter().all(|&b| b == b'n'));
        assert!(frame[0x30..0x40].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_security_answer_question_id_is_decimal_text() {
        let frame = AccountRequest::answer_security_question("bob", 4, "12345").encode();
        assert_eq!(frame[0x82], 0x70);
        assert!(frame[0x10..0x40].iter().all(|&b| b == 0));
        assert_eq!(&frame[0x40..0x45], b"12345");
        assert_eq!(frame[0x80], b'4');
        assert_eq!(frame[0x81], 0);
    }

    #[test]
    fn test_recover_and_shutdown_frames() {
        let recover = AccountRequest::recover("carol").encode();
        assert_eq!(recover[0x82], 0x60);
        assert_eq!(&recover[..5], b"carol");
        assert!(recover[5..0x82].iter().all(|&b| b == 0));

        let shutdown = AccountRequest::shutdown().encode();
        assert_eq!(shutdown[0x82], 0x15);
        assert!(shutdown[..0x82].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_request_reads_fields_by_opcode() {
        let frame = AccountRequest::set_security_question(
            "dave",
            "pw",
            SecurityQuestion::PetName,
            "Rex",
        )
        .encode();
        let decoded = AccountRequest::decode(&frame).unwrap();
        assert_eq!(decoded.opcode, RequestOpcode::LoginSecCode);
        assert_eq!(decoded.username, "dave");
        assert_eq!(decoded.password, "pw");
        assert_eq!(decoded.email_slot, EmailSlot::Empty);
        assert_eq!(
            decoded.security,
            Some(SecurityField {
                question_id: 1,
                answer: "Rex".into()
            })
        );
    }

    #[test]
    fn test_decode_request_rejects_short_and_unknown() {
        assert!(matches!(
            AccountRequest::decode(&[0u8; 10]),
            Err(ProtocolError::FrameTooShort { actual: 10, .. })
        ));
        let mut frame = [0u8; REQUEST_FRAME_LEN];
        frame[OPCODE] = 0xEE;
        assert_eq!(
            AccountRequest::decode(&frame),
            Err(ProtocolError::UnknownOpcode(0xEE))
        );
    }

    #[test]
    fn test_response_layout() {
        let frame = ResponseFrame::new(Status::SuccessLogin, 0x0102_0304).encode();
        assert_eq!(frame[0], 0x01);
        assert_eq!(&frame[0x10..0x14], &[0x04, 0x03, 0x02, 0x01]);

        let decoded = ResponseFrame::decode(&frame).unwrap();
        assert_eq!(decoded.status(), Some(Status::SuccessLogin));
        assert_eq!(decoded.value, 0x0102_0304);
    }

    #[test]
    fn test_response_unknown_status_is_kept() {
        let mut raw = [0u8; RESPONSE_FRAME_LEN];
        raw[0] = 0x7E;
        let decoded = ResponseFrame::decode(&raw).unwrap();
        assert_eq!(decoded.status_byte, 0x7E);
        assert_eq!(decoded.status(), None);
    }
}
