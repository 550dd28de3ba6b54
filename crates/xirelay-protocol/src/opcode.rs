//! Request opcodes and response status codes of the account protocol.

use std::fmt;

/// The operation a request frame asks the auth server to perform.
///
/// Written to the *last* byte of the request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RequestOpcode {
    LoginAttempt = 0x10,
    LoginCreate = 0x20,
    LoginEmail = 0x30,
    LoginPass = 0x40,
    LoginSecCode = 0x50,
    LoginRecover = 0x60,
    LoginSqAttempt = 0x70,
    /// Tells the auth server the client is moving on to gameplay.
    Shutdown = 0x15,
}

impl RequestOpcode {
    /// Every request opcode.
    pub const ALL: [RequestOpcode; 8] = [
        Self::LoginAttempt,
        Self::LoginCreate,
        Self::LoginEmail,
        Self::LoginPass,
        Self::LoginSecCode,
        Self::LoginRecover,
        Self::LoginSqAttempt,
        Self::Shutdown,
    ];

    /// Converts a raw byte to an opcode.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_u8() == value)
    }

    /// The byte written on the wire.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RequestOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoginAttempt => "LOGIN_ATTEMPT",
            Self::LoginCreate => "LOGIN_CREATE",
            Self::LoginEmail => "LOGIN_EMAIL",
            Self::LoginPass => "LOGIN_PASS",
            Self::LoginSecCode => "LOGIN_SEC_CODE",
            Self::LoginRecover => "LOGIN_RECOVER",
            Self::LoginSqAttempt => "LOGIN_SQATTEMPT",
            Self::Shutdown => "SHUTDOWN",
        };
        f.write_str(name)
    }
}

/// The status byte at offset 0 of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    SuccessLogin = 0x01,
    SuccessCreate = 0x02,
    SuccessEmail = 0x03,
    SuccessPass = 0x04,
    SuccessSecCode = 0x05,
    ErrorLogin = 0x06,
    ErrorCreate = 0x07,
    ErrorEmail = 0x08,
    ErrorPass = 0x09,
    ErrorSecCode = 0x10,
    /// Carries the account's security-question id at offset 0x10.
    SuccessUserFound = 0x11,
    ErrorUserFound = 0x12,
    SuccessSqChanged = 0x13,
    ErrorSqFailed = 0x14,
}

impl Status {
    /// Every status the server can send.
    pub const ALL: [Status; 14] = [
        Self::SuccessLogin,
        Self::SuccessCreate,
        Self::SuccessEmail,
        Self::SuccessPass,
        Self::SuccessSecCode,
        Self::ErrorLogin,
        Self::ErrorCreate,
        Self::ErrorEmail,
        Self::ErrorPass,
        Self::ErrorSecCode,
        Self::SuccessUserFound,
        Self::ErrorUserFound,
        Self::SuccessSqChanged,
        Self::ErrorSqFailed,
    ];

    /// Converts a raw byte to a status. Unknown bytes give `None`.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_u8() == value)
    }

    /// The byte written on the wire.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the `SUCCESS_*` family.
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::SuccessLogin
                | Self::SuccessCreate
                | Self::SuccessEmail
                | Self::SuccessPass
                | Self::SuccessSecCode
                | Self::SuccessUserFound
                | Self::SuccessSqChanged
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SuccessLogin => "SUCCESS_LOGIN",
            Self::SuccessCreate => "SUCCESS_CREATE",
            Self::SuccessEmail => "SUCCESS_EMAIL",
            Self::SuccessPass => "SUCCESS_PASS",
            Self::SuccessSecCode => "SUCCESS_SEC_CODE",
            Self::ErrorLogin => "ERROR_LOGIN",
            Self::ErrorCreate => "ERROR_CREATE",
            Self::ErrorEmail => "ERROR_EMAIL",
            Self::ErrorPass => "ERROR_PASS",
            Self::ErrorSecCode => "ERROR_SEC_CODE",
            Self::SuccessUserFound => "SUCCESS_USERFOUND",
            Self::ErrorUserFound => "ERROR_USERFOUND",
            Self::SuccessSqChanged => "SUCCESS_SQCHANGED",
            Self::ErrorSqFailed => "ERROR_SQFAILED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_opcode_values() {
        assert_eq!(RequestOpcode::LoginAttempt.as_u8(), 0x10);
        assert_eq!(RequestOpcode::LoginCreate.as_u8(), 0x20);
        assert_eq!(RequestOpcode::LoginEmail.as_u8(), 0x30);
        assert_eq!(RequestOpcode::LoginPass.as_u8(), 0x40);
        assert_eq!(RequestOpcode::LoginSecCode.as_u8(), 0x50);
        assert_eq!(RequestOpcode::LoginRecover.as_u8(), 0x60);
        assert_eq!(RequestOpcode::LoginSqAttempt.as_u8(), 0x70);
        assert_eq!(RequestOpcode::Shutdown.as_u8(), 0x15);
    }

    #[test]
    fn test_status_bytes_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for status in Status::ALL {
            assert!(seen.insert(status.as_u8()), "duplicate {status}");
            assert_eq!(Status::from_u8(status.as_u8()), Some(status));
        }
    }

    #[test]
    fn test_unknown_status_is_none() {
        assert_eq!(Status::from_u8(0x00), None);
        assert_eq!(Status::from_u8(0x0A), None);
        assert_eq!(Status::from_u8(0xFF), None);
    }

    #[test]
    fn test_error_sec_code_shares_value_with_login_attempt() {
        // Requests and responses live in separate spaces, so the overlap
        // between ERROR_SEC_CODE and LOGIN_ATTEMPT is harmless.
        assert_eq!(Status::ErrorSecCode.as_u8(), RequestOpcode::LoginAttempt.as_u8());
        assert!(!Status::ErrorSecCode.is_success());
    }
}
