//! The fixed set of security questions.

use std::fmt;

use crate::ProtocolError;

/// One of the five security questions the auth server knows about.
///
/// The discriminant is the id exchanged on the wire (as a decimal string in
/// request frames, as a `u32` in responses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SecurityQuestion {
    PetName = 1,
    FatherBirthYear = 2,
    FirstJobTown = 3,
    DriversLicence = 4,
    PartnerMotherMaidenName = 5,
}

impl SecurityQuestion {
    /// All questions in menu order.
    pub const ALL: [SecurityQuestion; 5] = [
        Self::PetName,
        Self::FatherBirthYear,
        Self::FirstJobTown,
        Self::DriversLicence,
        Self::PartnerMotherMaidenName,
    ];

    /// Looks a question up by its numeric id. Ids outside 1-5 give `None`.
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|q| u32::from(q.id()) == id)
    }

    /// Parses a menu selection typed by the user.
    ///
    /// Surrounding whitespace is ignored; anything that is not exactly one
    /// of `1`..`5` is rejected.
    pub fn parse_selection(input: &str) -> Result<Self, ProtocolError> {
        input
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::from_id)
            .ok_or_else(|| ProtocolError::InvalidQuestion(input.trim().to_string()))
    }

    /// The numeric id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// The canonical question text.
    pub fn text(self) -> &'static str {
        match self {
            Self::PetName => "What is your pets name?",
            Self::FatherBirthYear => "In what year was your father born?",
            Self::FirstJobTown => "In what town or city was your first full time job?",
            Self::DriversLicence => {
                "What are the last five digits of your drivers licence number?"
            }
            Self::PartnerMotherMaidenName => {
                "What is your spouse or partners mothers maiden name?"
            }
        }
    }
}

impl fmt::Display for SecurityQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
