//! Credentials collected during the account flow.

use std::fmt;

use xirelay_protocol::SecurityQuestion;

/// Everything the user typed that later requests may need.
///
/// Owned by the account client for its whole run; the username and password
/// entered at login are reused by the main-menu operations.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub new_password: String,
    pub confirm_password: String,
    pub email: String,
    pub security_question: Option<SecurityQuestion>,
    pub security_answer: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// The configured security question and its answer.
    ///
    /// `None` when no question was chosen or the answer is empty.
    pub fn security(&self) -> Option<(SecurityQuestion, &str)> {
        match self.security_question {
            Some(question) if !self.security_answer.is_empty() => {
                Some((question, self.security_answer.as_str()))
            }
            _ => None,
        }
    }

    /// Forgets the security question and answer.
    pub fn clear_security(&mut self) {
        self.security_question = None;
        self.security_answer.clear();
    }
}

// Passwords and the security answer never reach the logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("new_password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .field("email", &self.email)
            .field("security_question", &self.security_question)
            .field("security_answer", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_requires_question_and_answer() {
        let mut creds = Credentials::new("alice", "secret");
        assert_eq!(creds.security(), None);

        creds.security_question = Some(SecurityQuestion::FirstJobTown);
        assert_eq!(creds.security(), None);

        creds.security_answer = "Bastok".into();
        assert_eq!(
            creds.security(),
            Some((SecurityQuestion::FirstJobTown, "Bastok"))
        );

        creds.clear_security();
        assert_eq!(creds.security(), None);
        assert!(creds.security_answer.is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut creds = Credentials::new("alice", "hunter22");
        creds.security_answer = "Windurst".into();
        let shown = format!("{creds:?}");
        assert!(shown.contains("alice"));
        assert!(!shown.contains("hunter22"));
        assert!(!shown.contains("Windurst"));
    }
}
