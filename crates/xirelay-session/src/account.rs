//! The account-protocol client.
//!
//! [`AccountClient::run`] walks the menus: it prompts through the
//! [`Prompter`], builds request frames from the [`Credentials`], exchanges
//! them with the auth server over the [`Session`], and feeds each response
//! to [`on_response`] to pick the next state.
//!
//! # Connections
//!
//! Requests and responses are strictly sequential: one 131-byte request,
//! then one 32-byte response. A fresh connection is opened whenever the flow
//! enters a menu or a later recovery phase, so a full password recovery
//! uses three connections. The session is closed when `run` returns.

use xirelay_protocol::{
    AccountRequest, ResponseFrame, SecurityQuestion, Status, RESPONSE_FRAME_LEN,
};
use xirelay_transport::{Connection, TransportError};

use crate::transition::{on_response, ExitReason, MenuState, Outcome, RecoveryPhase, Transition};
use crate::{AccountError, Credentials, Notice, Prompter, Session};

const LOGIN_MENU: &[&str] = &[
    "==========================================================",
    "What would you like to do?",
    "   1.) Login",
    "   2.) Create New Account",
    "   3.) Recover Password",
    "==========================================================",
];

const MAIN_MENU: &[&str] = &[
    "==========================================================",
    "What would you like to do?",
    "   1.) Play",
    "   2.) Change Email",
    "   3.) Change Password",
    "   4.) Set Security Question",
    "   5.) Logout",
    "==========================================================",
];

const INVALID_SELECTION: &str = "Invalid selection..";

/// Drives the account flow for one user.
pub struct AccountClient<P> {
    session: Session,
    credentials: Credentials,
    prompter: P,
}

impl<P: Prompter> AccountClient<P> {
    pub fn new(session: Session, prompter: P) -> Self {
        Self {
            session,
            credentials: Credentials::default(),
            prompter,
        }
    }

    /// Starts from previously collected credentials instead of empty ones.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn into_parts(self) -> (Session, Credentials, P) {
        (self.session, self.credentials, self.prompter)
    }

    /// Runs the menus until the user plays, logs out, or the server ends
    /// the flow.
    ///
    /// Server-declared failures come back as [`Outcome::Exit`]. Errors are
    /// reserved for transport failures, malformed frames, and closed input.
    /// The session connection is closed in every case; its identity is kept.
    pub async fn run(&mut self) -> Result<Outcome, AccountError> {
        let result = self.drive().await;
        self.session.close().await;
        match &result {
            Ok(outcome) => tracing::info!(?outcome, "account flow finished"),
            Err(e) => tracing::warn!(error = %e, "account flow aborted"),
        }
        result
    }

    async fn drive(&mut self) -> Result<Outcome, AccountError> {
        self.session.ensure_open().await?;
        let mut state = MenuState::LoginMenu;

        loop {
            tracing::debug!(?state, "entering state");
            let transition = match state {
                MenuState::LoginMenu => self.login_menu().await?,
                MenuState::LoggingIn => self.login().await?,
                MenuState::CreatingAccount => self.create_account().await?,
                MenuState::Recovering(phase) => self.recover(phase).await?,
                MenuState::MainMenu => self.main_menu().await?,
                MenuState::ChangingEmail => self.change_email().await?,
                MenuState::ChangingPassword => self.change_password().await?,
                MenuState::SettingSecurityQuestion => self.set_security_question().await?,
            };

            match transition {
                Transition::Goto(next) => {
                    state = next;
                    if state.needs_fresh_connection() {
                        self.session.reopen().await?;
                    }
                }
                Transition::Finish(outcome) => return Ok(outcome),
                Transition::UnknownStatus(byte) => {
                    tracing::warn!(
                        ?state,
                        status = format_args!("{byte:#04x}"),
                        "unknown status from server"
                    );
                    self.notify(Notice::Error, &format!("Error Unknown (status {byte:#04x})."));
                    self.session.reopen().await?;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Login menu
    // -----------------------------------------------------------------------

    async fn login_menu(&mut self) -> Result<Transition, AccountError> {
        loop {
            self.show(LOGIN_MENU);
            match self.select(3).await? {
                Some(1) => return Ok(Transition::Goto(MenuState::LoggingIn)),
                Some(2) => return Ok(Transition::Goto(MenuState::CreatingAccount)),
                Some(3) => {
                    return Ok(Transition::Goto(MenuState::Recovering(RecoveryPhase::Lookup)));
                }
                _ => self.notify(Notice::Error, INVALID_SELECTION),
            }
        }
    }

    async fn login(&mut self) -> Result<Transition, AccountError> {
        self.notify(Notice::Plain, "Please enter your login information.");
        self.credentials.username = self.prompter.read_line("Username: ").await?;
        self.credentials.password.clear();
        self.credentials.password = self.prompter.read_secret("Password: ").await?;

        let request = AccountRequest::login(
            &self.credentials.username,
            &self.credentials.password,
            &self.credentials.email,
        );
        let response = self.exchange(&request).await?;
        Ok(self.conclude_login(MenuState::LoggingIn, response))
    }

    async fn create_account(&mut self) -> Result<Transition, AccountError> {
        self.notify(Notice::Plain, "Please enter your desired login information.");
        self.credentials.username = self.prompter.read_line("Username (3-15 characters): ").await?;
        self.credentials.password = self
            .read_new_password("Password (6-15 characters): ", "Repeat Password           : ")
            .await?;
        self.credentials.email = self.prompter.read_line("Email: ").await?;

        if self
            .confirm("Would you like to setup a security question? y/n: ")
            .await?
        {
            self.choose_security_question().await?;
        } else {
            self.credentials.clear_security();
        }

        self.review_new_account();
        if !self.confirm("Is this correct? y/n: ").await? {
            return Ok(Transition::Goto(MenuState::CreatingAccount));
        }

        let request = AccountRequest::create(
            &self.credentials.username,
            &self.credentials.password,
            &self.credentials.email,
            self.credentials.security(),
        );
        let response = self.exchange(&request).await?;
        Ok(self.conclude_login(MenuState::CreatingAccount, response))
    }

    fn review_new_account(&mut self) {
        let masked = "*".repeat(self.credentials.password.chars().count());
        let lines = [
            "Please review your information:".to_string(),
            format!("Username: {}", self.credentials.username),
            format!("Password: {masked}"),
            format!("Email:    {}", self.credentials.email),
        ];
        for line in &lines {
            self.notify(Notice::Info, line);
        }
        let security = self.credentials.security().map(|(question, answer)| {
            [
                format!("Security Question: {}", question.text()),
                format!("Security Answer:   {answer}"),
            ]
        });
        match security {
            Some(lines) => {
                for line in &lines {
                    self.notify(Notice::Info, line);
                }
            }
            None => self.notify(
                Notice::Warning,
                "No security question set. You will not be able to recover your password.",
            ),
        }
    }

    /// Records the account id on success and reports the result.
    fn conclude_login(&mut self, from: MenuState, response: ResponseFrame) -> Transition {
        let transition = on_response(from, &response);
        match response.status() {
            Some(Status::SuccessLogin) => {
                self.session.set_account_id(response.value);
                tracing::info!(account_id = response.value, "logged in");
                let text = format!("Successfully logged in as {}!", self.credentials.username);
                self.notify(Notice::Success, &text);
            }
            Some(Status::SuccessCreate) => {
                self.session.set_account_id(response.value);
                tracing::info!(account_id = response.value, "account created");
                self.notify(Notice::Success, "Account successfully created!");
            }
            Some(Status::ErrorLogin) => self.notify(
                Notice::Error,
                "Failed to login. Invalid username or password.",
            ),
            Some(Status::ErrorCreate) => self.notify(
                Notice::Error,
                "Failed to create the new account. Username already taken.",
            ),
            _ => {}
        }
        transition
    }

    // -----------------------------------------------------------------------
    // Recovery
    // -----------------------------------------------------------------------

    async fn recover(&mut self, phase: RecoveryPhase) -> Result<Transition, AccountError> {
        let from = MenuState::Recovering(phase);
        let request = match phase {
            RecoveryPhase::Lookup => {
                self.credentials.username =
                    self.prompter.read_line("Please enter your username: ").await?;
                AccountRequest::recover(&self.credentials.username)
            }
            RecoveryPhase::Answer { question_id } => {
                self.notify(
                    Notice::Plain,
                    "Please answer the security question to reset your password.",
                );
                let question = match SecurityQuestion::from_id(question_id) {
                    Some(question) => format!("Question: {}", question.text()),
                    None => {
                        tracing::warn!(question_id, "server reported an unknown question id");
                        format!("Question: (unknown question #{question_id})")
                    }
                };
                self.notify(Notice::Info, &question);
                self.credentials.security_question = SecurityQuestion::from_id(question_id);
                self.credentials.security_answer = self.prompter.read_line("Your Answer: ").await?;
                AccountRequest::answer_security_question(
                    &self.credentials.username,
                    question_id,
                    &self.credentials.security_answer,
                )
            }
            RecoveryPhase::Reset => {
                self.credentials.new_password = self
                    .read_new_password("New Password: ", "Repeat Password: ")
                    .await?;
                AccountRequest::change_password(
                    &self.credentials.username,
                    &self.credentials.password,
                    &self.credentials.new_password,
                )
            }
        };

        let response = self.exchange(&request).await?;
        let transition = on_response(from, &response);
        match transition {
            Transition::Finish(Outcome::Exit(ExitReason::NoSecurityQuestion)) => {
                self.notify(Notice::Error, "A security question was not setup.");
                self.notify(Notice::Error, "Please contact an admin.");
            }
            Transition::Finish(Outcome::Exit(ExitReason::UserNotFound)) => {
                self.notify(Notice::Error, "No user with that name was found.");
            }
            Transition::Goto(MenuState::Recovering(RecoveryPhase::Reset)) => {
                self.notify(Notice::Success, "Verified! Enter your new password below.");
            }
            Transition::Finish(Outcome::Exit(ExitReason::WrongAnswer)) => {
                self.notify(Notice::Error, "Incorrect answer.. Try again.");
            }
            Transition::Finish(Outcome::Exit(ExitReason::PasswordReset)) => {
                self.notify(Notice::Success, "Password updated! Please log in again.");
            }
            Transition::Finish(Outcome::Exit(ExitReason::PasswordRejected)) => {
                self.notify(Notice::Error, "Failed to change password..");
            }
            _ => {}
        }
        Ok(transition)
    }

    // -----------------------------------------------------------------------
    // Main menu
    // -----------------------------------------------------------------------

    async fn main_menu(&mut self) -> Result<Transition, AccountError> {
        loop {
            self.show(MAIN_MENU);
            match self.select(5).await? {
                Some(1) => {
                    self.send_only(&AccountRequest::shutdown()).await?;
                    self.notify(Notice::Success, "Proceeding to the game..");
                    return Ok(Transition::Finish(Outcome::Play));
                }
                Some(2) => return Ok(Transition::Goto(MenuState::ChangingEmail)),
                Some(3) => return Ok(Transition::Goto(MenuState::ChangingPassword)),
                Some(4) => return Ok(Transition::Goto(MenuState::SettingSecurityQuestion)),
                Some(5) => {
                    self.notify(Notice::Success, "Logged out successfully!");
                    return Ok(Transition::Finish(Outcome::Exit(ExitReason::LoggedOut)));
                }
                _ => self.notify(Notice::Error, INVALID_SELECTION),
            }
        }
    }

    async fn change_email(&mut self) -> Result<Transition, AccountError> {
        self.notify(
            Notice::Plain,
            "Verify your password, then enter your new email address.",
        );
        if !self.verify_password().await? {
            return Ok(Transition::Goto(MenuState::MainMenu));
        }
        self.credentials.email = self.prompter.read_line("New Email: ").await?;

        let request = AccountRequest::change_email(
            &self.credentials.username,
            &self.credentials.password,
            &self.credentials.email,
        );
        let response = self.exchange(&request).await?;
        Ok(self.conclude_change(MenuState::ChangingEmail, response))
    }

    async fn change_password(&mut self) -> Result<Transition, AccountError> {
        self.notify(Notice::Plain, "Verify your password, then choose a new one.");
        if !self.verify_password().await? {
            return Ok(Transition::Goto(MenuState::MainMenu));
        }
        self.credentials.new_password = self
            .read_new_password("New Password: ", "Repeat Password: ")
            .await?;

        let request = AccountRequest::change_password(
            &self.credentials.username,
            &self.credentials.password,
            &self.credentials.new_password,
        );
        let response = self.exchange(&request).await?;
        Ok(self.conclude_change(MenuState::ChangingPassword, response))
    }

    async fn set_security_question(&mut self) -> Result<Transition, AccountError> {
        self.notify(Notice::Plain, "Verify your password first.");
        if !self.verify_password().await? {
            return Ok(Transition::Goto(MenuState::MainMenu));
        }
        let question = self.choose_security_question().await?;

        let request = AccountRequest::set_security_question(
            &self.credentials.username,
            &self.credentials.password,
            question,
            &self.credentials.security_answer,
        );
        let response = self.exchange(&request).await?;
        Ok(self.conclude_change(MenuState::SettingSecurityQuestion, response))
    }

    fn conclude_change(&mut self, from: MenuState, response: ResponseFrame) -> Transition {
        let message = match response.status() {
            Some(Status::SuccessEmail) => Some((Notice::Success, "Successfully changed email!")),
            Some(Status::SuccessPass) => Some((Notice::Success, "Successfully changed password!")),
            Some(Status::SuccessSecCode) => {
                Some((Notice::Success, "Successfully set the security question!"))
            }
            Some(Status::ErrorEmail) => Some((Notice::Error, "Failed to change email..")),
            Some(Status::ErrorPass) => Some((Notice::Error, "Failed to change password..")),
            Some(Status::ErrorSecCode) => {
                Some((Notice::Error, "Failed to set the security question.."))
            }
            _ => None,
        };
        if let Some((notice, text)) = message {
            self.notify(notice, text);
        }
        on_response(from, &response)
    }

    // -----------------------------------------------------------------------
    // Input helpers
    // -----------------------------------------------------------------------

    /// Reads a menu selection in `1..=max`. `None` for anything else.
    async fn select(&mut self, max: u8) -> Result<Option<u8>, AccountError> {
        let input = self.prompter.read_line("Enter a selection: ").await?;
        match parse_selection(&input, max) {
            Ok(choice) => Ok(Some(choice)),
            Err(e) => {
                tracing::debug!(error = %e, "rejected menu selection");
                Ok(None)
            }
        }
    }

    async fn confirm(&mut self, prompt: &str) -> Result<bool, AccountError> {
        let answer = self.prompter.read_line(prompt).await?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }

    /// Asks for the current password again and compares it with the one
    /// entered at login.
    async fn verify_password(&mut self) -> Result<bool, AccountError> {
        self.credentials.confirm_password.clear();
        self.credentials.confirm_password =
            self.prompter.read_secret("Verify Your Password: ").await?;
        if self.credentials.confirm_password == self.credentials.password {
            return Ok(true);
        }
        self.notify(Notice::Error, "Failed to verify password..");
        Ok(false)
    }

    /// Reads a password twice until both entries match.
    async fn read_new_password(
        &mut self,
        prompt: &str,
        repeat_prompt: &str,
    ) -> Result<String, AccountError> {
        loop {
            let password = self.prompter.read_secret(prompt).await?;
            self.credentials.confirm_password.clear();
            self.credentials.confirm_password = self.prompter.read_secret(repeat_prompt).await?;
            if password == self.credentials.confirm_password {
                return Ok(password);
            }
            self.notify(Notice::Error, "Passwords did not match! Please try again.");
        }
    }

    /// Lets the user pick one of the fixed questions and answer it.
    async fn choose_security_question(&mut self) -> Result<SecurityQuestion, AccountError> {
        let question = loop {
            self.notify(Notice::Plain, "Please choose a security question:");
            for question in SecurityQuestion::ALL {
                let line = format!("   {}.) {}", question.id(), question.text());
                self.notify(Notice::Plain, &line);
            }
            let input = self.prompter.read_line("Enter a selection: ").await?;
            match SecurityQuestion::parse_selection(&input) {
                Ok(question) => break question,
                Err(e) => {
                    tracing::debug!(error = %e, "rejected security question");
                    self.notify(Notice::Error, INVALID_SELECTION);
                }
            }
        };
        self.credentials.security_question = Some(question);
        self.credentials.security_answer = self.prompter.read_line("Your Answer: ").await?;
        Ok(question)
    }

    fn show(&mut self, lines: &[&str]) {
        for line in lines {
            self.prompter.notify(Notice::Plain, line);
        }
    }

    fn notify(&mut self, notice: Notice, message: &str) {
        match notice {
            Notice::Error => tracing::debug!(text = message, "account flow error notice"),
            Notice::Warning => tracing::debug!(text = message, "account flow warning notice"),
            _ => tracing::trace!(text = message, "account flow notice"),
        }
        self.prompter.notify(notice, message);
    }

    // -----------------------------------------------------------------------
    // Wire
    // -----------------------------------------------------------------------

    /// Sends one request and waits for its 32-byte response.
    async fn exchange(&mut self, request: &AccountRequest) -> Result<ResponseFrame, AccountError> {
        let conn = self
            .session
            .connection()
            .ok_or_else(|| TransportError::ConnectionClosed("session is not open".into()))?;

        let frame = request.encode();
        tracing::debug!(
            id = %conn.id(),
            opcode = format_args!("{:#04x}", request.opcode.as_u8()),
            "sending account request"
        );
        conn.send(&frame).await?;

        let bytes = conn.recv_exact(RESPONSE_FRAME_LEN).await?;
        let response = ResponseFrame::decode(&bytes)?;
        tracing::debug!(
            id = %conn.id(),
            status = format_args!("{:#04x}", response.status_byte),
            value = response.value,
            "received account response"
        );
        Ok(response)
    }

    /// Sends a request that has no response.
    async fn send_only(&mut self, request: &AccountRequest) -> Result<(), AccountError> {
        let conn = self
            .session
            .connection()
            .ok_or_else(|| TransportError::ConnectionClosed("session is not open".into()))?;
        tracing::debug!(
            id = %conn.id(),
            opcode = format_args!("{:#04x}", request.opcode.as_u8()),
            "sending account request"
        );
        conn.send(&request.encode()).await?;
        Ok(())
    }
}

/// Parses a numbered menu selection in `1..=max`.
pub fn parse_selection(input: &str, max: u8) -> Result<u8, AccountError> {
    let trimmed = input.trim();
    match trimmed.parse::<u8>() {
        Ok(choice) if (1..=max).contains(&choice) => Ok(choice),
        _ => Err(AccountError::InvalidInput(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection_accepts_range() {
        assert_eq!(parse_selection("1", 3).unwrap(), 1);
        assert_eq!(parse_selection(" 3\n", 3).unwrap(), 3);
    }

    #[test]
    fn test_parse_selection_rejects_out_of_range() {
        for input in ["0", "4", "-1", "", "abc", "1.5", "256"] {
            assert!(
                matches!(parse_selection(input, 3), Err(AccountError::InvalidInput(_))),
                "{input:?} should be rejected"
            );
        }
    }
}
