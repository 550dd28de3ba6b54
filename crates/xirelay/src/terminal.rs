//! A [`Prompter`] on stdin and stdout.
//!
//! Lines are read through tokio's stdin. Secrets typed at a terminal are
//! read key by key in raw mode and echoed as `*`; when stdin is not a
//! terminal they are read as plain lines.

use std::io::{IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use xirelay_session::{AccountError, Notice, Prompter};

pub struct StdioPrompter {
    lines: Lines<BufReader<Stdin>>,
}

impl StdioPrompter {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdioPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for StdioPrompter {
    async fn read_line(&mut self, prompt: &str) -> Result<String, AccountError> {
        write_prompt(prompt).await?;
        match self.lines.next_line().await.map_err(AccountError::Input)? {
            Some(line) => Ok(line.trim_end_matches('\r').to_string()),
            None => Err(AccountError::InputClosed),
        }
    }

    async fn read_secret(&mut self, prompt: &str) -> Result<String, AccountError> {
        if !std::io::stdin().is_terminal() {
            return self.read_line(prompt).await;
        }
        write_prompt(prompt).await?;
        tokio::task::spawn_blocking(read_masked)
            .await
            .map_err(|e| AccountError::Input(std::io::Error::other(e)))?
    }

    fn notify(&mut self, notice: Notice, message: &str) {
        let prefix = match notice {
            Notice::Plain => "",
            Notice::Info => "[info] ",
            Notice::Success => "[ok] ",
            Notice::Warning => "[warn] ",
            Notice::Error => "[error] ",
        };
        println!("{prefix}{message}");
    }
}

async fn write_prompt(prompt: &str) -> Result<(), AccountError> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(prompt.as_bytes())
        .await
        .map_err(AccountError::Input)?;
    stdout.flush().await.map_err(AccountError::Input)
}

/// What one key press did to a masked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SecretKey {
    Typed,
    Erased,
    Ignored,
    Submit,
    Abort,
}

fn apply_key(secret: &mut String, key: &KeyEvent) -> SecretKey {
    if key.kind == KeyEventKind::Release {
        return SecretKey::Ignored;
    }
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => SecretKey::Submit,
        KeyCode::Char('c' | 'd') if control => SecretKey::Abort,
        KeyCode::Backspace if secret.pop().is_some() => SecretKey::Erased,
        KeyCode::Char(c) if !control => {
            secret.push(c);
            SecretKey::Typed
        }
        _ => SecretKey::Ignored,
    }
}

/// Keeps the terminal in raw mode while alive.
struct RawMode;

impl RawMode {
    fn enable() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!(error = %e, "failed to leave raw mode");
        }
    }
}

fn read_masked() -> Result<String, AccountError> {
    let _raw = RawMode::enable().map_err(AccountError::Input)?;
    let mut stdout = std::io::stdout();
    let mut secret = String::new();

    loop {
        let Event::Key(key) = event::read().map_err(AccountError::Input)? else {
            continue;
        };
        let (echo, result): (&[u8], Option<Result<String, AccountError>>) =
            match apply_key(&mut secret, &key) {
                SecretKey::Ignored => continue,
                SecretKey::Typed => (&b"*"[..], None),
                SecretKey::Erased => (&b"\x08 \x08"[..], None),
                SecretKey::Submit => (&b"\r\n"[..], Some(Ok(std::mem::take(&mut secret)))),
                SecretKey::Abort => (&b"\r\n"[..], Some(Err(AccountError::InputClosed))),
            };
        stdout
            .write_all(echo)
            .and_then(|()| stdout.flush())
            .map_err(AccountError::Input)?;
        if let Some(result) = result {
            return result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_keys(keys: &[KeyEvent]) -> (String, Vec<SecretKey>) {
        let mut secret = String::new();
        let outcomes = keys.iter().map(|key| apply_key(&mut secret, key)).collect();
        (secret, outcomes)
    }

    #[test]
    fn test_typed_characters_are_kept_and_enter_submits() {
        let (secret, outcomes) = type_keys(&[
            press(KeyCode::Char('p')),
            press(KeyCode::Char('w')),
            press(KeyCode::Enter),
        ]);
        assert_eq!(secret, "pw");
        assert_eq!(outcomes, [SecretKey::Typed, SecretKey::Typed, SecretKey::Submit]);
    }

    #[test]
    fn test_backspace_erases_only_what_was_typed() {
        let (secret, outcomes) = type_keys(&[
            press(KeyCode::Backspace),
            press(KeyCode::Char('a')),
            press(KeyCode::Char('b')),
            press(KeyCode::Backspace),
        ]);
        assert_eq!(secret, "a");
        assert_eq!(
            outcomes,
            [SecretKey::Ignored, SecretKey::Typed, SecretKey::Typed, SecretKey::Erased]
        );
    }

    #[test]
    fn test_control_keys_abort_or_are_ignored() {
        let mut secret = String::from("x");
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let ctrl_u = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(apply_key(&mut secret, &ctrl_u), SecretKey::Ignored);
        assert_eq!(apply_key(&mut secret, &press(KeyCode::Tab)), SecretKey::Ignored);
        assert_eq!(apply_key(&mut secret, &ctrl_c), SecretKey::Abort);
        assert_eq!(secret, "x");
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut secret = String::new();
        let mut release = press(KeyCode::Char('z'));
        release.kind = KeyEventKind::Release;
        assert_eq!(apply_key(&mut secret, &release), SecretKey::Ignored);
        assert!(secret.is_empty());
    }
}
