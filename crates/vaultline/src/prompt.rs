// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answers for continuation errors: headless values first, then the TTY.

use std::io::{BufRead, IsTerminal, Write};

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use vaultline_config::HeadlessConfig;
use vaultline_core::VaultlineError;
use vaultline_session::Session;

/// Supplies the inputs a session asks for while an operation is retried.
///
/// Each headless value is offered once; a rejected value is never replayed,
/// so a wrong headless password ends the run instead of looping.
pub struct Prompter {
    master_password: Option<SecretString>,
    otp_code: Option<SecretString>,
    interactive: bool,
}

impl Prompter {
    pub fn new(headless: &HeadlessConfig) -> Self {
        Self {
            master_password: headless.master_password.clone().map(SecretString::from),
            otp_code: headless.otp_code.clone().map(SecretString::from),
            interactive: std::io::stdin().is_terminal(),
        }
    }

    /// Resolves `error` by assigning the missing input to `session`.
    /// Anything that is not a continuation comes back as the error.
    pub fn answer(
        &mut self,
        session: &mut Session,
        error: VaultlineError,
    ) -> Result<(), VaultlineError> {
        match error {
            VaultlineError::RequireMasterPassword => {
                let password = match self.master_password.take() {
                    Some(password) => password,
                    None => self.read_secret("Master password: ", error)?,
                };
                session.assign_master_password(password.expose_secret())
            }
            VaultlineError::Require2FACode => {
                let code = match self.otp_code.take() {
                    Some(code) => code,
                    None => self.read_secret("Two-factor code: ", error)?,
                };
                session.assign_two_factor_code(code.expose_secret())
            }
            VaultlineError::RequireEmailToken => {
                eprintln!("A verification code was sent to {}.", session.login());
                let token = self.read_line("Email token: ", error)?;
                session.assign_email_token(&token)
            }
            e if e.is_invalid_input() && self.interactive => {
                eprintln!("{}", e.message());
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Login for the session: flag, then headless config, then the TTY.
    pub fn login(
        &self,
        flag: Option<String>,
        headless: &HeadlessConfig,
    ) -> Result<String, VaultlineError> {
        if let Some(login) = flag.or_else(|| headless.login.clone()) {
            return Ok(login);
        }
        self.read_line("Login: ", VaultlineError::MissingOrInvalidLogin)
    }

    fn read_secret(
        &self,
        prompt: &str,
        unanswered: VaultlineError,
    ) -> Result<SecretString, VaultlineError> {
        if !self.interactive {
            debug!(%unanswered, "no terminal to prompt on");
            return Err(unanswered);
        }
        eprint!("{prompt}");
        rpassword::read_password()
            .map(SecretString::from)
            .map_err(|_| unanswered)
    }

    fn read_line(
        &self,
        prompt: &str,
        unanswered: VaultlineError,
    ) -> Result<String, VaultlineError> {
        if !self.interactive {
            debug!(%unanswered, "no terminal to prompt on");
            return Err(unanswered);
        }
        eprint!("{prompt}");
        std::io::stderr().flush().map_err(|_| unanswered)?;
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|_| unanswered)?;
        Ok(line.trim().to_string())
    }
}
