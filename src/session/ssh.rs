//! SSH-backed device sessions using russh.
//!
//! One [`SshSession`] owns one interactive PTY shell on one device. Reads go
//! through a [`PatternBuffer`] until the platform's prompt pattern appears in
//! the buffer tail; every read carries the session deadline.

use std::future::Future;
use std::sync::Arc;

use log::debug;
use regex::bytes::Regex;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use secrecy::ExposeSecret;

use super::buffer::PatternBuffer;
use super::config::SessionConfig;
use super::platform::{self, Platform};
use super::{DeviceSession, SessionFactory};
use crate::error::{Result, SessionError};

/// How many bytes from the end of the buffer are searched for prompts.
const SEARCH_DEPTH: usize = 1000;

/// Terminal dimensions requested for the PTY. Wide, so the device does not
/// wrap or paginate long lines.
const TERMINAL_WIDTH: u32 = 511;
const TERMINAL_HEIGHT: u32 = 24;

/// Factory producing [`SshSession`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SshSessionFactory;

impl SessionFactory for SshSessionFactory {
    type Session = SshSession;

    fn open(
        &self,
        config: SessionConfig,
    ) -> impl Future<Output = Result<SshSession>> + Send {
        SshSession::connect(config)
    }
}

/// An authenticated interactive shell on one device.
pub struct SshSession {
    handle: Handle<SshHandler>,
    channel: Channel<Msg>,
    platform: Platform,
    config: SessionConfig,
    buffer: PatternBuffer,
    last_prompt: String,
}

impl SshSession {
    /// Connect, authenticate, and open the interactive shell.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let platform = platform::lookup(&config.platform)?;

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        let mut handle = tokio::time::timeout(
            config.timeout,
            client::connect(
                ssh_config,
                (config.host.as_str(), config.port),
                SshHandler,
            ),
        )
        .await
        .map_err(|_| SessionError::ConnectTimeout(config.timeout))?
        .map_err(SessionError::Ssh)?;

        let authed = handle
            .authenticate_password(&config.username, config.password.expose_secret())
            .await
            .map_err(SessionError::Ssh)?
            .success();
        if !authed {
            return Err(SessionError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(SessionError::Ssh)?;
        channel
            .request_pty(
                true,
                "xterm",
                TERMINAL_WIDTH,
                TERMINAL_HEIGHT,
                0,
                0,
                &[],
            )
            .await
            .map_err(SessionError::Ssh)?;
        channel
            .request_shell(true)
            .await
            .map_err(SessionError::Ssh)?;

        let mut session = Self {
            handle,
            channel,
            platform,
            config,
            buffer: PatternBuffer::new(SEARCH_DEPTH),
            last_prompt: String::new(),
        };

        // Swallow the login banner up to the first prompt.
        let prompt_pattern = session.platform.prompt_pattern.clone();
        session.read_until(&prompt_pattern).await?;
        debug!(
            "{}: connected, prompt {:?}",
            session.config.host, session.last_prompt
        );
        Ok(session)
    }

    /// Send one line, terminated with a newline.
    async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut payload = Vec::with_capacity(line.len() + 1);
        payload.extend_from_slice(line.as_bytes());
        payload.push(b'\n');
        self.channel
            .data(&payload[..])
            .await
            .map_err(SessionError::Ssh)?;
        Ok(())
    }

    /// Accumulate output until `pattern` appears in the buffer tail, then
    /// drain and return everything read.
    async fn read_until(&mut self, pattern: &Regex) -> Result<String> {
        let patterns = std::slice::from_ref(pattern);
        let (_, text) = self.read_until_any(patterns).await?;
        Ok(text)
    }

    /// Like [`read_until`](Self::read_until), for several candidate patterns.
    /// Returns the index of the pattern that matched first.
    async fn read_until_any(&mut self, patterns: &[Regex]) -> Result<(usize, String)> {
        let deadline = tokio::time::Instant::now() + self.config.timeout;
        loop {
            for (index, pattern) in patterns.iter().enumerate() {
                if self.buffer.tail_contains(pattern) {
                    let text = self.buffer.take_string();
                    self.remember_prompt(&text);
                    return Ok((index, text));
                }
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(SessionError::PromptTimeout(self.config.timeout).into());
            }

            let msg = tokio::time::timeout(remaining, self.channel.wait())
                .await
                .map_err(|_| SessionError::PromptTimeout(self.config.timeout))?;
            match msg {
                Some(ChannelMsg::Data { ref data }) => self.buffer.extend(data),
                Some(ChannelMsg::ExtendedData { ref data, .. }) => self.buffer.extend(data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(SessionError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }

    /// Record the trailing prompt line of a completed read.
    fn remember_prompt(&mut self, text: &str) {
        if let Some(line) = text.lines().rev().find(|line| !line.trim().is_empty()) {
            self.last_prompt = line.trim().to_string();
        }
    }
}

/// Strip the command echo and the trailing prompt from raw output.
fn normalize_output(prompt_pattern: &Regex, command: &str, raw: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().collect();
    if lines.first().is_some_and(|line| line.contains(command)) {
        lines.remove(0);
    }
    if lines
        .last()
        .is_some_and(|line| prompt_pattern.is_match(line.as_bytes()))
    {
        lines.pop();
    }
    let mut output = lines.join("\n");
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

impl DeviceSession for SshSession {
    async fn elevate(&mut self) -> Result<()> {
        let Some(enable) = self.platform.enable.clone() else {
            return Ok(());
        };
        if self
            .platform
            .privileged_pattern
            .is_match(self.last_prompt.as_bytes())
        {
            return Ok(());
        }

        self.send_line(&enable.command).await?;

        // The device answers with either a secret prompt or the elevated
        // prompt directly.
        let candidates = [
            enable.auth_prompt.clone(),
            self.platform.privileged_pattern.clone(),
        ];
        let (matched, _) = self.read_until_any(&candidates).await?;
        if matched == 0 {
            let secret = self
                .config
                .secret
                .as_ref()
                .unwrap_or(&self.config.password)
                .expose_secret()
                .to_string();
            self.send_line(&secret).await?;

            let privileged = self.platform.privileged_pattern.clone();
            if self.read_until(&privileged).await.is_err() {
                return Err(SessionError::ElevationFailed {
                    platform: self.platform.name.clone(),
                }
                .into());
            }
        }
        debug!("{}: elevated to {:?}", self.config.host, self.last_prompt);
        Ok(())
    }

    async fn prompt(&mut self) -> Result<String> {
        self.send_line("").await?;
        let pattern = self.platform.prompt_pattern.clone();
        self.read_until(&pattern).await?;
        Ok(self.last_prompt.clone())
    }

    async fn run(&mut self, command: &str) -> Result<String> {
        debug!("{}: running {command:?}", self.config.host);
        self.send_line(command).await?;
        let pattern = self.platform.prompt_pattern.clone();
        let raw = self.read_until(&pattern).await?;
        Ok(normalize_output(&pattern, command, &raw))
    }

    async fn close(&mut self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(SessionError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler for russh. Host keys are accepted without
/// verification.
struct SshHandler;

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cisco_prompt_pattern() -> Regex {
        platform::lookup("cisco_ios").unwrap().prompt_pattern
    }

    #[test]
    fn test_normalize_strips_echo_and_prompt() {
        let raw = "show version\r\nCisco IOS Software\r\nuptime is 1 week\r\nr1#";
        assert_eq!(
            normalize_output(&cisco_prompt_pattern(), "show version", raw),
            "Cisco IOS Software\nuptime is 1 week\n"
        );
    }

    #[test]
    fn test_normalize_keeps_body_without_echo() {
        let raw = "line one\r\nline two\r\nr1#";
        assert_eq!(
            normalize_output(&cisco_prompt_pattern(), "show clock", raw),
            "line one\nline two\n"
        );
    }

    #[test]
    fn test_normalize_empty_output() {
        let raw = "show clock\r\nr1#";
        assert_eq!(normalize_output(&cisco_prompt_pattern(), "show clock", raw), "");
    }
}
