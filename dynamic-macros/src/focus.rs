//! Line based configuration channel.
//!
//! A request is one line: a command word followed by optional arguments, all
//! separated by whitespace. The reply is zero or more body lines followed by a
//! line holding a single `.`. A request no plugin recognizes gets no reply.

use core::fmt::{self, Write};
use core::str::FromStr;

use crate::error::MacroError;
use crate::host::{EventResult, MacroHost, MacroPlugin};
use crate::types::protocol::{HELP_COMMAND, LINE_END, PLUGINS_COMMAND, REPLY_END};

/// A request split into its command word and the rest of the line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FocusRequest<'a> {
    pub command: &'a str,
    pub args: &'a str,
}

impl<'a> FocusRequest<'a> {
    /// Split `line`, `None` if it holds no command.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (command, args) = match line.split_once(|c: char| c.is_ascii_whitespace()) {
            Some((command, args)) => (command, args.trim_start()),
            None => (line, ""),
        };
        Some(Self { command, args })
    }
}

/// Failure of a command handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyError {
    /// The command failed, the failure is reported to the host software
    Command(MacroError),
    /// The reply couldn't be written
    Write(fmt::Error),
}

impl From<MacroError> for ReplyError {
    fn from(e: MacroError) -> Self {
        ReplyError::Command(e)
    }
}

impl From<fmt::Error> for ReplyError {
    fn from(e: fmt::Error) -> Self {
        ReplyError::Write(e)
    }
}

/// Parse the argument at position `index` as a number.
pub fn parse_arg<T: FromStr>(token: &str, index: usize) -> Result<T, MacroError> {
    token.parse().map_err(|_| MacroError::InvalidArgument { index })
}

/// Parse the first argument, `None` if there are no arguments.
pub fn parse_first_arg<T: FromStr>(args: &str) -> Result<Option<T>, MacroError> {
    args.split_ascii_whitespace()
        .next()
        .map(|token| parse_arg(token, 0))
        .transpose()
}

/// Write a failure line.
pub fn write_error<W: Write>(out: &mut W, error: &MacroError) -> fmt::Result {
    write!(out, "error: {}{}", error, LINE_END)
}

/// Dispatch one request line to `plugin` and frame its reply.
///
/// `help` and `plugins` are answered by every plugin, so they are terminated
/// here even though the plugin doesn't consume them.
pub fn process_line<P, H, W>(plugin: &mut P, line: &str, host: &mut H, out: &mut W) -> Result<EventResult, fmt::Error>
where
    P: MacroPlugin<H>,
    H: MacroHost,
    W: Write,
{
    let Some(request) = FocusRequest::parse(line) else {
        return Ok(EventResult::Ok);
    };
    debug!("Focus request: {}", request.command);

    let result = plugin.on_config_command(request.command, request.args, host, out)?;
    let builtin = request.command == HELP_COMMAND || request.command == PLUGINS_COMMAND;
    if result == EventResult::Consumed || builtin {
        write!(out, "{}{}", REPLY_END, LINE_END)?;
    }
    Ok(result)
}
