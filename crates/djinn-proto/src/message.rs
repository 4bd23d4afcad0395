//! Outbound command encoding and inbound line classification.
//!
//! The wire format is line-oriented text, so classification is substring
//! scanning on the raw line. That brittleness is kept inside this module:
//! callers only ever see [`Command`] and [`Event`].

use std::fmt;

/// Outbound client command.
///
/// Each variant serializes to exactly one wire line via [`fmt::Display`];
/// the line terminator is appended by the transport codec. No escaping is
/// performed, so message text must not contain line terminators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `USER <nick> <nick> <nick> <nick>`
    User(String),
    /// `NICK <nick>`
    Nick(String),
    /// `JOIN <channel>`
    Join(String),
    /// `PONG :pingis`
    Pong,
    /// `PRIVMSG <target> :<text>`
    Privmsg(String, String),
    /// `QUIT ` (the trailing space is part of the wire form)
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::User(nick) => write!(f, "USER {nick} {nick} {nick} {nick}"),
            Command::Nick(nick) => write!(f, "NICK {nick}"),
            Command::Join(channel) => write!(f, "JOIN {channel}"),
            Command::Pong => f.write_str("PONG :pingis"),
            Command::Privmsg(target, text) => write!(f, "PRIVMSG {target} :{text}"),
            Command::Quit => f.write_str("QUIT "),
        }
    }
}

/// One inbound line, classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Server liveness check.
    Ping,
    /// A message addressed to a channel or user.
    Privmsg {
        /// Name of the message origin, extracted from the line prefix.
        sender: String,
        /// Recipient field (channel or nickname).
        target: String,
        /// Message text.
        body: String,
    },
    /// Anything else, carried raw for diagnostics only.
    Other(String),
}

impl Event {
    /// Classify one protocol line.
    ///
    /// Never fails: a line that does not match a known shape comes back as
    /// [`Event::Other`].
    pub fn parse(line: &str) -> Event {
        if line.contains("PING :") {
            return Event::Ping;
        }
        if line.contains("PRIVMSG") {
            if let Some(event) = parse_privmsg(line) {
                return event;
            }
        }
        Event::Other(line.to_string())
    }
}

/// Split a PRIVMSG line into sender, target, and body.
///
/// The sender is the text between the leading `:` and the first `!`. A
/// prefix with a missing delimiter still yields a sender (the first
/// character is dropped unconditionally); consumers bound the damage with
/// a length guard rather than this parser rejecting the line.
fn parse_privmsg(line: &str) -> Option<Event> {
    let (target, body) = line.split_once("PRIVMSG")?.1.split_once(':')?;

    let before_bang = match line.find('!') {
        Some(pos) => &line[..pos],
        None => line,
    };
    let mut chars = before_bang.chars();
    chars.next();

    Some(Event::Privmsg {
        sender: chars.as_str().to_string(),
        target: target.trim().to_string(),
        body: body.to_string(),
    })
}
