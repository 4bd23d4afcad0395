//! Session lifecycle: handshake, channel join, and the serve loop.
//!
//! The state machine is sans-IO: it consumes framed lines and produces
//! commands to send, while [`run`] owns the transport and performs the
//! actual reads and writes. Phases only ever move forward.

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

use djinn_proto::{Command, Event, LineCodec, ProtocolError};

use crate::config::Config;
use crate::dispatch;

/// Marker the server sends when the channel member list is complete.
const JOIN_COMPLETE_MARKER: &str = "End of /NAMES list.";

/// Connection lifecycle phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Not yet registered with the server.
    #[default]
    Connecting,
    /// JOIN sent, waiting for the member list to finish.
    Joining,
    /// Normal operation: answering pings and channel messages.
    Serving,
    /// QUIT sent or stream ended; no further reads or writes.
    Terminated,
}

/// Sans-IO session state machine.
pub struct Session {
    config: Config,
    phase: Phase,
}

impl Session {
    /// Create a session in the initial phase.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            phase: Phase::Connecting,
        }
    }

    /// Get the current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Begin the handshake. Returns the registration and join commands, and
    /// advances to `Joining`.
    pub fn start(&mut self) -> Vec<Command> {
        let nick = self.config.bot.nick.clone();
        self.phase = Phase::Joining;
        vec![
            Command::User(nick.clone()),
            Command::Nick(nick),
            Command::Join(self.config.bot.channel.clone()),
        ]
    }

    /// Feed one inbound line and collect the commands to send, in order.
    pub fn feed(&mut self, line: &str) -> Vec<Command> {
        match self.phase {
            Phase::Connecting | Phase::Terminated => Vec::new(),
            Phase::Joining => {
                debug!(line = %line, "join wait");
                // Only an unclassified server line can complete the join; a
                // message that merely quotes the marker does not count.
                match Event::parse(line) {
                    Event::Other(raw) if raw.contains(JOIN_COMPLETE_MARKER) => {
                        info!(channel = %self.config.bot.channel, "Channel joined");
                        self.phase = Phase::Serving;
                    }
                    _ => {}
                }
                Vec::new()
            }
            Phase::Serving => match Event::parse(line) {
                Event::Ping => vec![Command::Pong],
                Event::Privmsg {
                    sender,
                    target,
                    body,
                } => {
                    debug!(sender = %sender, target = %target, "Message received");
                    let result = dispatch::dispatch(&sender, &body, &self.config);
                    if result.quit {
                        info!(sender = %sender, "Shutdown requested");
                        self.phase = Phase::Terminated;
                    }
                    result.replies
                }
                Event::Other(raw) => {
                    trace!(line = %raw, "Unhandled line");
                    Vec::new()
                }
            },
        }
    }
}

/// Connect to the configured server and run the session to completion.
///
/// Returns `Ok` only for a clean admin-requested shutdown; the stream
/// ending in any other phase is a transport failure.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.server.addr();
    info!(server = %addr, nick = %config.bot.nick, "Connecting");

    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;

    let codec = match config.limits.max_line_len {
        Some(limit) => LineCodec::with_max_len(limit),
        None => LineCodec::new(),
    };
    let mut framed = Framed::new(stream, codec);

    let mut session = Session::new(config);
    for command in session.start() {
        framed
            .send(command.to_string())
            .await
            .context("handshake write failed")?;
    }

    while let Some(read) = framed.next().await {
        let line = match read {
            Ok(line) => line,
            Err(ProtocolError::Decode(e)) => {
                // One garbled line is not worth the connection
                warn!(error = %e, "Skipping undecodable line");
                continue;
            }
            Err(e) => return Err(e).context("transport read failed"),
        };

        // All replies for one line go out before the next read
        for command in session.feed(&line) {
            framed
                .send(command.to_string())
                .await
                .context("transport write failed")?;
        }

        if session.phase() == Phase::Terminated {
            info!("Session terminated");
            return Ok(());
        }
    }

    match session.phase() {
        Phase::Terminated => Ok(()),
        phase => anyhow::bail!("connection closed by server during {phase:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> Config {
        toml::from_str(
            r##"
[bot]
nick = "djinn"
channel = "#dogstar"
admin = "boss"
shutdown_phrase = "goodnight"
"##,
        )
        .unwrap()
    }

    #[test]
    fn start_registers_then_joins() {
        let mut session = Session::new(make_config());
        assert_eq!(session.phase(), Phase::Connecting);

        let commands = session.start();
        assert_eq!(
            commands,
            vec![
                Command::User("djinn".to_string()),
                Command::Nick("djinn".to_string()),
                Command::Join("#dogstar".to_string()),
            ]
        );
        assert_eq!(session.phase(), Phase::Joining);
    }

    #[test]
    fn joining_waits_for_names_end() {
        let mut session = Session::new(make_config());
        let _ = session.start();

        // Unrelated lines are consumed without effect
        assert!(session.feed(":server 001 djinn :Welcome").is_empty());
        assert!(session.feed(":server 375 djinn :- MOTD -").is_empty());
        assert!(session.feed(":server 353 djinn = #dogstar :djinn alice").is_empty());
        assert_eq!(session.phase(), Phase::Joining);

        let commands = session.feed(":server 366 djinn #dogstar :End of /NAMES list.");
        assert!(commands.is_empty());
        assert_eq!(session.phase(), Phase::Serving);
    }

    #[test]
    fn joining_does_not_answer_pings() {
        let mut session = Session::new(make_config());
        let _ = session.start();

        assert!(session.feed("PING :server.example").is_empty());
        assert_eq!(session.phase(), Phase::Joining);
    }

    #[test]
    fn quoted_marker_in_a_message_does_not_complete_join() {
        let mut session = Session::new(make_config());
        let _ = session.start();

        let line = ":alice!user@host PRIVMSG #dogstar :End of /NAMES list.";
        assert!(session.feed(line).is_empty());
        assert_eq!(session.phase(), Phase::Joining);
    }

    fn serving_session() -> Session {
        let mut session = Session::new(make_config());
        let _ = session.start();
        let _ = session.feed(":server 366 djinn #dogstar :End of /NAMES list.");
        assert_eq!(session.phase(), Phase::Serving);
        session
    }

    #[test]
    fn serving_answers_ping_with_pong() {
        let mut session = serving_session();
        let commands = session.feed("PING :server.example");
        assert_eq!(commands, vec![Command::Pong]);
        assert_eq!(session.phase(), Phase::Serving);
    }

    #[test]
    fn serving_routes_privmsg_to_dispatcher() {
        let mut session = serving_session();
        let commands = session.feed(":alice!user@host PRIVMSG #dogstar :Hi djinn");
        assert_eq!(
            commands,
            vec![Command::Privmsg(
                "#dogstar".to_string(),
                "Hello alice!".to_string()
            )]
        );
    }

    #[test]
    fn serving_discards_numerics() {
        let mut session = serving_session();
        assert!(session.feed(":server 372 djinn :- motd line").is_empty());
        assert_eq!(session.phase(), Phase::Serving);
    }

    #[test]
    fn shutdown_terminates_with_quit_last() {
        let mut session = serving_session();
        let commands = session.feed(":boss!user@host PRIVMSG #dogstar :goodnight");
        assert_eq!(
            commands,
            vec![
                Command::Privmsg("#dogstar".to_string(), "oh...okay. :'(".to_string()),
                Command::Quit,
            ]
        );
        assert_eq!(session.phase(), Phase::Terminated);
    }

    #[test]
    fn terminated_session_is_inert() {
        let mut session = serving_session();
        let _ = session.feed(":boss!user@host PRIVMSG #dogstar :goodnight");
        assert_eq!(session.phase(), Phase::Terminated);

        assert!(session.feed("PING :server.example").is_empty());
        assert!(session.feed(":alice!user@host PRIVMSG #dogstar :Hi djinn").is_empty());
        assert_eq!(session.phase(), Phase::Terminated);
    }
}
