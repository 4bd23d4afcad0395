//! # djinn-proto
//!
//! Protocol plumbing for the djinn IRC bot: a line framer that splits the
//! inbound byte stream into discrete protocol lines, and a message codec
//! that turns structured outbound commands into wire lines and classifies
//! inbound lines into events.
//!
//! The decode side is deliberately lenient: a line that does not match a
//! known shape is passed through as [`Event::Other`] rather than failing,
//! so one garbled line never takes down a session.
//!
//! ## Quick Start
//!
//! ```rust
//! use djinn_proto::{Command, Event};
//!
//! // Encoding outbound commands
//! let join = Command::Join("#rust".to_string());
//! assert_eq!(join.to_string(), "JOIN #rust");
//!
//! // Classifying inbound lines
//! let event = Event::parse(":nick!user@host PRIVMSG #rust :Hello!");
//! assert!(matches!(event, Event::Privmsg { .. }));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod line;
pub mod message;

pub use self::error::ProtocolError;
pub use self::line::LineCodec;
pub use self::message::{Command, Event};
