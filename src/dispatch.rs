//! Behavior rules for inbound channel messages.

use djinn_proto::Command;

use crate::config::Config;

/// Longest sender name the dispatcher will act on. A prefix with a missing
/// delimiter makes the codec extract a runaway sender field; this bound
/// keeps such messages from matching any rule.
const MAX_SENDER_LEN: usize = 17;

/// Notice sent back when a `.tell` cannot be parsed.
const TELL_USAGE: &str = "Could not parse. The message should be in the format of \
'.tell [target] [message]' to work properly.";

/// Outcome of dispatching one inbound message.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchResult {
    /// Replies to send, in order.
    pub replies: Vec<Command>,
    /// The session should terminate once the replies are sent.
    pub quit: bool,
}

/// Apply the bot's rules to one inbound message.
///
/// Rules are evaluated independently and in a fixed order (greeting, relay,
/// admin shutdown), so a single message can produce several replies. When
/// the shutdown rule fires, `Quit` is the last reply.
pub fn dispatch(sender: &str, body: &str, config: &Config) -> DispatchResult {
    let mut result = DispatchResult::default();

    if sender.chars().count() >= MAX_SENDER_LEN {
        return result;
    }

    if body.contains(&format!("Hi {}", config.bot.nick)) {
        result.replies.push(Command::Privmsg(
            config.bot.channel.clone(),
            format!("Hello {sender}!"),
        ));
    }

    if body.starts_with(".tell") {
        let (target, text) = parse_tell(sender, body);
        result.replies.push(Command::Privmsg(target, text));
    }

    if sender.to_lowercase() == config.bot.admin.to_lowercase()
        && body.trim_end() == config.bot.shutdown_phrase
    {
        result.replies.push(Command::Privmsg(
            config.bot.channel.clone(),
            "oh...okay. :'(".to_string(),
        ));
        result.replies.push(Command::Quit);
        result.quit = true;
    }

    result
}

/// Parse `.tell [target] [message]`.
///
/// Anything short of both a target and a message falls back to telling the
/// sender how the command works.
fn parse_tell(sender: &str, body: &str) -> (String, String) {
    match body.split_once(' ').and_then(|(_, rest)| rest.split_once(' ')) {
        Some((target, text)) => (target.to_string(), text.to_string()),
        None => (sender.to_string(), TELL_USAGE.to_string()),
    }
}
