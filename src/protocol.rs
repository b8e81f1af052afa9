//! Text command protocol
//!
//! One command per datagram, matched on an exact, case-sensitive prefix:
//!
//! | datagram        | command        |
//! |-----------------|----------------|
//! | `record <path>` | start capture  |
//! | `play <path>`   | playback stub  |
//! | `stop`          | cancel capture |
//!
//! Anything else is ignored. `stop` takes no argument, so a datagram only
//! counts as a stop when nothing but whitespace or NULs follow it; that keeps
//! our own `stopped recording` and `stop failed` broadcasts, which loop back
//! over the shared socket, from being read as commands.

pub const RECORD_PREFIX: &str = "record ";
pub const PLAY_PREFIX: &str = "play ";
pub const STOP_COMMAND: &str = "stop";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Record { path: String },
    Play { path: String },
    Stop,
}

impl Command {
    /// Classify one datagram. Returns `None` for anything unrecognized.
    pub fn parse(datagram: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(datagram).ok()?;

        if let Some(path) = text.strip_prefix(RECORD_PREFIX) {
            return Some(Command::Record { path: clean_path(path) });
        }
        if let Some(path) = text.strip_prefix(PLAY_PREFIX) {
            return Some(Command::Play { path: clean_path(path) });
        }
        if text.trim_end_matches(|c: char| c.is_ascii_whitespace() || c == '\0') == STOP_COMMAND {
            return Some(Command::Stop);
        }
        None
    }
}

fn strip_terminators(text: &str) -> &str {
    text.trim_end_matches(&['\r', '\n', '\0'][..])
}

fn clean_path(path: &str) -> String {
    strip_terminators(path).to_string()
}
