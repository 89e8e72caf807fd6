//! Command grammar and the process-wide cooldown gate.

use std::time::{Duration, Instant};

/// Reply to `,help`.
pub const HELP_TEXT: &str =
    "Commands: describe | wins | numbers | date | bird | shitpost | who | when | write | video";

/// Recognized commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Ping,
    Help,
    Describe,
    Wins,
    Numbers,
    Date,
    Who,
    When,
    Bird,
    Shitpost,
    Meme,
    Video,
}

/// Accepted surface words for each command. Matching is case-sensitive.
const SYNONYMS: &[(CommandKind, &[&str])] = &[
    (CommandKind::Ping, &["ping"]),
    (CommandKind::Help, &["help"]),
    (CommandKind::Describe, &["describe"]),
    (CommandKind::Wins, &["wins", "win"]),
    (CommandKind::Numbers, &["numbers", "number", "nums", "num"]),
    (CommandKind::Date, &["date", "data", "time", "datetime"]),
    (CommandKind::Who, &["who", "pick", "any", "user", "username"]),
    (CommandKind::When, &["when", "die", "death"]),
    (CommandKind::Bird, &["bird", "birds", "birb", "birbs", "brb"]),
    (CommandKind::Shitpost, &["post", "shitpost", "4chan", "anon", "shit"]),
    (CommandKind::Meme, &["write", "writer", "words", "text", "meme"]),
    (CommandKind::Video, &["video", "vid"]),
];

impl CommandKind {
    pub fn from_word(word: &str) -> Option<Self> {
        SYNONYMS
            .iter()
            .find(|(_, words)| words.contains(&word))
            .map(|(kind, _)| *kind)
    }

    pub fn words(self) -> &'static [&'static str] {
        SYNONYMS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, words)| *words)
            .unwrap_or(&[])
    }

    /// Canonical name, used in logs.
    pub fn name(self) -> &'static str {
        self.words().first().copied().unwrap_or("unknown")
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A command word and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub kind: CommandKind,
    /// Remaining tokens joined with single spaces; `None` when there were none.
    pub args: Option<String>,
}

/// Parse chat text into a command. Returns `None` for text without the prefix
/// or with an unrecognized command word. Repeated prefixes are all stripped.
pub fn parse_command(text: &str, prefix: &str) -> Option<ParsedCommand> {
    let text = text.trim();
    let body = text.trim_start_matches(prefix);
    if body.len() == text.len() {
        return None;
    }

    let mut tokens = body.split_whitespace();
    let kind = CommandKind::from_word(tokens.next()?)?;
    let args = tokens.collect::<Vec<_>>().join(" ");

    Some(ParsedCommand {
        kind,
        args: (!args.is_empty()).then_some(args),
    })
}

/// Minimum spacing between admitted commands, shared by every room and user.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    last_command: Option<Instant>,
    delay: Duration,
}

impl CooldownGate {
    /// Starts closed: the first window after startup is gated too.
    pub fn new(delay: Duration) -> Self {
        Self::starting_at(delay, Instant::now())
    }

    pub fn starting_at(delay: Duration, last_command: Instant) -> Self {
        Self {
            last_command: Some(last_command),
            delay,
        }
    }

    /// A gate that admits the next command immediately.
    pub fn open(delay: Duration) -> Self {
        Self {
            last_command: None,
            delay,
        }
    }

    pub fn blocked(&self) -> bool {
        self.blocked_at(Instant::now())
    }

    pub fn blocked_at(&self, now: Instant) -> bool {
        self.last_command
            .is_some_and(|last| now.saturating_duration_since(last) < self.delay)
    }

    pub fn touch(&mut self) {
        self.touch_at(Instant::now());
    }

    pub fn touch_at(&mut self, now: Instant) {
        self.last_command = Some(now);
    }

    pub fn last_command(&self) -> Option<Instant> {
        self.last_command
    }
}
