//! Command dispatch for the bottom board.
//!
//! Maps each received line to an action on the output pin or to a reply
//! line.  Commands are idempotent: applying `turn_ON_led` twice leaves the
//! output HIGH and reports `changed: false` the second time.

use crate::app::commands::LinkCommand;
use crate::app::ports::OutputPort;
use crate::config::TokenTable;
use crate::state::Level;

/// What a dispatched line did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch<'a> {
    /// The output was driven to `level`.
    Output { level: Level, changed: bool },
    /// The line must be answered with `reply`.
    Reply(&'a str),
    /// The line is valid vocabulary but needs no action here (e.g. a
    /// stray `PONG`).
    Ignored,
    /// The line matched no command.
    Unknown,
}

/// Stateless mapping from command lines to output actions.
pub struct CommandDispatcher {
    tokens: TokenTable,
}

impl CommandDispatcher {
    pub fn new(tokens: TokenTable) -> Self {
        Self { tokens }
    }

    /// Dispatch one trimmed line against `output`.
    pub fn dispatch<O: OutputPort>(&self, line: &str, output: &mut O) -> Dispatch<'_> {
        let Some(command) = LinkCommand::parse(line, &self.tokens) else {
            return Dispatch::Unknown;
        };

        match command {
            LinkCommand::LedOn => Self::apply(output, Level::High),
            LinkCommand::LedOff => Self::apply(output, Level::Low),
            LinkCommand::Ping => Dispatch::Reply(LinkCommand::Pong.token(&self.tokens)),
            LinkCommand::Pong => Dispatch::Ignored,
        }
    }

    fn apply<O: OutputPort>(output: &mut O, level: Level) -> Dispatch<'static> {
        let changed = output.level() != level;
        output.set_level(level);
        Dispatch::Output { level, changed }
    }
}
