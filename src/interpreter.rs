//! Operator command line: a non-blocking line editor and its grammar.
//!
//! The terminal delivers one keystroke per scheduler iteration. Printable
//! characters build up an [`InputLine`]; end-of-line commits it. A committed
//! line is parsed into a [`ConsoleCommand`] and encoded as bus bytes on the
//! [`CommandQueue`].
//!
//! # Grammar
//!
//! | Input | Bytes queued |
//! |-------|--------------|
//! | `q` | none; the console shuts down |
//! | `g` | system start |
//! | `s` | system stop |
//! | `tr <id> <speed>` | speed, id, solenoid off |
//! | `rv <id>` | reverse speed, id, solenoid off |
//! | `sw <id> <S\|C>` | straight/curved, id, solenoid off |
//!
//! Anything else is ignored. Numbers are read from their leading decimal
//! digits and truncated to a byte; a token without digits reads as 0.
//!
//! ```rust
//! use train_console::interpreter::{ConsoleCommand, SwitchDirection};
//!
//! assert_eq!(
//!     ConsoleCommand::parse("tr 5 10"),
//!     Some(ConsoleCommand::Train { id: 5, speed: 10 })
//! );
//! assert_eq!(
//!     ConsoleCommand::parse("sw 12 C"),
//!     Some(ConsoleCommand::Switch { id: 12, direction: SwitchDirection::Curved })
//! );
//! assert_eq!(ConsoleCommand::parse("  q "), Some(ConsoleCommand::Quit));
//! assert_eq!(ConsoleCommand::parse("fly 3"), None);
//! ```

use crate::config::{Opcodes, INPUT_LINE_MAX};
use crate::queue::{CommandQueue, QueuedCommand};
use crate::traits::ByteChannel;
use heapless::{String as HString, Vec as HVec};

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;

/// Most bytes a single command expands to.
pub const MAX_COMMAND_BYTES: usize = 3;

/// Bus bytes for one command, in send order.
pub type EncodedCommand = HVec<QueuedCommand, MAX_COMMAND_BYTES>;

/// Bounded line being typed by the operator.
pub type InputLine = HString<INPUT_LINE_MAX>;

/// Switch position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwitchDirection {
    /// Through route.
    Straight,
    /// Diverging route.
    Curved,
}

impl SwitchDirection {
    /// `S`/`s` is straight; anything else, including a missing token, is curved.
    pub fn from_token(token: &str) -> Self {
        match token.as_bytes().first() {
            Some(b'S' | b's') => SwitchDirection::Straight,
            _ => SwitchDirection::Curved,
        }
    }
}

/// A parsed operator command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Leave the control loop.
    Quit,
    /// Power the layout.
    Go,
    /// Cut layout power.
    Stop,
    /// Set a train's speed.
    Train {
        /// Train number.
        id: u8,
        /// Speed step.
        speed: u8,
    },
    /// Reverse a train.
    Reverse {
        /// Train number.
        id: u8,
    },
    /// Throw a switch.
    Switch {
        /// Switch number.
        id: u8,
        /// Target position.
        direction: SwitchDirection,
    },
}

impl ConsoleCommand {
    /// Parse one committed line.
    ///
    /// Returns `None` for empty lines and unknown verbs.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let mut tokens = trimmed.split_whitespace();
        let verb = tokens.next()?;
        let mut arg = || tokens.next().unwrap_or("");

        match verb {
            "q" if trimmed == "q" => Some(ConsoleCommand::Quit),
            "g" if trimmed == "g" => Some(ConsoleCommand::Go),
            "s" if trimmed == "s" => Some(ConsoleCommand::Stop),
            "tr" => {
                let id = parse_number(arg());
                let speed = parse_number(arg());
                Some(ConsoleCommand::Train { id, speed })
            }
            "rv" => Some(ConsoleCommand::Reverse {
                id: parse_number(arg()),
            }),
            "sw" => {
                let id = parse_number(arg());
                let direction = SwitchDirection::from_token(arg());
                Some(ConsoleCommand::Switch { id, direction })
            }
            _ => None,
        }
    }

    /// Bus bytes for this command.
    ///
    /// Every train and switch write is followed by a solenoid-off byte so a
    /// switch coil is never left energized.
    pub fn encode(&self, opcodes: &Opcodes) -> EncodedCommand {
        let (sequence, len) = match *self {
            ConsoleCommand::Quit => ([0; MAX_COMMAND_BYTES], 0),
            ConsoleCommand::Go => ([opcodes.system_start, 0, 0], 1),
            ConsoleCommand::Stop => ([opcodes.system_stop, 0, 0], 1),
            ConsoleCommand::Train { id, speed } => ([speed, id, opcodes.solenoid_off], 3),
            ConsoleCommand::Reverse { id } => ([opcodes.train_reverse, id, opcodes.solenoid_off], 3),
            ConsoleCommand::Switch { id, direction } => {
                let position = match direction {
                    SwitchDirection::Straight => opcodes.switch_straight,
                    SwitchDirection::Curved => opcodes.switch_curved,
                };
                ([position, id, opcodes.solenoid_off], 3)
            }
        };
        sequence[..len]
            .iter()
            .map(|&byte| QueuedCommand::immediate(byte))
            .collect()
    }
}

/// Read an unsigned decimal from the token's leading digits.
///
/// Stops at the first non-digit, so `"12ab"` is 12 and `"x"` is 0. The
/// value wraps to a byte.
///
/// ```rust
/// use train_console::interpreter::parse_number;
///
/// assert_eq!(parse_number("14"), 14);
/// assert_eq!(parse_number("7mph"), 7);
/// assert_eq!(parse_number("fast"), 0);
/// assert_eq!(parse_number("300"), 44);
/// ```
pub fn parse_number(token: &str) -> u8 {
    token
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u8, |n, digit| n.wrapping_mul(10).wrapping_add(digit - b'0'))
}

/// What a committed line did.
#[derive(Clone, Debug, PartialEq)]
pub struct Commit {
    /// The line as typed.
    pub line: InputLine,
    /// The parsed command, if the line was recognised.
    pub command: Option<ConsoleCommand>,
    /// Bytes accepted by the queue.
    pub queued: usize,
    /// Bytes dropped because the queue was full.
    pub dropped: usize,
}

/// Result of one keystroke.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyEvent {
    /// A character was appended; the line is now this long.
    Appended {
        /// The character.
        ch: char,
        /// Line length after appending.
        len: usize,
    },
    /// The last character was removed; the line is now this long.
    Erased {
        /// Line length after erasing.
        len: usize,
    },
    /// The key changed nothing.
    Ignored,
    /// The line was committed and cleared.
    Committed(Commit),
    /// The operator asked to quit.
    Quit,
}

/// Line editor plus command dispatch onto the queue.
#[derive(Clone, Debug)]
pub struct Interpreter {
    line: InputLine,
    opcodes: Opcodes,
}

impl Interpreter {
    /// Creates an interpreter with an empty line.
    pub fn new(opcodes: Opcodes) -> Self {
        Self {
            line: InputLine::new(),
            opcodes,
        }
    }

    /// Read at most one key from `terminal` and handle it.
    pub fn poll<T: ByteChannel>(&mut self, terminal: &mut T, queue: &mut CommandQueue) -> KeyEvent {
        match terminal.try_read_byte() {
            Some(key) => self.handle_key(key, queue),
            None => KeyEvent::Ignored,
        }
    }

    /// Apply one keystroke.
    pub fn handle_key(&mut self, key: u8, queue: &mut CommandQueue) -> KeyEvent {
        match key {
            BACKSPACE | DELETE => match self.line.pop() {
                Some(_) => KeyEvent::Erased {
                    len: self.line.len(),
                },
                None => KeyEvent::Ignored,
            },
            b'\n' | b'\r' => self.commit(queue),
            0x20..=0x7E => {
                let ch = char::from(key);
                if self.line.push(ch).is_err() {
                    return KeyEvent::Ignored;
                }
                if self.line.len() == INPUT_LINE_MAX {
                    self.commit(queue)
                } else {
                    KeyEvent::Appended {
                        ch,
                        len: self.line.len(),
                    }
                }
            }
            _ => KeyEvent::Ignored,
        }
    }

    fn commit(&mut self, queue: &mut CommandQueue) -> KeyEvent {
        let line = core::mem::take(&mut self.line);
        let command = ConsoleCommand::parse(&line);
        tracing::debug!(line = line.as_str(), ?command, "input committed");

        let (queued, dropped) = match command {
            Some(ConsoleCommand::Quit) => return KeyEvent::Quit,
            Some(cmd) => self.submit(&cmd, queue),
            None => {
                if !line.trim().is_empty() {
                    tracing::debug!(line = line.as_str(), "unrecognised command ignored");
                }
                (0, 0)
            }
        };

        KeyEvent::Committed(Commit {
            line,
            command,
            queued,
            dropped,
        })
    }

    /// Queue the bytes for `command`, returning (accepted, dropped).
    pub fn submit(&self, command: &ConsoleCommand, queue: &mut CommandQueue) -> (usize, usize) {
        let mut queued = 0;
        let mut dropped = 0;
        for item in command.encode(&self.opcodes) {
            if queue.enqueue(item) {
                queued += 1;
            } else {
                dropped += 1;
            }
        }
        (queued, dropped)
    }

    /// The line being typed.
    pub fn line(&self) -> &str {
        &self.line
    }
}
