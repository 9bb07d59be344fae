//! Display abstraction for the operator screen.
//!
//! The core addresses the terminal as a grid of 1-based (line, column)
//! positions. How a cursor move is encoded on the wire is up to the
//! implementation; the simulator uses ANSI escape sequences.

use crate::error::ChannelError;

/// Cursor-addressed text display.
///
/// # Example
///
/// ```ignore
/// use train_console::traits::ConsoleDisplay;
///
/// struct MyScreen { /* ... */ }
///
/// impl ConsoleDisplay for MyScreen {
///     fn clear_screen(&mut self) -> Result<(), ChannelError> { Ok(()) }
///     fn move_cursor(&mut self, line: u16, column: u16) -> Result<(), ChannelError> { Ok(()) }
///     fn clear_to_eol(&mut self) -> Result<(), ChannelError> { Ok(()) }
///     fn write_str(&mut self, text: &str) -> Result<(), ChannelError> { Ok(()) }
/// }
/// ```
pub trait ConsoleDisplay {
    /// Clears the whole screen.
    fn clear_screen(&mut self) -> Result<(), ChannelError>;

    /// Moves the cursor to a 1-based line and column.
    fn move_cursor(&mut self, line: u16, column: u16) -> Result<(), ChannelError>;

    /// Clears from the cursor to the end of the current line.
    fn clear_to_eol(&mut self) -> Result<(), ChannelError>;

    /// Writes text at the cursor.
    fn write_str(&mut self, text: &str) -> Result<(), ChannelError>;

    /// Moves the cursor, clears the rest of that line, and writes `text`.
    fn replace_line(&mut self, line: u16, column: u16, text: &str) -> Result<(), ChannelError> {
        self.move_cursor(line, column)?;
        self.clear_to_eol()?;
        self.write_str(text)
    }
}
