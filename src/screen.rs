//! Status screen rendering.
//!
//! Draws the operator-facing regions described by [`ScreenLayout`]:
//!
//! ```text
//! line 1   Time elapsed: 2:03,4  counter: 0xfffe1a40
//! line 2   tr 5 10                           <- last committed command
//! line 3   |A8:1   |A6:1   |C1:1   ...       <- recent sensor strip
//! ...
//! line 20  sw 3 S_                           <- input being typed
//! ```
//!
//! After any redraw outside the input line, the cursor is put back at the
//! end of the input so typing continues where the operator expects.

use crate::config::ScreenLayout;
use crate::error::ChannelError;
use crate::interpreter::KeyEvent;
use crate::sensor::SensorEvent;
use crate::timebase::ElapsedClock;
use crate::traits::ConsoleDisplay;
use core::fmt::Write;
use heapless::String as HString;

type Cell = HString<48>;

const COLUMN_FIRST: u16 = 1;

/// Renders console state onto a [`ConsoleDisplay`].
#[derive(Clone, Debug, Default)]
pub struct Screen {
    layout: ScreenLayout,
}

impl Screen {
    /// Creates a renderer for `layout`.
    pub fn new(layout: ScreenLayout) -> Self {
        Self { layout }
    }

    /// Clear everything and put the cursor on the input line.
    pub fn init<D: ConsoleDisplay>(&self, display: &mut D) -> Result<(), ChannelError> {
        display.clear_screen()?;
        self.return_to_input(display, 0)
    }

    /// Redraw the elapsed time readout.
    pub fn elapsed<D: ConsoleDisplay>(
        &self,
        display: &mut D,
        clock: ElapsedClock,
        raw_sample: u32,
        input_len: usize,
    ) -> Result<(), ChannelError> {
        let mut text = Cell::new();
        // Cell holds the longest readout ("Time elapsed: 7158278:12,3  counter: 0xffffffff")
        let _ = write!(text, "Time elapsed: {}  counter: {:#010x}", clock, raw_sample);
        display.replace_line(self.layout.elapsed_line, COLUMN_FIRST, &text)?;
        self.return_to_input(display, input_len)
    }

    /// Draw one sensor event in its recent-strip cell.
    pub fn sensor<D: ConsoleDisplay>(
        &self,
        display: &mut D,
        cell: usize,
        event: &SensorEvent,
        input_len: usize,
    ) -> Result<(), ChannelError> {
        let mut text = Cell::new();
        let _ = write!(
            text,
            "|{}{}:{}",
            event.decoder_id, event.sensor_id, event.value
        );
        let width = usize::from(self.layout.sensor_column_width);
        while text.len() < width && text.push(' ').is_ok() {}
        display.move_cursor(self.layout.recent_sensor_line, self.layout.sensor_column(cell))?;
        display.write_str(&text)?;
        self.return_to_input(display, input_len)
    }

    /// Reflect a keystroke on the input and last-command lines.
    pub fn key<D: ConsoleDisplay>(&self, display: &mut D, event: &KeyEvent) -> Result<(), ChannelError> {
        match event {
            KeyEvent::Appended { ch, len } => {
                display.move_cursor(self.layout.input_line, *len as u16)?;
                let mut buf = [0u8; 4];
                display.write_str(ch.encode_utf8(&mut buf))
            }
            KeyEvent::Erased { len } => {
                self.return_to_input(display, *len)?;
                display.clear_to_eol()
            }
            KeyEvent::Committed(commit) => {
                display.move_cursor(self.layout.input_line, COLUMN_FIRST)?;
                display.clear_to_eol()?;
                display.replace_line(self.layout.last_command_line, COLUMN_FIRST, &commit.line)?;
                self.return_to_input(display, 0)
            }
            KeyEvent::Quit => {
                display.move_cursor(self.layout.input_line, COLUMN_FIRST)?;
                display.clear_to_eol()
            }
            KeyEvent::Ignored => Ok(()),
        }
    }

    /// Park the cursor below everything before exit.
    pub fn park<D: ConsoleDisplay>(&self, display: &mut D) -> Result<(), ChannelError> {
        display.move_cursor(self.layout.bottom_line, COLUMN_FIRST)
    }

    fn return_to_input<D: ConsoleDisplay>(&self, display: &mut D, input_len: usize) -> Result<(), ChannelError> {
        display.move_cursor(self.layout.input_line, input_len as u16 + 1)
    }

    /// The layout being drawn.
    pub fn layout(&self) -> &ScreenLayout {
        &self.layout
    }
}
