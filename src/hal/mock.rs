//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for every collaborator trait, so the
//! whole control loop can run on a desktop and in unit tests.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockChannel`] | [`ByteChannel`] | Scripted input, recorded output |
//! | [`MockTrackBus`] | [`ByteChannel`] | Answers sensor poll requests like a decoder bank |
//! | [`MockCounter`] | [`HardwareCounter`] | Controllable down-counter |
//! | [`MockBusStatus`] | [`BusStatus`] | Becomes quiet after N checks |
//! | [`MockRegisters`] | [`RegisterFile`] | Sparse register map with a write log |
//! | [`MockDisplay`] | [`ConsoleDisplay`] | Records operations and keeps a text grid |
//!
//! # Example
//!
//! ```rust
//! use train_console::hal::{MockTrackBus, MockChannel};
//! use train_console::traits::ByteChannel;
//!
//! let mut bus = MockTrackBus::new(192, 5);
//! bus.set_module(0, [0x80, 0x00]);
//!
//! // Poll request for module A goes out on flush, the answer comes back
//! bus.write_byte(193).unwrap();
//! bus.flush().unwrap();
//! assert_eq!(bus.try_read_byte(), Some(0x80));
//! assert_eq!(bus.try_read_byte(), Some(0x00));
//! assert_eq!(bus.try_read_byte(), None);
//! ```
//!
//! [`ByteChannel`]: crate::traits::ByteChannel
//! [`HardwareCounter`]: crate::traits::HardwareCounter
//! [`BusStatus`]: crate::traits::BusStatus
//! [`RegisterFile`]: crate::traits::RegisterFile
//! [`ConsoleDisplay`]: crate::traits::ConsoleDisplay

extern crate alloc;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::config::MAX_DECODERS;
use crate::error::ChannelError;
use crate::traits::{BusStatus, ByteChannel, ConsoleDisplay, HardwareCounter, RegisterFile};

// ============================================================================
// Channel Mocks
// ============================================================================

/// Mock serial channel.
///
/// Bytes passed to [`feed`](Self::feed) come back from `try_read_byte`
/// in order. Everything written is kept for inspection.
#[derive(Debug, Default)]
pub struct MockChannel {
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    flushes: usize,
    write_error: Option<ChannelError>,
}

impl MockChannel {
    /// Creates a channel with nothing to read.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes to be read.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().copied());
    }

    /// Bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Take and clear the written bytes.
    pub fn take_written(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.written)
    }

    /// Number of `flush` calls.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Bytes still waiting to be read.
    pub fn pending_input(&self) -> usize {
        self.incoming.len()
    }

    /// Make every following write and flush fail.
    pub fn fail_writes(&mut self, error: ChannelError) {
        self.write_error = Some(error);
    }
}

impl ByteChannel for MockChannel {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.incoming.pop_front()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ChannelError> {
        if let Some(error) = self.write_error {
            return Err(error);
        }
        self.written.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ChannelError> {
        if let Some(error) = self.write_error {
            return Err(error);
        }
        self.flushes += 1;
        Ok(())
    }
}

/// Mock track bus with a bank of sensor decoders behind it.
///
/// Bytes written are recorded. On `flush`, every poll request sent since
/// the previous flush is answered with the two bytes configured for that
/// module, which then become readable. Other bytes (train and switch
/// commands) are only recorded.
#[derive(Debug)]
pub struct MockTrackBus {
    request_base: u8,
    modules: Vec<[u8; 2]>,
    unsent: Vec<u8>,
    incoming: VecDeque<u8>,
    /// Every byte written, in order.
    pub sent: Vec<u8>,
    /// Poll requests answered so far.
    pub requests_answered: usize,
}

impl MockTrackBus {
    /// Creates a bus whose module `n` (zero-based) answers request
    /// `request_base + n + 1`.
    pub fn new(request_base: u8, module_count: u8) -> Self {
        let count = usize::from(module_count.clamp(1, MAX_DECODERS));
        Self {
            request_base,
            modules: alloc::vec![[0, 0]; count],
            unsent: Vec::new(),
            incoming: VecDeque::new(),
            sent: Vec::new(),
            requests_answered: 0,
        }
    }

    /// Set the response bytes for a module.
    pub fn set_module(&mut self, index: usize, bytes: [u8; 2]) {
        if let Some(slot) = self.modules.get_mut(index) {
            *slot = bytes;
        }
    }

    /// Inject bytes directly onto the receive side (line noise).
    pub fn inject(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().copied());
    }

    /// Sent bytes that were not poll requests.
    pub fn commands_sent(&self) -> Vec<u8> {
        self.sent
            .iter()
            .copied()
            .filter(|b| self.module_for(*b).is_none())
            .collect()
    }

    fn module_for(&self, byte: u8) -> Option<usize> {
        let offset = byte.checked_sub(self.request_base)?;
        let index = usize::from(offset).checked_sub(1)?;
        (index < self.modules.len()).then_some(index)
    }
}

impl ByteChannel for MockTrackBus {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.incoming.pop_front()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ChannelError> {
        self.sent.push(byte);
        self.unsent.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ChannelError> {
        for byte in core::mem::take(&mut self.unsent) {
            if let Some(index) = self.module_for(byte) {
                let [first, second] = self.modules[index];
                self.incoming.push_back(first);
                self.incoming.push_back(second);
                self.requests_answered += 1;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock down-counter.
///
/// Returns its current value from `sample()`, then counts down by the
/// configured step so a running loop sees time pass.
///
/// ```rust
/// use train_console::hal::MockCounter;
/// use train_console::traits::HardwareCounter;
///
/// let mut counter = MockCounter::starting_at(100).with_step(60);
/// assert_eq!(counter.sample(), 100);
/// assert_eq!(counter.sample(), 40);
/// assert_eq!(counter.sample(), u32::MAX - 19); // wrapped
/// ```
#[derive(Debug, Clone)]
pub struct MockCounter {
    value: u32,
    step: u32,
    /// Whether the counter is running.
    pub enabled: bool,
    /// Number of `sample` calls.
    pub samples: usize,
}

impl MockCounter {
    /// Creates an enabled counter at `value` that does not move by itself.
    pub fn starting_at(value: u32) -> Self {
        Self {
            value,
            step: 0,
            enabled: true,
            samples: 0,
        }
    }

    /// Count down by `step` after every sample.
    pub fn with_step(mut self, step: u32) -> Self {
        self.step = step;
        self
    }

    /// Move the counter down by `ticks`, wrapping through zero.
    pub fn count_down(&mut self, ticks: u32) {
        self.value = self.value.wrapping_sub(ticks);
    }

    /// Set the raw value.
    pub fn set(&mut self, value: u32) {
        self.value = value;
    }
}

impl Default for MockCounter {
    fn default() -> Self {
        Self::starting_at(u32::MAX)
    }
}

impl HardwareCounter for MockCounter {
    fn sample(&mut self) -> u32 {
        self.samples += 1;
        let current = self.value;
        if self.enabled {
            self.value = self.value.wrapping_sub(self.step);
        }
        current
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Mock bus readiness.
///
/// Reports busy for a fixed number of checks, then quiet.
#[derive(Debug, Default)]
pub struct MockBusStatus {
    busy_checks: Cell<usize>,
    checks: Cell<usize>,
}

impl MockBusStatus {
    /// Quiet from the first check.
    pub fn ready() -> Self {
        Self::default()
    }

    /// Busy for the first `checks` checks.
    pub fn quiet_after(checks: usize) -> Self {
        Self {
            busy_checks: Cell::new(checks),
            checks: Cell::new(0),
        }
    }

    /// Number of times readiness was checked.
    pub fn checks(&self) -> usize {
        self.checks.get()
    }
}

impl BusStatus for MockBusStatus {
    fn is_quiescent(&self) -> bool {
        self.checks.set(self.checks.get() + 1);
        match self.busy_checks.get() {
            0 => true,
            n => {
                self.busy_checks.set(n - 1);
                false
            }
        }
    }
}

/// Mock register file.
///
/// Unwritten registers read as zero. Every write is logged.
///
/// ```rust
/// use train_console::hal::MockRegisters;
/// use train_console::traits::RegisterFile;
///
/// let mut regs = MockRegisters::new();
/// regs.write32(0x8081_0088, 0xC0);
/// assert_eq!(regs.read32(0x8081_0088), 0xC0);
/// assert_eq!(regs.writes, vec![(0x8081_0088, 0xC0)]);
/// ```
#[derive(Debug, Default)]
pub struct MockRegisters {
    values: BTreeMap<u32, u32>,
    /// Writes in order, as (address, value).
    pub writes: Vec<(u32, u32)>,
}

impl MockRegisters {
    /// Creates an all-zero register file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register without logging it as a write (hardware-side change).
    pub fn preset(&mut self, addr: u32, value: u32) {
        self.values.insert(addr, value);
    }
}

impl RegisterFile for MockRegisters {
    fn read32(&self, addr: u32) -> u32 {
        self.values.get(&addr).copied().unwrap_or(0)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        self.values.insert(addr, value);
        self.writes.push((addr, value));
    }
}

// ============================================================================
// Display Mock
// ============================================================================

/// One recorded display operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayOp {
    /// `clear_screen`
    ClearScreen,
    /// `move_cursor`
    MoveCursor {
        /// Line.
        line: u16,
        /// Column.
        column: u16,
    },
    /// `clear_to_eol`
    ClearToEol,
    /// `write_str`
    Write(String),
}

/// Mock display.
///
/// Records every operation and maintains a character grid so tests can
/// read back what a line shows.
#[derive(Debug)]
pub struct MockDisplay {
    /// Operations in order.
    pub ops: Vec<DisplayOp>,
    lines: BTreeMap<u16, Vec<char>>,
    line: u16,
    column: u16,
}

impl MockDisplay {
    /// Creates a blank display with the cursor at (1, 1).
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            lines: BTreeMap::new(),
            line: 1,
            column: 1,
        }
    }

    /// Text on `line` with trailing spaces removed, or `None` if blank.
    pub fn line_text(&self, line: u16) -> Option<String> {
        let text: String = self.lines.get(&line)?.iter().collect();
        let trimmed = text.trim_end();
        (!trimmed.is_empty()).then(|| String::from(trimmed))
    }

    /// Current (line, column).
    pub fn cursor(&self) -> (u16, u16) {
        (self.line, self.column)
    }

    /// Forget recorded operations, keeping the grid.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleDisplay for MockDisplay {
    fn clear_screen(&mut self) -> Result<(), ChannelError> {
        self.ops.push(DisplayOp::ClearScreen);
        self.lines.clear();
        Ok(())
    }

    fn move_cursor(&mut self, line: u16, column: u16) -> Result<(), ChannelError> {
        self.ops.push(DisplayOp::MoveCursor { line, column });
        self.line = line;
        self.column = column.max(1);
        Ok(())
    }

    fn clear_to_eol(&mut self) -> Result<(), ChannelError> {
        self.ops.push(DisplayOp::ClearToEol);
        let keep = usize::from(self.column - 1);
        if let Some(row) = self.lines.get_mut(&self.line) {
            row.truncate(keep);
        }
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), ChannelError> {
        self.ops.push(DisplayOp::Write(String::from(text)));
        let row = self.lines.entry(self.line).or_default();
        for ch in text.chars() {
            let index = usize::from(self.column - 1);
            if row.len() <= index {
                row.resize(index + 1, ' ');
            }
            row[index] = ch;
            self.column = self.column.saturating_add(1);
        }
        Ok(())
    }
}
