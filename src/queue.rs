//! Outbound command queue and the bus pause gate.
//!
//! Every byte the console sends on the track bus goes through this queue:
//! train and switch commands from the operator, and the sensor poll requests
//! issued by the decoder. The bus is half-duplex with respect to sensor
//! exchanges, so the queue also owns the gate that stops dispatch while a
//! poll response is outstanding.
//!
//! # Key Components
//!
//! - [`QueuedCommand`]: One byte plus its delay and pause flag
//! - [`PauseGate`]: Two-state gate, closed by a pausing dispatch and opened
//!   only by [`CommandQueue::resume`]
//! - [`CommandQueue`]: The FIFO ring and the dispatch step
//!
//! # Dispatch
//!
//! ```rust
//! use train_console::queue::{CommandQueue, DispatchResult, QueuedCommand};
//! use train_console::hal::MockChannel;
//!
//! let mut queue = CommandQueue::new();
//! let mut bus = MockChannel::new();
//!
//! // Poll request: pauses the bus once sent
//! assert!(queue.enqueue(QueuedCommand::pausing(193)));
//! // Train command queued behind it
//! assert!(queue.enqueue(QueuedCommand::immediate(10)));
//!
//! assert_eq!(queue.tick(0, &mut bus).unwrap(), DispatchResult::Dispatched(193));
//! assert_eq!(queue.tick(0, &mut bus).unwrap(), DispatchResult::Paused);
//!
//! // Sensor response complete
//! queue.resume();
//! assert_eq!(queue.tick(0, &mut bus).unwrap(), DispatchResult::Dispatched(10));
//! assert_eq!(bus.written(), &[193, 10]);
//! ```

use crate::config::QUEUE_SLOTS;
use crate::error::ChannelError;
use crate::ring::Ring;
use crate::traits::ByteChannel;

/// Commands the queue can hold (`QUEUE_SLOTS - 1`).
pub const QUEUE_CAPACITY: usize = QUEUE_SLOTS - 1;

/// One pending outbound byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueuedCommand {
    /// The byte to transmit.
    pub byte: u8,
    /// Tenths to wait once this command reaches the head of the queue.
    ///
    /// Counted down by elapsed time; may go negative.
    pub delay: i32,
    /// Close the pause gate after this byte is sent.
    pub pause_after_send: bool,
}

impl QueuedCommand {
    /// Creates a command.
    pub const fn new(byte: u8, delay: i32, pause_after_send: bool) -> Self {
        Self {
            byte,
            delay,
            pause_after_send,
        }
    }

    /// A command with no delay that leaves the gate open.
    pub const fn immediate(byte: u8) -> Self {
        Self::new(byte, 0, false)
    }

    /// A command with no delay that closes the gate once sent.
    pub const fn pausing(byte: u8) -> Self {
        Self::new(byte, 0, true)
    }

    /// Returns true if the delay has run out.
    pub const fn is_ready(&self) -> bool {
        self.delay <= 0
    }
}

/// Flow-control gate over the shared track bus.
///
/// `Closed` while a sensor poll exchange is outstanding. The only way to
/// close it is dispatching a command with `pause_after_send`; the only way
/// to open it is [`CommandQueue::resume`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PauseGate {
    /// Dispatch allowed.
    #[default]
    Open,
    /// Dispatch suspended until the sensor response completes.
    Closed,
}

impl PauseGate {
    /// Returns true if dispatch is suspended.
    pub const fn is_closed(&self) -> bool {
        matches!(self, PauseGate::Closed)
    }
}

/// Outcome of one [`CommandQueue::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchResult {
    /// The gate is closed; nothing was examined.
    Paused,
    /// The head command was sent.
    Dispatched(u8),
    /// The head command is still counting down its delay.
    Waiting {
        /// Tenths left on the head command.
        remaining: i32,
    },
    /// Nothing queued.
    Empty,
}

/// Bounded FIFO of outbound commands with a pause gate.
///
/// # Capacity
///
/// Sized as a ring of [`QUEUE_SLOTS`] slots with one kept free, so at most
/// [`QUEUE_CAPACITY`] commands are resident. A full queue rejects new
/// commands; producers log the drop and move on.
///
/// # Ordering
///
/// Strict FIFO. A head command with time left on its delay holds back
/// everything queued behind it.
#[derive(Clone, Debug, Default)]
pub struct CommandQueue {
    ring: Ring<QueuedCommand, QUEUE_CAPACITY>,
    gate: PauseGate,
    dropped: u32,
}

impl CommandQueue {
    /// Creates an empty queue with the gate open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command.
    ///
    /// Returns false and leaves the queue unchanged if it is full.
    #[must_use]
    pub fn enqueue(&mut self, command: QueuedCommand) -> bool {
        match self.ring.push(command) {
            Ok(()) => {
                tracing::trace!(
                    byte = command.byte,
                    delay = command.delay,
                    pause = command.pause_after_send,
                    "queued"
                );
                true
            }
            Err(rejected) => {
                self.dropped = self.dropped.saturating_add(1);
                tracing::warn!(byte = rejected.byte, "command buffer full, dropping");
                false
            }
        }
    }

    /// Run one dispatch step.
    ///
    /// Counts the head command's delay down by `elapsed_tenths` and sends it
    /// on `bus` once the delay has run out. Sending a pausing command closes
    /// the gate.
    ///
    /// A write failure is returned after the command has been removed; the
    /// queue does not retry it.
    pub fn tick<C: ByteChannel>(
        &mut self,
        elapsed_tenths: u32,
        bus: &mut C,
    ) -> Result<DispatchResult, ChannelError> {
        if self.gate.is_closed() {
            return Ok(DispatchResult::Paused);
        }

        let Some(head) = self.ring.front_mut() else {
            return Ok(DispatchResult::Empty);
        };

        let elapsed = i32::try_from(elapsed_tenths).unwrap_or(i32::MAX);
        head.delay = head.delay.saturating_sub(elapsed);
        if !head.is_ready() {
            return Ok(DispatchResult::Waiting {
                remaining: head.delay,
            });
        }

        let Some(command) = self.ring.pop() else {
            return Ok(DispatchResult::Empty);
        };
        if command.pause_after_send {
            self.gate = PauseGate::Closed;
            tracing::trace!(byte = command.byte, "dispatch paused");
        }
        bus.write_byte(command.byte)?;
        tracing::trace!(byte = command.byte, "dispatched");
        Ok(DispatchResult::Dispatched(command.byte))
    }

    /// Reopen the gate.
    ///
    /// Returns true if the gate was closed. Calling it on an open gate is a
    /// no-op.
    pub fn resume(&mut self) -> bool {
        if self.gate.is_closed() {
            self.gate = PauseGate::Open;
            tracing::trace!("dispatch resumed");
            true
        } else {
            false
        }
    }

    /// Current gate state.
    pub fn gate(&self) -> PauseGate {
        self.gate
    }

    /// Returns true if dispatch is suspended.
    pub fn is_paused(&self) -> bool {
        self.gate.is_closed()
    }

    /// The next command to be dispatched.
    pub fn peek(&self) -> Option<&QueuedCommand> {
        self.ring.front()
    }

    /// Resident commands, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedCommand> + '_ {
        self.ring.iter()
    }

    /// Returns the number of resident commands.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true if no commands are resident.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Returns true if the next enqueue would be rejected.
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Maximum number of resident commands.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Commands rejected because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockChannel;

    fn fill(queue: &mut CommandQueue, count: usize) {
        for i in 0..count {
            assert!(queue.enqueue(QueuedCommand::immediate(i as u8)));
        }
    }

    // === Capacity ===
    #[test]
    fn new_queue_is_empty_and_open() {
        let queue = CommandQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.gate(), PauseGate::Open);
        assert_eq!(queue.capacity(), QUEUE_SLOTS - 1);
        assert_eq!(queue.capacity(), QUEUE_CAPACITY);
    }

    #[test]
    fn full_queue_rejects_and_is_unchanged() {
        let mut queue = CommandQueue::new();
        fill(&mut queue, QUEUE_SLOTS - 1);
        assert!(queue.is_full());

        let before: Vec<_> = queue.iter().copied().collect();
        assert!(!queue.enqueue(QueuedCommand::immediate(0xFF)));
        let after: Vec<_> = queue.iter().copied().collect();

        assert_eq!(before, after);
        assert_eq!(queue.len(), QUEUE_SLOTS - 1);
        assert_eq!(queue.dropped(), 1);
    }

    // === Dispatch ===
    #[test]
    fn empty_tick_reports_empty() {
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        assert_eq!(queue.tick(5, &mut bus).unwrap(), DispatchResult::Empty);
        assert!(bus.written().is_empty());
    }

    #[test]
    fn one_dispatch_per_tick() {
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        fill(&mut queue, 3);

        assert_eq!(queue.tick(0, &mut bus).unwrap(), DispatchResult::Dispatched(0));
        assert_eq!(bus.written(), &[0]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn delayed_head_blocks_queue() {
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        assert!(queue.enqueue(QueuedCommand::new(1, 3, false)));
        assert!(queue.enqueue(QueuedCommand::immediate(2)));

        assert_eq!(
            queue.tick(1, &mut bus).unwrap(),
            DispatchResult::Waiting { remaining: 2 }
        );
        assert_eq!(
            queue.tick(0, &mut bus).unwrap(),
            DispatchResult::Waiting { remaining: 2 }
        );
        assert!(bus.written().is_empty());

        // Overshoot: delay goes negative, still dispatched
        assert_eq!(queue.tick(5, &mut bus).unwrap(), DispatchResult::Dispatched(1));
        assert_eq!(queue.tick(0, &mut bus).unwrap(), DispatchResult::Dispatched(2));
        assert_eq!(bus.written(), &[1, 2]);
    }

    #[test]
    fn huge_elapsed_saturates() {
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        assert!(queue.enqueue(QueuedCommand::new(9, i32::MIN + 1, false)));
        assert_eq!(
            queue.tick(u32::MAX, &mut bus).unwrap(),
            DispatchResult::Dispatched(9)
        );
    }

    // === Pause gate ===
    #[test]
    fn pausing_dispatch_closes_gate() {
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        assert!(queue.enqueue(QueuedCommand::pausing(193)));
        assert!(queue.enqueue(QueuedCommand::immediate(10)));

        assert_eq!(queue.tick(0, &mut bus).unwrap(), DispatchResult::Dispatched(193));
        assert!(queue.is_paused());
        assert_eq!(queue.tick(100, &mut bus).unwrap(), DispatchResult::Paused);
        assert_eq!(bus.written(), &[193]);
    }

    #[test]
    fn paused_tick_does_not_consume_delay() {
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        assert!(queue.enqueue(QueuedCommand::pausing(193)));
        assert!(queue.enqueue(QueuedCommand::new(7, 2, false)));
        let _ = queue.tick(0, &mut bus);

        let _ = queue.tick(50, &mut bus);
        assert_eq!(queue.peek().unwrap().delay, 2);
    }

    #[test]
    fn resume_opens_only_closed_gate() {
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        assert!(!queue.resume());
        assert_eq!(queue.gate(), PauseGate::Open);

        assert!(queue.enqueue(QueuedCommand::pausing(193)));
        let _ = queue.tick(0, &mut bus);
        assert!(queue.resume());
        assert!(!queue.resume());
        assert_eq!(queue.gate(), PauseGate::Open);
    }

    #[test]
    fn write_failure_still_consumes_command() {
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        bus.fail_writes(ChannelError::Disconnected);
        assert!(queue.enqueue(QueuedCommand::immediate(5)));

        assert_eq!(queue.tick(0, &mut bus), Err(ChannelError::Disconnected));
        assert!(queue.is_empty());
    }

    #[test]
    fn wraps_around_many_times() {
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        for i in 0..(QUEUE_SLOTS * 3) {
            assert!(queue.enqueue(QueuedCommand::immediate(i as u8)));
            assert_eq!(
                queue.tick(0, &mut bus).unwrap(),
                DispatchResult::Dispatched(i as u8)
            );
        }
        assert_eq!(bus.written().len(), QUEUE_SLOTS * 3);
    }
}
