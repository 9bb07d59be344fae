//! Sensor bitstream decoding and the poll request cadence.
//!
//! The sensor decoder modules share the track bus with train commands. The
//! console polls them round-robin: one request byte, then a two-byte answer
//! carrying sixteen contact states, then the next module. While an answer is
//! outstanding the command queue's pause gate is closed so no other byte
//! lands on the bus.
//!
//! ```text
//!   request A ──▶ (gate closed) ──▶ byte A0, byte A1 ──▶ resume
//!   request B ──▶ (gate closed) ──▶ byte B0, byte B1 ──▶ resume
//!   ...
//! ```
//!
//! # Sensor numbering
//!
//! Within a module, sensor 1 is the most significant bit of the first byte
//! and sensor 16 the least significant bit of the second byte.
//!
//! ```rust
//! use train_console::sensor::SensorDecoder;
//! use train_console::queue::CommandQueue;
//! use train_console::config::ConsoleConfig;
//!
//! let config = ConsoleConfig::default();
//! let mut decoder = SensorDecoder::new(&config);
//! let mut queue = CommandQueue::new();
//!
//! let outcome = decoder.ingest(0b0000_0101, &mut queue);
//! let ids: Vec<u8> = outcome.events.iter().map(|(_, e)| e.sensor_id).collect();
//! assert_eq!(ids, vec![8, 6]);
//! assert_eq!(outcome.events[0].1.decoder_id, 'A');
//! ```
//!
//! # Desynchronization
//!
//! There is no framing on the response stream. A stray byte shifts every
//! following byte onto the wrong module or half until the cursor happens to
//! line up again.

use crate::config::{ConsoleConfig, Opcodes, BYTES_PER_DECODER, RECENT_SENSOR_SLOTS};
use crate::error::ConsoleError;
use crate::queue::{CommandQueue, QueuedCommand};
use crate::traits::{BusStatus, ByteChannel};
use heapless::{HistoryBuffer, Vec as HVec};

const BITS_PER_BYTE: usize = 8;

/// One triggered contact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorEvent {
    /// Decoder module letter ('A' for the first module).
    pub decoder_id: char,
    /// Contact number within the module, 1 to 16.
    pub sensor_id: u8,
    /// Reported bit value.
    pub value: u8,
}

/// Position in the response stream.
///
/// Counts received bytes over all modules and wraps after the last byte of
/// the last module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorCursor {
    next_slot: usize,
}

impl SensorCursor {
    /// Slot the next received byte is attributed to.
    pub fn next_slot(&self) -> usize {
        self.next_slot
    }

    /// Zero-based module index of the next byte.
    pub fn decoder_index(&self) -> usize {
        self.next_slot / BYTES_PER_DECODER
    }

    /// Byte position within the module of the next byte.
    pub fn byte_position(&self) -> usize {
        self.next_slot % BYTES_PER_DECODER
    }

    /// Returns true if the cursor sits on the first byte of a module.
    pub fn at_chunk_boundary(&self) -> bool {
        self.byte_position() == 0
    }

    fn advance(&mut self, slots: usize) {
        self.next_slot = (self.next_slot + 1) % slots;
    }
}

/// The last few sensor events, kept for the status screen.
///
/// Each push lands in the next display cell, wrapping after
/// [`RECENT_SENSOR_SLOTS`] cells.
#[derive(Clone, Debug, Default)]
pub struct RecentSensors {
    history: HistoryBuffer<SensorEvent, RECENT_SENSOR_SLOTS>,
    next_cell: usize,
}

impl RecentSensors {
    /// Creates an empty strip.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, returning the display cell it occupies.
    pub fn push(&mut self, event: SensorEvent) -> usize {
        let cell = self.next_cell;
        self.history.write(event);
        self.next_cell = (self.next_cell + 1) % RECENT_SENSOR_SLOTS;
        cell
    }

    /// The most recent event.
    pub fn latest(&self) -> Option<&SensorEvent> {
        self.history.recent()
    }

    /// Stored events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SensorEvent> + '_ {
        self.history.oldest_ordered()
    }

    /// Number of stored events (at most [`RECENT_SENSOR_SLOTS`]).
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.history.len() == 0
    }
}

/// Events produced by one received byte, paired with their display cells.
pub type EventBatch = HVec<(usize, SensorEvent), BITS_PER_BYTE>;

/// Result of feeding one byte to the decoder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngestOutcome {
    /// Triggered contacts, least significant bit first.
    pub events: EventBatch,
    /// True if this byte completed a module and reopened the queue.
    pub resumed: bool,
}

/// What one [`SensorDecoder::poll`] call did.
#[derive(Clone, Debug, PartialEq)]
pub enum SensorStep {
    /// A byte was received and decoded.
    Received {
        /// The raw byte.
        byte: u8,
        /// Decoding result.
        outcome: IngestOutcome,
    },
    /// Nothing received; a poll request was queued.
    Requested(u8),
    /// Nothing received and nothing to request.
    Idle,
}

/// Sensor response decoder and poll request driver.
#[derive(Clone, Debug)]
pub struct SensorDecoder {
    cursor: SensorCursor,
    slots: usize,
    opcodes: Opcodes,
    recent: RecentSensors,
    events_total: u32,
    request_pending: bool,
}

impl SensorDecoder {
    /// Creates a decoder for the configured module bank.
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            cursor: SensorCursor::default(),
            slots: config.sensors.slots(),
            opcodes: config.opcodes.clone(),
            recent: RecentSensors::new(),
            events_total: 0,
            request_pending: false,
        }
    }

    /// Decode one response byte and advance the cursor.
    ///
    /// Reopens the queue's gate when the byte finishes a module's response
    /// and the gate was closed.
    pub fn ingest(&mut self, byte: u8, queue: &mut CommandQueue) -> IngestOutcome {
        let slot = self.cursor.next_slot();
        let decoder_id = decoder_letter(self.cursor.decoder_index());
        let half = self.cursor.byte_position();
        let mut outcome = IngestOutcome::default();

        if byte != 0 {
            tracing::trace!(decoder = %decoder_id, half, byte, "sensor data");
            for bit in 0..BITS_PER_BYTE {
                if (byte >> bit) & 0x01 == 0 {
                    continue;
                }
                let event = SensorEvent {
                    decoder_id,
                    sensor_id: (BITS_PER_BYTE * half + (BITS_PER_BYTE - bit)) as u8,
                    value: 1,
                };
                tracing::debug!(decoder = %event.decoder_id, sensor = event.sensor_id, "sensor triggered");
                let cell = self.recent.push(event);
                self.events_total = self.events_total.saturating_add(1);
                // at most eight bits per byte, matching the batch capacity
                let _ = outcome.events.push((cell, event));
            }
        }

        self.cursor.advance(self.slots);
        tracing::trace!(slot, next = self.cursor.next_slot(), "sensor cursor");

        if self.cursor.at_chunk_boundary() {
            self.request_pending = false;
            if queue.is_paused() {
                outcome.resumed = queue.resume();
            }
        }
        outcome
    }

    /// Queue a poll request for the module under the cursor.
    ///
    /// Only done between responses (cursor on a module boundary), while the
    /// gate is open, and when no request is already waiting for its answer.
    /// Returns the request byte if one was queued.
    pub fn request_next(&mut self, queue: &mut CommandQueue) -> Option<u8> {
        if self.request_pending || !self.cursor.at_chunk_boundary() || queue.is_paused() {
            return None;
        }
        let request = self.opcodes.sensor_request(self.cursor.decoder_index());
        if queue.enqueue(QueuedCommand::pausing(request)) {
            tracing::debug!(request, "sensor poll requested");
            self.request_pending = true;
            Some(request)
        } else {
            None
        }
    }

    /// One scheduler step: decode a waiting byte, or request the next module.
    pub fn poll<C: ByteChannel>(&mut self, bus: &mut C, queue: &mut CommandQueue) -> SensorStep {
        match bus.try_read_byte() {
            Some(byte) => SensorStep::Received {
                byte,
                outcome: self.ingest(byte, queue),
            },
            None => match self.request_next(queue) {
                Some(request) => SensorStep::Requested(request),
                None => SensorStep::Idle,
            },
        }
    }

    /// Wait for a quiet bus, then queue the first poll request.
    ///
    /// Busy-polls `status`. Each busy check drains whatever stray bytes the
    /// bus holds and flushes the terminal so pending screen output keeps
    /// moving. Returns the number of bytes discarded.
    pub fn bootstrap<B, S, T>(
        &mut self,
        bus: &mut B,
        status: &S,
        terminal: &mut T,
        queue: &mut CommandQueue,
    ) -> Result<usize, ConsoleError>
    where
        B: ByteChannel,
        S: BusStatus,
        T: ByteChannel,
    {
        tracing::info!("sensor bootstrap: waiting for quiet bus");
        let mut discarded = 0;
        while !status.is_quiescent() {
            let drained = bus.discard_input();
            if drained > 0 {
                tracing::debug!(drained, "discarded stray sensor bytes");
                discarded += drained;
            }
            terminal.flush().map_err(ConsoleError::Terminal)?;
        }
        self.request_next(queue);
        Ok(discarded)
    }

    /// Current stream position.
    pub fn cursor(&self) -> SensorCursor {
        self.cursor
    }

    /// Recent events for display.
    pub fn recent(&self) -> &RecentSensors {
        &self.recent
    }

    /// Returns true if a poll request is queued or awaiting its answer.
    pub fn request_pending(&self) -> bool {
        self.request_pending
    }

    /// Events decoded since start.
    pub fn events_total(&self) -> u32 {
        self.events_total
    }
}

fn decoder_letter(index: usize) -> char {
    // index < MAX_DECODERS (26)
    char::from(b'A' + index as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorConfig;
    use crate::hal::{MockBusStatus, MockChannel};

    fn decoder() -> SensorDecoder {
        SensorDecoder::new(&ConsoleConfig::default())
    }

    fn sensor_ids(outcome: &IngestOutcome) -> Vec<u8> {
        outcome.events.iter().map(|(_, e)| e.sensor_id).collect()
    }

    /// Send the request at the head of the queue so the gate closes.
    fn dispatch_request(queue: &mut CommandQueue) {
        let mut bus = MockChannel::new();
        let _ = queue.tick(0, &mut bus);
        assert!(queue.is_paused());
    }

    #[test]
    fn low_bits_map_to_high_sensor_numbers() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        let outcome = dec.ingest(0b0000_0101, &mut queue);

        assert_eq!(sensor_ids(&outcome), vec![8, 6]);
        assert!(outcome.events.iter().all(|(_, e)| e.decoder_id == 'A'));
        assert!(outcome.events.iter().all(|(_, e)| e.value == 1));
    }

    #[test]
    fn second_byte_is_sensors_nine_to_sixteen() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        let _ = dec.ingest(0, &mut queue);
        let outcome = dec.ingest(0b1000_0001, &mut queue);
        assert_eq!(sensor_ids(&outcome), vec![16, 9]);
    }

    #[test]
    fn zero_byte_emits_nothing() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        let outcome = dec.ingest(0, &mut queue);
        assert!(outcome.events.is_empty());
        assert!(dec.recent().is_empty());
        assert_eq!(dec.cursor().next_slot(), 1);
    }

    #[test]
    fn full_byte_emits_eight_events() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        let outcome = dec.ingest(0xFF, &mut queue);
        assert_eq!(sensor_ids(&outcome), vec![8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(dec.recent().len(), RECENT_SENSOR_SLOTS);
        assert_eq!(dec.events_total(), 8);
    }

    #[test]
    fn decoder_letters_follow_cursor() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        for _ in 0..4 {
            let _ = dec.ingest(0, &mut queue);
        }
        let outcome = dec.ingest(0b1000_0000, &mut queue);
        assert_eq!(outcome.events[0].1.decoder_id, 'C');
        assert_eq!(outcome.events[0].1.sensor_id, 1);
    }

    #[test]
    fn cursor_wraps_after_last_module() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        for _ in 0..10 {
            let _ = dec.ingest(0, &mut queue);
        }
        assert_eq!(dec.cursor().next_slot(), 0);
        let outcome = dec.ingest(0x01, &mut queue);
        assert_eq!(outcome.events[0].1.decoder_id, 'A');
    }

    #[test]
    fn resume_once_per_completed_module() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        assert_eq!(dec.request_next(&mut queue), Some(193));
        dispatch_request(&mut queue);

        let first = dec.ingest(0, &mut queue);
        assert!(!first.resumed);
        assert!(queue.is_paused());

        let second = dec.ingest(0, &mut queue);
        assert!(second.resumed);
        assert!(!queue.is_paused());
    }

    #[test]
    fn no_resume_when_gate_open() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        let _ = dec.ingest(0, &mut queue);
        let outcome = dec.ingest(0, &mut queue);
        assert!(!outcome.resumed);
    }

    #[test]
    fn request_only_on_boundary_and_open_gate() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();

        let _ = dec.ingest(0, &mut queue);
        assert_eq!(dec.request_next(&mut queue), None);

        let _ = dec.ingest(0, &mut queue);
        assert_eq!(dec.request_next(&mut queue), Some(194));

        dispatch_request(&mut queue);
        assert_eq!(dec.request_next(&mut queue), None);
    }

    #[test]
    fn one_request_outstanding_at_a_time() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        assert_eq!(dec.request_next(&mut queue), Some(193));
        assert!(dec.request_pending());
        // still queued, gate still open
        assert_eq!(dec.request_next(&mut queue), None);
        assert_eq!(queue.len(), 1);

        dispatch_request(&mut queue);
        let _ = dec.ingest(0, &mut queue);
        let _ = dec.ingest(0, &mut queue);
        assert!(!dec.request_pending());
        assert_eq!(dec.request_next(&mut queue), Some(194));
    }

    #[test]
    fn poll_reads_before_requesting() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();

        assert_eq!(dec.poll(&mut bus, &mut queue), SensorStep::Requested(193));

        bus.feed(&[0x10]);
        match dec.poll(&mut bus, &mut queue) {
            SensorStep::Received { byte, outcome } => {
                assert_eq!(byte, 0x10);
                assert_eq!(sensor_ids(&outcome), vec![4]);
            }
            other => panic!("expected Received, got {:?}", other),
        }

        // mid-module: nothing to request
        assert_eq!(dec.poll(&mut bus, &mut queue), SensorStep::Idle);
    }

    #[test]
    fn smaller_bank_wraps_sooner() {
        let config = ConsoleConfig::default().with_sensors(SensorConfig::default().with_decoder_count(2));
        let mut dec = SensorDecoder::new(&config);
        let mut queue = CommandQueue::new();
        for _ in 0..4 {
            let _ = dec.ingest(0, &mut queue);
        }
        assert_eq!(dec.cursor().next_slot(), 0);
    }

    #[test]
    fn recent_cells_wrap() {
        let mut recent = RecentSensors::new();
        let event = SensorEvent {
            decoder_id: 'B',
            sensor_id: 3,
            value: 1,
        };
        let cells: Vec<usize> = (0..10).map(|_| recent.push(event)).collect();
        assert_eq!(cells, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1]);
        assert_eq!(recent.len(), RECENT_SENSOR_SLOTS);
        assert_eq!(recent.latest(), Some(&event));
    }

    #[test]
    fn bootstrap_drains_a_whole_burst_per_check() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        let mut terminal = MockChannel::new();
        bus.feed(&[1, 2, 3, 4, 5]);
        let status = MockBusStatus::quiet_after(1);

        let discarded = dec
            .bootstrap(&mut bus, &status, &mut terminal, &mut queue)
            .unwrap();

        assert_eq!(discarded, 5);
        assert_eq!(bus.pending_input(), 0);
        assert_eq!(terminal.flush_count(), 1);
    }

    #[test]
    fn bootstrap_discards_until_quiet() {
        let mut dec = decoder();
        let mut queue = CommandQueue::new();
        let mut bus = MockChannel::new();
        let mut terminal = MockChannel::new();
        bus.feed(&[0xAA, 0x55]);
        let status = MockBusStatus::quiet_after(3);

        let discarded = dec
            .bootstrap(&mut bus, &status, &mut terminal, &mut queue)
            .unwrap();

        assert_eq!(discarded, 2);
        assert_eq!(terminal.flush_count(), 3);
        assert_eq!(queue.peek(), Some(&QueuedCommand::pausing(193)));
    }
}
