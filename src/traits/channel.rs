//! Non-blocking byte channels.
//!
//! Both serial ports (the track bus and the operator terminal) are plain
//! byte streams to the core. Reads never wait: an empty receiver returns
//! `None` and the control loop moves on to its next step.

use crate::error::ChannelError;

/// A non-blocking serial channel.
///
/// # Implementation Notes
///
/// - `try_read_byte()` must return immediately
/// - `write_byte()` may buffer; bytes leave the device on `flush()`
/// - `flush()` is best-effort and is called once per scheduler iteration,
///   so it should send what the hardware can take and return
///
/// # Example
///
/// ```rust
/// use train_console::traits::ByteChannel;
/// use train_console::hal::MockChannel;
///
/// let mut chan = MockChannel::new();
/// chan.feed(&[0x01, 0x02]);
///
/// assert_eq!(chan.try_read_byte(), Some(0x01));
/// assert_eq!(chan.try_read_byte(), Some(0x02));
/// assert_eq!(chan.try_read_byte(), None);
///
/// chan.write_byte(0xC1).unwrap();
/// assert_eq!(chan.written(), &[0xC1]);
/// ```
pub trait ByteChannel {
    /// Returns the next received byte, or `None` if nothing is waiting.
    fn try_read_byte(&mut self) -> Option<u8>;

    /// Queue one byte for transmission.
    fn write_byte(&mut self, byte: u8) -> Result<(), ChannelError>;

    /// Push buffered output toward the device.
    fn flush(&mut self) -> Result<(), ChannelError>;

    /// Drain any pending input, returning how many bytes were discarded.
    fn discard_input(&mut self) -> usize {
        let mut discarded = 0;
        while self.try_read_byte().is_some() {
            discarded += 1;
        }
        discarded
    }
}
