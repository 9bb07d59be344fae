//! Hardware abstraction traits for registers, the timer, and bus readiness.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`RegisterFile`] | Raw 32-bit register reads and writes |
//! | [`HardwareCounter`] | Free-running down-counter sampled every iteration |
//! | [`BusStatus`] | UART flag check used before the first sensor poll |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. Register-backed implementations for the
//! TS-7200 live in [`crate::hal::registers`].
//!
//! # Example
//!
//! ```rust
//! use train_console::traits::HardwareCounter;
//! use train_console::hal::MockCounter;
//!
//! let mut counter = MockCounter::starting_at(1000);
//! assert_eq!(counter.sample(), 1000);
//!
//! counter.count_down(250);
//! assert_eq!(counter.sample(), 750);
//! ```

/// Memory-mapped register access.
///
/// Addresses are absolute (base + offset). Implementations on real
/// hardware perform volatile accesses; the mock keeps a sparse map.
pub trait RegisterFile {
    /// Read the 32-bit register at `addr`.
    fn read32(&self, addr: u32) -> u32;

    /// Write `value` to the 32-bit register at `addr`.
    fn write32(&mut self, addr: u32, value: u32);

    /// Returns true if any bit of `mask` is set in the register at `addr`.
    fn bit_set(&self, addr: u32, mask: u32) -> bool {
        self.read32(addr) & mask != 0
    }

    /// Set or clear the bits of `mask` in the register at `addr`.
    ///
    /// Read-modify-write; other bits are preserved.
    fn set_bits(&mut self, addr: u32, mask: u32, on: bool) {
        let current = self.read32(addr);
        let next = if on { current | mask } else { current & !mask };
        self.write32(addr, next);
    }
}

/// Free-running hardware counter.
///
/// The counter decrements at a fixed rate and wraps from zero back to
/// `u32::MAX`. The timer accountant turns successive samples into
/// tenth-second ticks, so it must be sampled more often than once per
/// full counter period.
pub trait HardwareCounter {
    /// Returns the current raw counter value.
    fn sample(&mut self) -> u32;

    /// Start or stop the counter.
    ///
    /// Called with `false` during teardown.
    fn set_enabled(&mut self, enabled: bool);
}

/// Readiness check for the track bus UART.
///
/// The sensor bootstrap busy-polls this until the line is quiet before
/// issuing its first request.
pub trait BusStatus {
    /// Returns true when the bus is clear to send, and both the transmit
    /// and receive FIFOs are empty.
    fn is_quiescent(&self) -> bool;
}
