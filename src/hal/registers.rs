//! Register-backed collaborators for the TS-7200 (EP9302) board.
//!
//! Both types are generic over [`RegisterFile`], so the same code drives
//! real memory-mapped registers on the board and [`MockRegisters`] in
//! tests.
//!
//! | Type | Trait | Registers |
//! |------|-------|-----------|
//! | [`RegisterTimer`] | [`HardwareCounter`] | Timer 3 value and control |
//! | [`RegisterBusStatus`] | [`BusStatus`] | UART1 flag register |
//!
//! [`MockRegisters`]: crate::hal::MockRegisters

use crate::traits::{BusStatus, HardwareCounter, RegisterFile};

/// Timer 3 register block.
pub mod timer3 {
    /// Block base address.
    pub const BASE: u32 = 0x8081_0080;
    /// Load register.
    pub const LOAD_OFFSET: u32 = 0x00;
    /// Current value register (read-only).
    pub const VALUE_OFFSET: u32 = 0x04;
    /// Control register.
    pub const CONTROL_OFFSET: u32 = 0x08;
    /// Control: timer enable.
    pub const ENABLE_MASK: u32 = 0x80;
    /// Control: periodic mode (clear for free-running).
    pub const MODE_MASK: u32 = 0x40;
    /// Control: 508 kHz clock (clear for 2 kHz).
    pub const CLKSEL_MASK: u32 = 0x08;
}

/// UART1 (track bus) register block.
pub mod uart1 {
    /// Block base address.
    pub const BASE: u32 = 0x808C_0000;
    /// Flag register.
    pub const FLAG_OFFSET: u32 = 0x18;
    /// Flag: clear to send.
    pub const CTS_MASK: u32 = 0x01;
    /// Flag: receive FIFO empty.
    pub const RXFE_MASK: u32 = 0x10;
    /// Flag: transmit FIFO empty.
    pub const TXFE_MASK: u32 = 0x80;
}

/// Timer input clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimerClock {
    /// 2 kHz; 200 ticks per tenth-second.
    #[default]
    Khz2,
    /// 508 kHz; 50 800 ticks per tenth-second.
    Khz508,
}

impl TimerClock {
    /// Raw counter ticks in one tenth of a second.
    pub const fn ticks_per_tenth(&self) -> u32 {
        match self {
            TimerClock::Khz2 => 200,
            TimerClock::Khz508 => 50_800,
        }
    }
}

/// Free-running timer 3 as a [`HardwareCounter`].
///
/// ```rust
/// use train_console::hal::registers::{timer3, RegisterTimer, TimerClock};
/// use train_console::hal::MockRegisters;
/// use train_console::traits::HardwareCounter;
///
/// let mut timer = RegisterTimer::new(MockRegisters::new(), TimerClock::Khz2);
/// timer.set_enabled(true);
/// assert_eq!(
///     timer.registers().writes.last(),
///     Some(&(timer3::BASE + timer3::CONTROL_OFFSET, timer3::ENABLE_MASK))
/// );
/// ```
#[derive(Debug)]
pub struct RegisterTimer<R: RegisterFile> {
    regs: R,
    clock: TimerClock,
}

impl<R: RegisterFile> RegisterTimer<R> {
    /// Wrap a register file. The timer is not touched until enabled.
    pub fn new(regs: R, clock: TimerClock) -> Self {
        Self { regs, clock }
    }

    /// The configured input clock.
    pub fn clock(&self) -> TimerClock {
        self.clock
    }

    /// The underlying registers.
    pub fn registers(&self) -> &R {
        &self.regs
    }

    fn control_value(&self, enabled: bool) -> u32 {
        let enable = if enabled { timer3::ENABLE_MASK } else { 0 };
        let clksel = match self.clock {
            TimerClock::Khz2 => 0,
            TimerClock::Khz508 => timer3::CLKSEL_MASK,
        };
        // free-running: MODE bit left clear
        enable | clksel
    }
}

impl<R: RegisterFile> HardwareCounter for RegisterTimer<R> {
    fn sample(&mut self) -> u32 {
        self.regs.read32(timer3::BASE + timer3::VALUE_OFFSET)
    }

    fn set_enabled(&mut self, enabled: bool) {
        let value = self.control_value(enabled);
        tracing::debug!(enabled, control = value, "timer3 control");
        self.regs
            .write32(timer3::BASE + timer3::CONTROL_OFFSET, value);
    }
}

/// UART1 flag register as a [`BusStatus`].
#[derive(Debug)]
pub struct RegisterBusStatus<R: RegisterFile> {
    regs: R,
}

impl<R: RegisterFile> RegisterBusStatus<R> {
    /// Wrap a register file.
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// The underlying registers.
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }
}

impl<R: RegisterFile> BusStatus for RegisterBusStatus<R> {
    fn is_quiescent(&self) -> bool {
        let flags = uart1::BASE + uart1::FLAG_OFFSET;
        self.regs.bit_set(flags, uart1::CTS_MASK)
            && self.regs.bit_set(flags, uart1::TXFE_MASK)
            && self.regs.bit_set(flags, uart1::RXFE_MASK)
    }
}
