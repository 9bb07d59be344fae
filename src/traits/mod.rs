//! Trait definitions for the collaborators the console core drives.
//!
//! The control loop never touches hardware directly. Everything it reads or
//! writes goes through one of these abstractions so the same loop runs on the
//! TS-7200 board, in the desktop simulator, and against mocks in tests.
//!
//! # Submodules
//!
//! - `hardware`: Register file, free-running counter, bus UART status
//! - `channel`: Non-blocking byte channels (track bus, operator terminal)
//! - `display`: Cursor-addressed operator screen
//!
//! # Hardware Abstraction
//!
//! - [`RegisterFile`]: 32-bit memory-mapped register access
//! - [`HardwareCounter`]: Free-running down-counter used for timekeeping
//! - [`BusStatus`]: Readiness flags checked during sensor bootstrap
//! - [`ByteChannel`]: `try_read_byte` / `write_byte` / `flush`
//! - [`ConsoleDisplay`]: "move cursor, then write text"

pub mod channel;
pub mod display;
pub mod hardware;

pub use channel::*;
pub use display::*;
pub use hardware::*;
