//! # train-console
//!
//! A polling operator console for a model railway: it keeps elapsed time,
//! polls the track's sensor decoders, and turns typed operator commands into
//! byte sequences on the shared track bus.
//!
//! ## Features
//!
//! - **Cooperative scheduling**: One non-blocking loop, fixed step order, no threads
//! - **Half-duplex arbitration**: A pause gate keeps train commands off the bus while a sensor poll is outstanding
//! - **Wraparound-safe timing**: Tenths of a second counted from a free-running down-counter
//! - **Sensor decoding**: Round-robin polling of decoder modules, bit-level contact reporting
//! - **Line editing**: Echo, backspace, and a small command grammar (`tr`, `rv`, `sw`, `g`, `s`, `q`)
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Byte channel, counter, bus status, and display abstractions
//! - `timebase` - Elapsed time accounting
//! - `queue` - Outbound command ring with the pause gate
//! - `sensor` - Sensor response decoding and poll cadence
//! - `interpreter` - Line editor and command encoder
//! - `screen` - Status screen rendering
//! - `console` - The scheduler that ties everything together
//! - `hal` - Concrete implementations (mock for testing, register-backed for the board)
//!
//! ## Example
//!
//! ```rust
//! use train_console::{CommandQueue, ConsoleCommand, Opcodes};
//! use train_console::hal::MockChannel;
//!
//! let opcodes = Opcodes::default();
//! let mut queue = CommandQueue::new();
//!
//! let command = ConsoleCommand::parse("sw 12 C").unwrap();
//! for item in command.encode(&opcodes) {
//!     assert!(queue.enqueue(item));
//! }
//!
//! let mut bus = MockChannel::new();
//! while !queue.is_empty() {
//!     queue.tick(0, &mut bus).unwrap();
//! }
//! assert_eq!(bus.written(), &[34, 12, 32]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Runtime configuration: timing, opcodes, sensor bank, screen layout.
pub mod config;
/// The polling scheduler.
pub mod console;
/// Error types for channels and the console loop.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Operator line editor and command grammar.
pub mod interpreter;
/// Outbound command queue with the bus pause gate.
pub mod queue;
/// Fixed-capacity ring buffer.
pub mod ring;
/// Status screen rendering.
pub mod screen;
/// Sensor response decoding and poll requests.
pub mod sensor;
/// Elapsed time accounting over a wrapping down-counter.
pub mod timebase;
/// Core traits for I/O collaborators.
pub mod traits;

// Re-exports for convenience
pub use config::{ConsoleConfig, Opcodes, ScreenLayout, SensorConfig, TimingConfig};
pub use console::{Console, ConsoleStats, RunState, StepReport};
pub use error::{ChannelError, ConsoleError};
pub use interpreter::{Commit, ConsoleCommand, Interpreter, KeyEvent, SwitchDirection};
pub use queue::{CommandQueue, DispatchResult, PauseGate, QueuedCommand, QUEUE_CAPACITY};
pub use ring::Ring;
pub use screen::Screen;
pub use sensor::{SensorDecoder, SensorEvent, SensorStep};
pub use timebase::{ElapsedClock, TimeBase};
pub use traits::{BusStatus, ByteChannel, ConsoleDisplay, HardwareCounter, RegisterFile};
