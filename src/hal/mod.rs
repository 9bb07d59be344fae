//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development and the simulator
//! - `registers`: TS-7200 timer and UART flag access over any register file

pub mod mock;
pub mod registers;

pub use mock::*;
pub use registers::{RegisterBusStatus, RegisterTimer, TimerClock};
