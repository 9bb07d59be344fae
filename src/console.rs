//! The polling scheduler that ties everything together.
//!
//! This module provides [`Console`], which owns every piece of control
//! state and the I/O collaborators, and advances them in a fixed order
//! each iteration. Nothing blocks: each step probes its input once and
//! moves on.
//!
//! # Iteration order
//!
//! 1. Sensor: decode one waiting bus byte, or queue the next poll request
//! 2. Flush the bus and terminal output
//! 3. Sample the hardware counter and account elapsed tenths
//! 4. Dispatch at most one queued command
//! 5. Handle at most one operator keystroke
//!
//! The loop ends only when the operator commits `q`.
//!
//! # Example
//!
//! ```rust
//! use train_console::{Console, ConsoleConfig};
//! use train_console::hal::{MockBusStatus, MockChannel, MockCounter, MockDisplay, MockTrackBus};
//!
//! let config = ConsoleConfig::default();
//! let bus = MockTrackBus::new(config.opcodes.sensor_read_one, config.sensors.decoder_count);
//! let mut terminal = MockChannel::new();
//! terminal.feed(b"tr 5 10\n");
//!
//! let mut console = Console::new(
//!     &config,
//!     bus,
//!     terminal,
//!     MockCounter::default().with_step(50),
//!     MockDisplay::new(),
//! );
//!
//! console.start(&MockBusStatus::ready()).unwrap();
//! for _ in 0..20 {
//!     console.step().unwrap();
//! }
//! assert_eq!(console.bus().commands_sent(), vec![10, 5, 32]);
//!
//! console.terminal_mut().feed(b"q\n");
//! while !console.step().unwrap().is_quit() {}
//! let stats = console.shutdown().unwrap();
//! assert!(stats.iterations > 20);
//! ```

use crate::config::ConsoleConfig;
use crate::error::{ChannelError, ConsoleError};
use crate::interpreter::{Interpreter, KeyEvent};
use crate::queue::{CommandQueue, DispatchResult};
use crate::screen::Screen;
use crate::sensor::{SensorDecoder, SensorStep};
use crate::timebase::TimeBase;
use crate::traits::{BusStatus, ByteChannel, ConsoleDisplay, HardwareCounter};

/// Where the console is in its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    /// Constructed; bootstrap not yet run.
    #[default]
    Idle,
    /// Inside the polling loop.
    Running,
    /// The operator quit; teardown pending or done.
    Stopped,
}

/// Counters reported at shutdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsoleStats {
    /// Scheduler iterations run.
    pub iterations: u64,
    /// Bytes sent on the track bus.
    pub dispatched: u32,
    /// Sensor poll requests queued.
    pub polls_requested: u32,
    /// Sensor response bytes received.
    pub sensor_bytes: u32,
    /// Sensor events decoded.
    pub sensor_events: u32,
    /// Commands dropped on a full queue.
    pub dropped: u32,
    /// Stray bytes discarded during bootstrap.
    pub bootstrap_discarded: u32,
    /// Tenths elapsed.
    pub elapsed_tenths: u32,
}

/// What one iteration did.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Sensor step outcome.
    pub sensor: SensorStep,
    /// Tenths accounted this iteration.
    pub tenths: u32,
    /// Dispatch outcome.
    pub dispatch: DispatchResult,
    /// Keystroke outcome.
    pub key: KeyEvent,
}

impl StepReport {
    /// Returns true if the operator quit on this iteration.
    pub fn is_quit(&self) -> bool {
        matches!(self.key, KeyEvent::Quit)
    }
}

/// The operator console.
///
/// # Type Parameters
///
/// - `B`: Track bus channel
/// - `T`: Operator terminal channel (keystrokes in)
/// - `C`: Free-running hardware counter
/// - `D`: Status screen
///
/// All state lives here; nothing is global, so tests build a fresh console
/// per case.
pub struct Console<B, T, C, D>
where
    B: ByteChannel,
    T: ByteChannel,
    C: HardwareCounter,
    D: ConsoleDisplay,
{
    bus: B,
    terminal: T,
    counter: C,
    display: D,
    time: TimeBase,
    queue: CommandQueue,
    sensors: SensorDecoder,
    interpreter: Interpreter,
    screen: Screen,
    stats: ConsoleStats,
    state: RunState,
}

impl<B, T, C, D> Console<B, T, C, D>
where
    B: ByteChannel,
    T: ByteChannel,
    C: HardwareCounter,
    D: ConsoleDisplay,
{
    /// Create a console, anchoring the time base at the counter's current value.
    pub fn new(config: &ConsoleConfig, bus: B, terminal: T, mut counter: C, display: D) -> Self {
        let anchor = counter.sample();
        Self {
            bus,
            terminal,
            counter,
            display,
            time: TimeBase::new(anchor, config.timing.ticks_per_tenth),
            queue: CommandQueue::new(),
            sensors: SensorDecoder::new(config),
            interpreter: Interpreter::new(config.opcodes.clone()),
            screen: Screen::new(config.layout.clone()),
            stats: ConsoleStats::default(),
            state: RunState::Idle,
        }
    }

    /// Clear the screen, wait for a quiet bus, and queue the first poll.
    pub fn start<S: BusStatus>(&mut self, status: &S) -> Result<(), ConsoleError> {
        tracing::info!("console starting");
        shown(self.screen.init(&mut self.display));
        let discarded =
            self.sensors
                .bootstrap(&mut self.bus, status, &mut self.terminal, &mut self.queue)?;
        self.stats.bootstrap_discarded = u32::try_from(discarded).unwrap_or(u32::MAX);
        if self.sensors.request_pending() {
            self.stats.polls_requested += 1;
        }
        self.state = RunState::Running;
        Ok(())
    }

    /// Run one scheduler iteration.
    pub fn step(&mut self) -> Result<StepReport, ConsoleError> {
        self.stats.iterations += 1;

        // 1. sensor ingestion or poll request
        let sensor = self.sensors.poll(&mut self.bus, &mut self.queue);
        match &sensor {
            SensorStep::Received { outcome, .. } => {
                self.stats.sensor_bytes += 1;
                let input_len = self.interpreter.line().len();
                for (cell, event) in &outcome.events {
                    shown(self.screen.sensor(&mut self.display, *cell, event, input_len));
                }
            }
            SensorStep::Requested(_) => self.stats.polls_requested += 1,
            SensorStep::Idle => {}
        }

        // 2. push output along
        self.bus.flush().map_err(ConsoleError::Bus)?;
        self.terminal.flush().map_err(ConsoleError::Terminal)?;

        // 3. time
        let raw = self.counter.sample();
        let tenths = self.time.accumulate(raw);
        if tenths > 0 {
            shown(self.screen.elapsed(
                &mut self.display,
                self.time.clock(),
                raw,
                self.interpreter.line().len(),
            ));
        }

        // 4. dispatch
        let dispatch = self
            .queue
            .tick(tenths, &mut self.bus)
            .map_err(ConsoleError::Bus)?;
        if let DispatchResult::Dispatched(_) = dispatch {
            self.stats.dispatched += 1;
        }

        // 5. operator input
        let key = self.interpreter.poll(&mut self.terminal, &mut self.queue);
        shown(self.screen.key(&mut self.display, &key));
        if let KeyEvent::Quit = key {
            tracing::info!("quit requested");
            self.state = RunState::Stopped;
        }

        Ok(StepReport {
            sensor,
            tenths,
            dispatch,
            key,
        })
    }

    /// Stop the timer, park the cursor, and flush both channels.
    pub fn shutdown(&mut self) -> Result<ConsoleStats, ConsoleError> {
        self.counter.set_enabled(false);
        shown(self.screen.park(&mut self.display));
        self.bus.flush().map_err(ConsoleError::Bus)?;
        self.terminal.flush().map_err(ConsoleError::Terminal)?;
        self.state = RunState::Stopped;

        let stats = self.stats();
        tracing::info!(
            iterations = stats.iterations,
            dispatched = stats.dispatched,
            polls = stats.polls_requested,
            sensor_events = stats.sensor_events,
            dropped = stats.dropped,
            tenths = stats.elapsed_tenths,
            "console stopped"
        );
        Ok(stats)
    }

    /// Bootstrap, loop until the operator quits, then tear down.
    pub fn run<S: BusStatus>(&mut self, status: &S) -> Result<ConsoleStats, ConsoleError> {
        self.start(status)?;
        while !self.step()?.is_quit() {}
        self.shutdown()
    }

    /// Counters so far.
    pub fn stats(&self) -> ConsoleStats {
        ConsoleStats {
            sensor_events: self.sensors.events_total(),
            dropped: self.queue.dropped(),
            elapsed_tenths: self.time.elapsed_tenths(),
            ..self.stats
        }
    }

    /// Lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The outbound command queue.
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Mutable access to the queue (for injecting commands).
    pub fn queue_mut(&mut self) -> &mut CommandQueue {
        &mut self.queue
    }

    /// Elapsed time accounting.
    pub fn time(&self) -> &TimeBase {
        &self.time
    }

    /// Sensor decoder state.
    pub fn sensors(&self) -> &SensorDecoder {
        &self.sensors
    }

    /// The line editor.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Track bus channel.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutable track bus channel.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Terminal channel.
    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    /// Mutable terminal channel.
    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    /// Hardware counter.
    pub fn counter(&self) -> &C {
        &self.counter
    }

    /// Mutable hardware counter.
    pub fn counter_mut(&mut self) -> &mut C {
        &mut self.counter
    }

    /// Status display.
    pub fn display(&self) -> &D {
        &self.display
    }
}

/// The screen is informational; a failed draw is logged and skipped.
fn shown(result: Result<(), ChannelError>) {
    if let Err(e) = result {
        tracing::trace!(error = %e, "display update skipped");
    }
}
