//! Desktop simulator for the operator console.
//!
//! Runs the real [`Console`] loop against simulated hardware so the screen,
//! command grammar, and sensor polling can be exercised without a board:
//!
//! - The terminal is stdin (line-buffered by the host shell) and the screen is
//!   stdout driven with ANSI escapes
//! - The hardware counter is a wall-clock down-counter at `counter_hz`
//! - The track bus is a decoder bank where a single "train" trips one
//!   contact after another
//!
//! Logs go to stderr, so redirect them to keep the screen clean.
//!
//! # Usage
//!
//! ```sh
//! cargo run --bin console_sim --features sim 2>console.log
//!
//! # with a JSON config (any subset of fields)
//! cargo run --bin console_sim --features sim -- console.json 2>console.log
//! ```
//!
//! Type `tr 5 10`, `sw 3 S`, `g`, and so on; `q` exits.

use std::io::{self, Read, Stdout, Write};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use train_console::config::BYTES_PER_DECODER;
use train_console::hal::{MockBusStatus, MockTrackBus};
use train_console::{
    ByteChannel, ChannelError, Console, ConsoleConfig, ConsoleDisplay, HardwareCounter,
};

/// Pause between scheduler iterations so the simulator doesn't spin a core.
const LOOP_INTERVAL: Duration = Duration::from_micros(500);

/// Scheduler iterations between simulated train movements.
const ITERATIONS_PER_CONTACT: u64 = 4_000;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)?,
        None => ConsoleConfig::default(),
    };
    tracing::info!(?config, "configuration");

    let bus = SimulatedTrack::new(&config);
    let terminal = StdinTerminal::spawn();
    let counter = WallClockCounter::new(config.timing.counter_hz);
    let display = AnsiDisplay::new(io::stdout());

    let mut console = Console::new(&config, bus, terminal, counter, display);
    console
        .start(&MockBusStatus::ready())
        .context("console bootstrap failed")?;

    loop {
        let report = console.step().context("console step failed")?;
        if report.is_quit() {
            break;
        }
        console.bus_mut().advance();
        thread::sleep(LOOP_INTERVAL);
    }

    let stats = console.shutdown().context("console shutdown failed")?;
    println!();
    println!(
        "{} iterations, {} bytes sent, {} sensor events, {} dropped, {}",
        stats.iterations,
        stats.dispatched,
        stats.sensor_events,
        stats.dropped,
        console.time().clock()
    );
    Ok(())
}

fn load_config(path: &str) -> anyhow::Result<ConsoleConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

// ============================================================================
// Track bus
// ============================================================================

/// Decoder bank with one train lapping the layout.
struct SimulatedTrack {
    bus: MockTrackBus,
    requests: std::ops::RangeInclusive<u8>,
    modules: usize,
    contact: usize,
    iterations: u64,
}

impl SimulatedTrack {
    fn new(config: &ConsoleConfig) -> Self {
        let base = config.opcodes.sensor_read_one;
        // a deserialized config skips the builder's clamp; slots() re-applies it
        let modules = config.sensors.slots() / BYTES_PER_DECODER;
        let count = u8::try_from(modules).unwrap_or(u8::MAX);
        Self {
            bus: MockTrackBus::new(base, count),
            requests: base.saturating_add(1)..=base.saturating_add(count),
            modules,
            contact: 0,
            iterations: 0,
        }
    }

    /// Move the train on every so often.
    fn advance(&mut self) {
        self.iterations += 1;
        if self.iterations % ITERATIONS_PER_CONTACT != 0 {
            return;
        }
        let (module, _) = self.position();
        self.bus.set_module(module, [0, 0]);

        self.contact = (self.contact + 1) % (self.modules * 16);
        let (module, bit) = self.position();
        let word = 0x8000_u16 >> bit;
        self.bus.set_module(module, word.to_be_bytes());
        tracing::debug!(module, sensor = bit + 1, "train at contact");
    }

    fn position(&self) -> (usize, usize) {
        (self.contact / 16, self.contact % 16)
    }
}

impl ByteChannel for SimulatedTrack {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.bus.try_read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ChannelError> {
        if !self.requests.contains(&byte) {
            tracing::info!(byte, "track command");
        }
        self.bus.write_byte(byte)
    }

    fn flush(&mut self) -> Result<(), ChannelError> {
        self.bus.flush()?;
        // `sent` is a test log; keep it bounded
        self.bus.sent.clear();
        Ok(())
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Keystrokes from stdin, read on a helper thread.
struct StdinTerminal {
    keys: Receiver<u8>,
}

impl StdinTerminal {
    fn spawn() -> Self {
        let (tx, keys) = mpsc::channel();
        thread::spawn(move || {
            for byte in io::stdin().lock().bytes() {
                let Ok(byte) = byte else { break };
                if tx.send(byte).is_err() {
                    return;
                }
            }
            // stdin closed: quit cleanly
            tracing::info!("stdin closed");
            for byte in *b"\nq\n" {
                let _ = tx.send(byte);
            }
        });
        Self { keys }
    }
}

impl ByteChannel for StdinTerminal {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.keys.try_recv().ok()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ChannelError> {
        io::stdout()
            .write_all(&[byte])
            .map_err(|_| ChannelError::Disconnected)
    }

    fn flush(&mut self) -> Result<(), ChannelError> {
        io::stdout().flush().map_err(|_| ChannelError::Disconnected)
    }
}

// ============================================================================
// Counter
// ============================================================================

/// Free-running down-counter derived from wall-clock time.
struct WallClockCounter {
    origin: Instant,
    hz: u64,
    frozen: Option<u32>,
}

impl WallClockCounter {
    fn new(hz: u32) -> Self {
        Self {
            origin: Instant::now(),
            hz: u64::from(hz.max(1)),
            frozen: None,
        }
    }

    fn current(&self) -> u32 {
        let ticks = self.origin.elapsed().as_micros() as u64 * self.hz / 1_000_000;
        // wraps exactly like the 32-bit hardware register
        u32::MAX.wrapping_sub(ticks as u32)
    }
}

impl HardwareCounter for WallClockCounter {
    fn sample(&mut self) -> u32 {
        self.frozen.unwrap_or_else(|| self.current())
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.frozen = if enabled { None } else { Some(self.current()) };
    }
}

// ============================================================================
// Display
// ============================================================================

/// VT100 screen on a writer.
struct AnsiDisplay<W: Write> {
    out: W,
}

impl AnsiDisplay<Stdout> {
    fn new(out: Stdout) -> Self {
        Self { out }
    }
}

impl<W: Write> AnsiDisplay<W> {
    fn emit(&mut self, args: std::fmt::Arguments<'_>) -> Result<(), ChannelError> {
        self.out
            .write_fmt(args)
            .map_err(|_| ChannelError::Disconnected)
    }
}

impl<W: Write> ConsoleDisplay for AnsiDisplay<W> {
    fn clear_screen(&mut self) -> Result<(), ChannelError> {
        self.emit(format_args!("\x1b[2J"))
    }

    fn move_cursor(&mut self, line: u16, column: u16) -> Result<(), ChannelError> {
        self.emit(format_args!("\x1b[{line};{column}H"))
    }

    fn clear_to_eol(&mut self) -> Result<(), ChannelError> {
        self.emit(format_args!("\x1b[K"))
    }

    fn write_str(&mut self, text: &str) -> Result<(), ChannelError> {
        self.emit(format_args!("{text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_from_json(json: &str) -> SimulatedTrack {
        let config: ConsoleConfig = serde_json::from_str(json).unwrap();
        SimulatedTrack::new(&config)
    }

    #[test]
    fn zero_decoder_count_is_clamped() {
        let mut track = track_from_json(r#"{"sensors":{"decoder_count":0}}"#);
        assert_eq!(track.modules, 1);
        assert_eq!(track.requests, 193..=193);

        for _ in 0..ITERATIONS_PER_CONTACT * 3 {
            track.advance();
        }
        assert_eq!(track.position(), (0, 3));
    }

    #[test]
    fn oversized_decoder_count_is_clamped() {
        let track = track_from_json(r#"{"sensors":{"decoder_count":200}}"#);
        assert_eq!(track.modules, 26);
    }

    #[test]
    fn train_moves_to_next_module() {
        let mut track = track_from_json("{}");
        track.contact = 15;
        for _ in 0..ITERATIONS_PER_CONTACT {
            track.advance();
        }
        assert_eq!(track.position(), (1, 0));

        track.write_byte(194).unwrap();
        track.flush().unwrap();
        assert_eq!(track.try_read_byte(), Some(0x80));
        assert_eq!(track.try_read_byte(), Some(0x00));
    }
}
