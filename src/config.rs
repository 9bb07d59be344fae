//! Console configuration: timing, sensor bank, wire opcodes, screen layout.
//!
//! Buffer capacities are compile-time constants because they size
//! `heapless` storage. Everything else is a runtime value with a default
//! matching the reference layout (Märklin-style bus at 2400 baud, five
//! sensor decoders, a 2 kHz timer).
//!
//! # Example
//!
//! ```rust
//! use train_console::config::{ConsoleConfig, SensorConfig, TimingConfig};
//!
//! // Use defaults
//! let config = ConsoleConfig::default();
//! assert_eq!(config.timing.ticks_per_tenth, 200);
//!
//! // Or customize
//! let config = ConsoleConfig::default()
//!     .with_timing(TimingConfig::default().with_ticks_per_tenth(50))
//!     .with_sensors(SensorConfig::default().with_decoder_count(3));
//! assert_eq!(config.sensors.decoder_count, 3);
//! ```

/// Number of slots in the outbound command ring (one is always left free).
pub const QUEUE_SLOTS: usize = 100;

/// Maximum length of an operator input line.
pub const INPUT_LINE_MAX: usize = 100;

/// Number of recent sensor events kept for display.
pub const RECENT_SENSOR_SLOTS: usize = 8;

/// Bytes each decoder module returns per poll.
pub const BYTES_PER_DECODER: usize = 2;

/// Upper bound on decoder modules (identifiers run 'A' to 'Z').
pub const MAX_DECODERS: u8 = 26;

// ============================================================================
// Main Config
// ============================================================================

/// Complete console configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConsoleConfig {
    /// Hardware counter timing
    pub timing: TimingConfig,
    /// Sensor decoder bank
    pub sensors: SensorConfig,
    /// Wire opcodes sent on the track bus
    pub opcodes: Opcodes,
    /// Operator screen positions
    pub layout: ScreenLayout,
}

impl ConsoleConfig {
    /// Set timing configuration
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set sensor configuration
    pub fn with_sensors(mut self, sensors: SensorConfig) -> Self {
        self.sensors = sensors;
        self
    }

    /// Set opcode table
    pub fn with_opcodes(mut self, opcodes: Opcodes) -> Self {
        self.opcodes = opcodes;
        self
    }

    /// Set screen layout
    pub fn with_layout(mut self, layout: ScreenLayout) -> Self {
        self.layout = layout;
        self
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// Hardware counter timing
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimingConfig {
    /// Raw counter decrements per tenth of a second
    pub ticks_per_tenth: u32,
    /// Counter rate in Hz (informational; used by the simulator's counter)
    pub counter_hz: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            ticks_per_tenth: 200,
            counter_hz: 2000,
        }
    }
}

impl TimingConfig {
    /// Set raw ticks per tenth-second (minimum 1)
    pub fn with_ticks_per_tenth(mut self, ticks: u32) -> Self {
        self.ticks_per_tenth = ticks.max(1);
        self
    }

    /// Set the counter rate
    pub fn with_counter_hz(mut self, hz: u32) -> Self {
        self.counter_hz = hz.max(1);
        self
    }
}

// ============================================================================
// Sensor Config
// ============================================================================

/// Sensor decoder bank configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorConfig {
    /// Number of decoder modules on the bus (1 to 26)
    pub decoder_count: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { decoder_count: 5 }
    }
}

impl SensorConfig {
    /// Set the number of decoder modules
    pub fn with_decoder_count(mut self, count: u8) -> Self {
        self.decoder_count = count.clamp(1, MAX_DECODERS);
        self
    }

    /// Total response bytes in one full round over all decoders
    pub fn slots(&self) -> usize {
        usize::from(self.decoder_count.clamp(1, MAX_DECODERS)) * BYTES_PER_DECODER
    }
}

// ============================================================================
// Opcodes
// ============================================================================

/// Bytes the console writes to the track bus
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Opcodes {
    /// Powers the layout ("g")
    pub system_start: u8,
    /// Cuts layout power ("s")
    pub system_stop: u8,
    /// Speed value that reverses a train ("rv")
    pub train_reverse: u8,
    /// Throws a switch straight
    pub switch_straight: u8,
    /// Throws a switch curved
    pub switch_curved: u8,
    /// De-energizes the switch solenoid after every write
    pub solenoid_off: u8,
    /// Base of the single-decoder read request; decoder `n` (1-based) is `base + n`
    pub sensor_read_one: u8,
}

impl Default for Opcodes {
    fn default() -> Self {
        Self {
            system_start: 96,
            system_stop: 97,
            train_reverse: 15,
            switch_straight: 33,
            switch_curved: 34,
            solenoid_off: 32,
            sensor_read_one: 192,
        }
    }
}

impl Opcodes {
    /// Poll request byte for a zero-based decoder index
    pub fn sensor_request(&self, decoder_index: usize) -> u8 {
        // decoder_index is bounded by MAX_DECODERS
        self.sensor_read_one.wrapping_add(decoder_index as u8 + 1)
    }
}

// ============================================================================
// Screen Layout
// ============================================================================

/// Where each region of the status screen lives (1-based lines and columns)
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScreenLayout {
    /// Elapsed time readout
    pub elapsed_line: u16,
    /// Echo of the last committed command
    pub last_command_line: u16,
    /// Recent sensor strip
    pub recent_sensor_line: u16,
    /// Operator input line
    pub input_line: u16,
    /// Where the cursor is parked on exit
    pub bottom_line: u16,
    /// Width of one recent-sensor cell
    pub sensor_column_width: u16,
}

impl Default for ScreenLayout {
    fn default() -> Self {
        Self {
            elapsed_line: 1,
            last_command_line: 2,
            recent_sensor_line: 3,
            input_line: 20,
            bottom_line: 35,
            sensor_column_width: 8,
        }
    }
}

impl ScreenLayout {
    /// Set the operator input line
    pub fn with_input_line(mut self, line: u16) -> Self {
        self.input_line = line;
        self
    }

    /// Set the line the cursor is parked on at exit
    pub fn with_bottom_line(mut self, line: u16) -> Self {
        self.bottom_line = line;
        self
    }

    /// Column of a recent-sensor cell
    pub fn sensor_column(&self, slot: usize) -> u16 {
        1 + (slot as u16).saturating_mul(self.sensor_column_width)
    }
}
