//! Error types for collaborator failures.
//!
//! Nothing in the console core is fatal on its own: a full command queue
//! drops the command, malformed operator input becomes zero or a no-op, and a
//! desynchronized sensor stream is simply misread. Those are reported through
//! return values and logs. The types here cover the one thing the core cannot
//! absorb, which is an I/O collaborator that stops working.

use core::fmt;

/// Failure reported by a [`ByteChannel`] or [`ConsoleDisplay`].
///
/// [`ByteChannel`]: crate::traits::ByteChannel
/// [`ConsoleDisplay`]: crate::traits::ConsoleDisplay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelError {
    /// The output buffer had no room for the byte.
    BufferFull,
    /// The peer or device is gone.
    Disconnected,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferFull => write!(f, "output buffer full"),
            Self::Disconnected => write!(f, "channel disconnected"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ChannelError {}

/// Error returned by the polling scheduler.
///
/// Identifies which side of the console failed. Display writes are never
/// turned into this error; the screen is informational only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleError {
    /// Track bus channel failure.
    Bus(ChannelError),
    /// Operator terminal channel failure.
    Terminal(ChannelError),
}

impl ConsoleError {
    /// Returns the underlying channel error.
    pub fn channel_error(&self) -> ChannelError {
        match self {
            Self::Bus(e) | Self::Terminal(e) => *e,
        }
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "track bus error: {}", e),
            Self::Terminal(e) => write!(f, "terminal error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConsoleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_error_display() {
        assert_eq!(ChannelError::BufferFull.to_string(), "output buffer full");
        assert_eq!(
            ChannelError::Disconnected.to_string(),
            "channel disconnected"
        );
    }

    #[test]
    fn console_error_display() {
        let error = ConsoleError::Bus(ChannelError::Disconnected);
        assert_eq!(error.to_string(), "track bus error: channel disconnected");

        let error = ConsoleError::Terminal(ChannelError::BufferFull);
        assert_eq!(error.to_string(), "terminal error: output buffer full");
    }

    #[test]
    fn console_error_unwraps_channel_error() {
        let error = ConsoleError::Terminal(ChannelError::Disconnected);
        assert_eq!(error.channel_error(), ChannelError::Disconnected);
    }

    #[cfg(feature = "std")]
    #[test]
    fn console_error_is_std_error() {
        let error = ConsoleError::Bus(ChannelError::BufferFull);
        let _: &dyn std::error::Error = &error;
    }
}
