//! Error types for the OLED display driver.

use core::fmt;

use embedded_hal::digital::ErrorKind as PinErrorKind;

use crate::config::ConfigError;
use crate::driver::DeviceState;
use crate::transcode::SizeMismatch;

/// Errors that can occur during OLED display operations.
///
/// Generic over the transport error `E` so callers can branch on the
/// underlying bus failure.
#[derive(Debug, PartialEq, Eq)]
pub enum OledError<E> {
    /// The transport reported itself unusable (missing or invalid handle).
    Unavailable,
    /// Underlying bus write (or SPI select line) failed mid-batch.
    Bus(E),
    /// `send()` was called with no pending bytes.
    NothingToSend,
    /// An append did not fit in the batch capacity; nothing was sent.
    BatchOverflow,
    /// Surface dimensions do not match the panel geometry.
    SizeMismatch,
    /// The controller configuration was rejected before any bus traffic.
    Config(ConfigError),
    /// Driving the reset line failed.
    Pin(PinErrorKind),
    /// An operation was attempted before [`OledDriver::init()`](crate::OledDriver::init)
    /// succeeded.
    NotReady,
    /// [`OledDriver::init()`](crate::OledDriver::init) was called on a driver
    /// that already left the `Unknown` state.
    InvalidState(DeviceState),
}

/// Bound for transport errors that end up in log messages.
///
/// With the `defmt` feature this is `defmt::Format`; without it every type
/// qualifies.
#[cfg(feature = "defmt")]
pub trait MaybeFormat: defmt::Format {}

#[cfg(feature = "defmt")]
impl<T: defmt::Format> MaybeFormat for T {}

/// Bound for transport errors that end up in log messages.
///
/// With the `defmt` feature this is `defmt::Format`; without it every type
/// qualifies.
#[cfg(not(feature = "defmt"))]
pub trait MaybeFormat {}

#[cfg(not(feature = "defmt"))]
impl<T> MaybeFormat for T {}

impl<E> From<ConfigError> for OledError<E> {
    fn from(error: ConfigError) -> Self {
        OledError::Config(error)
    }
}

impl<E> From<SizeMismatch> for OledError<E> {
    fn from(_: SizeMismatch) -> Self {
        OledError::SizeMismatch
    }
}

impl<E: fmt::Debug> fmt::Display for OledError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OledError::Unavailable => write!(f, "Bus unavailable"),
            OledError::Bus(e) => write!(f, "Bus error: {:?}", e),
            OledError::NothingToSend => write!(f, "Nothing to send"),
            OledError::BatchOverflow => write!(f, "Batch capacity exceeded"),
            OledError::SizeMismatch => write!(f, "Surface size does not match panel"),
            OledError::Config(e) => write!(f, "Invalid configuration: {}", e),
            OledError::Pin(kind) => write!(f, "Reset pin error: {}", kind),
            OledError::NotReady => write!(f, "Display not ready"),
            OledError::InvalidState(s) => write!(f, "Invalid state for init: {:?}", s),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for OledError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            OledError::Unavailable => defmt::write!(f, "Bus unavailable"),
            OledError::Bus(e) => defmt::write!(f, "Bus error: {}", e),
            OledError::NothingToSend => defmt::write!(f, "Nothing to send"),
            OledError::BatchOverflow => defmt::write!(f, "Batch capacity exceeded"),
            OledError::SizeMismatch => defmt::write!(f, "Surface size mismatch"),
            OledError::Config(e) => defmt::write!(f, "Invalid configuration: {}", e),
            OledError::Pin(kind) => defmt::write!(f, "Reset pin error: {}", kind),
            OledError::NotReady => defmt::write!(f, "Not ready"),
            OledError::InvalidState(s) => defmt::write!(f, "Invalid state for init: {}", s),
        }
    }
}
