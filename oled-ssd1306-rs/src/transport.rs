//! Bus transports for the SSD1306.
//!
//! The controller distinguishes command bytes from display data either with
//! an in-band control byte (I2C) or with a dedicated D/C select line (SPI).
//! [`Transport`] hides the bus behind a byte-write primitive and tells the
//! batcher which of the two [`Framing`]s to apply.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oled_ssd1306_rs::{I2cTransport, SpiTransport, I2C_PRIMARY_ADDRESS};
//!
//! // I2C: control bytes are inserted by the batcher
//! let i2c = I2cTransport::new(i2c_bus, I2C_PRIMARY_ADDRESS);
//!
//! // SPI: D/C low for commands, high for data
//! let spi = SpiTransport::new(spi_device, dc_pin);
//! ```

use core::fmt;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::i2c::I2c;
use embedded_hal_async::spi::SpiDevice;

use crate::batch::RunKind;
use crate::error::MaybeFormat;

/// Which physical bus a transport drives. Used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusKind {
    I2c,
    Spi,
}

/// How command and data runs are told apart on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Framing {
    /// Every run starts with a control byte (0x00 command, 0x40 data).
    ControlByte,
    /// The D/C line is driven before each run; no in-band flag.
    SelectLine,
}

/// Byte-level access to the controller.
///
/// Implemented for [`I2cTransport`] and [`SpiTransport`]. Implement it on
/// your own type to drive the controller through an unusual bus (a shared
/// bus manager, a bit-banged interface, a test recorder).
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Error type for bus operations.
    type Error: MaybeFormat;

    /// The bus this transport drives.
    fn kind(&self) -> BusKind;

    /// Framing the batcher must apply to runs.
    fn framing(&self) -> Framing;

    /// `false` if the underlying handle is missing or unusable.
    ///
    /// Checked before every send and once during initialisation.
    fn is_ready(&self) -> bool {
        true
    }

    /// Drive the command/data select line for the next write.
    ///
    /// Only called for [`Framing::SelectLine`] transports.
    fn select(&mut self, _kind: RunKind) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Perform one blocking bus write of `bytes`.
    async fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

// ── I2C ──────────────────────────────────────────────────────────────────

/// SSD1306 over I2C.
///
/// Owns the I2C peripheral (or a shared-bus device wrapper) and the 7-bit
/// target address.
pub struct I2cTransport<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cTransport<I2C>
where
    I2C: I2c,
{
    /// Create a new I2C transport.
    ///
    /// # Arguments
    /// * `i2c`: I2C peripheral (takes ownership for exclusive access)
    /// * `address`: 7-bit I2C device address (typically `0x3C` or `0x3D`)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// The configured 7-bit address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The underlying bus handle.
    pub fn bus(&self) -> &I2C {
        &self.i2c
    }

    /// Release the bus handle.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Transport for I2cTransport<I2C>
where
    I2C: I2c,
    I2C::Error: MaybeFormat,
{
    type Error = I2C::Error;

    fn kind(&self) -> BusKind {
        BusKind::I2c
    }

    fn framing(&self) -> Framing {
        Framing::ControlByte
    }

    fn is_ready(&self) -> bool {
        // Anything above 0x7F cannot be a 7-bit address.
        self.address <= 0x7F
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address, bytes).await
    }
}

// ── SPI ──────────────────────────────────────────────────────────────────

/// Errors from the SPI transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError<SpiErr, PinErr> {
    /// SPI communication error
    Spi(SpiErr),
    /// D/C pin error
    Pin(PinErr),
}

impl<SpiErr: fmt::Debug, PinErr: fmt::Debug> fmt::Display for TransportError<SpiErr, PinErr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Spi(e) => write!(f, "SPI error: {e:?}"),
            TransportError::Pin(e) => write!(f, "D/C pin error: {e:?}"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<SpiErr: defmt::Format, PinErr: defmt::Format> defmt::Format
    for TransportError<SpiErr, PinErr>
{
    fn format(&self, f: defmt::Formatter) {
        match self {
            TransportError::Spi(e) => defmt::write!(f, "SPI error: {}", e),
            TransportError::Pin(e) => defmt::write!(f, "D/C pin error: {}", e),
        }
    }
}

/// SSD1306 over 4-wire SPI.
///
/// `SpiDevice` manages chip select per transaction; the D/C pin is low for
/// command runs and high for data runs.
pub struct SpiTransport<SPI, DC> {
    spi: SPI,
    dc: DC,
}

impl<SPI, DC> SpiTransport<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    /// Create a new SPI transport.
    ///
    /// # Arguments
    /// * `spi`: SPI device (chip select handled by the device)
    /// * `dc`: Data/Command pin (output, low=command, high=data)
    pub fn new(spi: SPI, dc: DC) -> Self {
        Self { spi, dc }
    }

    /// Release the SPI device and D/C pin.
    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }
}

impl<SPI, DC> Transport for SpiTransport<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
    TransportError<SPI::Error, DC::Error>: MaybeFormat,
{
    type Error = TransportError<SPI::Error, DC::Error>;

    fn kind(&self) -> BusKind {
        BusKind::Spi
    }

    fn framing(&self) -> Framing {
        Framing::SelectLine
    }

    fn select(&mut self, kind: RunKind) -> Result<(), Self::Error> {
        let result = match kind {
            RunKind::Command => self.dc.set_low(),
            RunKind::Data => self.dc.set_high(),
        };
        result.map_err(TransportError::Pin)
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(bytes).await.map_err(TransportError::Spi)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
