//! Async driver for SSD1306-family monochrome OLED controllers.
//!
//! The crate turns "configure the panel, then show this bitmap" into the
//! exact byte stream the controller expects, over either I2C or 4-wire SPI.
//!
//! - [`OledDriver`] runs the reset → configuration → startup image → ready
//!   sequence and pushes whole frames.
//! - [`Transaction`] batches command and data bytes into as few bus writes
//!   as possible: one write per run of same-typed bytes.
//! - [`Canvas`] is an `embedded-graphics` draw target; [`transcode`] packs
//!   it into the controller's page-addressed 1 bpp layout.
//!
//! No startup logos are bundled. Unless an image is supplied with
//! [`OledDriver::with_startup_image`], every panel starts blank.
//!
//! # Quick Start
//!
//! ```ignore
//! use embedded_graphics::{pixelcolor::Gray8, prelude::*, primitives::*};
//! use oled_ssd1306_rs::{
//!     Canvas, ControllerConfig, I2cTransport, OledDriver, PanelGeometry, I2C_PRIMARY_ADDRESS,
//! };
//!
//! let geometry = PanelGeometry::OLED_128_32;
//! let transport = I2cTransport::new(i2c, I2C_PRIMARY_ADDRESS);
//! let mut oled = OledDriver::new(transport, embassy_time::Delay, ControllerConfig::new(geometry));
//! oled.init().await?;
//!
//! let mut canvas = Canvas::new(geometry);
//! Circle::new(Point::new(48, 0), 32)
//!     .into_styled(PrimitiveStyle::with_stroke(Gray8::WHITE, 1))
//!     .draw(&mut canvas)?;
//! oled.display(&canvas).await?;
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`](https://docs.rs/defmt).
//! - **`task`**: [`display_update_task`], a periodic refresh loop sharing a
//!   [`Canvas`] through an Embassy mutex. Its tests need the feature too:
//!   `cargo test --features task`.

#![cfg_attr(not(test), no_std)]

pub mod batch;
pub mod canvas;
pub mod command;
pub mod config;
#[cfg(feature = "task")]
pub mod display_task;
pub mod driver;
pub mod error;
pub mod refresh;
pub mod transcode;
pub mod transport;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use batch::{Batch, Controller, RunKind, Transaction};
pub use canvas::{Canvas, PixelSource, BACKGROUND, FOREGROUND};
pub use command::{I2C_PRIMARY_ADDRESS, I2C_SECONDARY_ADDRESS};
pub use config::{
    AddressingMode, ComPinConfig, ComPinLayout, ComPinRemap, ConfigError, ControllerConfig,
    DeselectLevel, PanelGeometry,
};
#[cfg(feature = "task")]
pub use display_task::{display_update_task, refresh_once};
pub use driver::{DeviceState, NoResetPin, OledDriver};
pub use error::{MaybeFormat, OledError};
pub use refresh::RefreshConfig;
pub use transcode::{is_pixel_on, transcode, DeviceBuffer, SizeMismatch};
pub use transport::{BusKind, Framing, I2cTransport, SpiTransport, Transport, TransportError};
