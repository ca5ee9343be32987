//! SSD1306 device state machine.
//!
//! [`OledDriver`] owns the bus transport, the optional reset line, the
//! device buffer and a delay provider. It walks the controller from power-up
//! to a displaying state and then pushes whole frames on request.

use core::convert::Infallible;

use embedded_hal::digital::{Error as _, ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::batch::Controller;
use crate::canvas::PixelSource;
use crate::command::{
    init_sequence, DISPLAY_ALL_ON, DISPLAY_ALL_ON_RAM, DISPLAY_OFF, DISPLAY_ON, INVERSE_DISPLAY,
    NORMAL_DISPLAY, SET_CONTRAST,
};
use crate::config::ControllerConfig;
use crate::error::OledError;
use crate::transcode::{transcode, DeviceBuffer};
use crate::transport::{BusKind, Transport};

/// Reset line held low for this long (datasheet minimum is 3 µs).
pub const RESET_PULSE_MS: u32 = 1;

/// Wait after reset before the first command.
pub const POST_RESET_DELAY_MS: u32 = 100;

/// Wait after the startup image before the panel is considered ready.
pub const SETTLE_DELAY_MS: u32 = 1000;

/// Lifecycle of an [`OledDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Constructed, no bus traffic yet.
    Unknown,
    /// [`OledDriver::init()`] is running.
    Initializing,
    /// Initialised; frames may be displayed.
    Ready,
    /// Initialisation failed. Terminal: construct a new driver to retry.
    Aborted,
}

/// Placeholder reset line for boards that do not wire one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResetPin;

impl ErrorType for NoResetPin {
    type Error = Infallible;
}

impl OutputPin for NoResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Async driver for an SSD1306-family OLED panel.
///
/// # Lifecycle
///
/// 1. [`OledDriver::new()`] / [`OledDriver::with_reset()`]: no bus traffic.
/// 2. [`OledDriver::init()`]: reset, configuration burst, startup image.
/// 3. Draw into a [`Canvas`](crate::Canvas) (or any [`PixelSource`]).
/// 4. [`OledDriver::display()`]: transcode and send the frame.
///
/// # Example
///
/// ```ignore
/// use oled_ssd1306_rs::{
///     Canvas, ControllerConfig, I2cTransport, OledDriver, PanelGeometry, I2C_PRIMARY_ADDRESS,
/// };
///
/// let config = ControllerConfig::new(PanelGeometry::OLED_128_32);
/// let transport = I2cTransport::new(i2c, I2C_PRIMARY_ADDRESS);
/// let mut oled = OledDriver::new(transport, embassy_time::Delay, config);
/// oled.init().await?;
///
/// let mut canvas = Canvas::new(PanelGeometry::OLED_128_32);
/// // ... draw with embedded-graphics ...
/// oled.display(&canvas).await?;
/// ```
pub struct OledDriver<T, RST, D>
where
    T: Transport,
{
    controller: Controller<T>,
    reset: Option<RST>,
    delay: D,
    config: ControllerConfig,
    buffer: DeviceBuffer,
    startup_image: Option<&'static [u8]>,
    state: DeviceState,
}

impl<T, D> OledDriver<T, NoResetPin, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Construct a driver for a panel without a reset line.
    pub fn new(transport: T, delay: D, config: ControllerConfig) -> Self {
        Self::build(transport, None, delay, config)
    }
}

impl<T, RST, D> OledDriver<T, RST, D>
where
    T: Transport,
    RST: OutputPin,
    D: DelayNs,
{
    /// Construct a driver that pulses `reset` during [`init()`](Self::init).
    pub fn with_reset(transport: T, reset: RST, delay: D, config: ControllerConfig) -> Self {
        Self::build(transport, Some(reset), delay, config)
    }

    fn build(transport: T, reset: Option<RST>, delay: D, config: ControllerConfig) -> Self {
        Self {
            controller: Controller::new(transport),
            reset,
            delay,
            buffer: DeviceBuffer::new(config.geometry()),
            config,
            startup_image: None,
            state: DeviceState::Unknown,
        }
    }

    /// Show `image` (pre-encoded device buffer bytes) right after init.
    ///
    /// Without one the panel starts blank; the crate bundles no logos.
    /// Ignored with a warning at init time unless its length equals the
    /// panel's buffer length; the panel then starts blank.
    pub fn with_startup_image(mut self, image: &'static [u8]) -> Self {
        self.startup_image = Some(image);
        self
    }

    /// Bring the controller up.
    ///
    /// Checks the transport, pulses the reset line (if any), sends the
    /// configuration burst as one batch, sends the startup image (or a
    /// blank frame) and waits for the panel to settle.
    ///
    /// # Errors
    ///
    /// * [`OledError::InvalidState`] if `init()` was already called. The
    ///   driver state is not changed.
    /// * Any other error moves the driver to [`DeviceState::Aborted`] and is
    ///   returned as-is.
    pub async fn init(&mut self) -> Result<(), OledError<T::Error>> {
        if self.state != DeviceState::Unknown {
            return Err(OledError::InvalidState(self.state));
        }
        self.state = DeviceState::Initializing;

        match self.bring_up().await {
            Ok(()) => {
                self.state = DeviceState::Ready;
                #[cfg(feature = "defmt")]
                defmt::info!("SSD1306 display on {} initialised", self.bus_kind());
                Ok(())
            }
            Err(e) => {
                self.state = DeviceState::Aborted;
                #[cfg(feature = "defmt")]
                defmt::error!(
                    "Failed to initialise SSD1306 display on {}: {}",
                    self.bus_kind(),
                    e
                );
                Err(e)
            }
        }
    }

    async fn bring_up(&mut self) -> Result<(), OledError<T::Error>> {
        self.config.validate()?;
        if !self.controller.is_ready() {
            return Err(OledError::Unavailable);
        }

        if let Some(reset) = self.reset.as_mut() {
            reset.set_low().map_err(|e| OledError::Pin(e.kind()))?;
            self.delay.delay_ms(RESET_PULSE_MS).await;
            reset.set_high().map_err(|e| OledError::Pin(e.kind()))?;
        }
        self.delay.delay_ms(POST_RESET_DELAY_MS).await;

        let burst = init_sequence(&self.config);
        self.controller.send_command(&burst).await?;

        self.load_startup_image();
        self.controller.send_data(self.buffer.as_bytes()).await?;

        self.delay.delay_ms(SETTLE_DELAY_MS).await;
        Ok(())
    }

    fn load_startup_image(&mut self) {
        match self.startup_image {
            Some(image) if self.buffer.load(image) => {}
            Some(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Startup image does not match panel, starting blank");
                self.buffer.fill_zero();
            }
            None => self.buffer.fill_zero(),
        }
    }

    /// Transcode `surface` into the device buffer without sending it.
    ///
    /// Valid in any state; the buffer is only pushed by
    /// [`flush()`](Self::flush).
    ///
    /// # Errors
    ///
    /// [`OledError::SizeMismatch`] if the surface does not match the panel.
    /// The device buffer keeps its previous contents.
    pub fn render<S>(&mut self, surface: &S) -> Result<(), OledError<T::Error>>
    where
        S: PixelSource + ?Sized,
    {
        transcode(surface, &mut self.buffer)?;
        Ok(())
    }

    /// Send the device buffer to the panel as one data batch.
    ///
    /// # Errors
    ///
    /// [`OledError::NotReady`] before a successful [`init()`](Self::init),
    /// otherwise any transport error.
    pub async fn flush(&mut self) -> Result<(), OledError<T::Error>> {
        self.ensure_ready()?;
        self.controller.send_data(self.buffer.as_bytes()).await
    }

    /// [`render()`](Self::render) then [`flush()`](Self::flush).
    ///
    /// Readiness is checked first, so a driver that is not ready never
    /// overwrites its buffer.
    pub async fn display<S>(&mut self, surface: &S) -> Result<(), OledError<T::Error>>
    where
        S: PixelSource + ?Sized,
    {
        self.ensure_ready()?;
        self.render(surface)?;
        self.flush().await
    }

    /// Blank the panel and `surface` without reading any pixels.
    ///
    /// Always issues exactly one data batch of zeros.
    pub async fn clear<S>(&mut self, surface: &mut S) -> Result<(), OledError<T::Error>>
    where
        S: PixelSource + ?Sized,
    {
        self.ensure_ready()?;
        self.buffer.fill_zero();
        surface.clear_pixels();
        self.flush().await
    }

    // ── Runtime commands ─────────────────────────────────────────────

    /// Set the contrast (0–255).
    pub async fn set_contrast(&mut self, contrast: u8) -> Result<(), OledError<T::Error>> {
        self.command(&[SET_CONTRAST, contrast]).await?;
        self.config.contrast = contrast;
        Ok(())
    }

    /// Swap lit and dark pixels in hardware.
    pub async fn set_inverted(&mut self, inverted: bool) -> Result<(), OledError<T::Error>> {
        let opcode = if inverted { INVERSE_DISPLAY } else { NORMAL_DISPLAY };
        self.command(&[opcode]).await
    }

    /// Turn the panel on or put it to sleep. GDDRAM is retained.
    pub async fn set_display_on(&mut self, on: bool) -> Result<(), OledError<T::Error>> {
        let opcode = if on { DISPLAY_ON } else { DISPLAY_OFF };
        self.command(&[opcode]).await
    }

    /// Light every pixel regardless of GDDRAM (panel test).
    pub async fn set_all_on(&mut self, all_on: bool) -> Result<(), OledError<T::Error>> {
        let opcode = if all_on {
            DISPLAY_ALL_ON
        } else {
            DISPLAY_ALL_ON_RAM
        };
        self.command(&[opcode]).await
    }

    async fn command(&mut self, bytes: &[u8]) -> Result<(), OledError<T::Error>> {
        self.ensure_ready()?;
        self.controller.send_command(bytes).await
    }

    fn ensure_ready(&self) -> Result<(), OledError<T::Error>> {
        if self.state == DeviceState::Ready {
            Ok(())
        } else {
            Err(OledError::NotReady)
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// `true` once [`init()`](Self::init) has succeeded.
    pub fn is_ready(&self) -> bool {
        self.state == DeviceState::Ready
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// The last transcoded (or cleared) frame.
    pub fn buffer(&self) -> &DeviceBuffer {
        &self.buffer
    }

    pub fn bus_kind(&self) -> BusKind {
        self.controller.bus_kind()
    }

    pub fn transport(&self) -> &T {
        self.controller.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.controller.transport_mut()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::RunKind;
    use crate::canvas::{Canvas, FOREGROUND};
    use crate::config::PanelGeometry;
    use crate::transport::Framing;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct BusFault;

    #[derive(Default)]
    struct Log {
        ready: bool,
        fail_after: Option<usize>,
        writes: Vec<Vec<u8>>,
    }

    impl Transport for Log {
        type Error = BusFault;

        fn kind(&self) -> BusKind {
            BusKind::I2c
        }

        fn framing(&self) -> Framing {
            Framing::ControlByte
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn select(&mut self, _kind: RunKind) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            if self.fail_after == Some(self.writes.len()) {
                return Err(BusFault);
            }
            self.writes.push(bytes.to_vec());
            Ok(())
        }
    }

    #[derive(Default)]
    struct Ticks(Vec<u32>);

    impl DelayNs for Ticks {
        async fn delay_ns(&mut self, ns: u32) {
            self.0.push(ns / 1_000_000);
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.0.push(ms);
        }
    }

    fn driver(geometry: PanelGeometry) -> OledDriver<Log, NoResetPin, Ticks> {
        let log = Log {
            ready: true,
            ..Log::default()
        };
        OledDriver::new(log, Ticks::default(), ControllerConfig::new(geometry))
    }

    #[tokio::test]
    async fn init_walks_to_ready_with_two_batches() {
        let mut oled = driver(PanelGeometry::OLED_64_32);
        assert_eq!(oled.state(), DeviceState::Unknown);
        oled.init().await.unwrap();

        assert_eq!(oled.state(), DeviceState::Ready);
        let writes = &oled.transport().writes;
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0][0], 0x00);
        assert_eq!(writes[1][0], 0x40);
        assert_eq!(writes[1].len(), 1 + 256);
        assert_eq!(oled.delay.0, [POST_RESET_DELAY_MS, SETTLE_DELAY_MS]);
    }

    #[tokio::test]
    async fn second_init_is_rejected_without_traffic() {
        let mut oled = driver(PanelGeometry::OLED_128_32);
        oled.init().await.unwrap();
        assert_eq!(
            oled.init().await,
            Err(OledError::InvalidState(DeviceState::Ready))
        );
        assert_eq!(oled.transport().writes.len(), 2);
        assert_eq!(oled.state(), DeviceState::Ready);
    }

    #[tokio::test]
    async fn unavailable_transport_aborts() {
        let mut oled = driver(PanelGeometry::OLED_128_32);
        oled.transport_mut().ready = false;
        assert_eq!(oled.init().await, Err(OledError::Unavailable));
        assert_eq!(oled.state(), DeviceState::Aborted);
        assert!(oled.transport().writes.is_empty());
        assert_eq!(
            oled.init().await,
            Err(OledError::InvalidState(DeviceState::Aborted))
        );
    }

    #[tokio::test]
    async fn bus_failure_during_burst_aborts() {
        let mut oled = driver(PanelGeometry::OLED_128_64);
        oled.transport_mut().fail_after = Some(0);
        assert_eq!(oled.init().await, Err(OledError::Bus(BusFault)));
        assert_eq!(oled.state(), DeviceState::Aborted);
    }

    #[tokio::test]
    async fn invalid_config_aborts_before_any_traffic() {
        let mut config = ControllerConfig::new(PanelGeometry::OLED_128_32);
        config.start_line = 70;
        let log = Log {
            ready: true,
            ..Log::default()
        };
        let mut oled = OledDriver::new(log, Ticks::default(), config);
        assert_eq!(
            oled.init().await,
            Err(OledError::Config(crate::config::ConfigError::InvalidStartLine))
        );
        assert_eq!(oled.state(), DeviceState::Aborted);
        assert!(oled.transport().writes.is_empty());
        assert!(oled.delay.0.is_empty());
    }

    #[tokio::test]
    async fn operations_before_init_are_not_ready() {
        let mut oled = driver(PanelGeometry::OLED_128_32);
        let mut canvas = Canvas::new(PanelGeometry::OLED_128_32);
        assert_eq!(oled.flush().await, Err(OledError::NotReady));
        assert_eq!(oled.display(&canvas).await, Err(OledError::NotReady));
        assert_eq!(oled.clear(&mut canvas).await, Err(OledError::NotReady));
        assert_eq!(oled.set_contrast(0x7F).await, Err(OledError::NotReady));
        assert!(oled.transport().writes.is_empty());
    }

    #[tokio::test]
    async fn matching_startup_image_is_sent() {
        static IMAGE: [u8; 256] = [0xA5; 256];
        let mut oled = driver(PanelGeometry::OLED_64_32).with_startup_image(&IMAGE);
        oled.init().await.unwrap();
        assert!(oled.buffer().as_bytes().iter().all(|&b| b == 0xA5));
        assert_eq!(&oled.transport().writes[1][1..], &IMAGE[..]);
    }

    #[tokio::test]
    async fn mismatched_startup_image_falls_back_to_blank() {
        static IMAGE: [u8; 512] = [0xA5; 512];
        let mut oled = driver(PanelGeometry::OLED_64_32).with_startup_image(&IMAGE);
        oled.init().await.unwrap();
        assert_eq!(oled.transport().writes[1].len(), 1 + 256);
        assert!(oled.transport().writes[1][1..].iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn every_preset_starts_blank_without_an_image() {
        for geometry in [
            PanelGeometry::OLED_128_64,
            PanelGeometry::OLED_128_32,
            PanelGeometry::OLED_64_32,
        ] {
            let mut oled = driver(geometry);
            oled.init().await.unwrap();
            let frame = &oled.transport().writes[1];
            assert_eq!(frame.len(), 1 + geometry.buffer_len());
            assert!(frame[1..].iter().all(|&b| b == 0));
        }
    }

    #[tokio::test]
    async fn display_sends_one_data_batch() {
        let mut oled = driver(PanelGeometry::OLED_128_64);
        oled.init().await.unwrap();

        let mut canvas = Canvas::new(PanelGeometry::OLED_128_64);
        canvas.set_pixel(0, 0, FOREGROUND);
        oled.display(&canvas).await.unwrap();

        let frame = oled.transport().writes.last().unwrap();
        assert_eq!(frame.len(), 1 + 1024);
        assert_eq!(frame[0], 0x40);
        assert_eq!(frame[1], 0x01);
    }

    #[tokio::test]
    async fn display_with_wrong_surface_sends_nothing() {
        let mut oled = driver(PanelGeometry::OLED_128_64);
        oled.init().await.unwrap();
        let canvas = Canvas::new(PanelGeometry::OLED_128_32);
        assert_eq!(oled.display(&canvas).await, Err(OledError::SizeMismatch));
        assert_eq!(oled.transport().writes.len(), 2);
        assert_eq!(oled.state(), DeviceState::Ready);
    }

    #[tokio::test]
    async fn clear_blanks_buffer_and_surface() {
        let mut oled = driver(PanelGeometry::OLED_128_32);
        oled.init().await.unwrap();

        let mut canvas = Canvas::new(PanelGeometry::OLED_128_32);
        canvas.fill(FOREGROUND);
        oled.render(&canvas).unwrap();
        assert!(oled.buffer().as_bytes().iter().all(|&b| b == 0xFF));

        oled.clear(&mut canvas).await.unwrap();
        assert!(oled.buffer().as_bytes().iter().all(|&b| b == 0));
        assert!(canvas.pixel_bytes().iter().all(|&p| p == 0));
        assert_eq!(oled.transport().writes.len(), 3);
        assert!(oled.transport().writes[2][1..].iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn runtime_commands_send_single_command_runs() {
        let mut oled = driver(PanelGeometry::OLED_128_32);
        oled.init().await.unwrap();

        oled.set_contrast(0xCF).await.unwrap();
        oled.set_inverted(true).await.unwrap();
        oled.set_inverted(false).await.unwrap();
        oled.set_display_on(false).await.unwrap();
        oled.set_all_on(true).await.unwrap();
        oled.set_all_on(false).await.unwrap();

        let tail: Vec<&[u8]> = oled.transport().writes[2..]
            .iter()
            .map(Vec::as_slice)
            .collect();
        assert_eq!(
            tail,
            [
                &[0x00, 0x81, 0xCF][..],
                &[0x00, 0xA7][..],
                &[0x00, 0xA6][..],
                &[0x00, 0xAE][..],
                &[0x00, 0xA5][..],
                &[0x00, 0xA4][..],
            ]
        );
        assert_eq!(oled.config().contrast, 0xCF);
    }

    #[tokio::test]
    async fn flush_failure_keeps_ready() {
        let mut oled = driver(PanelGeometry::OLED_128_32);
        oled.init().await.unwrap();
        oled.transport_mut().fail_after = Some(2);
        assert_eq!(oled.flush().await, Err(OledError::Bus(BusFault)));
        assert_eq!(oled.state(), DeviceState::Ready);
    }
}
