//! Periodic display update loop.
//!
//! Application tasks draw into a shared [`Canvas`]; [`display_update_task`]
//! polls it at a fixed rate and pushes a frame only when the canvas
//! generation moved since the last successful flush.

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::canvas::Canvas;
use crate::driver::OledDriver;
use crate::refresh::RefreshConfig;
use crate::transport::Transport;

/// Periodic display update loop.
///
/// This is a regular `async fn`, **not** an Embassy `#[task]`. Embassy tasks
/// cannot be generic, so wrap it in a concrete task:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn oled_task(
///     driver: OledDriver<MyTransport, NoResetPin, embassy_time::Delay>,
///     canvas: &'static Mutex<CriticalSectionRawMutex, Canvas>,
///     config: RefreshConfig,
/// ) {
///     display_update_task(driver, canvas, config).await;
/// }
/// ```
///
/// # Control flow
///
/// 1. Initialise the display hardware.
/// 2. Loop at `config.update_frequency_hz`, running [`refresh_once`]:
///    - **Step 1**: lock `canvas` and compare its generation with the last
///      one flushed. Skip the cycle if unchanged.
///    - **Step 2**: transcode the canvas into the device buffer, then
///      release the mutex.
///    - **Step 3**: flush the device buffer to hardware (no mutex held).
///
/// # Errors
///
/// * Initialisation failure: logs the error and **returns** (task exits).
/// * Render / flush failure: logs the error and continues to the next cycle.
///   A failed flush is retried on the next cycle even if nothing was drawn.
#[allow(clippy::needless_pass_by_value)] // config is small and consumed
pub async fn display_update_task<T, RST, D>(
    mut driver: OledDriver<T, RST, D>,
    canvas: &'static Mutex<CriticalSectionRawMutex, Canvas>,
    config: RefreshConfig,
) where
    T: Transport,
    RST: OutputPin,
    D: DelayNs,
{
    // ── Initialisation ───────────────────────────────────────────────
    if let Err(_e) = driver.init().await {
        #[cfg(feature = "defmt")]
        defmt::error!("OLED init failed, display task exiting: {}", _e);
        return;
    }

    let period = Duration::from_millis(config.update_period_ms());
    let mut last_generation: Option<u32> = None;

    // ── Main loop ────────────────────────────────────────────────────
    loop {
        Timer::after(period).await;
        refresh_once(&mut driver, canvas, &mut last_generation).await;
    }
}

/// One cycle of [`display_update_task`].
///
/// `last_generation` is the canvas generation last pushed to the panel
/// (`None` before the first frame). Returns `true` if a frame was flushed.
///
/// * Unchanged generation: nothing is rendered or sent.
/// * Render failure (size mismatch): the generation is recorded so the same
///   canvas is not retried.
/// * Flush failure: the generation is left alone so the frame is retried on
///   the next cycle.
pub async fn refresh_once<M, T, RST, D>(
    driver: &mut OledDriver<T, RST, D>,
    canvas: &Mutex<M, Canvas>,
    last_generation: &mut Option<u32>,
) -> bool
where
    M: RawMutex,
    T: Transport,
    RST: OutputPin,
    D: DelayNs,
{
    // ── Steps 1–2: render under the lock ─────────────────────────────
    let generation = {
        let canvas = canvas.lock().await;
        let generation = canvas.generation();
        if *last_generation == Some(generation) {
            return false;
        }
        if let Err(_e) = driver.render(&*canvas) {
            #[cfg(feature = "defmt")]
            defmt::error!("Render failed: {}", _e);
            *last_generation = Some(generation);
            return false;
        }
        generation
    }; // ← mutex released here, before any bus traffic

    // ── Step 3: flush ────────────────────────────────────────────────
    if let Err(_e) = driver.flush().await {
        #[cfg(feature = "defmt")]
        defmt::error!("Flush failed: {}", _e);
        return false;
    }

    *last_generation = Some(generation);
    true
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::RunKind;
    use crate::canvas::FOREGROUND;
    use crate::config::{ControllerConfig, PanelGeometry};
    use crate::driver::NoResetPin;
    use crate::transport::{BusKind, Framing};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use std::vec::Vec;

    type SharedCanvas = Mutex<NoopRawMutex, Canvas>;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct BusFault;

    /// Records frames and whether the canvas lock was free while writing.
    struct Panel<'a> {
        canvas: &'a SharedCanvas,
        failing: bool,
        writes: Vec<Vec<u8>>,
        unlocked_during_write: Vec<bool>,
    }

    impl Transport for Panel<'_> {
        type Error = BusFault;

        fn kind(&self) -> BusKind {
            BusKind::I2c
        }

        fn framing(&self) -> Framing {
            Framing::ControlByte
        }

        fn select(&mut self, _kind: RunKind) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            self.unlocked_during_write.push(self.canvas.try_lock().is_ok());
            if self.failing {
                return Err(BusFault);
            }
            self.writes.push(bytes.to_vec());
            Ok(())
        }
    }

    async fn ready_driver(canvas: &SharedCanvas) -> OledDriver<Panel<'_>, NoResetPin, NoopDelay> {
        let panel = Panel {
            canvas,
            failing: false,
            writes: Vec::new(),
            unlocked_during_write: Vec::new(),
        };
        let config = ControllerConfig::new(PanelGeometry::OLED_128_32);
        let mut driver = OledDriver::new(panel, NoopDelay, config);
        driver.init().await.unwrap();
        driver
    }

    #[tokio::test]
    async fn unchanged_generation_sends_nothing() {
        let canvas = SharedCanvas::new(Canvas::new(PanelGeometry::OLED_128_32));
        let mut driver = ready_driver(&canvas).await;
        let mut last = None;

        assert!(refresh_once(&mut driver, &canvas, &mut last).await);
        assert_eq!(driver.transport().writes.len(), 3);

        assert!(!refresh_once(&mut driver, &canvas, &mut last).await);
        assert!(!refresh_once(&mut driver, &canvas, &mut last).await);
        assert_eq!(driver.transport().writes.len(), 3);

        canvas.lock().await.set_pixel(0, 0, FOREGROUND);
        assert!(refresh_once(&mut driver, &canvas, &mut last).await);
        let frame = driver.transport().writes.last().unwrap();
        assert_eq!(frame[0], 0x40);
        assert_eq!(frame[1], 0x01);
    }

    #[tokio::test]
    async fn failed_flush_is_retried_with_unchanged_canvas() {
        let canvas = SharedCanvas::new(Canvas::new(PanelGeometry::OLED_128_32));
        let mut driver = ready_driver(&canvas).await;
        let mut last = None;

        canvas.lock().await.set_pixel(1, 0, FOREGROUND);
        driver.transport_mut().failing = true;
        assert!(!refresh_once(&mut driver, &canvas, &mut last).await);
        assert_eq!(last, None);
        assert_eq!(driver.transport().writes.len(), 2);

        driver.transport_mut().failing = false;
        assert!(refresh_once(&mut driver, &canvas, &mut last).await);
        assert_eq!(driver.transport().writes.len(), 3);
        assert_eq!(driver.transport().writes[2][2], 0x01);

        assert!(!refresh_once(&mut driver, &canvas, &mut last).await);
        assert_eq!(driver.transport().writes.len(), 3);
    }

    #[tokio::test]
    async fn size_mismatch_is_not_retried() {
        let panel_canvas = SharedCanvas::new(Canvas::new(PanelGeometry::OLED_128_32));
        let mut driver = ready_driver(&panel_canvas).await;
        let wrong = SharedCanvas::new(Canvas::new(PanelGeometry::OLED_128_64));
        let mut last = None;

        assert!(!refresh_once(&mut driver, &wrong, &mut last).await);
        assert_eq!(last, Some(wrong.lock().await.generation()));
        assert_eq!(driver.transport().writes.len(), 2);

        assert!(!refresh_once(&mut driver, &wrong, &mut last).await);
        assert_eq!(driver.transport().writes.len(), 2);
        assert_eq!(driver.transport().unlocked_during_write.len(), 2);
    }

    #[tokio::test]
    async fn canvas_is_unlocked_while_flushing() {
        let canvas = SharedCanvas::new(Canvas::new(PanelGeometry::OLED_128_32));
        let mut driver = ready_driver(&canvas).await;
        let mut last = None;

        canvas.lock().await.fill(FOREGROUND);
        assert!(refresh_once(&mut driver, &canvas, &mut last).await);
        assert!(driver.transport().unlocked_during_write.iter().all(|&free| free));
        assert!(driver.transport().writes[2][1..].iter().all(|&b| b == 0xFF));
    }
}
