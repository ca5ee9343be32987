//! Hello OLED example
//!
//! Standalone hardware demonstration driving two panels at once:
//!
//! - a 128×64 module on SPI0 (D/C and reset lines, alternative COM pins,
//!   mounted upside down so both remaps are on), drawn directly from `main`;
//! - a 128×32 module on I2C0 at `0x3C`, refreshed by [`display_update_task`]
//!   from a shared [`Canvas`].
//!
//! # Wiring
//!
//! | Signal    | Pico 2 Pin | Notes             |
//! |-----------|------------|-------------------|
//! | I2C0 SDA  | GP20       | 128×32 panel      |
//! | I2C0 SCL  | GP21       |                   |
//! | SPI0 SCK  | GP18       | 128×64 panel      |
//! | SPI0 MOSI | GP19       |                   |
//! | OLED CS   | GP17       | active low        |
//! | OLED D/C  | GP16       | low = command     |
//! | OLED RST  | GP15       | active low        |

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{I2C0, SPI0};
use embassy_rp::spi::{self, Spi};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use heapless::String;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_9X18_BOLD};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

use oled_ssd1306_rs::{
    display_update_task, Canvas, ComPinConfig, ComPinLayout, ComPinRemap, ControllerConfig,
    I2cTransport, NoResetPin, OledDriver, PanelGeometry, RefreshConfig, SpiTransport,
    I2C_PRIMARY_ADDRESS,
};

/// Tell the Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// Wire the I2C0 interrupt to Embassy's handler.
bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// Canvas of the I2C panel, drawn by `main` and read by the display task.
static STATUS_CANVAS: StaticCell<Mutex<CriticalSectionRawMutex, Canvas>> = StaticCell::new();

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

type StatusTransport = I2cTransport<I2c<'static, I2C0, i2c::Async>>;

type MainTransport = SpiTransport<
    ExclusiveDevice<Spi<'static, SPI0, spi::Async>, Output<'static>, Delay>,
    Output<'static>,
>;

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Thin wrapper that monomorphises the generic `display_update_task` so it can
/// be spawned as a concrete Embassy task.
#[embassy_executor::task]
async fn status_task(
    driver: OledDriver<StatusTransport, NoResetPin, Delay>,
    canvas: &'static Mutex<CriticalSectionRawMutex, Canvas>,
    config: RefreshConfig,
) {
    display_update_task(driver, canvas, config).await;
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Hello OLED example starting");

    // ── I2C panel: 128×32, sequential COM pins (defaults) ──
    let i2c = I2c::new_async(
        p.I2C0,
        p.PIN_21, // SCL
        p.PIN_20, // SDA
        Irqs,
        i2c::Config::default(),
    );
    let status_geometry = PanelGeometry::OLED_128_32;
    let status = OledDriver::new(
        I2cTransport::new(i2c, I2C_PRIMARY_ADDRESS),
        Delay,
        ControllerConfig::new(status_geometry),
    );
    let status_canvas = STATUS_CANVAS.init(Mutex::new(Canvas::new(status_geometry)));
    spawner
        .spawn(status_task(status, status_canvas, RefreshConfig::default()))
        .unwrap();

    // ── SPI panel: 128×64, alternative COM pins, mounted rotated 180° ──
    let spi = Spi::new_txonly(
        p.SPI0,
        p.PIN_18, // SCK
        p.PIN_19, // MOSI
        p.DMA_CH0,
        spi::Config::default(),
    );
    let cs = Output::new(p.PIN_17, Level::High);
    let dc = Output::new(p.PIN_16, Level::Low);
    let rst = Output::new(p.PIN_15, Level::High);
    let spi_device = ExclusiveDevice::new(spi, cs, Delay).expect("CS pin init failed");

    let main_geometry = PanelGeometry::OLED_128_64;
    let mut config = ControllerConfig::new(main_geometry);
    config.com_pins = ComPinConfig::new(ComPinLayout::Alternative, ComPinRemap::Disabled);
    config.segment_remapped = true;
    config.scan_direction_remapped = true;

    let transport: MainTransport = SpiTransport::new(spi_device, dc);
    let mut oled = OledDriver::with_reset(transport, rst, Delay, config);

    if let Err(e) = oled.init().await {
        error!("SPI OLED init failed: {}", e);
        return;
    }
    info!("SPI OLED initialised");

    let mut canvas = Canvas::new(main_geometry);
    let big = MonoTextStyle::new(&FONT_9X18_BOLD, Gray8::WHITE);
    let small = MonoTextStyle::new(&FONT_6X10, Gray8::WHITE);

    let mut seconds: u32 = 0;
    loop {
        // ── SPI panel: drawn and pushed from here ──
        canvas.clear(Gray8::BLACK).ok();
        Text::new("Hello OLED", Point::new(19, 24), big)
            .draw(&mut canvas)
            .ok();
        let mut line: String<24> = String::new();
        core::write!(line, "uptime {}s", seconds).ok();
        Text::new(&line, Point::new(30, 48), small)
            .draw(&mut canvas)
            .ok();

        if let Err(e) = oled.display(&canvas).await {
            warn!("SPI OLED display failed: {}", e);
        }

        // ── I2C panel: draw only; the display task flushes it ──
        {
            let mut status = status_canvas.lock().await;
            status.clear(Gray8::BLACK).ok();
            Text::new("I2C @ 0x3C", Point::new(0, 10), small)
                .draw(&mut *status)
                .ok();
            Text::new(&line, Point::new(0, 24), small)
                .draw(&mut *status)
                .ok();
        } // mutex released here

        seconds = seconds.wrapping_add(1);
        Timer::after(Duration::from_secs(1)).await;
    }
}
