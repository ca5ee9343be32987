//! Intensity surface for drawing with `embedded-graphics`.
//!
//! [`Canvas`] stores one 8-bit intensity per pixel, row-major, which is the
//! layout the [`transcode`](crate::transcode) step reads through
//! [`PixelSource`]. Draw with [`Gray8`] colours; anything closer to
//! [`FOREGROUND`] than to [`BACKGROUND`] lights the pixel.

use core::convert::Infallible;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use embedded_graphics::Pixel;

use crate::config::{PanelGeometry, MAX_PIXELS};

/// Reference intensity of a lit pixel.
pub const FOREGROUND: u8 = 0xFF;

/// Reference intensity of a dark pixel.
pub const BACKGROUND: u8 = 0x00;

/// A rectangular surface the transcoder can read.
///
/// `pixel_bytes()` must return exactly `width() * height()` bytes, one
/// intensity per pixel, row-major.
pub trait PixelSource {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Row-major intensities, one byte per pixel.
    fn pixel_bytes(&self) -> &[u8];

    /// Reset every pixel to [`BACKGROUND`].
    fn clear_pixels(&mut self);
}

/// Fixed-capacity 8-bit intensity surface sized to a panel.
///
/// Every mutation bumps [`generation`](Self::generation), so a consumer can
/// tell whether anything was drawn since it last looked.
pub struct Canvas {
    geometry: PanelGeometry,
    pixels: [u8; MAX_PIXELS],
    generation: u32,
}

impl Canvas {
    /// Create a canvas covering `geometry`, filled with [`BACKGROUND`].
    pub fn new(geometry: PanelGeometry) -> Self {
        Self {
            geometry,
            pixels: [BACKGROUND; MAX_PIXELS],
            generation: 0,
        }
    }

    pub fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    /// Counter bumped on every draw or clear. Wraps on overflow.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Intensity at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Set the intensity at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = value;
            self.touch();
        }
    }

    /// Fill the whole canvas with `value`.
    pub fn fill(&mut self, value: u8) {
        let count = self.geometry.pixel_count();
        self.pixels[..count].fill(value);
        self.touch();
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.geometry.width() && y < self.geometry.height() {
            Some((y * self.geometry.width() + x) as usize)
        } else {
            None
        }
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl PixelSource for Canvas {
    fn width(&self) -> u32 {
        self.geometry.width()
    }

    fn height(&self) -> u32 {
        self.geometry.height()
    }

    fn pixel_bytes(&self) -> &[u8] {
        &self.pixels[..self.geometry.pixel_count()]
    }

    fn clear_pixels(&mut self) {
        self.fill(BACKGROUND);
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.geometry.width(), self.geometry.height())
    }
}

impl DrawTarget for Canvas {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Negative coordinates are off-canvas.
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                if let Some(i) = self.index(x, y) {
                    self.pixels[i] = color.luma();
                }
            }
        }
        self.touch();
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color.luma());
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
