//! Surface-to-GDDRAM transcoding.
//!
//! The controller stores pixels in 8-row *pages*: byte `page * width + column`
//! holds one column of one page, bit 0 being the top row of that page.
//!
//! ```text
//! surface (row-major, 1 byte/pixel)        device buffer (1 bit/pixel)
//!   row 0: c0 c1 c2 …                        page 0: [c0 c1 c2 …]  bit0 = row 0
//!   row 1: c0 c1 c2 …                                               bit7 = row 7
//!   …                                        page 1: [c0 c1 c2 …]  rows 8..15
//! ```

use core::fmt;

use crate::canvas::{PixelSource, BACKGROUND, FOREGROUND};
use crate::command::ROWS_PER_PAGE;
use crate::config::{PanelGeometry, MAX_BUFFER_SIZE};

/// The surface does not have the panel's dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SizeMismatch;

impl fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Surface size does not match panel")
    }
}

/// Page-addressed 1 bpp image, exactly as it is written to the controller.
pub struct DeviceBuffer {
    geometry: PanelGeometry,
    storage: [u8; MAX_BUFFER_SIZE],
}

impl DeviceBuffer {
    /// All-zero buffer for `geometry`.
    pub fn new(geometry: PanelGeometry) -> Self {
        Self {
            geometry,
            storage: [0x00; MAX_BUFFER_SIZE],
        }
    }

    pub fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.geometry.buffer_len()]
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.storage[..self.geometry.buffer_len()]
    }

    /// Turn every pixel off.
    pub fn fill_zero(&mut self) {
        self.bytes_mut().fill(0x00);
    }

    /// Replace the contents with a pre-encoded image.
    ///
    /// Returns `false` and leaves the buffer untouched if `image` is not
    /// exactly one panel's worth of bytes.
    pub fn load(&mut self, image: &[u8]) -> bool {
        if image.len() != self.geometry.buffer_len() {
            return false;
        }
        self.bytes_mut().copy_from_slice(image);
        true
    }
}

/// `true` if `value` is strictly closer to [`FOREGROUND`] than to
/// [`BACKGROUND`]. Equidistant values stay off.
#[inline]
pub fn is_pixel_on(value: u8) -> bool {
    FOREGROUND.abs_diff(value) < value.abs_diff(BACKGROUND)
}

/// Re-encode the whole of `source` into `buffer`.
///
/// # Errors
///
/// [`SizeMismatch`] if the surface dimensions or its pixel slice length
/// disagree with the buffer's geometry. The buffer is not modified in that
/// case.
pub fn transcode<S>(source: &S, buffer: &mut DeviceBuffer) -> Result<(), SizeMismatch>
where
    S: PixelSource + ?Sized,
{
    let geometry = buffer.geometry;
    let pixels = source.pixel_bytes();
    if source.width() != geometry.width()
        || source.height() != geometry.height()
        || pixels.len() != geometry.pixel_count()
    {
        return Err(SizeMismatch);
    }

    let width = geometry.width() as usize;
    for (index, byte) in buffer.bytes_mut().iter_mut().enumerate() {
        let page = index / width;
        let column = index % width;
        let top = page * ROWS_PER_PAGE * width + column;

        *byte = (0..ROWS_PER_PAGE)
            .filter(|&row| is_pixel_on(pixels[top + row * width]))
            .fold(0u8, |bits, row| bits | (1 << row));
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────
