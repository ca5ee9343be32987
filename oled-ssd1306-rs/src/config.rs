//! Panel geometry and controller configuration.
//!
//! [`PanelGeometry`] is the single source of panel dimensions. A
//! [`ControllerConfig`] is derived from it with the defaults that suit most
//! SSD1306 breakout boards; individual tunables can be overridden before the
//! configuration is moved into the driver.

use core::fmt;

use crate::command::{
    CHARGE_PUMP_DISABLED, CHARGE_PUMP_ENABLED, DISPLAY_START_LINE_MAX, DISPLAY_START_LINE_MIN,
    ROWS_PER_PAGE,
};

/// Widest panel the controller can address.
pub const MAX_WIDTH: u32 = 128;

/// Tallest panel the controller can address.
pub const MAX_HEIGHT: u32 = 64;

/// Size of the largest device buffer (128 columns × 8 pages).
pub const MAX_BUFFER_SIZE: usize = (MAX_WIDTH as usize) * (MAX_HEIGHT as usize) / ROWS_PER_PAGE;

/// Size of the largest intensity surface (one byte per pixel).
pub const MAX_PIXELS: usize = (MAX_WIDTH as usize) * (MAX_HEIGHT as usize);

// ── ConfigError ──────────────────────────────────────────────────────────

/// Reasons a geometry or configuration is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Width or height is zero, too large, or height is not a multiple of 8.
    InvalidGeometry,
    /// Start line is outside 0–63.
    InvalidStartLine,
    /// Page window is inverted or extends past the last page.
    InvalidPageWindow,
    /// Column window is inverted or extends past the last column.
    InvalidColumnWindow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::InvalidGeometry => write!(f, "Invalid panel geometry"),
            ConfigError::InvalidStartLine => write!(f, "Start line must be 0-63"),
            ConfigError::InvalidPageWindow => write!(f, "Page window outside panel"),
            ConfigError::InvalidColumnWindow => write!(f, "Column window outside panel"),
        }
    }
}

// ── PanelGeometry ────────────────────────────────────────────────────────

/// Physical panel dimensions in pixels.
///
/// Immutable once constructed. The height is always a non-zero multiple of
/// the 8-row page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelGeometry {
    width: u32,
    height: u32,
}

impl PanelGeometry {
    /// 128×32 panel (common 0.91" module).
    pub const OLED_128_32: Self = Self {
        width: 128,
        height: 32,
    };

    /// 128×64 panel (common 0.96" / 1.3" module).
    pub const OLED_128_64: Self = Self {
        width: 128,
        height: 64,
    };

    /// 64×32 panel (0.49" module).
    pub const OLED_64_32: Self = Self {
        width: 64,
        height: 32,
    };

    /// Validate and construct a geometry.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidGeometry`] if either dimension is zero, exceeds
    /// 128×64, or the height is not a multiple of 8.
    pub const fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0
            || height == 0
            || width > MAX_WIDTH
            || height > MAX_HEIGHT
            || height % ROWS_PER_PAGE as u32 != 0
        {
            return Err(ConfigError::InvalidGeometry);
        }
        Ok(Self { width, height })
    }

    /// Width in pixels (number of columns).
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels (number of COM rows).
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of 8-row pages.
    pub const fn page_count(&self) -> u32 {
        self.height / ROWS_PER_PAGE as u32
    }

    /// Default multiplex ratio (height − 1).
    pub const fn multiplex_ratio(&self) -> u8 {
        (self.height - 1) as u8
    }

    /// Bytes in the device buffer: one per column per page.
    pub const fn buffer_len(&self) -> usize {
        (self.width * self.page_count()) as usize
    }

    /// Pixels on the panel: one intensity byte each on a surface.
    pub const fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }
}

// ── Enumerated tunables ──────────────────────────────────────────────────

/// How the COM pins are wired to the panel rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ComPinLayout {
    /// COM pins map to rows in order (most 128×32 modules).
    Sequential,
    /// COM pins alternate between panel halves (most 128×64 modules).
    Alternative,
}

/// Left/right remapping of the COM pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ComPinRemap {
    Disabled,
    Enabled,
}

/// COM pin hardware configuration, the argument of `0xDA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ComPinConfig {
    pub layout: ComPinLayout,
    pub remap: ComPinRemap,
}

impl ComPinConfig {
    pub const fn new(layout: ComPinLayout, remap: ComPinRemap) -> Self {
        Self { layout, remap }
    }

    /// Encode as the `0xDA` argument byte: `0b00RA_0010`.
    ///
    /// | Layout      | Remap    | Byte |
    /// |-------------|----------|------|
    /// | Sequential  | Disabled | 0x02 |
    /// | Alternative | Disabled | 0x12 |
    /// | Sequential  | Enabled  | 0x22 |
    /// | Alternative | Enabled  | 0x32 |
    pub const fn to_byte(&self) -> u8 {
        let mut byte = 0x02;
        if matches!(self.layout, ComPinLayout::Alternative) {
            byte |= 0x10;
        }
        if matches!(self.remap, ComPinRemap::Enabled) {
            byte |= 0x20;
        }
        byte
    }
}

impl Default for ComPinConfig {
    fn default() -> Self {
        Self::new(ComPinLayout::Sequential, ComPinRemap::Disabled)
    }
}

/// GDDRAM addressing mode, the argument of `0x20`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressingMode {
    Horizontal = 0x00,
    Vertical = 0x01,
    Page = 0x02,
}

/// V_COMH deselect level, the argument of `0xDB`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeselectLevel {
    Percent65Vcc = 0x00,
    Percent77Vcc = 0x20,
    Percent83Vcc = 0x30,
    Percent90Vcc = 0x40,
}

// ── ControllerConfig ─────────────────────────────────────────────────────

/// Electrical and addressing configuration sent during initialisation.
///
/// [`ControllerConfig::new()`] derives every geometry-dependent field
/// (multiplex ratio, page and column windows) from the panel. The remaining
/// fields default to values that work with the usual charge-pump breakout
/// boards. Override fields before handing the configuration to
/// [`OledDriver`](crate::OledDriver); the driver only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    geometry: PanelGeometry,

    /// Display clock divide ratio (low nibble) and oscillator frequency
    /// (high nibble). Default: 0x80.
    pub divide_ratio_and_oscillator: u8,
    /// Multiplex ratio. Default: height − 1.
    pub multiplex_ratio: u8,
    /// Vertical shift by COM. Default: 0.
    pub display_offset: u8,
    /// RAM row shown on the top line (0–63). Default: 0.
    pub start_line: u8,
    /// Mirror columns (`0xA1` instead of `0xA0`). Default: false.
    pub segment_remapped: bool,
    /// Mirror rows (`0xC8` instead of `0xC0`). Default: false.
    pub scan_direction_remapped: bool,
    /// COM pin wiring. Default: sequential, no remap.
    pub com_pins: ComPinConfig,
    /// Contrast, 0–255. Default: 0x1F.
    pub contrast: u8,
    /// GDDRAM addressing mode. Default: horizontal.
    pub addressing_mode: AddressingMode,
    /// First page of the write window. Default: 0.
    pub start_page: u8,
    /// Last page of the write window. Default: page count − 1.
    pub end_page: u8,
    /// First column of the write window. Default: 0.
    pub start_column: u8,
    /// Last column of the write window. Default: width − 1.
    pub end_column: u8,
    /// Pre-charge period (phase 2 high nibble, phase 1 low nibble).
    /// Default: 0xF1.
    pub pre_charge_period: u8,
    /// V_COMH deselect level. Default: 83 % Vcc.
    pub deselect_level: DeselectLevel,
    /// Use the internal charge pump. Default: true.
    pub charge_pump_enabled: bool,
}

impl ControllerConfig {
    /// Derive the default configuration for `geometry`.
    pub const fn new(geometry: PanelGeometry) -> Self {
        Self {
            geometry,
            divide_ratio_and_oscillator: 0x80,
            multiplex_ratio: geometry.multiplex_ratio(),
            display_offset: 0x00,
            start_line: 0,
            segment_remapped: false,
            scan_direction_remapped: false,
            com_pins: ComPinConfig::new(ComPinLayout::Sequential, ComPinRemap::Disabled),
            contrast: 0x1F,
            addressing_mode: AddressingMode::Horizontal,
            start_page: 0,
            end_page: (geometry.page_count() - 1) as u8,
            start_column: 0,
            end_column: (geometry.width() - 1) as u8,
            pre_charge_period: 0xF1,
            deselect_level: DeselectLevel::Percent83Vcc,
            charge_pump_enabled: true,
        }
    }

    /// The panel this configuration was derived from.
    pub const fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    /// Argument byte for the charge pump command (`0x14` on, `0x10` off).
    pub const fn charge_pump_setting(&self) -> u8 {
        if self.charge_pump_enabled {
            CHARGE_PUMP_ENABLED
        } else {
            CHARGE_PUMP_DISABLED
        }
    }

    /// Check the overridable fields against the geometry.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InvalidStartLine`] if `start_line > 63`.
    /// * [`ConfigError::InvalidPageWindow`] if the page window is inverted
    ///   or ends past the last page.
    /// * [`ConfigError::InvalidColumnWindow`] likewise for columns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_line > DISPLAY_START_LINE_MAX - DISPLAY_START_LINE_MIN {
            return Err(ConfigError::InvalidStartLine);
        }
        if self.start_page > self.end_page || u32::from(self.end_page) >= self.geometry.page_count()
        {
            return Err(ConfigError::InvalidPageWindow);
        }
        if self.start_column > self.end_column
            || u32::from(self.end_column) >= self.geometry.width()
        {
            return Err(ConfigError::InvalidColumnWindow);
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
