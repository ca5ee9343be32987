//! SSD1306 command vocabulary.
//!
//! Opcodes are grouped the way the controller datasheet groups them. Most
//! commands take zero, one or two argument bytes which follow the opcode in
//! the same command run.
//!
//! [`init_sequence`] turns a [`ControllerConfig`] into the ordered
//! configuration burst sent during initialisation.

use heapless::Vec;

use crate::config::ControllerConfig;

// ---------------------------------------------------------------------------
// Bus addressing
// ---------------------------------------------------------------------------

/// 7-bit I2C address with SA0 tied low.
pub const I2C_PRIMARY_ADDRESS: u8 = 0x3C;

/// 7-bit I2C address with SA0 tied high (the D/C pin acts as SA0).
pub const I2C_SECONDARY_ADDRESS: u8 = 0x3D;

/// I2C control byte that opens a command run.
pub const CONTROL_COMMAND: u8 = 0x00;

/// I2C control byte that opens a data run.
pub const CONTROL_DATA: u8 = 0x40;

/// Number of COM rows packed into one GDDRAM page byte.
pub const ROWS_PER_PAGE: usize = 8;

// ---------------------------------------------------------------------------
// Fundamental commands
// ---------------------------------------------------------------------------

/// Set contrast control. One argument byte (0–255).
pub const SET_CONTRAST: u8 = 0x81;

/// Resume display output from GDDRAM content.
pub const DISPLAY_ALL_ON_RAM: u8 = 0xA4;

/// Force every pixel on, ignoring GDDRAM.
pub const DISPLAY_ALL_ON: u8 = 0xA5;

/// Normal display: a set bit lights the pixel.
pub const NORMAL_DISPLAY: u8 = 0xA6;

/// Inverse display: a cleared bit lights the pixel.
pub const INVERSE_DISPLAY: u8 = 0xA7;

/// Panel off (sleep mode).
pub const DISPLAY_OFF: u8 = 0xAE;

/// Panel on.
pub const DISPLAY_ON: u8 = 0xAF;

/// Charge pump setting. One argument byte, see
/// [`ControllerConfig::charge_pump_setting`].
pub const SET_CHARGE_PUMP: u8 = 0x8D;

/// Charge pump argument when the pump is enabled.
pub const CHARGE_PUMP_ENABLED: u8 = 0x14;

/// Charge pump argument when the pump is disabled.
pub const CHARGE_PUMP_DISABLED: u8 = 0x10;

// ---------------------------------------------------------------------------
// Timing & driving scheme
// ---------------------------------------------------------------------------

/// Set display clock divide ratio / oscillator frequency. One argument byte.
pub const SET_DIVIDE_RATIO_AND_OSCILLATOR: u8 = 0xD5;

/// Set pre-charge period. One argument byte.
pub const SET_PRE_CHARGE_PERIOD: u8 = 0xD9;

/// Set V_COMH deselect level. One argument byte.
pub const SET_COM_DESELECT_LEVEL: u8 = 0xDB;

// ---------------------------------------------------------------------------
// Hardware configuration
// ---------------------------------------------------------------------------

/// Set multiplex ratio. One argument byte (panel height − 1).
pub const SET_MULTIPLEX_RATIO: u8 = 0xA8;

/// Set vertical display offset. One argument byte.
pub const SET_DISPLAY_OFFSET: u8 = 0xD3;

/// Display start line 0. Lines 1–63 are `DISPLAY_START_LINE_MIN | line`.
pub const DISPLAY_START_LINE_MIN: u8 = 0x40;

/// Display start line 63.
pub const DISPLAY_START_LINE_MAX: u8 = 0x7F;

/// Column address 0 is mapped to SEG0.
pub const SET_SEGMENT_REMAP: u8 = 0xA0;

/// Column address 127 is mapped to SEG0.
pub const SET_SEGMENT_REMAP_REVERSE: u8 = 0xA1;

/// Scan from COM0 to COM[N−1].
pub const SET_COM_SCAN_DIRECTION: u8 = 0xC0;

/// Scan from COM[N−1] to COM0.
pub const SET_COM_SCAN_DIRECTION_REVERSE: u8 = 0xC8;

/// Set COM pins hardware configuration. One argument byte, see
/// [`ComPinConfig::to_byte`](crate::config::ComPinConfig::to_byte).
pub const SET_COM_PINS_HARDWARE_CONFIG: u8 = 0xDA;

// ---------------------------------------------------------------------------
// Scrolling
// ---------------------------------------------------------------------------

/// Stop any running scroll. Must precede GDDRAM writes that should not move.
pub const DEACTIVATE_SCROLL: u8 = 0x2E;

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Set memory addressing mode. One argument byte.
pub const SET_MEMORY_ADDRESSING_MODE: u8 = 0x20;

/// Set column window. Two argument bytes (start, end).
pub const SET_COLUMN_ADDRESS: u8 = 0x21;

/// Set page window. Two argument bytes (start, end).
pub const SET_PAGE_ADDRESS: u8 = 0x22;

/// Page start address for page addressing mode (`0xB0 | page`).
pub const FIRST_PAGE_ADDRESS: u8 = 0xB0;

// ---------------------------------------------------------------------------
// Initialisation burst
// ---------------------------------------------------------------------------

/// Length of the configuration burst produced by [`init_sequence`].
pub const INIT_SEQUENCE_LEN: usize = 32;

/// Build the ordered configuration burst for `config`.
///
/// The order is fixed: some settings (multiplex ratio, COM pins, charge
/// pump) must be latched while the panel is off and before `DISPLAY_ON`.
///
/// ```text
/// AE  D5 xx  A8 xx  D3 xx  4x  A0|A1  C0|C8  DA xx  81 xx  20 xx
/// 22 ss ee  21 ss ee  D9 xx  DB xx  2E  A6  8D xx  AF
/// ```
pub fn init_sequence(config: &ControllerConfig) -> Vec<u8, INIT_SEQUENCE_LEN> {
    let segment_remap = if config.segment_remapped {
        SET_SEGMENT_REMAP_REVERSE
    } else {
        SET_SEGMENT_REMAP
    };
    let scan_direction = if config.scan_direction_remapped {
        SET_COM_SCAN_DIRECTION_REVERSE
    } else {
        SET_COM_SCAN_DIRECTION
    };

    let bytes = [
        DISPLAY_OFF,
        SET_DIVIDE_RATIO_AND_OSCILLATOR,
        config.divide_ratio_and_oscillator,
        SET_MULTIPLEX_RATIO,
        config.multiplex_ratio,
        SET_DISPLAY_OFFSET,
        config.display_offset,
        DISPLAY_START_LINE_MIN | (config.start_line & 0x3F),
        segment_remap,
        scan_direction,
        SET_COM_PINS_HARDWARE_CONFIG,
        config.com_pins.to_byte(),
        SET_CONTRAST,
        config.contrast,
        SET_MEMORY_ADDRESSING_MODE,
        config.addressing_mode as u8,
        SET_PAGE_ADDRESS,
        config.start_page,
        config.end_page,
        SET_COLUMN_ADDRESS,
        config.start_column,
        config.end_column,
        SET_PRE_CHARGE_PERIOD,
        config.pre_charge_period,
        SET_COM_DESELECT_LEVEL,
        config.deselect_level as u8,
        DEACTIVATE_SCROLL,
        NORMAL_DISPLAY,
        SET_CHARGE_PUMP,
        config.charge_pump_setting(),
        DISPLAY_ON,
    ];

    Vec::from_slice(&bytes).unwrap_or_default()
}

// ── Tests ────────────────────────────────────────────────────────────────
