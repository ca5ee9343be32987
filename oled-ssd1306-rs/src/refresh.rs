//! Refresh-rate configuration for the display update loop.

/// Highest refresh rate worth asking for: a full 128×64 frame takes roughly
/// 20 ms at 400 kHz I2C.
pub const MAX_UPDATE_FREQUENCY_HZ: u32 = 60;

/// Configuration for [`display_update_task`](crate::display_task::display_update_task).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshConfig {
    /// Canvas polling rate in Hz. Default: 30. Clamped to 1–60.
    pub update_frequency_hz: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            update_frequency_hz: 30,
        }
    }
}

impl RefreshConfig {
    /// Convert the configured frequency to a timer period in milliseconds.
    ///
    /// Formula: `1000 / update_frequency_hz`, after clamping the frequency.
    pub fn update_period_ms(&self) -> u64 {
        let hz = self.update_frequency_hz.clamp(1, MAX_UPDATE_FREQUENCY_HZ);
        1000 / u64::from(hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_30hz() {
        let c = RefreshConfig::default();
        assert_eq!(c.update_frequency_hz, 30);
        assert_eq!(c.update_period_ms(), 33);
    }

    #[test]
    fn update_period_60hz() {
        let c = RefreshConfig {
            update_frequency_hz: 60,
        };
        assert_eq!(c.update_period_ms(), 16);
    }

    #[test]
    fn update_period_20hz() {
        let c = RefreshConfig {
            update_frequency_hz: 20,
        };
        assert_eq!(c.update_period_ms(), 50);
    }

    #[test]
    fn out_of_range_frequencies_are_clamped() {
        let zero = RefreshConfig {
            update_frequency_hz: 0,
        };
        assert_eq!(zero.update_period_ms(), 1000);

        let fast = RefreshConfig {
            update_frequency_hz: 500,
        };
        assert_eq!(fast.update_period_ms(), 16);
    }
}
