use crate::{Celsius, Milliseconds};

/// Oversampling settings for Temperature, Pressure, and Humidity.
///
/// Higher oversampling rates reduce noise by averaging in hardware but lead to
/// longer measurement times and higher power consumption per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Oversampling {
    /// No measurement performed. Used to disable a specific sensor.
    Skipped = 0,
    /// 1x Oversampling.
    #[default]
    X1 = 1,
    /// 2x Oversampling.
    X2 = 2,
    /// 4x Oversampling.
    X4 = 3,
    /// 8x Oversampling.
    X8 = 4,
    /// 16x Oversampling.
    X16 = 5,
}

/// Grouped oversampling settings for all three environmental sensors.
///
/// Use `Oversampling::Skipped` to disable channels that are irrelevant to
/// the application. A skipped channel still goes through compensation; its
/// value is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OversamplingConfig {
    /// Temperature oversampling.
    pub temp_osrs: Oversampling,
    /// Humidity oversampling.
    pub hum_osrs: Oversampling,
    /// Pressure oversampling.
    pub pres_osrs: Oversampling,
}

impl Default for OversamplingConfig {
    fn default() -> Self {
        OversamplingConfig {
            temp_osrs: Oversampling::X8,
            hum_osrs: Oversampling::X2,
            pres_osrs: Oversampling::X8,
        }
    }
}

impl OversamplingConfig {
    /// `ctrl_meas` value with the mode bits cleared (sleep).
    pub(crate) fn ctrl_meas(&self) -> u8 {
        ((self.temp_osrs as u8) << 5) | ((self.pres_osrs as u8) << 2)
    }
}

/// Infinite Impulse Response (IIR) filter coefficient.
///
/// Filters short-term disturbances in pressure and temperature (slamming
/// doors, drafts). Does not affect humidity or gas measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IIRFilter {
    IIR0 = 0,
    IIR1 = 1,
    #[default]
    IIR3 = 2,
    IIR7 = 3,
    IIR15 = 4,
    IIR31 = 5,
    IIR63 = 6,
    IIR127 = 7,
}

/// Available heating profile slots (0 to 9) stored in the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum GasProfileIndex {
    #[default]
    Profile0 = 0,
    Profile1 = 1,
    Profile2 = 2,
    Profile3 = 3,
    Profile4 = 4,
    Profile5 = 5,
    Profile6 = 6,
    Profile7 = 7,
    Profile8 = 8,
    Profile9 = 9,
}

/// Configuration for the gas sensor heating plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasProfile {
    /// Slot index in the sensor memory where this profile is stored.
    pub index: GasProfileIndex,
    /// Target temperature of the plate (typically 200°C to 400°C).
    pub target_temp: Celsius,
    /// Duration to maintain the temperature before measurement.
    pub wait_time: Milliseconds,
}

impl Default for GasProfile {
    fn default() -> Self {
        GasProfile {
            index: GasProfileIndex::Profile0,
            target_temp: Celsius(150),
            wait_time: Milliseconds(320),
        }
    }
}

/// Complete sensor configuration used for setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Oversampling settings for T, P, H.
    pub osrs_config: OversamplingConfig,
    /// IIR Filter settings.
    pub iir_filter: IIRFilter,
    /// Gas heater configuration.
    /// `None` disables the heater and the gas measurement entirely.
    pub gas_profile: Option<GasProfile>,
    /// Current ambient temperature estimate (required for heater resistance calculation).
    pub ambient_temp: Celsius,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            osrs_config: OversamplingConfig::default(),
            iir_filter: IIRFilter::default(),
            gas_profile: Some(GasProfile::default()),
            ambient_temp: Celsius(25),
        }
    }
}

impl Config {
    /// Checks whether the gas measurement is enabled.
    pub fn gas_enabled(&self) -> bool {
        self.gas_profile.is_some()
    }
}

/// Builder for a [`Config`], starting from [`Config::default`].
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the temperature oversampling.
    pub fn temp_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.temp_osrs = os;
        self
    }

    /// Sets the humidity oversampling.
    pub fn hum_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.hum_osrs = os;
        self
    }

    /// Sets the pressure oversampling.
    pub fn pres_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.pres_osrs = os;
        self
    }

    /// Sets the IIR filter coefficient.
    pub fn iir_filter(mut self, filter: IIRFilter) -> Self {
        self.config.iir_filter = filter;
        self
    }

    /// Enables or disables the gas profile.
    pub fn gas_profile(mut self, profile: Option<GasProfile>) -> Self {
        self.config.gas_profile = profile;
        self
    }

    /// Sets the ambient temperature estimate for the heater calculation.
    pub fn ambient_temp(mut self, temp: Celsius) -> Self {
        self.config.ambient_temp = temp;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_board_parameters() {
        let config = Config::default();
        assert_eq!(config.osrs_config.ctrl_meas(), (4 << 5) | (4 << 2));
        assert_eq!(config.osrs_config.hum_osrs as u8, 2);
        assert_eq!(config.iir_filter as u8, 2);
        assert_eq!(
            config.gas_profile,
            Some(GasProfile {
                index: GasProfileIndex::Profile0,
                target_temp: Celsius(150),
                wait_time: Milliseconds(320),
            })
        );
        assert_eq!(config.ambient_temp, Celsius(25));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ConfigBuilder::new()
            .temp_oversampling(Oversampling::X1)
            .pres_oversampling(Oversampling::Skipped)
            .iir_filter(IIRFilter::IIR0)
            .gas_profile(None)
            .build();

        assert_eq!(config.osrs_config.ctrl_meas(), 1 << 5);
        assert_eq!(config.osrs_config.hum_osrs, Oversampling::X2);
        assert!(!config.gas_enabled());
    }
}
