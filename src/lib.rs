#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

//! # BME680 Environmental Sensor Driver
//!
//! A type-safe, `no_std` driver for the Bosch BME680 built around a bit-exact
//! port of the datasheet's fixed-point compensation formulas.
//! The driver uses the typestate pattern to ensure the sensor is correctly
//! initialized and configured before measurements are taken.
//!
//! ## Features
//! - **Fixed-Point Arithmetic**: No FPU required. Results match the Bosch
//!   reference implementation bit for bit.
//! - **Pure Compensation Core**: [`compensate`], [`convert_res_heat`] and
//!   [`calc_heater_dur`] work on plain data and can be used without the driver.
//! - **I2C and SPI**: via `embedded-hal` 1.0 ([`interface`]).
//! - **Typestate Pattern**: Prevents measuring before initialization.
//! - **Optional Logging**: `defmt` or `log` feature.
//!
//! ## Units
//! - **Temperature**: Centigrade (C * 100) -> 2350 = 23.50 °C
//! - **Humidity**: Milli-percent (RH % * 1000) -> 45123 = 45.123 %
//! - **Pressure**: Pascal (Pa) -> 101325 = 1013.25 hPa
//! - **Gas Resistance**: Ohms (Ω)
//!
//! ## Example
//! ```no_run
//! use bme680_compensation::{Bme680, Config, error::Bme680Error, interface::I2C_ADDR_SECONDARY};
//! use embedded_hal::{delay::DelayNs, i2c::I2c};
//!
//! fn run<I: I2c, D: DelayNs>(i2c: I, delay: &mut D) -> Result<(), Bme680Error<I::Error>> {
//!     let mut bme680 = Bme680::new_i2c(i2c, I2C_ADDR_SECONDARY, Config::default()).init(delay)?;
//!
//!     let data = bme680.read_new_data(delay)?;
//!     let (deg, centi) = data.temperature.split();
//!     println!("{deg}.{centi:02} °C");
//!
//!     // Keep the heater on target with the temperature just measured
//!     bme680.set_ambient_temp(data.temperature.celsius())?;
//!     Ok(())
//! }
//! ```

#[macro_use]
mod macros;

mod calc;
pub mod calib;
pub mod error;
pub mod heater;
pub mod interface;
pub mod raw;
pub mod regs;
pub mod registry;
pub mod settings;

use core::marker::PhantomData;
use embedded_hal::{delay::DelayNs, i2c::I2c, spi::SpiDevice};

pub use calc::{CalcTempData, calc_gas, calc_hum, calc_pres, calc_temp, compensate};
pub use calib::CalibrationData;
pub use error::{Bme680Error, CompensationError};
pub use heater::{calc_heater_dur, convert_res_heat};
pub use raw::RawSample;
pub use settings::{
    Config, ConfigBuilder, GasProfile, GasProfileIndex, IIRFilter, Oversampling,
    OversamplingConfig,
};

use interface::{I2cInterface, Interface, SpiInterface};

/// Interval between two polls of the new-data bit.
const POLL_INTERVAL_MS: u32 = 10;
/// Polls before a measurement counts as timed out.
const MAX_POLLS: u32 = 50;

// --- Typestates ---

/// Sensor has been created but not yet initialized with calibration data.
#[derive(Debug)]
pub struct Uninitialized;
/// Sensor is initialized, configured, and ready for measurements.
#[derive(Debug)]
pub struct Ready;

/// Whole degrees Celsius, used for heater settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Celsius(pub u16);

/// Duration wrapper for type-safety. Stored in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Milliseconds(pub u16);

/// Represents temperature in Centigrade (degrees Celsius * 100).
///
/// # Example
/// A value of `2350` represents **23.50 °C**.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub i32);

impl Temperature {
    /// Splits the fixed-point value into integral (degrees) and fractional (decimals) parts.
    ///
    /// # Example
    /// ```rust
    /// use bme680_compensation::Temperature;
    /// let temp = Temperature(2350);
    /// assert_eq!(temp.split(), (23, 50)); // Represents 23.50 °C
    /// ```
    pub fn split(&self) -> (i32, i32) {
        (self.0 / 100, self.0 % 100)
    }

    /// Rounded whole degrees, clamped to the range a heater setting accepts.
    ///
    /// ```rust
    /// use bme680_compensation::{Celsius, Temperature};
    /// assert_eq!(Temperature(2350).celsius(), Celsius(24));
    /// assert_eq!(Temperature(-500).celsius(), Celsius(0));
    /// ```
    pub fn celsius(&self) -> Celsius {
        Celsius((self.0.saturating_add(50) / 100).clamp(0, u16::MAX as i32) as u16)
    }
}

/// Represents relative humidity in milli-percent (percent * 1000).
///
/// # Example
/// A value of `45123` represents **45.123 %rH**.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Humidity(pub u32);

impl Humidity {
    /// Splits the fixed-point value into integral and fractional parts.
    ///
    /// # Example
    /// ```rust
    /// use bme680_compensation::Humidity;
    /// let hum = Humidity(45123);
    /// assert_eq!(hum.split(), (45, 123)); // Represents 45.123 %
    /// ```
    pub fn split(&self) -> (u32, u32) {
        (self.0 / 1000, self.0 % 1000)
    }
}

/// Represents atmospheric pressure in Pascal (Pa).
///
/// # Example
/// A value of `101325` represents **101325 Pa** (or 1013.25 hPa).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pressure(pub u32);

impl Pressure {
    /// Converts the raw Pascal value to Hectopascal (hPa) and splits it into parts.
    ///
    /// # Example
    /// ```rust
    /// use bme680_compensation::Pressure;
    /// let press = Pressure(101325);
    /// assert_eq!(press.as_hpa(), (1013, 25)); // Represents 1013.25 hPa
    /// ```
    pub fn as_hpa(&self) -> (u32, u32) {
        (self.0 / 100, self.0 % 100)
    }
}

/// Represents gas resistance in Ohms (Ω).
///
/// A higher gas resistance typically indicates cleaner air (fewer VOCs).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasResistance(pub u32);

/// Compensated measurement result in physical units.
///
/// `gas_resistance` is `None` when gas measurement is disabled or the sensor
/// did not report a valid gas result with a stable heater.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompensatedReading {
    pub temperature: Temperature,
    pub pressure: Pressure,
    pub humidity: Humidity,
    pub gas_resistance: Option<GasResistance>,
}

/// The main BME680 driver structure.
///
/// Use `Bme680::new(...)` to start. The `STATE` generic uses the Typestate pattern
/// to track initialization status at compile time.
#[derive(Debug)]
pub struct Bme680<IFACE, STATE> {
    iface: IFACE,
    calib_data: CalibrationData,
    config: Config,
    _state: PhantomData<STATE>,
}

impl<IFACE> Bme680<IFACE, Uninitialized> {
    /// Creates a new driver instance in the `Uninitialized` state.
    ///
    /// This does not communicate with the sensor yet.
    pub fn new(iface: IFACE, config: Config) -> Self {
        Bme680 {
            iface,
            calib_data: CalibrationData::default(),
            config,
            _state: PhantomData,
        }
    }
}

impl<I2C: I2c> Bme680<I2cInterface<I2C>, Uninitialized> {
    /// Creates a driver talking I2C at `address` (typically `0x76` or `0x77`).
    pub fn new_i2c(i2c: I2C, address: u8, config: Config) -> Self {
        Self::new(I2cInterface::new(i2c, address), config)
    }
}

impl<SPI: SpiDevice> Bme680<SpiInterface<SPI>, Uninitialized> {
    /// Creates a driver talking SPI.
    pub fn new_spi(spi: SPI, config: Config) -> Self {
        Self::new(SpiInterface::new(spi), config)
    }
}

impl<IFACE, STATE> Bme680<IFACE, STATE> {
    /// Gives the register transport back.
    pub fn release(self) -> IFACE {
        self.iface
    }

    /// Returns the configuration the sensor was (or will be) set up with.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<IFACE, STATE> Bme680<IFACE, STATE>
where
    IFACE: Interface,
{
    /// Reads data from a starting register address into a provided buffer.
    fn read_into(&mut self, reg_address: u8, buffer: &mut [u8]) -> error::Result<(), IFACE::Error> {
        self.iface
            .read_regs(reg_address, buffer)
            .map_err(Bme680Error::Bus)
    }

    /// Reads a single byte from a specific register address.
    fn read_reg_byte(&mut self, reg_address: u8) -> error::Result<u8, IFACE::Error> {
        self.iface.read_reg(reg_address).map_err(Bme680Error::Bus)
    }

    /// Writes a single register.
    fn write_reg(&mut self, reg_address: u8, value: u8) -> error::Result<(), IFACE::Error> {
        self.iface
            .write_reg(reg_address, value)
            .map_err(Bme680Error::Bus)
    }

    /// Reads the Chip ID from the sensor (expected value: 0x61).
    pub fn read_chip_id(&mut self) -> error::Result<u8, IFACE::Error> {
        self.read_reg_byte(regs::ADDR_CHIP_ID)
    }

    /// Reads factory-fused calibration coefficients from the sensor's ROM.
    ///
    /// The BME680 stores the coefficients in two non-contiguous memory blocks;
    /// the heater trim values live in a third one at the start of the map.
    pub fn read_calibration(&mut self) -> error::Result<CalibrationData, IFACE::Error> {
        let mut coeff = [0u8; regs::COEFF_LEN];
        let mut heat = [0u8; regs::HEAT_CALIB_LEN];

        self.read_into(regs::ADDR_COEFF_1, &mut coeff[..regs::COEFF_1_LEN])?;
        self.read_into(regs::ADDR_COEFF_2, &mut coeff[regs::COEFF_1_LEN..])?;
        self.read_into(regs::ADDR_RES_HEAT_VAL, &mut heat)?;

        Ok(CalibrationData::from_registers(&coeff, &heat))
    }

    /// Performs a soft-reset of the sensor.
    ///
    /// This resets all internal registers to their default values.
    fn reset(&mut self, delay: &mut impl DelayNs) -> error::Result<(), IFACE::Error> {
        self.write_reg(regs::ADDR_RESET, regs::SOFT_RESET_CMD)?;

        delay.delay_ms(2);

        if self.read_reg_byte(regs::ADDR_RESET)? != 0 {
            warn!("soft reset did not complete");
            return Err(Bme680Error::ResetFailed);
        }

        Ok(())
    }
}

impl<IFACE> Bme680<IFACE, Uninitialized>
where
    IFACE: Interface,
{
    /// Initializes the sensor: performs a soft-reset, verifies the chip id,
    /// loads factory calibration data and applies the configuration.
    ///
    /// This transitions the driver state from `Uninitialized` to `Ready`.
    ///
    /// # Errors
    /// Returns an error if the bus fails, the reset does not complete or the
    /// chip is not a BME680.
    pub fn init(
        mut self,
        delay: &mut impl DelayNs,
    ) -> error::Result<Bme680<IFACE, Ready>, IFACE::Error> {
        // Sensor requires time to start up before reset
        delay.delay_ms(2);

        self.reset(delay)?;

        let chip_id = self.read_chip_id()?;
        if chip_id != regs::CHIP_ID {
            warn!("wrong chip id: {}", chip_id);
            return Err(Bme680Error::WrongChipId(chip_id));
        }

        let calib_data = self.read_calibration()?;
        debug!("calibration loaded");

        let mut bme680 = Bme680 {
            iface: self.iface,
            calib_data,
            config: self.config,
            _state: PhantomData,
        };
        bme680.configure(self.config)?;

        Ok(bme680)
    }
}

impl<IFACE> Bme680<IFACE, Ready>
where
    IFACE: Interface,
{
    /// Calibration data read during [`Bme680::init`].
    pub fn calibration(&self) -> &CalibrationData {
        &self.calib_data
    }

    /// Applies a full sensor configuration.
    ///
    /// This method sets oversampling, filters, and the gas profile.
    /// If `config.gas_profile` is `None`, the gas sensor is disabled to save power.
    pub fn configure(&mut self, config: Config) -> error::Result<(), IFACE::Error> {
        self.config = config;

        self.config_oversampling(&config.osrs_config)?;
        self.config_iir_filter(config.iir_filter)?;

        match config.gas_profile {
            Some(profile) => self.enable_gas_profile(profile)?,
            None => self.disable_gas_measurement()?,
        }

        Ok(())
    }

    /// Updates the ambient temperature and re-encodes the heater target.
    ///
    /// The heating plate resistance depends on the ambient temperature; feeding
    /// back a fresh reading keeps the plate on target.
    pub fn set_ambient_temp(&mut self, ambient_temp: Celsius) -> error::Result<(), IFACE::Error> {
        self.config.ambient_temp = ambient_temp;

        if let Some(profile) = self.config.gas_profile {
            let res_heat = convert_res_heat(&self.calib_data, ambient_temp.0, profile.target_temp.0);
            self.write_reg(regs::ADDR_RES_HEAT_0 + profile.index as u8, res_heat)?;
        }

        Ok(())
    }

    /// Writes heater resistance and duration codes into the slot of the
    /// configured gas profile.
    pub fn write_heater_registers(
        &mut self,
        resistance_code: u8,
        duration_code: u8,
    ) -> error::Result<(), IFACE::Error> {
        let index = self
            .config
            .gas_profile
            .map(|profile| profile.index)
            .unwrap_or_default() as u8;

        self.write_reg(regs::ADDR_RES_HEAT_0 + index, resistance_code)?;
        self.write_reg(regs::ADDR_GAS_WAIT_0 + index, duration_code)?;

        Ok(())
    }

    /// Triggers a measurement in 'Forced Mode', waits for completion, and returns compensated data.
    ///
    /// # Errors
    /// [`Bme680Error::Timeout`] if the sensor never flags new data, and
    /// [`Bme680Error::Compensation`] if the sample is corrupt.
    pub fn read_new_data(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> error::Result<CompensatedReading, IFACE::Error> {
        let raw = self.read_raw_sample(delay)?;

        if self.config.gas_enabled() && !raw.gas_status() {
            debug!("gas measurement not successful");
        }

        let reading = compensate(&self.calib_data, &raw)?;

        debug!(
            "T = {} cC, P = {} Pa, H = {} m%",
            reading.temperature.0,
            reading.pressure.0,
            reading.humidity.0
        );

        Ok(reading)
    }

    /// Triggers a measurement and returns the uncompensated ADC values.
    ///
    /// Polls the new-data bit every 10 ms, up to 50 times. If gas measurement
    /// is disabled the returned sample never carries a gas result.
    pub fn read_raw_sample(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> error::Result<RawSample, IFACE::Error> {
        // 1. Wake up sensor and start measurement cycle
        self.activate_forced_mode()?;

        // 2. Wait for heating phase (if gas is enabled)
        // The sensor measures T, P, H first, then heats up for gas measurement.
        if let Some(profile) = self.config.gas_profile {
            delay.delay_ms(profile.wait_time.0 as u32);
        }

        // 3. Poll for "New Data" bit
        let mut polls = 0;
        while self.read_reg_byte(regs::ADDR_MEAS_STATUS_0)? & regs::NEW_DATA_MSK == 0 {
            polls += 1;
            if polls >= MAX_POLLS {
                warn!("measurement timed out");
                return Err(Bme680Error::Timeout);
            }
            delay.delay_ms(POLL_INTERVAL_MS);
        }

        // 4. Burst read starting from 0x1F (pressure MSB)
        let mut buffer = [0u8; regs::ADC_LEN];
        self.read_into(regs::ADDR_ADC, &mut buffer)?;

        let raw = RawSample::from_registers(&buffer);
        if self.config.gas_enabled() {
            Ok(raw)
        } else {
            Ok(raw.without_gas())
        }
    }

    /// Sets oversampling rates for Humidity, Temperature, and Pressure.
    ///
    /// Writes to registers `ctrl_hum` (0x72) and `ctrl_meas` (0x74).
    fn config_oversampling(&mut self, osrs_config: &OversamplingConfig) -> error::Result<(), IFACE::Error> {
        let register = self.read_reg_byte(regs::ADDR_CTRL_HUM)?;
        let ctrl_hum = (register & regs::HUM_SETTINGS_MSK) | osrs_config.hum_osrs as u8;
        self.write_reg(regs::ADDR_CTRL_HUM, ctrl_hum)?;

        // Humidity settings only take effect after a write to ctrl_meas
        self.write_reg(regs::ADDR_CTRL_MEAS, osrs_config.ctrl_meas())?;

        Ok(())
    }

    /// Configures the IIR filter coefficient.
    fn config_iir_filter(&mut self, iir_filter: IIRFilter) -> error::Result<(), IFACE::Error> {
        let register = self.read_reg_byte(regs::ADDR_CONFIG)?;
        let new_reg_val = (register & !regs::FILTER_MSK) | ((iir_filter as u8) << 2);
        self.write_reg(regs::ADDR_CONFIG, new_reg_val)
    }

    /// Programs the heater slot of `profile`, then enables gas measurement
    /// with that slot selected (ctrl_gas_1).
    fn enable_gas_profile(&mut self, profile: GasProfile) -> error::Result<(), IFACE::Error> {
        let res_heat = convert_res_heat(
            &self.calib_data,
            self.config.ambient_temp.0,
            profile.target_temp.0,
        );
        let gas_wait = calc_heater_dur(profile.wait_time.0);
        debug!("heater codes: res_heat {}, gas_wait {}", res_heat, gas_wait);

        self.write_heater_registers(res_heat, gas_wait)?;

        let register = self.read_reg_byte(regs::ADDR_CTRL_GAS_1)?;
        let ctrl_gas_1 = (register & !(regs::RUN_GAS_MSK | regs::NB_CONV_MSK))
            | regs::RUN_GAS_MSK
            | profile.index as u8;
        self.write_reg(regs::ADDR_CTRL_GAS_1, ctrl_gas_1)
    }

    /// Disables the gas sensing functionality in the sensor.
    fn disable_gas_measurement(&mut self) -> error::Result<(), IFACE::Error> {
        let register = self.read_reg_byte(regs::ADDR_CTRL_GAS_1)?;
        self.write_reg(regs::ADDR_CTRL_GAS_1, register & !regs::RUN_GAS_MSK)
    }

    /// Activates 'Forced Mode' to trigger a single measurement cycle.
    ///
    /// The sensor returns to Sleep mode automatically after the measurement.
    fn activate_forced_mode(&mut self) -> error::Result<(), IFACE::Error> {
        let register = self.read_reg_byte(regs::ADDR_CTRL_MEAS)?;
        self.write_reg(
            regs::ADDR_CTRL_MEAS,
            (register & !regs::MODE_MSK) | regs::MODE_FORCED,
        )
    }
}
