//! Raw ADC snapshot.

use crate::regs;

/// Raw ADC output and status bits read directly from the sensor registers.
///
/// This struct holds the uncompensated data of one measurement cycle. It is
/// never mutated after construction; `gas_range` is always a valid 4-bit index.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    temp_adc: u32,
    press_adc: u32,
    hum_adc: u16,
    gas_adc: u16,
    gas_range: u8,
    gas_status: bool,
}

impl RawSample {
    /// Builds a sample from already unpacked ADC values.
    ///
    /// # Panics
    /// If `gas_range` is outside `0..=15`.
    pub fn new(
        temp_adc: u32,
        press_adc: u32,
        hum_adc: u16,
        gas_adc: u16,
        gas_range: u8,
        gas_status: bool,
    ) -> Self {
        assert!(gas_range <= regs::GAS_RANGE_MSK, "gas_range out of range");

        RawSample {
            temp_adc,
            press_adc,
            hum_adc,
            gas_adc,
            gas_range,
            gas_status,
        }
    }

    /// Unpacks the burst read starting at the pressure MSB register (`0x1F`).
    ///
    /// The gas result only counts as valid when both the `gas_valid_r` and the
    /// `heat_stab_r` bits are set.
    pub fn from_registers(buffer: &[u8; regs::ADC_LEN]) -> Self {
        // Reconstruct 20-bit and 16-bit ADC values from register bytes
        let press_adc =
            ((buffer[2] as u32) >> 4) | ((buffer[1] as u32) << 4) | ((buffer[0] as u32) << 12);
        let temp_adc =
            ((buffer[5] as u32) >> 4) | ((buffer[4] as u32) << 4) | ((buffer[3] as u32) << 12);
        let hum_adc = u16::from_be_bytes([buffer[6], buffer[7]]);
        let gas_adc = ((buffer[12] as u16) >> 6) | ((buffer[11] as u16) << 2);
        let gas_range = buffer[12] & regs::GAS_RANGE_MSK;

        let success = regs::GAS_VALID_MSK | regs::HEAT_STAB_MSK;
        let gas_status = (buffer[12] & success) == success;

        RawSample::new(temp_adc, press_adc, hum_adc, gas_adc, gas_range, gas_status)
    }

    /// Same sample with the gas result marked as not measured.
    pub fn without_gas(self) -> Self {
        RawSample {
            gas_status: false,
            ..self
        }
    }

    pub fn temp_adc(&self) -> u32 {
        self.temp_adc
    }

    pub fn press_adc(&self) -> u32 {
        self.press_adc
    }

    pub fn hum_adc(&self) -> u16 {
        self.hum_adc
    }

    pub fn gas_adc(&self) -> u16 {
        self.gas_adc
    }

    pub fn gas_range(&self) -> u8 {
        self.gas_range
    }

    /// `true` when the gas measurement completed with a stable heater.
    pub fn gas_status(&self) -> bool {
        self.gas_status
    }
}
