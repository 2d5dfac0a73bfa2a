//! Fixed-point compensation formulas.
//!
//! Integer-only ports of the Bosch reference formulas. Every intermediate is
//! kept at the width the reference uses; overflow wraps exactly as it does in
//! the reference, so results match it bit for bit.

use crate::{
    CompensatedReading, GasResistance, Humidity, Pressure, Temperature, calib::CalibrationData,
    error::CompensationError, raw::RawSample,
};

/// Constants and lookup tables for the gas resistance calculation, indexed by `gas_range`.
mod gas_constants {
    /// Range-dependent correction factors.
    pub static ARRAY1_INT: [u32; 16] = [
        2147483647, 2147483647, 2147483647, 2147483647, 2147483647, 2126008810, 2147483647,
        2130303777, 2147483647, 2147483647, 2143188679, 2136746228, 2147483647, 2126008810,
        2147483647, 2147483647,
    ];
    /// Range scaling table converting ADC values to Ohm.
    pub static ARRAY2_INT: [u32; 16] = [
        4096000000, 2048000000, 1024000000, 512000000, 255744255, 127110228, 64000000, 32258064,
        16016016, 8000000, 4000000, 2000000, 1000000, 500000, 250000, 125000,
    ];
}

/// Above this value the pressure numerator is divided before it is doubled.
const PRES_OVF_CHECK: i32 = 1 << 30;

/// Intermediate temperature values used for compensation.
///
/// These values are calculated during temperature compensation and are required
/// for the subsequent pressure and humidity compensation formulas (t_fine).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalcTempData {
    /// `t_fine`, input of the pressure formula.
    pub temp_fine: i32,
    /// Temperature in °C * 100, input of the humidity formula.
    pub temp_comp: i32,
}

/// Converts a full raw sample into physical units.
///
/// Temperature is always compensated first since pressure consumes `t_fine`
/// and humidity the compensated temperature. A gas value is only produced when
/// the sample reports a successful gas measurement.
pub fn compensate(
    calib: &CalibrationData,
    raw: &RawSample,
) -> Result<CompensatedReading, CompensationError> {
    let temp = calc_temp(calib, raw.temp_adc());
    let pres = calc_pres(calib, temp.temp_fine, raw.press_adc())?;
    let hum = calc_hum(calib, temp.temp_comp, raw.hum_adc());

    let gas = if raw.gas_status() {
        Some(GasResistance(calc_gas(calib, raw.gas_adc(), raw.gas_range())?))
    } else {
        None
    };

    Ok(CompensatedReading {
        temperature: Temperature(temp.temp_comp),
        pressure: Pressure(pres),
        humidity: Humidity(hum),
        gas_resistance: gas,
    })
}

/// Converts the raw temperature ADC value into °C * 100.
///
/// This is the most important compensation, since `temp_fine` is the
/// reference for both pressure and humidity.
pub fn calc_temp(calib: &CalibrationData, temp_adc: u32) -> CalcTempData {
    let var1 = ((temp_adc as i32) >> 3) - ((calib.par_t1 as i32) << 1);
    let var2 = var1.wrapping_mul(calib.par_t2 as i32) >> 11;
    let var3 = ((((var1 >> 1).wrapping_mul(var1 >> 1)) >> 12)
        .wrapping_mul((calib.par_t3 as i32) << 4))
        >> 14;
    let temp_fine = var2.wrapping_add(var3);

    CalcTempData {
        temp_fine,
        temp_comp: temp_fine.wrapping_mul(5).wrapping_add(128) >> 8,
    }
}

/// Runs the pressure formula up to the division.
///
/// Returns the divisor and the numerator.
fn pres_terms(calib: &CalibrationData, t_fine: i32, press_adc: u32) -> (i32, i32) {
    let var1 = (t_fine >> 1) - 64_000;
    let sq = (var1 >> 2).wrapping_mul(var1 >> 2);

    let mut var2 = ((sq >> 11).wrapping_mul(calib.par_p6 as i32)) >> 2;
    var2 = var2.wrapping_add(var1.wrapping_mul(calib.par_p5 as i32) << 1);
    var2 = (var2 >> 2).wrapping_add((calib.par_p4 as i32) << 16);

    let mut div = (((sq >> 13).wrapping_mul((calib.par_p3 as i32) << 5)) >> 3)
        .wrapping_add((calib.par_p2 as i32).wrapping_mul(var1) >> 1);
    div >>= 18;
    div = (32768 + div).wrapping_mul(calib.par_p1 as i32) >> 15;

    let press_comp = 1_048_576i32.wrapping_sub(press_adc as i32);
    let press_comp = (press_comp.wrapping_sub(var2 >> 12) as u32).wrapping_mul(3125) as i32;

    (div, press_comp)
}

/// Converts the raw pressure ADC value into Pascal (Pa).
///
/// Requires `t_fine` from the temperature compensation.
///
/// # Errors
/// [`CompensationError::InvalidPressureDivisor`] if the calibration yields a
/// zero or negative divisor.
pub fn calc_pres(
    calib: &CalibrationData,
    t_fine: i32,
    press_adc: u32,
) -> Result<u32, CompensationError> {
    let (div, mut press_comp) = pres_terms(calib, t_fine, press_adc);

    if div <= 0 {
        return Err(CompensationError::InvalidPressureDivisor);
    }

    // The order of division and doubling keeps the 32-bit intermediate in range
    press_comp = if press_comp >= PRES_OVF_CHECK {
        (((press_comp as u32) / (div as u32)) << 1) as i32
    } else {
        (((press_comp << 1) as u32) / (div as u32)) as i32
    };

    let var1 = (calib.par_p9 as i32)
        .wrapping_mul((press_comp >> 3).wrapping_mul(press_comp >> 3) >> 13)
        >> 12;
    let var2 = (press_comp >> 2).wrapping_mul(calib.par_p8 as i32) >> 13;
    let cube = press_comp >> 8;
    let var3 = cube
        .wrapping_mul(cube)
        .wrapping_mul(cube)
        .wrapping_mul(calib.par_p10 as i32)
        >> 17;

    press_comp = press_comp.wrapping_add(
        var1.wrapping_add(var2)
            .wrapping_add(var3)
            .wrapping_add((calib.par_p7 as i32) << 7)
            >> 4,
    );

    Ok(press_comp as u32)
}

/// Converts the raw humidity ADC value into milli-percent (% * 1000).
///
/// Takes the compensated temperature, not `t_fine`. The result is clamped
/// to `0..=100_000`.
pub fn calc_hum(calib: &CalibrationData, temp_comp: i32, hum_adc: u16) -> u32 {
    let var1 = (hum_adc as i32 - ((calib.par_h1 as i32) << 4))
        .wrapping_sub((temp_comp.wrapping_mul(calib.par_h3 as i32) / 100) >> 1);
    let var2 = (calib.par_h2 as i32).wrapping_mul(
        (temp_comp.wrapping_mul(calib.par_h4 as i32) / 100)
            .wrapping_add(
                (temp_comp.wrapping_mul(temp_comp.wrapping_mul(calib.par_h5 as i32) / 100) >> 6)
                    / 100,
            )
            .wrapping_add(1 << 14),
    ) >> 10;
    let var3 = var1.wrapping_mul(var2);
    let var4 = ((calib.par_h6 as i32) << 7)
        .wrapping_add(temp_comp.wrapping_mul(calib.par_h7 as i32) / 100)
        >> 4;
    let var5 = (var3 >> 14).wrapping_mul(var3 >> 14) >> 10;
    let var6 = var4.wrapping_mul(var5) >> 1;

    let hum_comp = (var3.wrapping_add(var6) >> 10).wrapping_mul(1000) >> 12;

    hum_comp.clamp(0, 100_000) as u32
}

/// Converts the raw gas ADC value and its range into Ohm.
///
/// # Errors
/// [`CompensationError::GasDivisorZero`] if the divisor evaluates to zero.
///
/// # Panics
/// If `gas_range` is outside `0..=15`.
pub fn calc_gas(
    calib: &CalibrationData,
    gas_adc: u16,
    gas_range: u8,
) -> Result<u32, CompensationError> {
    assert!(gas_range < 16, "gas_range out of range");
    let range = gas_range as usize;

    // 64-bit intermediates, as in the reference
    let var1 = ((1340 + 5 * calib.range_sw_err as i64)
        * gas_constants::ARRAY1_INT[range] as i64)
        >> 16;
    let var2 = ((gas_adc as i64) << 15) - (1 << 24) + var1;
    let var3 = (gas_constants::ARRAY2_INT[range] as i64 * var1) >> 9;

    (var3 + (var2 >> 1))
        .checked_div(var2)
        .map(|res| res as u32)
        .ok_or(CompensationError::GasDivisorZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calib::tests::sample;

    #[test]
    fn temperature_matches_reference() {
        let calib = sample();
        assert_eq!(
            calc_temp(&calib, 500_000),
            CalcTempData {
                temp_fine: 134_011,
                temp_comp: 2617
            }
        );
        assert_eq!(calc_temp(&calib, 520_000).temp_comp, 3244);
        assert_eq!(calc_temp(&calib, 480_000).temp_comp, 1991);
    }

    #[test]
    fn pressure_divides_first_above_threshold() {
        let calib = sample();
        let (div, num) = pres_terms(&calib, 134_011, 350_000);
        assert!(div > 0);
        assert!(num >= PRES_OVF_CHECK);
        assert_eq!(calc_pres(&calib, 134_011, 350_000), Ok(104_428));
    }

    #[test]
    fn pressure_shifts_first_below_threshold() {
        let calib = sample();
        let (_, num) = pres_terms(&calib, 134_011, 750_000);
        assert!((0..PRES_OVF_CHECK).contains(&num));
        assert_eq!(calc_pres(&calib, 134_011, 750_000), Ok(34_051));
    }

    #[test]
    fn pressure_rejects_zero_divisor() {
        let calib = CalibrationData {
            par_p1: 0,
            ..sample()
        };
        assert_eq!(
            calc_pres(&calib, 134_011, 350_000),
            Err(CompensationError::InvalidPressureDivisor)
        );
    }

    #[test]
    fn humidity_matches_reference() {
        let calib = sample();
        assert_eq!(calc_hum(&calib, 2617, 25_000), 68_830);
        assert_eq!(calc_hum(&calib, 2617, 20_000), 37_178);
    }

    #[test]
    fn humidity_is_clamped() {
        let calib = sample();
        assert_eq!(calc_hum(&calib, 2617, 30_000), 100_000);
        assert_eq!(calc_hum(&calib, 2617, u16::MAX), 100_000);
        assert_eq!(calc_hum(&calib, 2617, 0), 0);
    }

    #[test]
    fn gas_resistance_for_every_range() {
        const EXPECTED: [u32; 16] = [
            8_072_289, 4_036_145, 2_018_072, 1_009_036, 504_014, 250_528, 126_130, 63_578, 31_564,
            15_766, 7_883, 3_942, 1_971, 985, 493, 246,
        ];
        let calib = CalibrationData {
            range_sw_err: 0,
            ..sample()
        };

        for (range, expected) in EXPECTED.iter().enumerate() {
            assert_eq!(calc_gas(&calib, 500, range as u8), Ok(*expected), "range {range}");
        }
    }

    #[test]
    #[should_panic]
    fn gas_range_above_15_panics() {
        let _ = calc_gas(&sample(), 500, 16);
    }

    #[test]
    fn compensates_full_sample() {
        let calib = sample();
        let raw = RawSample::new(500_000, 350_000, 25_000, 500, 4, true);

        let reading = compensate(&calib, &raw).unwrap();
        assert_eq!(reading.temperature, Temperature(2617));
        assert_eq!(reading.pressure, Pressure(104_428));
        assert_eq!(reading.humidity, Humidity(68_830));
        assert_eq!(reading.gas_resistance, Some(GasResistance(504_031)));
    }

    #[test]
    fn failed_gas_measurement_has_no_value() {
        let calib = sample();
        let raw = RawSample::new(500_000, 350_000, 25_000, 500, 4, false);

        let reading = compensate(&calib, &raw).unwrap();
        assert_eq!(reading.gas_resistance, None);
        assert_eq!(reading.temperature, Temperature(2617));
    }
}
