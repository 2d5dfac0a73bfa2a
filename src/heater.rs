//! Gas heater register encoding.

use crate::calib::CalibrationData;

/// Highest heater target the sensor membrane tolerates, in °C.
pub const MAX_TARGET_TEMP: u16 = 400;

/// Durations at or above this many milliseconds saturate the duration code.
const MAX_DURATION_MS: u16 = 0xFC0;

/// Calculates the `res_heat_x` register value for a heater target temperature.
///
/// Converts the target temperature, taking the ambient temperature and the
/// chip calibration into account, into an 8-bit register value. Both
/// temperatures are in °C; targets above [`MAX_TARGET_TEMP`] are capped.
pub fn convert_res_heat(calib: &CalibrationData, ambient_temp: u16, target_temp: u16) -> u8 {
    let target_temp = target_temp.min(MAX_TARGET_TEMP) as i32;

    let var1 = ((ambient_temp as i32 * calib.par_g3 as i32) / 1000) * 256;
    let var2 = (calib.par_g1 as i32 + 784)
        * (((((calib.par_g2 as i32) + 154009) * target_temp * 5) / 100 + 3276800) / 10);
    let var3 = var1 + var2 / 2;
    let var4 = var3 / (calib.res_heat_range as i32 + 4);
    let var5 = 131 * (calib.res_heat_val as i32) + 65536;

    let res_heat_x100 = ((var4 / var5) - 250) * 34;
    ((res_heat_x100 + 50) / 100) as u8
}

/// Encodes a heating duration in milliseconds as a `gas_wait_x` register value.
///
/// The hardware uses a 6-bit mantissa (bits 0-5) and a 2-bit multiplier
/// exponent (bits 6-7):
/// - Multiplier 00: 1ms steps
/// - Multiplier 01: 4ms steps
/// - Multiplier 10: 16ms steps
/// - Multiplier 11: 64ms steps
///
/// Durations of `0xFC0` ms and above saturate to `0xFF`. The encoding is lossy:
/// anything above 63 ms loses its low bits, so [`heater_dur_ms`] of the code is
/// generally not the requested duration.
pub fn calc_heater_dur(duration_ms: u16) -> u8 {
    if duration_ms >= MAX_DURATION_MS {
        return 0xFF;
    }

    let mut dur = duration_ms;
    let mut factor = 0u8;
    while dur > 0x3F {
        dur /= 4;
        factor += 1;
    }

    dur as u8 + factor * 64
}

/// Decodes a `gas_wait_x` register value back into milliseconds.
pub fn heater_dur_ms(code: u8) -> u16 {
    let mantissa = (code & 0x3F) as u16;
    mantissa << (2 * (code >> 6))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calib::tests::sample;

    #[test]
    fn resistance_code_matches_reference() {
        let calib = sample();
        assert_eq!(convert_res_heat(&calib, 25, 300), 100);
        assert_eq!(convert_res_heat(&calib, 25, 150), 62);
    }

    #[test]
    fn target_temperature_is_capped() {
        let calib = sample();
        assert_eq!(convert_res_heat(&calib, 25, 400), 125);
        assert_eq!(convert_res_heat(&calib, 25, 500), 125);
    }

    #[test]
    fn duration_codes() {
        assert_eq!(calc_heater_dur(0), 0x00);
        assert_eq!(calc_heater_dur(0x3F), 0x3F);
        assert_eq!(calc_heater_dur(0x40), 0x50);
        assert_eq!(calc_heater_dur(100), 89);
        assert_eq!(calc_heater_dur(255), 127);
        assert_eq!(calc_heater_dur(256), 144);
        assert_eq!(calc_heater_dur(320), 148);
        assert_eq!(calc_heater_dur(1000), 190);
        assert_eq!(calc_heater_dur(4031), 254);
    }

    #[test]
    fn duration_saturates() {
        assert_eq!(calc_heater_dur(0xFC0), 0xFF);
        assert_eq!(calc_heater_dur(u16::MAX), 0xFF);
    }

    #[test]
    fn duration_round_trip_is_lossy() {
        assert_eq!(heater_dur_ms(calc_heater_dur(63)), 63);
        assert_eq!(heater_dur_ms(calc_heater_dur(100)), 100);
        assert_eq!(heater_dur_ms(calc_heater_dur(101)), 100);
        assert_eq!(heater_dur_ms(calc_heater_dur(320)), 320);
        assert_eq!(heater_dur_ms(calc_heater_dur(1000)), 992);
    }
}
