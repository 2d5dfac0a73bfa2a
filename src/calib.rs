//! Factory calibration coefficients and their register layout.

use crate::regs;

/// Factory-fused calibration coefficients read from the sensor.
/// These are unique to every individual chip and required for compensation formulas.
///
/// Field widths and signedness follow the datasheet; the compensation formulas
/// depend on them, so they are kept exactly as stored on the chip.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationData {
    pub par_t1: u16,
    pub par_t2: i16,
    pub par_t3: i8,
    pub par_p1: u16,
    pub par_p2: i16,
    pub par_p3: i8,
    pub par_p4: i16,
    pub par_p5: i16,
    pub par_p6: i8,
    pub par_p7: i8,
    pub par_p8: i16,
    pub par_p9: i16,
    pub par_p10: u8,
    /// 12 bit.
    pub par_h1: u16,
    /// 12 bit.
    pub par_h2: u16,
    pub par_h3: i8,
    pub par_h4: i8,
    pub par_h5: i8,
    pub par_h6: u8,
    pub par_h7: i8,
    pub par_g1: i8,
    pub par_g2: i16,
    pub par_g3: i8,
    pub res_heat_val: u8,
    /// 2 bit.
    pub res_heat_range: u8,
    /// Signed 4 bit range switching error.
    pub range_sw_err: i8,
}

fn u16_le(lsb: u8, msb: u8) -> u16 {
    u16::from_le_bytes([lsb, msb])
}

fn i16_le(lsb: u8, msb: u8) -> i16 {
    i16::from_le_bytes([lsb, msb])
}

impl CalibrationData {
    /// Decodes the coefficient blocks read from the sensor's ROM.
    ///
    /// `coeff` holds the 25 bytes starting at `0x89` followed by the 16 bytes
    /// starting at `0xE1`. `heat` holds the 5 bytes starting at `0x00`.
    /// See BME680 datasheet, Section 3.11.1.
    pub fn from_registers(
        coeff: &[u8; regs::COEFF_LEN],
        heat: &[u8; regs::HEAT_CALIB_LEN],
    ) -> Self {
        let b = coeff;

        CalibrationData {
            par_t1: u16_le(b[33], b[34]),
            par_t2: i16_le(b[1], b[2]),
            par_t3: b[3] as i8,
            par_p1: u16_le(b[5], b[6]),
            par_p2: i16_le(b[7], b[8]),
            par_p3: b[9] as i8,
            par_p4: i16_le(b[11], b[12]),
            par_p5: i16_le(b[13], b[14]),
            par_p6: b[16] as i8,
            par_p7: b[15] as i8,
            par_p8: i16_le(b[19], b[20]),
            par_p9: i16_le(b[21], b[22]),
            par_p10: b[23],
            // h1 and h2 share the nibbles of byte 26
            par_h1: ((b[27] as u16) << 4) | ((b[26] & 0x0F) as u16),
            par_h2: ((b[25] as u16) << 4) | ((b[26] >> 4) as u16),
            par_h3: b[28] as i8,
            par_h4: b[29] as i8,
            par_h5: b[30] as i8,
            par_h6: b[31],
            par_h7: b[32] as i8,
            par_g1: b[37] as i8,
            par_g2: i16_le(b[35], b[36]),
            par_g3: b[38] as i8,
            res_heat_val: heat[0],
            res_heat_range: (heat[2] & regs::RES_HEAT_RANGE_MSK) >> 4,
            range_sw_err: ((heat[4] & regs::RANGE_SW_ERR_MSK) as i8) >> 4,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const COEFF: [u8; regs::COEFF_LEN] = [
        0x00, 0xA3, 0x66, 0x03, 0x00, 0xD4, 0x8A, 0x65, 0xD7, 0x58, 0x00, 0xBE, 0x19, 0xCB, 0xFF,
        0x16, 0x1E, 0x00, 0x00, 0xC9, 0xFA, 0x3E, 0xF4, 0x1E, 0x00, // 0x89..
        0x3F, 0x71, 0x31, 0x00, 0x2D, 0x14, 0x78, 0x9C, 0xAC, 0x65, 0xBC, 0xED, 0xB4, 0x12, 0x00,
        0x00, // 0xE1..
    ];
    pub(crate) const HEAT: [u8; regs::HEAT_CALIB_LEN] = [0x30, 0x00, 0x15, 0x00, 0xF3];

    /// Calibration set shared by the compensation tests.
    pub(crate) fn sample() -> CalibrationData {
        CalibrationData {
            par_t1: 26028,
            par_t2: 26275,
            par_t3: 3,
            par_p1: 35540,
            par_p2: -10395,
            par_p3: 88,
            par_p4: 6590,
            par_p5: -53,
            par_p6: 30,
            par_p7: 22,
            par_p8: -1335,
            par_p9: -3010,
            par_p10: 30,
            par_h1: 785,
            par_h2: 1015,
            par_h3: 0,
            par_h4: 45,
            par_h5: 20,
            par_h6: 120,
            par_h7: -100,
            par_g1: -76,
            par_g2: -4676,
            par_g3: 18,
            res_heat_val: 48,
            res_heat_range: 1,
            range_sw_err: -1,
        }
    }

    #[test]
    fn decodes_register_blocks() {
        assert_eq!(CalibrationData::from_registers(&COEFF, &HEAT), sample());
    }

    #[test]
    fn range_switching_error_is_sign_extended() {
        let mut heat = HEAT;
        heat[4] = 0x70;
        assert_eq!(CalibrationData::from_registers(&COEFF, &heat).range_sw_err, 7);
        heat[4] = 0x8F;
        assert_eq!(CalibrationData::from_registers(&COEFF, &heat).range_sw_err, -8);
    }

    #[test]
    fn humidity_coefficients_share_a_byte() {
        let mut coeff = [0u8; regs::COEFF_LEN];
        coeff[25] = 0xAB;
        coeff[26] = 0xCD;
        coeff[27] = 0xEF;
        let calib = CalibrationData::from_registers(&coeff, &[0; regs::HEAT_CALIB_LEN]);
        assert_eq!(calib.par_h1, 0xEFD);
        assert_eq!(calib.par_h2, 0xABC);
    }
}
