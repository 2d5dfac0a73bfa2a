//! Register map of the BME680.

pub const ADDR_RES_HEAT_VAL: u8 = 0x00;
pub const ADDR_MEAS_STATUS_0: u8 = 0x1D;
pub const ADDR_ADC: u8 = 0x1F;
pub const ADDR_RES_HEAT_0: u8 = 0x5A;
pub const ADDR_GAS_WAIT_0: u8 = 0x64;
pub const ADDR_CTRL_GAS_1: u8 = 0x71;
pub const ADDR_CTRL_HUM: u8 = 0x72;
/// Status register; holds the SPI memory page bit.
pub const ADDR_STATUS: u8 = 0x73;
pub const ADDR_CTRL_MEAS: u8 = 0x74;
pub const ADDR_CONFIG: u8 = 0x75;
pub const ADDR_COEFF_1: u8 = 0x89;
pub const ADDR_CHIP_ID: u8 = 0xD0;
pub const ADDR_RESET: u8 = 0xE0;
pub const ADDR_COEFF_2: u8 = 0xE1;

pub const COEFF_1_LEN: usize = 25;
pub const COEFF_2_LEN: usize = 16;
pub const COEFF_LEN: usize = COEFF_1_LEN + COEFF_2_LEN;
/// `res_heat_val`, `res_heat_range` and `range_sw_err` live in `0x00..=0x04`.
pub const HEAT_CALIB_LEN: usize = 5;
/// Pressure MSB (`0x1F`) up to gas LSB (`0x2B`).
pub const ADC_LEN: usize = 13;

pub const CHIP_ID: u8 = 0x61;
pub const SOFT_RESET_CMD: u8 = 0xB6;

pub const NEW_DATA_MSK: u8 = 0x80;
pub const GAS_VALID_MSK: u8 = 0x20;
pub const HEAT_STAB_MSK: u8 = 0x10;
pub const GAS_RANGE_MSK: u8 = 0x0F;
pub const RUN_GAS_MSK: u8 = 0x10;
pub const NB_CONV_MSK: u8 = 0x0F;
pub const HUM_SETTINGS_MSK: u8 = 0xF8;
pub const FILTER_MSK: u8 = 0x1C;
pub const MODE_MSK: u8 = 0x03;
pub const RES_HEAT_RANGE_MSK: u8 = 0x30;
pub const RANGE_SW_ERR_MSK: u8 = 0xF0;
pub const SPI_MEM_PAGE_MSK: u8 = 0x10;

pub const MODE_FORCED: u8 = 0x01;

pub const SPI_READ: u8 = 0x80;
pub const SPI_WRITE_MSK: u8 = 0x7F;
