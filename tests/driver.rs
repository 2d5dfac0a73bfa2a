use bme680_compensation::{
    Bme680, Bme680Error, CalibrationData, Celsius, CompensatedReading, Config, ConfigBuilder,
    GasProfile, GasProfileIndex, GasResistance, Humidity, Milliseconds, Pressure, Temperature,
    convert_res_heat,
    interface::{I2C_ADDR_SECONDARY, Interface, SpiInterface},
};
use embedded_hal_mock::eh1::{
    delay::NoopDelay,
    i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    spi::{Mock as SpiMock, Transaction as SpiTransaction},
};

const ADDR: u8 = I2C_ADDR_SECONDARY;

const COEFF: [u8; 41] = [
    0x00, 0xA3, 0x66, 0x03, 0x00, 0xD4, 0x8A, 0x65, 0xD7, 0x58, 0x00, 0xBE, 0x19, 0xCB, 0xFF, 0x16,
    0x1E, 0x00, 0x00, 0xC9, 0xFA, 0x3E, 0xF4, 0x1E, 0x00, // 0x89..
    0x3F, 0x71, 0x31, 0x00, 0x2D, 0x14, 0x78, 0x9C, 0xAC, 0x65, 0xBC, 0xED, 0xB4, 0x12, 0x00,
    0x00, // 0xE1..
];
const HEAT: [u8; 5] = [0x30, 0x00, 0x15, 0x00, 0xF3];

/// T = 500000, P = 350000, H = 25000, gas 500 in range 4, valid and stable.
const ADC: [u8; 13] = [
    0x55, 0x73, 0x00, 0x7A, 0x12, 0x00, 0x61, 0xA8, 0x00, 0x00, 0x00, 0x7D, 0x34,
];

fn write(bytes: &[u8]) -> I2cTransaction {
    I2cTransaction::write(ADDR, bytes.to_vec())
}

fn read(reg: u8, bytes: &[u8]) -> I2cTransaction {
    I2cTransaction::write_read(ADDR, vec![reg], bytes.to_vec())
}

/// Reset, chip id and calibration readout.
fn startup() -> Vec<I2cTransaction> {
    vec![
        write(&[0xE0, 0xB6]),
        read(0xE0, &[0x00]),
        read(0xD0, &[0x61]),
        read(0x89, &COEFF[..25]),
        read(0xE1, &COEFF[25..]),
        read(0x00, &HEAT),
    ]
}

/// Oversampling and filter writes for the default configuration.
fn default_measurement_setup() -> Vec<I2cTransaction> {
    vec![
        read(0x72, &[0x00]),
        write(&[0x72, 0x02]),
        write(&[0x74, 0x90]),
        read(0x75, &[0x00]),
        write(&[0x75, 0x08]),
    ]
}

/// Heater slot 0 at 150 °C for 320 ms with 25 °C ambient.
fn default_gas_setup() -> Vec<I2cTransaction> {
    vec![
        write(&[0x5A, 62]),
        write(&[0x64, 148]),
        read(0x71, &[0x00]),
        write(&[0x71, 0x10]),
    ]
}

fn expected_reading() -> CompensatedReading {
    CompensatedReading {
        temperature: Temperature(2617),
        pressure: Pressure(104428),
        humidity: Humidity(68830),
        gas_resistance: Some(GasResistance(504031)),
    }
}

#[test]
fn init_and_measure_over_i2c() {
    let mut expectations = startup();
    expectations.extend(default_measurement_setup());
    expectations.extend(default_gas_setup());
    expectations.extend([
        // forced mode
        read(0x74, &[0x90]),
        write(&[0x74, 0x91]),
        // new data on first poll
        read(0x1D, &[0x80]),
        read(0x1F, &ADC),
    ]);

    let mut i2c = I2cMock::new(&expectations);
    let mut delay = NoopDelay::new();

    let mut bme680 = Bme680::new_i2c(i2c.clone(), ADDR, Config::default())
        .init(&mut delay)
        .unwrap();
    assert_eq!(
        *bme680.calibration(),
        CalibrationData::from_registers(&COEFF, &HEAT)
    );

    let reading = bme680.read_new_data(&mut delay).unwrap();
    assert_eq!(reading, expected_reading());

    i2c.done();
}

#[test]
fn wrong_chip_id_is_rejected() {
    let expectations = [
        write(&[0xE0, 0xB6]),
        read(0xE0, &[0x00]),
        read(0xD0, &[0x60]),
    ];
    let mut i2c = I2cMock::new(&expectations);
    let mut delay = NoopDelay::new();

    let result = Bme680::new_i2c(i2c.clone(), ADDR, Config::default()).init(&mut delay);
    assert!(matches!(result, Err(Bme680Error::WrongChipId(0x60))));

    i2c.done();
}

#[test]
fn incomplete_reset_is_rejected() {
    let expectations = [write(&[0xE0, 0xB6]), read(0xE0, &[0xB6])];
    let mut i2c = I2cMock::new(&expectations);
    let mut delay = NoopDelay::new();

    let result = Bme680::new_i2c(i2c.clone(), ADDR, Config::default()).init(&mut delay);
    assert!(matches!(result, Err(Bme680Error::ResetFailed)));

    i2c.done();
}

#[test]
fn disabled_gas_yields_no_gas_value() {
    let config = ConfigBuilder::new().gas_profile(None).build();

    let mut expectations = startup();
    expectations.extend(default_measurement_setup());
    expectations.extend([
        read(0x71, &[0x1A]),
        write(&[0x71, 0x0A]),
        read(0x74, &[0x90]),
        write(&[0x74, 0x91]),
        read(0x1D, &[0x00]),
        read(0x1D, &[0x00]),
        read(0x1D, &[0x80]),
        read(0x1F, &ADC),
    ]);

    let mut i2c = I2cMock::new(&expectations);
    let mut delay = NoopDelay::new();

    let mut bme680 = Bme680::new_i2c(i2c.clone(), ADDR, config)
        .init(&mut delay)
        .unwrap();
    let reading = bme680.read_new_data(&mut delay).unwrap();

    assert_eq!(
        reading,
        CompensatedReading {
            gas_resistance: None,
            ..expected_reading()
        }
    );

    i2c.done();
}

#[test]
fn measurement_times_out_after_50_polls() {
    let config = ConfigBuilder::new().gas_profile(None).build();

    let mut expectations = startup();
    expectations.extend(default_measurement_setup());
    expectations.extend([
        read(0x71, &[0x00]),
        write(&[0x71, 0x00]),
        read(0x74, &[0x90]),
        write(&[0x74, 0x91]),
    ]);
    expectations.extend((0..50).map(|_| read(0x1D, &[0x00])));

    let mut i2c = I2cMock::new(&expectations);
    let mut delay = NoopDelay::new();

    let mut bme680 = Bme680::new_i2c(i2c.clone(), ADDR, config)
        .init(&mut delay)
        .unwrap();
    assert!(matches!(
        bme680.read_new_data(&mut delay),
        Err(Bme680Error::Timeout)
    ));

    i2c.done();
}

#[test]
fn heater_follows_profile_slot_and_ambient_temperature() {
    let profile = GasProfile {
        index: GasProfileIndex::Profile3,
        target_temp: Celsius(300),
        wait_time: Milliseconds(100),
    };
    let config = ConfigBuilder::new().gas_profile(Some(profile)).build();

    let calib = CalibrationData::from_registers(&COEFF, &HEAT);
    let warm = convert_res_heat(&calib, 40, 300);

    let mut expectations = startup();
    expectations.extend(default_measurement_setup());
    expectations.extend([
        write(&[0x5D, 100]),
        write(&[0x67, 89]),
        read(0x71, &[0x00]),
        write(&[0x71, 0x13]),
        // ambient update only rewrites the resistance code
        write(&[0x5D, warm]),
    ]);

    let mut i2c = I2cMock::new(&expectations);
    let mut delay = NoopDelay::new();

    let mut bme680 = Bme680::new_i2c(i2c.clone(), ADDR, config)
        .init(&mut delay)
        .unwrap();
    bme680.set_ambient_temp(Celsius(40)).unwrap();
    assert_eq!(bme680.config().ambient_temp, Celsius(40));

    i2c.done();
}

#[test]
fn spi_switches_memory_page_on_demand() {
    let expectations = [
        // chip id lives in page 0, sensor reports page 1
        SpiTransaction::transaction_start(),
        SpiTransaction::write_vec(vec![0xF3]),
        SpiTransaction::read_vec(vec![0x10]),
        SpiTransaction::transaction_end(),
        SpiTransaction::transaction_start(),
        SpiTransaction::write_vec(vec![0x73, 0x00]),
        SpiTransaction::transaction_end(),
        SpiTransaction::transaction_start(),
        SpiTransaction::write_vec(vec![0xD0]),
        SpiTransaction::read_vec(vec![0x61]),
        SpiTransaction::transaction_end(),
        // ctrl_meas lives in page 1
        SpiTransaction::transaction_start(),
        SpiTransaction::write_vec(vec![0xF3]),
        SpiTransaction::read_vec(vec![0x00]),
        SpiTransaction::transaction_end(),
        SpiTransaction::transaction_start(),
        SpiTransaction::write_vec(vec![0x73, 0x10]),
        SpiTransaction::transaction_end(),
        SpiTransaction::transaction_start(),
        SpiTransaction::write_vec(vec![0x74, 0x91]),
        SpiTransaction::transaction_end(),
        // page already selected
        SpiTransaction::transaction_start(),
        SpiTransaction::write_vec(vec![0xF3]),
        SpiTransaction::read_vec(vec![0x10]),
        SpiTransaction::transaction_end(),
        SpiTransaction::transaction_start(),
        SpiTransaction::write_vec(vec![0xF4]),
        SpiTransaction::read_vec(vec![0x91]),
        SpiTransaction::transaction_end(),
    ];

    let mut spi = SpiMock::new(&expectations);
    let mut iface = SpiInterface::new(spi.clone());

    assert_eq!(iface.read_reg(0xD0).unwrap(), 0x61);
    iface.write_reg(0x74, 0x91).unwrap();
    assert_eq!(iface.read_reg(0x74).unwrap(), 0x91);

    spi.done();
}
