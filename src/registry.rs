//! Per-device reading cache for sensor registries.
//!
//! A single measurement yields all four channels, while registry clients read
//! one channel at a time. The [`Registry`] keeps the last reading of every
//! device and serves each channel from it once before measuring again.

use core::hash::Hash;

use embedded_hal::delay::DelayNs;
use heapless::FnvIndexMap;
use thiserror_no_std::Error;

use crate::{Bme680, Bme680Error, CompensatedReading, Ready, interface::Interface};

/// Anything that produces a full compensated reading on demand.
pub trait Measure {
    type Error;

    fn measure<D: DelayNs>(&mut self, delay: &mut D) -> Result<CompensatedReading, Self::Error>;
}

impl<IFACE: Interface> Measure for Bme680<IFACE, Ready> {
    type Error = Bme680Error<IFACE::Error>;

    fn measure<D: DelayNs>(&mut self, delay: &mut D) -> Result<CompensatedReading, Self::Error> {
        self.read_new_data(delay)
    }
}

/// One of the physical quantities in a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Temperature,
    Pressure,
    Humidity,
    Gas,
}

impl Channel {
    fn bit(self) -> u8 {
        1 << self as u8
    }
}

const ALL_CHANNELS: u8 = 0x0F;

/// Physical unit of a [`Phydat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Unit {
    Celsius,
    Pascal,
    Percent,
    Ohm,
}

/// A single value in registry format: `value * 10^scale` in `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Phydat {
    pub value: i16,
    pub unit: Unit,
    pub scale: i8,
}

impl Phydat {
    /// Extracts `channel` from `reading`.
    ///
    /// Returns `None` for [`Channel::Gas`] when the reading carries no gas value.
    ///
    /// ```rust
    /// use bme680_compensation::{CompensatedReading, GasResistance, Temperature};
    /// use bme680_compensation::registry::{Channel, Phydat, Unit};
    ///
    /// let reading = CompensatedReading {
    ///     temperature: Temperature(2617),
    ///     gas_resistance: Some(GasResistance(504031)),
    ///     ..Default::default()
    /// };
    ///
    /// let temp = Phydat::from_reading(&reading, Channel::Temperature).unwrap();
    /// assert_eq!((temp.value, temp.unit, temp.scale), (2617, Unit::Celsius, -2));
    ///
    /// let gas = Phydat::from_reading(&reading, Channel::Gas).unwrap();
    /// assert_eq!((gas.value, gas.unit, gas.scale), (504, Unit::Ohm, 3));
    /// ```
    pub fn from_reading(reading: &CompensatedReading, channel: Channel) -> Option<Self> {
        let phydat = match channel {
            Channel::Temperature => Phydat {
                value: saturate(reading.temperature.0 as i64),
                unit: Unit::Celsius,
                scale: -2,
            },
            Channel::Pressure => Phydat {
                value: saturate((reading.pressure.0 / 100) as i64),
                unit: Unit::Pascal,
                scale: 2,
            },
            Channel::Humidity => Phydat {
                value: saturate((reading.humidity.0 / 10) as i64),
                unit: Unit::Percent,
                scale: -2,
            },
            Channel::Gas => {
                let ohm = reading.gas_resistance?.0;
                if ohm > i16::MAX as u32 {
                    Phydat {
                        value: saturate((ohm / 1000) as i64),
                        unit: Unit::Ohm,
                        scale: 3,
                    }
                } else {
                    Phydat {
                        value: ohm as i16,
                        unit: Unit::Ohm,
                        scale: 0,
                    }
                }
            }
        };

        Some(phydat)
    }
}

fn saturate(value: i64) -> i16 {
    value.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError<E> {
    /// No device is registered under the key.
    #[error("no device registered under this key")]
    UnknownDevice,
    /// The registry has no free slot left.
    #[error("registry is full")]
    Full,
    /// The last measurement did not produce a gas value.
    #[error("no gas value in the last measurement")]
    NoGasValue,
    /// The sensor failed to measure.
    #[error("measurement failed")]
    Sensor(E),
}

struct Entry<S> {
    sensor: S,
    reading: CompensatedReading,
    /// Channels of `reading` that have not been handed out yet.
    fresh: u8,
}

/// Fixed-capacity registry of sensors keyed by device identity.
///
/// `N` must be a power of two.
pub struct Registry<K, S, const N: usize> {
    devices: FnvIndexMap<K, Entry<S>, N>,
}

impl<K, S, const N: usize> Default for Registry<K, S, N>
where
    K: Eq + Hash,
    S: Measure,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S, const N: usize> Registry<K, S, N>
where
    K: Eq + Hash,
    S: Measure,
{
    pub fn new() -> Self {
        Registry {
            devices: FnvIndexMap::new(),
        }
    }

    /// Adds `sensor` under `key`, returning the sensor it replaces.
    pub fn register(&mut self, key: K, sensor: S) -> Result<Option<S>, RegistryError<S::Error>> {
        let entry = Entry {
            sensor,
            reading: CompensatedReading::default(),
            fresh: 0,
        };

        match self.devices.insert(key, entry) {
            Ok(previous) => Ok(previous.map(|entry| entry.sensor)),
            Err(_) => {
                warn!("registry full");
                Err(RegistryError::Full)
            }
        }
    }

    /// Removes the device under `key` and hands its sensor back.
    pub fn remove(&mut self, key: &K) -> Option<S> {
        self.devices.swap_remove(key).map(|entry| entry.sensor)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.devices.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Reads one channel of the device under `key`.
    ///
    /// The channel is served from the cached reading if it has not been read
    /// since the last measurement. Otherwise a new measurement refreshes all
    /// channels first.
    pub fn read<D: DelayNs>(
        &mut self,
        key: &K,
        channel: Channel,
        delay: &mut D,
    ) -> Result<Phydat, RegistryError<S::Error>> {
        let entry = self
            .devices
            .get_mut(key)
            .ok_or(RegistryError::UnknownDevice)?;

        if entry.fresh & channel.bit() == 0 {
            entry.reading = entry.sensor.measure(delay).map_err(RegistryError::Sensor)?;
            entry.fresh = ALL_CHANNELS;
        }
        entry.fresh &= !channel.bit();

        Phydat::from_reading(&entry.reading, channel).ok_or(RegistryError::NoGasValue)
    }
}
