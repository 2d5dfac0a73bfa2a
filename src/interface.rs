//! Register transports.
//!
//! The driver owns its interface, so a bus is never shared between two
//! transactions of the same device. Sharing a physical bus between devices is
//! left to `embedded-hal` bus managers.

use embedded_hal::{
    i2c::I2c,
    spi::{Operation, SpiDevice},
};

use crate::regs;

/// Primary I2C address (SDO pulled low).
pub const I2C_ADDR_PRIMARY: u8 = 0x76;
/// Secondary I2C address (SDO pulled high).
pub const I2C_ADDR_SECONDARY: u8 = 0x77;

/// Byte-oriented access to the sensor registers.
pub trait Interface {
    type Error;

    /// Reads `buffer.len()` consecutive registers starting at `reg`.
    fn read_regs(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes a single register.
    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;

    /// Reads a single register.
    fn read_reg(&mut self, reg: u8) -> Result<u8, Self::Error> {
        let mut buffer = [0];
        self.read_regs(reg, &mut buffer)?;
        Ok(buffer[0])
    }
}

/// I2C transport.
#[derive(Debug)]
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        I2cInterface { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Interface for I2cInterface<I2C> {
    type Error = I2C::Error;

    fn read_regs(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[reg], buffer)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[reg, value])
    }
}

/// SPI transport.
///
/// On SPI only 7 address bits are available, so the register space is split
/// into two pages selected by bit 4 of the status register (`0x73`), which is
/// reachable from both pages.
#[derive(Debug)]
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    pub fn new(spi: SPI) -> Self {
        SpiInterface { spi }
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> SpiInterface<SPI> {
    /// Switches to the memory page holding `reg` if it is not selected yet.
    fn select_page(&mut self, reg: u8) -> Result<(), SPI::Error> {
        // page 0 holds 0x80..=0xFF, page 1 holds 0x00..=0x7F
        let page = if (reg & 0x80) != 0 {
            0
        } else {
            regs::SPI_MEM_PAGE_MSK
        };

        let mut status = [0];
        self.spi.transaction(&mut [
            Operation::Write(&[regs::ADDR_STATUS | regs::SPI_READ]),
            Operation::Read(&mut status),
        ])?;

        if (status[0] & regs::SPI_MEM_PAGE_MSK) != page {
            let value = (status[0] & !regs::SPI_MEM_PAGE_MSK) | page;
            self.spi
                .write(&[regs::ADDR_STATUS & regs::SPI_WRITE_MSK, value])?;
        }

        Ok(())
    }
}

impl<SPI: SpiDevice> Interface for SpiInterface<SPI> {
    type Error = SPI::Error;

    fn read_regs(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.select_page(reg)?;
        self.spi.transaction(&mut [
            Operation::Write(&[reg | regs::SPI_READ]),
            Operation::Read(buffer),
        ])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.select_page(reg)?;
        self.spi.write(&[reg & regs::SPI_WRITE_MSK, value])
    }
}
