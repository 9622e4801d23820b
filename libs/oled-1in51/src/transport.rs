//! Physical links to the controller.
//!
//! The 4-wire SPI link separates commands from data with the D/C line. The
//! I2C link has no D/C line; every transfer is prefixed with a control byte
//! instead, 0x00 for a command and 0x40 for display data.

use crate::error::{Error, OledResult};
use embedded_hal::digital::{Error as _, OutputPin};
use embedded_hal::i2c::{Error as _, I2c};
use embedded_hal::spi::{Error as _, SpiBus};
use log::trace;

const I2C_COMMAND_CONTROL: u8 = 0x00;
const I2C_DATA_CONTROL: u8 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPin {
    Reset,
    DataCommand,
}

/// Byte-level access to the controller. Every call blocks until the
/// transfer has completed.
pub trait BusTransport {
    fn send_command(&mut self, command: u8) -> OledResult<()>;

    fn send_data(&mut self, data: &[u8]) -> OledResult<()>;

    fn set_pin(&mut self, pin: ControlPin, level: bool) -> OledResult<()>;

    /// Leaves the lines in their idle state before the bus is closed.
    fn release(&mut self) -> OledResult<()> {
        self.set_pin(ControlPin::Reset, false)
    }
}

impl<T: BusTransport + ?Sized> BusTransport for Box<T> {
    fn send_command(&mut self, command: u8) -> OledResult<()> {
        (**self).send_command(command)
    }

    fn send_data(&mut self, data: &[u8]) -> OledResult<()> {
        (**self).send_data(data)
    }

    fn set_pin(&mut self, pin: ControlPin, level: bool) -> OledResult<()> {
        (**self).set_pin(pin, level)
    }

    fn release(&mut self) -> OledResult<()> {
        (**self).release()
    }
}

fn drive<P: OutputPin>(pin: &mut P, level: bool) -> OledResult<()> {
    let result = if level { pin.set_high() } else { pin.set_low() };
    result.map_err(|e| Error::Pin(e.kind()))
}

pub struct SpiTransport<SPI, DC, RST> {
    spi: SPI,
    dc: DC,
    rst: RST,
}

impl<SPI, DC, RST> SpiTransport<SPI, DC, RST>
where
    SPI: SpiBus,
    DC: OutputPin,
    RST: OutputPin,
{
    pub fn new(spi: SPI, dc: DC, rst: RST) -> Self {
        Self { spi, dc, rst }
    }

    // Flushing keeps D/C stable until the last bit has left the controller.
    fn write(&mut self, bytes: &[u8]) -> OledResult<()> {
        self.spi
            .write(bytes)
            .and_then(|()| self.spi.flush())
            .map_err(|e| Error::SpiBus(e.kind()))
    }
}

impl<SPI, DC, RST> BusTransport for SpiTransport<SPI, DC, RST>
where
    SPI: SpiBus,
    DC: OutputPin,
    RST: OutputPin,
{
    fn send_command(&mut self, command: u8) -> OledResult<()> {
        trace!("OLED: SPI command 0x{command:02X}");
        drive(&mut self.dc, false)?;
        self.write(&[command])
    }

    fn send_data(&mut self, data: &[u8]) -> OledResult<()> {
        drive(&mut self.dc, true)?;
        self.write(data)?;
        trace!("OLED: SPI sent {} bytes of data", data.len());
        Ok(())
    }

    fn set_pin(&mut self, pin: ControlPin, level: bool) -> OledResult<()> {
        match pin {
            ControlPin::Reset => drive(&mut self.rst, level),
            ControlPin::DataCommand => drive(&mut self.dc, level),
        }
    }

    fn release(&mut self) -> OledResult<()> {
        drive(&mut self.rst, false)?;
        drive(&mut self.dc, false)
    }
}

pub struct I2cTransport<I2C, RST> {
    i2c: I2C,
    rst: RST,
    address: u8,
}

impl<I2C, RST> I2cTransport<I2C, RST>
where
    I2C: I2c,
    RST: OutputPin,
{
    pub fn new(i2c: I2C, rst: RST, address: u8) -> Self {
        Self { i2c, rst, address }
    }

    fn write(&mut self, control: u8, byte: u8) -> OledResult<()> {
        self.i2c
            .write(self.address, &[control, byte])
            .map_err(|e| Error::I2cBus(e.kind()))
    }
}

impl<I2C, RST> BusTransport for I2cTransport<I2C, RST>
where
    I2C: I2c,
    RST: OutputPin,
{
    fn send_command(&mut self, command: u8) -> OledResult<()> {
        trace!("OLED: I2C command 0x{command:02X}");
        self.write(I2C_COMMAND_CONTROL, command)
    }

    fn send_data(&mut self, data: &[u8]) -> OledResult<()> {
        for &byte in data {
            self.write(I2C_DATA_CONTROL, byte)?;
        }
        trace!("OLED: I2C sent {} bytes of data", data.len());
        Ok(())
    }

    fn set_pin(&mut self, pin: ControlPin, level: bool) -> OledResult<()> {
        match pin {
            ControlPin::Reset => drive(&mut self.rst, level),
            // Command/data selection rides on the control byte.
            ControlPin::DataCommand => Ok(()),
        }
    }
}
