use crate::display_driver::State;
use linux_embedded_hal::CdevPinError;
use linux_embedded_hal::SPIError;
use linux_embedded_hal::gpio_cdev::Error as GpioError;
use linux_embedded_hal::i2cdev::linux::LinuxI2CError;
use std::io::Error as IoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] IoError),
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
    #[error("Cdev pin error: {0}")]
    CdevPin(#[from] CdevPinError),
    #[error("SPI error: {0}")]
    Spi(#[from] SPIError),
    #[error("I2C error: {0}")]
    I2c(#[from] LinuxI2CError),
    #[error("Unsupported panel geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },
    #[error("SPI transfer failed: {0}")]
    SpiBus(embedded_hal::spi::ErrorKind),
    #[error("I2C transfer failed: {0}")]
    I2cBus(embedded_hal::i2c::ErrorKind),
    #[error("Pin level change failed: {0}")]
    Pin(embedded_hal::digital::ErrorKind),
    #[error("Controller is {0:?}, expected Ready")]
    NotReady(State),
    #[error("Frame buffer is {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
    #[error("Image size {width}x{height} matches neither panel orientation")]
    UnsupportedGeometry { width: u32, height: u32 },
}

/// Coarse classification of [`Error`] by how a caller should react.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bus, pin or geometry could not be set up. Fatal, not retried.
    Configuration,
    /// The call was made in the wrong state or with a malformed buffer.
    Precondition,
    /// Image dimensions fit neither orientation. Non-fatal.
    UnsupportedGeometry,
    /// A transfer on an open bus failed.
    Transport,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_)
            | Error::Gpio(_)
            | Error::CdevPin(_)
            | Error::Spi(_)
            | Error::I2c(_)
            | Error::InvalidGeometry { .. } => ErrorKind::Configuration,
            Error::SpiBus(_) | Error::I2cBus(_) | Error::Pin(_) => ErrorKind::Transport,
            Error::NotReady(_) | Error::BufferLength { .. } => ErrorKind::Precondition,
            Error::UnsupportedGeometry { .. } => ErrorKind::UnsupportedGeometry,
        }
    }
}

pub type OledResult<T> = Result<T, Error>;
