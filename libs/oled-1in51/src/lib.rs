pub mod command;
pub mod common;
pub mod device;
pub mod display;
pub mod display_driver;
mod error;
pub mod frame;
pub mod transport;

pub use common::{BUFFER_SIZE, Geometry, HEIGHT, I2C_ADDRESS, Rotation, WIDTH};
pub use device::{BusKind, Device, DeviceConfig};
pub use display::Display;
pub use display_driver::{Controller, State, WritePolicy};
pub use error::{Error, ErrorKind, OledResult};
pub use frame::{Canvas, Conversion, Encoded, FrameBuffer, LumaImage, PixelSource};
pub use transport::{BusTransport, ControlPin, I2cTransport, SpiTransport};
