use crate::common::{Geometry, I2C_ADDRESS, Rotation};
use crate::display::Display;
use crate::display_driver::{Controller, WritePolicy};
use crate::frame::Conversion;
pub use crate::error::{Error, OledResult};
use crate::transport::{BusTransport, I2cTransport, SpiTransport};
use linux_embedded_hal::{
    CdevPin, Delay, I2cdev, SpidevBus,
    gpio_cdev::{Chip, LineRequestFlags},
    spidev::{SpiModeFlags, SpidevOptions},
};
use log::{info, warn};

const DEFAULT_SPI_BUS_PATH: &str = "/dev/spidev0.0";
const DEFAULT_SPI_BITS_PER_WORD: u8 = 8;
const DEFAULT_SPI_MAX_SPEED_HZ: u32 = 10_000_000;
const DEFAULT_GPIO_CHIP_PATH: &str = "/dev/gpiochip0";
const DEFAULT_DC_PIN: u32 = 24;
const DEFAULT_RST_PIN: u32 = 25;
const DEFAULT_I2C_BUS_PATH: &str = "/dev/i2c-1";
const DEFAULT_BUS: BusKind = BusKind::Spi;
const DEFAULT_WRITE_POLICY: WritePolicy = WritePolicy::InvertedPerByte;
const DEFAULT_ROTATION: Rotation = Rotation::Deg0;

const OLED_DC_CONSUMER: &str = "oled-dc";
const OLED_RST_CONSUMER: &str = "oled-rst";
const OLED_CS_CONSUMER: &str = "oled-cs";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusKind {
    Spi,
    I2c,
}

#[derive(Default)]
pub struct DeviceConfig {
    pub bus: Option<BusKind>,
    pub spi_bus_path: Option<String>,
    pub spi_options: Option<SpidevOptions>,
    pub gpio_chip_path: Option<String>,
    pub dc_pin: Option<u32>,
    pub rst_pin: Option<u32>,
    /// Software chip select, held active while the device is open. Leave
    /// unset when the spidev node drives chip select itself.
    pub cs_pin: Option<u32>,
    pub i2c_bus_path: Option<String>,
    pub i2c_address: Option<u8>,
    pub write_policy: Option<WritePolicy>,
    pub rotation: Option<Rotation>,
    /// Grey-level reduction used by `Display::update`. Dithering when unset.
    pub conversion: Option<Conversion>,
}

pub type LinuxDisplay = Display<Box<dyn BusTransport>, Delay>;

/// An opened and initialized panel. Dropping it switches the panel off and
/// releases the bus and pins.
pub struct Device {
    pub display: LinuxDisplay,
    _cs: Option<CdevPin>,
}

impl Device {
    pub fn new(config: DeviceConfig) -> OledResult<Self> {
        let bus = config.bus.unwrap_or(DEFAULT_BUS);
        let gpio_chip_path = config
            .gpio_chip_path
            .unwrap_or_else(|| DEFAULT_GPIO_CHIP_PATH.to_string());
        let rst_pin = config.rst_pin.unwrap_or(DEFAULT_RST_PIN);
        let policy = config.write_policy.unwrap_or(DEFAULT_WRITE_POLICY);
        let rotation = config.rotation.unwrap_or(DEFAULT_ROTATION);

        info!("Opening OLED device on {bus:?} with {policy:?} writes...");

        let mut chip = Chip::new(gpio_chip_path)?;
        let rst = CdevPin::new(chip.get_line(rst_pin)?.request(
            LineRequestFlags::OUTPUT,
            0,
            OLED_RST_CONSUMER,
        )?)?;

        let mut cs = None;
        let transport: Box<dyn BusTransport> = match bus {
            BusKind::Spi => {
                let spi_bus_path = config
                    .spi_bus_path
                    .unwrap_or_else(|| DEFAULT_SPI_BUS_PATH.to_string());
                let spi_options = config.spi_options.unwrap_or_else(|| {
                    SpidevOptions::new()
                        .bits_per_word(DEFAULT_SPI_BITS_PER_WORD)
                        .max_speed_hz(DEFAULT_SPI_MAX_SPEED_HZ)
                        .mode(SpiModeFlags::SPI_MODE_0)
                        .build()
                });
                let dc_pin = config.dc_pin.unwrap_or(DEFAULT_DC_PIN);

                let mut spi_bus = SpidevBus::open(spi_bus_path)?;
                spi_bus.configure(&spi_options)?;
                let dc = CdevPin::new(chip.get_line(dc_pin)?.request(
                    LineRequestFlags::OUTPUT,
                    0,
                    OLED_DC_CONSUMER,
                )?)?;
                if let Some(cs_pin) = config.cs_pin {
                    // Active low, so requesting it at 0 selects the panel.
                    cs = Some(CdevPin::new(chip.get_line(cs_pin)?.request(
                        LineRequestFlags::OUTPUT,
                        0,
                        OLED_CS_CONSUMER,
                    )?)?);
                }
                Box::new(SpiTransport::new(spi_bus, dc, rst))
            }
            BusKind::I2c => {
                let i2c_bus_path = config
                    .i2c_bus_path
                    .unwrap_or_else(|| DEFAULT_I2C_BUS_PATH.to_string());
                let address = config.i2c_address.unwrap_or(I2C_ADDRESS);
                let i2c_bus = I2cdev::new(i2c_bus_path)?;
                Box::new(I2cTransport::new(i2c_bus, rst, address))
            }
        };

        let mut driver = Controller::new(transport, Delay {}, Geometry::OLED_1IN51, policy);
        driver.set_conversion(config.conversion.unwrap_or_default());
        driver.initialize_or_release()?;
        let display = Display::new(driver, rotation);

        Ok(Self { display, _cs: cs })
    }

    pub fn sleep(&mut self) -> OledResult<()> {
        self.display.driver_mut().sleep()
    }

    pub fn wake(&mut self) -> OledResult<()> {
        self.display.driver_mut().wake()
    }

    /// Closes the device, reporting a failed teardown instead of logging it.
    pub fn close(mut self) -> OledResult<()> {
        self.display.shutdown()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if let Err(e) = self.display.shutdown() {
            warn!("OLED: Teardown failed: {e}");
        }
    }
}
