use crate::common::Rotation;
use crate::display_driver::Controller;
use crate::error::OledResult;
use crate::frame::Canvas;
use crate::transport::BusTransport;
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::{DrawTarget, OriginDimensions, Pixel, Size},
};
use embedded_hal::delay::DelayNs;

/// A drawable panel. Drawing goes to an in-memory canvas and reaches the
/// panel on `update()`.
pub struct Display<T, D> {
    driver: Controller<T, D>,
    canvas: Canvas,
    rotation: Rotation,
}

impl<T, D> Display<T, D>
where
    T: BusTransport,
    D: DelayNs,
{
    #[must_use]
    pub fn new(driver: Controller<T, D>, rotation: Rotation) -> Self {
        let canvas = Canvas::for_panel(driver.geometry(), rotation);
        Self {
            driver,
            canvas,
            rotation,
        }
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn driver(&self) -> &Controller<T, D> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Controller<T, D> {
        &mut self.driver
    }

    /// Sends the canvas to the panel.
    pub fn update(&mut self) -> OledResult<()> {
        let encoded = self.driver.encode_buffer(&self.canvas)?;
        self.driver.write_buffer(encoded.frame().as_bytes())
    }

    /// Blanks the panel without touching the canvas.
    pub fn clear_panel(&mut self) -> OledResult<()> {
        self.driver.clear()
    }

    pub(crate) fn shutdown(&mut self) -> OledResult<()> {
        self.driver.shutdown()
    }
}

impl<T, D> DrawTarget for Display<T, D>
where
    T: BusTransport,
    D: DelayNs,
{
    type Color = BinaryColor;
    type Error = crate::error::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let Ok(()) = self.canvas.draw_iter(pixels);
        Ok(())
    }

    fn clear(&mut self, color: BinaryColor) -> Result<(), Self::Error> {
        let Ok(()) = self.canvas.clear(color);
        Ok(())
    }
}

impl<T, D> OriginDimensions for Display<T, D> {
    fn size(&self) -> Size {
        self.canvas.size()
    }
}
