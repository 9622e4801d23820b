//! Conversion of images into the controller's page-addressed frame layout.
//!
//! The panel memory is split into pages of 8 rows. Byte `page * width + column`
//! holds one column of a page, bit `b` being row `page * 8 + b`. A cleared bit
//! lights the pixel.

use crate::common::{Geometry, PAGE_HEIGHT, Rotation};
use crate::error::{Error, OledResult};
use core::convert::Infallible;
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::{DrawTarget, OriginDimensions, Pixel, Size},
};
use log::warn;

/// Samples below this luminance count as set (lit on the panel) once any
/// diffused error has been added.
pub const LUMA_THRESHOLD: u8 = 0x80;

const LUMA_LIT: u8 = 0x00;
const LUMA_DARK: u8 = 0xFF;
const BLANK_BYTE: u8 = 0xFF;

/// A monochrome-sampleable image.
pub trait PixelSource {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Luminance of the pixel at `(x, y)`, 0 being black.
    fn luma(&self, x: u32, y: u32) -> u8;
}

/// How grey levels are reduced to one bit per pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Conversion {
    /// Floyd-Steinberg error diffusion, as PIL's `convert('1')` does.
    #[default]
    Dither,
    /// Plain cut at [`LUMA_THRESHOLD`].
    Threshold,
}

/// Row-major set flags for every pixel of `image`.
fn monochrome<P: PixelSource + ?Sized>(image: &P, conversion: Conversion) -> Vec<bool> {
    let (width, height) = image.dimensions();
    let width = width as usize;
    let threshold = i32::from(LUMA_THRESHOLD);
    let mut set = Vec::with_capacity(width * height as usize);

    // Error rows are padded by one slot on each side.
    let mut current = vec![0i32; width + 2];
    let mut next = vec![0i32; width + 2];
    for y in 0..height {
        for x in 0..width {
            let luma = i32::from(image.luma(x as u32, y));
            if conversion == Conversion::Threshold {
                set.push(luma < threshold);
                continue;
            }
            let value = (luma + current[x + 1]).clamp(0, 255);
            let lit = value < threshold;
            let error = if lit { value } else { value - 255 };
            set.push(lit);
            current[x + 2] += error * 7 / 16;
            next[x] += error * 3 / 16;
            next[x + 1] += error * 5 / 16;
            next[x + 2] += error / 16;
        }
        core::mem::swap(&mut current, &mut next);
        next.fill(0);
    }
    set
}

/// Row-major 8-bit luminance pixels borrowed from the caller.
pub struct LumaImage<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> LumaImage<'a> {
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> OledResult<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

impl PixelSource for LumaImage<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn luma(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

/// An in-memory drawing surface for embedded-graphics.
///
/// `BinaryColor::On` is a lit pixel.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Box<[u8]>,
}

impl Canvas {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = vec![LUMA_DARK; width as usize * height as usize].into_boxed_slice();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A canvas covering `geometry` when viewed with `rotation`.
    #[must_use]
    pub fn for_panel(geometry: Geometry, rotation: Rotation) -> Self {
        let (width, height) = geometry.surface_size(rotation);
        Self::new(width, height)
    }
}

impl PixelSource for Canvas {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn luma(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(coord.x), u32::try_from(coord.y)) else {
                continue;
            };
            if x >= self.width || y >= self.height {
                continue;
            }
            let index = y as usize * self.width as usize + x as usize;
            self.pixels[index] = if color.is_on() { LUMA_LIT } else { LUMA_DARK };
        }
        Ok(())
    }

    fn clear(&mut self, color: BinaryColor) -> Result<(), Self::Error> {
        self.pixels
            .fill(if color.is_on() { LUMA_LIT } else { LUMA_DARK });
        Ok(())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// One encoded frame, exactly `geometry.buffer_len()` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    geometry: Geometry,
    bytes: Box<[u8]>,
}

impl FrameBuffer {
    /// A frame with every pixel off.
    #[must_use]
    pub fn blank(geometry: Geometry) -> Self {
        Self {
            geometry,
            bytes: vec![BLANK_BYTE; geometry.buffer_len()].into_boxed_slice(),
        }
    }

    pub fn from_bytes(geometry: Geometry, bytes: Vec<u8>) -> OledResult<Self> {
        if bytes.len() != geometry.buffer_len() {
            return Err(Error::BufferLength {
                expected: geometry.buffer_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self {
            geometry,
            bytes: bytes.into_boxed_slice(),
        })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The `width` bytes making up `page`, or `None` past the last page.
    pub fn page(&self, page: u32) -> Option<&[u8]> {
        if page >= self.geometry.pages() {
            return None;
        }
        let width = self.geometry.width() as usize;
        let start = page as usize * width;
        Some(&self.bytes[start..start + width])
    }

    /// Whether the pixel at `column`, `row` in panel coordinates is lit, or
    /// `None` outside the panel.
    pub fn is_lit(&self, column: u32, row: u32) -> Option<bool> {
        if column >= self.geometry.width() || row >= self.geometry.height() {
            return None;
        }
        let index = column as usize + (row / PAGE_HEIGHT) as usize * self.geometry.width() as usize;
        Some(self.bytes[index] & (1 << (row % PAGE_HEIGHT)) == 0)
    }

    fn light(&mut self, index: usize, bit: u32) {
        self.bytes[index] &= !(1 << bit);
    }
}

impl AsRef<[u8]> for FrameBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// An encoded frame plus the non-fatal problem met while encoding, if any.
#[derive(Debug)]
pub struct Encoded {
    frame: FrameBuffer,
    diagnostic: Option<Error>,
}

impl Encoded {
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn into_frame(self) -> FrameBuffer {
        self.frame
    }

    /// `Some(Error::UnsupportedGeometry)` when the image fit neither
    /// orientation and the frame was left blank.
    pub fn diagnostic(&self) -> Option<&Error> {
        self.diagnostic.as_ref()
    }
}

impl AsRef<[u8]> for Encoded {
    fn as_ref(&self) -> &[u8] {
        self.frame.as_bytes()
    }
}

/// Packs `image` into the panel layout with dithering.
pub fn encode<P: PixelSource + ?Sized>(geometry: Geometry, image: &P) -> Encoded {
    encode_with(geometry, image, Conversion::default())
}

/// Packs `image` into the panel layout.
///
/// A transposed image (`height` x `width`) is rotated onto the panel. Its
/// row bit is taken from the source row rather than the rotated one, which
/// matches how this panel has always been fed. An image matching
/// neither orientation produces a blank frame and a diagnostic.
pub fn encode_with<P: PixelSource + ?Sized>(
    geometry: Geometry,
    image: &P,
    conversion: Conversion,
) -> Encoded {
    let mut frame = FrameBuffer::blank(geometry);
    let (image_width, image_height) = image.dimensions();
    let width = geometry.width() as usize;

    let rotation = match geometry.rotation_for(image_width, image_height) {
        Ok(rotation) => rotation,
        Err(e) => {
            warn!("OLED: {e}, frame left blank");
            return Encoded {
                frame,
                diagnostic: Some(e),
            };
        }
    };

    let set = monochrome(image, conversion);
    for y in 0..image_height {
        for x in 0..image_width {
            if !set[y as usize * image_width as usize + x as usize] {
                continue;
            }
            let index = match rotation {
                Rotation::Deg0 => x as usize + (y / PAGE_HEIGHT) as usize * width,
                Rotation::Deg90 => {
                    let new_x = y;
                    let new_y = geometry.height() - x - 1;
                    new_x as usize + (new_y / PAGE_HEIGHT) as usize * width
                }
            };
            frame.light(index, y % PAGE_HEIGHT);
        }
    }

    Encoded {
        frame,
        diagnostic: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{BUFFER_SIZE, HEIGHT, WIDTH};
    use embedded_graphics::{
        Drawable,
        prelude::{Point, Primitive},
        primitives::{PrimitiveStyle, Rectangle},
    };

    fn solid(width: u32, height: u32, luma: u8) -> Vec<u8> {
        vec![luma; width as usize * height as usize]
    }

    fn encode_luma(width: u32, height: u32, pixels: &[u8]) -> Encoded {
        let image = LumaImage::new(width, height, pixels).unwrap();
        encode(Geometry::OLED_1IN51, &image)
    }

    fn lit_count(frame: &FrameBuffer) -> usize {
        (0..HEIGHT)
            .flat_map(|row| (0..WIDTH).map(move |column| (column, row)))
            .filter(|&(column, row)| frame.is_lit(column, row) == Some(true))
            .count()
    }

    #[test]
    fn test_white_image_is_blank() {
        let encoded = encode_luma(WIDTH, HEIGHT, &solid(WIDTH, HEIGHT, 0xFF));
        assert_eq!(encoded.frame(), &FrameBuffer::blank(Geometry::OLED_1IN51));
        assert!(encoded.diagnostic().is_none());
    }

    #[test]
    fn test_black_image_clears_every_bit() {
        let encoded = encode_luma(WIDTH, HEIGHT, &solid(WIDTH, HEIGHT, 0x00));
        assert_eq!(encoded.as_ref().len(), BUFFER_SIZE);
        assert!(encoded.as_ref().iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_black_transposed_image_lights_column_bit_only() {
        // The row bit comes from the source row, which is the panel column,
        // so column `c` only ever has bit `c % 8` cleared.
        let encoded = encode_luma(HEIGHT, WIDTH, &solid(HEIGHT, WIDTH, 0x00));
        let frame = encoded.frame();
        for page in 0..8 {
            for (column, &byte) in frame.page(page).unwrap().iter().enumerate() {
                assert_eq!(byte, !(1u8 << (column % 8)), "page {page} column {column}");
            }
        }
        assert!(encoded.diagnostic().is_none());
    }

    #[test]
    fn test_mismatched_size_is_left_blank_with_diagnostic() {
        let encoded = encode_luma(100, 50, &solid(100, 50, 0x00));
        assert!(matches!(
            encoded.diagnostic(),
            Some(Error::UnsupportedGeometry {
                width: 100,
                height: 50
            })
        ));
        assert_eq!(
            encoded.into_frame(),
            FrameBuffer::blank(Geometry::OLED_1IN51)
        );
    }

    #[test]
    fn test_single_pixel_position() {
        let mut pixels = solid(WIDTH, HEIGHT, 0xFF);
        // x = 5, y = 19: page 2, bit 3
        pixels[19 * WIDTH as usize + 5] = 0;
        let encoded = encode_luma(WIDTH, HEIGHT, &pixels);
        let frame = encoded.frame();

        let index = 5 + 2 * WIDTH as usize;
        assert_eq!(frame.as_bytes()[index], !(1 << 3));
        assert_eq!(
            frame.as_bytes().iter().filter(|&&b| b != 0xFF).count(),
            1
        );
        assert_eq!(frame.is_lit(5, 19), Some(true));
        assert_eq!(frame.is_lit(5, 18), Some(false));
    }

    #[test]
    fn test_transposed_pixel_keeps_source_row_bit() {
        // Source is 64 wide, 128 tall. Pixel (x = 10, y = 3) maps to panel
        // column 3, panel row 53 (page 6), but keeps bit 3 from the source row.
        let mut pixels = solid(HEIGHT, WIDTH, 0xFF);
        pixels[3 * HEIGHT as usize + 10] = 0;
        let encoded = encode_luma(HEIGHT, WIDTH, &pixels);
        let frame = encoded.frame();

        let index = 3 + 6 * WIDTH as usize;
        assert_eq!(frame.as_bytes()[index], !(1 << 3));
        assert_eq!(
            frame.as_bytes().iter().filter(|&&b| b != 0xFF).count(),
            1
        );
    }

    #[test]
    fn test_threshold_conversion() {
        let mut pixels = solid(WIDTH, HEIGHT, 0xFF);
        pixels[0] = 0x7F;
        pixels[1] = 0x80;
        let image = LumaImage::new(WIDTH, HEIGHT, &pixels).unwrap();
        let encoded = encode_with(Geometry::OLED_1IN51, &image, Conversion::Threshold);
        assert_eq!(encoded.frame().is_lit(0, 0), Some(true));
        assert_eq!(encoded.frame().is_lit(1, 0), Some(false));
    }

    #[test]
    fn test_threshold_cuts_uniform_grey() {
        let lighter = solid(WIDTH, HEIGHT, 0x80);
        let image = LumaImage::new(WIDTH, HEIGHT, &lighter).unwrap();
        let encoded = encode_with(Geometry::OLED_1IN51, &image, Conversion::Threshold);
        assert_eq!(lit_count(encoded.frame()), 0);

        let darker = solid(WIDTH, HEIGHT, 0x7F);
        let image = LumaImage::new(WIDTH, HEIGHT, &darker).unwrap();
        let encoded = encode_with(Geometry::OLED_1IN51, &image, Conversion::Threshold);
        assert_eq!(lit_count(encoded.frame()), 8192);
    }

    #[test]
    fn test_dither_spreads_mid_grey() {
        for luma in [0x7F, 0x80] {
            let encoded = encode_luma(WIDTH, HEIGHT, &solid(WIDTH, HEIGHT, luma));
            let lit = lit_count(encoded.frame());
            assert!(
                (3000..=5200).contains(&lit),
                "luma 0x{luma:02X} lit {lit} of 8192"
            );
        }
    }

    #[test]
    fn test_dither_darker_grey_lights_more() {
        let dark = encode_luma(WIDTH, HEIGHT, &solid(WIDTH, HEIGHT, 0x40));
        let light = encode_luma(WIDTH, HEIGHT, &solid(WIDTH, HEIGHT, 0xC0));
        let dark_lit = lit_count(dark.frame());
        let light_lit = lit_count(light.frame());
        assert!(dark_lit > 8192 / 2, "dark lit {dark_lit}");
        assert!(light_lit < 8192 / 2, "light lit {light_lit}");
    }

    #[test]
    fn test_luma_image_rejects_wrong_length() {
        let pixels = [0u8; 10];
        assert!(matches!(
            LumaImage::new(4, 4, &pixels),
            Err(Error::BufferLength {
                expected: 16,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_frame_from_bytes_checks_length() {
        let geometry = Geometry::OLED_1IN51;
        assert!(FrameBuffer::from_bytes(geometry, vec![0; BUFFER_SIZE]).is_ok());
        assert!(matches!(
            FrameBuffer::from_bytes(geometry, vec![0; 3]),
            Err(Error::BufferLength { actual: 3, .. })
        ));
    }

    #[test]
    fn test_page_slices() {
        let geometry = Geometry::OLED_1IN51;
        let mut bytes = vec![0xFF; BUFFER_SIZE];
        bytes[WIDTH as usize * 7] = 0x00;
        let frame = FrameBuffer::from_bytes(geometry, bytes).unwrap();
        let last = frame.page(7).unwrap();
        assert_eq!(last.len(), WIDTH as usize);
        assert_eq!(last[0], 0x00);
        assert!(frame.page(0).unwrap().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_accessors_outside_panel() {
        let frame = FrameBuffer::blank(Geometry::OLED_1IN51);
        assert!(frame.page(8).is_none());
        assert!(frame.page(u32::MAX).is_none());
        assert_eq!(frame.is_lit(WIDTH, 0), None);
        assert_eq!(frame.is_lit(0, HEIGHT), None);
        assert_eq!(frame.is_lit(WIDTH - 1, HEIGHT - 1), Some(false));
    }

    #[test]
    fn test_canvas_drawing_is_encoded() {
        let mut canvas = Canvas::for_panel(Geometry::OLED_1IN51, Rotation::Deg0);
        Rectangle::new(Point::new(0, 0), Size::new(WIDTH, 8))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut canvas)
            .unwrap();
        // Off the canvas, ignored.
        canvas
            .draw_iter([Pixel(Point::new(-1, 0), BinaryColor::On)])
            .unwrap();
        canvas
            .draw_iter([Pixel(Point::new(0, 64), BinaryColor::On)])
            .unwrap();

        let encoded = encode(Geometry::OLED_1IN51, &canvas);
        let frame = encoded.frame();
        assert!(frame.page(0).unwrap().iter().all(|&b| b == 0x00));
        assert!((1..8).all(|p| frame.page(p).unwrap().iter().all(|&b| b == 0xFF)));
    }

    #[test]
    fn test_canvas_clear() {
        let mut canvas = Canvas::new(8, 8);
        canvas.clear(BinaryColor::On).unwrap();
        assert_eq!(canvas.luma(7, 7), 0x00);
        canvas.clear(BinaryColor::Off).unwrap();
        assert_eq!(canvas.luma(7, 7), 0xFF);
        assert_eq!(canvas.size(), Size::new(8, 8));
    }
}
