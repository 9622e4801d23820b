use crate::error::{Error, OledResult};

pub const WIDTH: u32 = 128;
pub const HEIGHT: u32 = 64;
pub const PAGE_HEIGHT: u32 = 8;
pub const BUFFER_SIZE: usize = (WIDTH as usize / 8) * HEIGHT as usize;

/// Fixed two-wire address of this controller family.
pub const I2C_ADDRESS: u8 = 0x3C;

const MAX_WIDTH: u32 = 128;
const MAX_PAGES: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
}

/// Panel dimensions in pixels. Fixed for the lifetime of a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    width: u32,
    height: u32,
}

impl Geometry {
    pub const OLED_1IN51: Self = Self {
        width: WIDTH,
        height: HEIGHT,
    };

    /// Both sides must be whole multiples of 8, with at most 128 columns and
    /// 8 pages, since page and column addressing cannot reach further.
    pub fn new(width: u32, height: u32) -> OledResult<Self> {
        let width_ok = (PAGE_HEIGHT..=MAX_WIDTH).contains(&width) && width % 8 == 0;
        let height_ok =
            (PAGE_HEIGHT..=MAX_PAGES * PAGE_HEIGHT).contains(&height) && height % PAGE_HEIGHT == 0;
        if width_ok && height_ok {
            Ok(Self { width, height })
        } else {
            Err(Error::InvalidGeometry { width, height })
        }
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn pages(&self) -> u32 {
        self.height / PAGE_HEIGHT
    }

    pub const fn buffer_len(&self) -> usize {
        (self.width as usize / 8) * self.height as usize
    }

    /// Size of a drawing surface that maps onto this panel with `rotation`.
    pub const fn surface_size(&self, rotation: Rotation) -> (u32, u32) {
        match rotation {
            Rotation::Deg0 => (self.width, self.height),
            Rotation::Deg90 => (self.height, self.width),
        }
    }

    /// Works out how an image of `width` x `height` lands on the panel.
    /// A native match wins over the transposed one for square panels.
    pub fn rotation_for(&self, width: u32, height: u32) -> OledResult<Rotation> {
        if (width, height) == (self.width, self.height) {
            Ok(Rotation::Deg0)
        } else if (width, height) == (self.height, self.width) {
            Ok(Rotation::Deg90)
        } else {
            Err(Error::UnsupportedGeometry { width, height })
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::OLED_1IN51
    }
}
