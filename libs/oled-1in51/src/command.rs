//! Command set of the 1.51" OLED controller.
//!
//! Every byte here travels on the command channel, including the parameter
//! bytes that follow opcodes such as `Contrast` or `MultiplexRatio`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OledCommand {
    /// Lower nibble of the column start address (0x00-0x0F).
    LowColumnAddress = 0x00,
    /// Upper nibble of the column start address (0x10-0x1F).
    HighColumnAddress = 0x10,
    Contrast = 0x81,
    SegmentRemap = 0xA1,
    NormalDisplay = 0xA6,
    InverseDisplay = 0xA7,
    MultiplexRatio = 0xA8,
    DisplayOff = 0xAE,
    DisplayOn = 0xAF,
    /// Page address; the page number is added to the opcode.
    PageAddress = 0xB0,
    ComScanReverse = 0xC8,
    DisplayOffset = 0xD3,
    ClockDivide = 0xD5,
    PreChargePeriod = 0xD9,
    ComPins = 0xDA,
    VcomhLevel = 0xDB,
}

impl OledCommand {
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Opcode selecting `page` as the target of the next data write.
    pub const fn page(page: u8) -> u8 {
        OledCommand::PageAddress as u8 + page
    }
}

pub(crate) const CONTRAST_DEFAULT: u8 = 0xCF;
pub(crate) const MULTIPLEX_64: u8 = 0x3F;
pub(crate) const NO_DISPLAY_OFFSET: u8 = 0x00;
pub(crate) const CLOCK_DIVIDE_DEFAULT: u8 = 0x80;
pub(crate) const PRE_CHARGE_DEFAULT: u8 = 0xF1;
pub(crate) const COM_PINS_ALTERNATIVE: u8 = 0x12;
pub(crate) const VCOMH_DEFAULT: u8 = 0x40;

/// Power-on register setup, sent in order after the reset pulse.
///
/// The final `DisplayOn` is issued separately so the controller can insert
/// its settle delay first.
pub const INIT_SEQUENCE: &[u8] = &[
    OledCommand::DisplayOff.byte(),
    OledCommand::LowColumnAddress.byte(),
    OledCommand::HighColumnAddress.byte(),
    OledCommand::page(0),
    OledCommand::Contrast.byte(),
    CONTRAST_DEFAULT,
    OledCommand::SegmentRemap.byte(),
    OledCommand::ComScanReverse.byte(),
    OledCommand::NormalDisplay.byte(),
    OledCommand::MultiplexRatio.byte(),
    MULTIPLEX_64,
    OledCommand::DisplayOffset.byte(),
    NO_DISPLAY_OFFSET,
    OledCommand::ClockDivide.byte(),
    CLOCK_DIVIDE_DEFAULT,
    OledCommand::PreChargePeriod.byte(),
    PRE_CHARGE_DEFAULT,
    OledCommand::ComPins.byte(),
    COM_PINS_ALTERNATIVE,
    OledCommand::VcomhLevel.byte(),
    VCOMH_DEFAULT,
];
