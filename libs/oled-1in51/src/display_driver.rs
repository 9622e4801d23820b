use crate::command::{INIT_SEQUENCE, OledCommand};
use crate::common::Geometry;
use crate::error::{Error, OledResult};
use crate::frame::{self, Conversion, Encoded, FrameBuffer, PixelSource};
use crate::transport::{BusTransport, ControlPin};
use embedded_hal::delay::DelayNs;
use log::{debug, info, trace, warn};

pub(crate) const RESET_DELAY_MS: u32 = 100;
pub(crate) const POWER_ON_DELAY_MS: u32 = 100;
pub(crate) const PAGE_SETTLE_DELAY_MS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Ready,
    /// A transfer failed after initialization. `initialize()` recovers.
    Faulted,
}

/// How page data goes out on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WritePolicy {
    /// One data transfer per column, carrying the complement of the frame
    /// byte.
    InvertedPerByte,
    /// One data transfer per page carrying the frame bytes unchanged.
    Bulk,
}

pub struct Controller<T, D> {
    transport: T,
    delay: D,
    geometry: Geometry,
    policy: WritePolicy,
    conversion: Conversion,
    state: State,
    released: bool,
}

impl<T, D> Controller<T, D>
where
    T: BusTransport,
    D: DelayNs,
{
    pub fn new(transport: T, delay: D, geometry: Geometry, policy: WritePolicy) -> Self {
        Self {
            transport,
            delay,
            geometry,
            policy,
            conversion: Conversion::default(),
            state: State::Uninitialized,
            released: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn conversion(&self) -> Conversion {
        self.conversion
    }

    /// Selects how `encode_buffer` reduces grey levels. Dithering by default.
    pub fn set_conversion(&mut self, conversion: Conversion) {
        self.conversion = conversion;
    }

    /// Resets the panel and loads the power-on register setup.
    ///
    /// On failure the controller is left `Uninitialized`.
    pub fn initialize(&mut self) -> OledResult<()> {
        info!("OLED: Initializing display...");
        self.state = State::Uninitialized;
        self.released = false;

        self.reset()?;
        for &byte in INIT_SEQUENCE {
            self.transport.send_command(byte)?;
        }
        self.delay.delay_ms(POWER_ON_DELAY_MS);
        self.transport.send_command(OledCommand::DisplayOn.byte())?;

        self.state = State::Ready;
        info!("OLED: Display initialized");
        Ok(())
    }

    /// Like [`Controller::initialize`], but a failure also releases the
    /// lines, so nothing is left driven when the caller gives up.
    pub(crate) fn initialize_or_release(&mut self) -> OledResult<()> {
        self.initialize().inspect_err(|_| {
            if let Err(e) = self.shutdown() {
                warn!("OLED: Release after failed initialization failed: {e}");
            }
        })
    }

    /// Pulses the reset line. The controller latches reset on the rising
    /// edge, so the order high, low, high is fixed.
    pub fn reset(&mut self) -> OledResult<()> {
        debug!("OLED: Hardware reset starting");
        for level in [true, false, true] {
            self.transport
                .set_pin(ControlPin::Reset, level)
                .inspect_err(|_| self.fault())?;
            self.delay.delay_ms(RESET_DELAY_MS);
        }
        debug!("OLED: Hardware reset complete");
        Ok(())
    }

    /// Packs `image` into a frame. An image of unsupported size still
    /// succeeds with a blank frame; the reason is in
    /// [`Encoded::diagnostic`].
    pub fn encode_buffer<P: PixelSource + ?Sized>(&self, image: &P) -> OledResult<Encoded> {
        self.ensure_ready()?;
        Ok(frame::encode_with(self.geometry, image, self.conversion))
    }

    /// Streams a full frame to the panel, page by page.
    ///
    /// The length is checked before anything is sent.
    pub fn write_buffer(&mut self, buffer: &[u8]) -> OledResult<()> {
        self.ensure_ready()?;
        let expected = self.geometry.buffer_len();
        if buffer.len() != expected {
            return Err(Error::BufferLength {
                expected,
                actual: buffer.len(),
            });
        }

        debug!(
            "OLED: write_buffer() with policy={:?}, buffer_len={}",
            self.policy,
            buffer.len()
        );
        let result = self.send_pages(buffer);
        if result.is_err() {
            self.fault();
        }
        result
    }

    /// Turns every pixel off.
    pub fn clear(&mut self) -> OledResult<()> {
        let blank = FrameBuffer::blank(self.geometry);
        self.write_buffer(blank.as_bytes())
    }

    /// Switches the panel off. Display RAM is kept.
    pub fn sleep(&mut self) -> OledResult<()> {
        self.command(OledCommand::DisplayOff.byte())
    }

    pub fn wake(&mut self) -> OledResult<()> {
        self.command(OledCommand::DisplayOn.byte())
    }

    pub fn set_contrast(&mut self, contrast: u8) -> OledResult<()> {
        self.command(OledCommand::Contrast.byte())?;
        self.command(contrast)
    }

    pub fn set_inverted(&mut self, inverted: bool) -> OledResult<()> {
        let mode = if inverted {
            OledCommand::InverseDisplay
        } else {
            OledCommand::NormalDisplay
        };
        self.command(mode.byte())
    }

    /// Switches the panel off when it is up and puts the lines into their
    /// idle state. Runs at most once per initialization.
    pub fn shutdown(&mut self) -> OledResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        debug!("OLED: Shutting down from state {:?}", self.state);

        let panel_off = if self.state == State::Ready {
            self.transport.send_command(OledCommand::DisplayOff.byte())
        } else {
            Ok(())
        };
        self.state = State::Uninitialized;
        let release = self.transport.release();
        panel_off.and(release)
    }

    fn send_pages(&mut self, buffer: &[u8]) -> OledResult<()> {
        let width = self.geometry.width() as usize;
        for (page, data) in (0u8..).zip(buffer.chunks_exact(width)) {
            self.transport.send_command(OledCommand::page(page))?;
            self.transport
                .send_command(OledCommand::LowColumnAddress.byte())?;
            self.transport
                .send_command(OledCommand::HighColumnAddress.byte())?;
            self.delay.delay_ms(PAGE_SETTLE_DELAY_MS);
            match self.policy {
                WritePolicy::InvertedPerByte => {
                    for &byte in data {
                        self.transport.send_data(&[!byte])?;
                    }
                }
                WritePolicy::Bulk => self.transport.send_data(data)?,
            }
            trace!("OLED: page {page} written");
        }
        Ok(())
    }

    fn command(&mut self, byte: u8) -> OledResult<()> {
        self.ensure_ready()?;
        self.transport
            .send_command(byte)
            .inspect_err(|_| self.fault())
    }

    fn ensure_ready(&self) -> OledResult<()> {
        match self.state {
            State::Ready => Ok(()),
            state => Err(Error::NotReady(state)),
        }
    }

    fn fault(&mut self) {
        if self.state == State::Ready {
            warn!("OLED: Transfer failed, controller faulted");
            self.state = State::Faulted;
        }
    }
}
