// Minimal CO5300 panel driver (Standard SPI mode, no D/C pin).
// Works with any embedded-hal 1.0 `SpiDevice` and embedded-graphics.
//
// Wiring on Waveshare ESP32-S3 Touch AMOLED 1.43" (CO5300):
//   CS  = GPIO9
//   SCK = GPIO10
//   IO0/MOSI = GPIO11
//   (IO1..IO3 unused in Standard SPI mode)
//   RST = GPIO21
//
// Protocol (Standard SPI):
//   Every write begins with 0x02, then one byte CMD, then N data bytes.
//   Example: [0x02, 0x11] -> Sleep Out
//            [0x02, 0x3A, 0x55] -> Pixel Format = 16bpp (RGB565)
// Geometry: panel is 466 x 466 logical pixels (square).
//
// Drawing only touches the framebuffer and grows a dirty rectangle; `flush`
// pushes that rectangle to the panel once per frame.

use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::*,
    primitives::Rectangle,
};
use embedded_hal::{
    delay::DelayNs,
    digital::OutputPin,
    spi::{Operation, SpiDevice},
};

pub const CO5300_WIDTH: u16 = 466;
pub const CO5300_HEIGHT: u16 = 466;

const CMD_SWRESET: u8 = 0x01;
const CMD_SLPOUT: u8 = 0x11;
const CMD_NORON: u8 = 0x13;
const CMD_DISPON: u8 = 0x29;
const CMD_CASET: u8 = 0x2A;
const CMD_RASET: u8 = 0x2B;
const CMD_RAMWR: u8 = 0x2C;
const CMD_MADCTL: u8 = 0x36;
const CMD_COLMOD: u8 = 0x3A;
const CMD_RAMWRC: u8 = 0x3C;
const CMD_BRIGHTNESS: u8 = 0x51;
const CMD_CTRL_DISPLAY: u8 = 0x53;

// Column offset of the visible area on this panel
const X_OFFSET: u16 = 0x0006;

// Bytes staged per SPI transaction while flushing
pub const STAGE_BYTES: usize = 4096;

/// Error type that wraps SPI and GPIO errors.
#[derive(Debug, PartialEq, Eq)]
pub enum Co5300Error<SpiE, GpioE> {
    Spi(SpiE),
    Gpio(GpioE),
    OutOfBounds,
    // Bus or panel setup rejected before any pixel was sent
    Config,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Dirty {
    x0: u16,
    y0: u16,
    x1: u16,
    y1: u16,
}

impl Dirty {
    fn grow(this: &mut Option<Dirty>, x: u16, y: u16) {
        match this {
            Some(d) => {
                d.x0 = d.x0.min(x);
                d.y0 = d.y0.min(y);
                d.x1 = d.x1.max(x);
                d.y1 = d.y1.max(y);
            }
            None => *this = Some(Dirty { x0: x, y0: y, x1: x, y1: y }),
        }
    }
}

/// A very small CO5300 panel driver speaking the "0x02 + CMD + DATA" SPI framing.
/// No D/C pin is used; CS is handled by the `SpiDevice` implementation.
pub struct Co5300Display<'fb, SPI, RST> {
    spi: SPI,
    rst: Option<RST>,
    w: u16,
    h: u16,
    fb: &'fb mut [u16], // framebuffer storage, RGB565 row-major
    dirty: Option<Dirty>,
    stage: [u8; STAGE_BYTES],
}

type Result<T, SPI, RST> =
    core::result::Result<T, Co5300Error<<SPI as embedded_hal::spi::ErrorType>::Error, <RST as embedded_hal::digital::ErrorType>::Error>>;

impl<'fb, SPI, RST> Co5300Display<'fb, SPI, RST>
where
    SPI: SpiDevice<u8>,
    RST: OutputPin,
{
    /// Create + init the panel. Call once at startup.
    ///
    /// * `spi` - an SPI device with CS control (e.g., `embedded_hal_bus::spi::ExclusiveDevice`)
    /// * `rst` - optional reset pin (recommended to wire)
    /// * `delay` - any `DelayNs` impl
    /// * `fb` - `width * height` pixels of framebuffer
    pub fn new(
        spi: SPI,
        rst: Option<RST>,
        delay: &mut impl DelayNs,
        width: u16,
        height: u16,
        fb: &'fb mut [u16],
    ) -> Result<Self, SPI, RST> {
        if width == 0 || height == 0 {
            return Err(Co5300Error::Config);
        }
        if fb.len() != (width as usize) * (height as usize) {
            return Err(Co5300Error::OutOfBounds);
        }

        let mut this = Self {
            spi,
            rst,
            w: width,
            h: height,
            fb,
            dirty: None,
            stage: [0; STAGE_BYTES],
        };

        // Hard reset sequence
        if let Some(r) = this.rst.as_mut() {
            r.set_high().map_err(Co5300Error::Gpio)?;
            delay.delay_ms(2);
            r.set_low().map_err(Co5300Error::Gpio)?;
            delay.delay_ms(80);
            r.set_high().map_err(Co5300Error::Gpio)?;
            delay.delay_ms(200);
        }

        this.cmd(CMD_SWRESET, &[])?;
        delay.delay_ms(150);
        this.cmd(CMD_SLPOUT, &[])?;
        delay.delay_ms(180);
        this.cmd(CMD_COLMOD, &[0x55])?; // 16bpp
        delay.delay_ms(2);
        this.cmd(0xC4, &[0x80])?; // vendor: SPI mode control
        this.cmd(CMD_NORON, &[])?;
        this.cmd(CMD_CTRL_DISPLAY, &[0x20])?; // brightness control on
        this.cmd(0x63, &[0xFF])?; // vendor: HBM brightness
        this.cmd(CMD_BRIGHTNESS, &[0x00])?;
        this.cmd(CMD_DISPON, &[])?;
        delay.delay_ms(200);
        this.cmd(CMD_BRIGHTNESS, &[0xFF])?;
        this.cmd(CMD_MADCTL, &[0x00])?;

        this.fb.fill(0);
        Ok(this)
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.w
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.h
    }

    /// True if the framebuffer holds pixels not yet sent to the panel.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Framebuffer pixel, for inspection.
    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb565> {
        if x >= self.w || y >= self.h {
            return None;
        }
        Some(RawU16::new(self.fb[y as usize * self.w as usize + x as usize]).into())
    }

    /// Panel brightness, 0 = off, 255 = max.
    pub fn set_brightness(&mut self, level: u8) -> Result<(), SPI, RST> {
        self.cmd(CMD_BRIGHTNESS, &[level])
    }

    /// Send the dirty rectangle to the panel.
    ///
    /// The window is widened to even coordinates; the controller drops odd
    /// starts/ends in this mode.
    pub fn flush(&mut self) -> Result<(), SPI, RST> {
        let Some(d) = self.dirty.take() else {
            return Ok(());
        };

        let x0 = d.x0 & !1;
        let y0 = d.y0 & !1;
        let x1 = (d.x1 | 1).min(self.w - 1);
        let y1 = (d.y1 | 1).min(self.h - 1);
        self.set_window(x0, y0, x1, y1)?;

        let fbw = self.w as usize;
        let mut filled = 0usize;
        let mut first = true;
        for y in y0..=y1 {
            let row = y as usize * fbw;
            for x in x0..=x1 {
                if filled + 2 > STAGE_BYTES {
                    self.write_stage(filled, first)?;
                    first = false;
                    filled = 0;
                }
                let be = self.fb[row + x as usize].to_be_bytes();
                self.stage[filled] = be[0];
                self.stage[filled + 1] = be[1];
                filled += 2;
            }
        }
        self.write_stage(filled, first)
    }

    // ---- Low-level helpers ----

    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), SPI, RST> {
        if x0 > x1 || y0 > y1 || x1 >= self.w || y1 >= self.h {
            return Err(Co5300Error::OutOfBounds);
        }
        let (x0, x1) = (x0 + X_OFFSET, x1 + X_OFFSET);
        let ca = [(x0 >> 8) as u8, x0 as u8, (x1 >> 8) as u8, x1 as u8];
        let ra = [(y0 >> 8) as u8, y0 as u8, (y1 >> 8) as u8, y1 as u8];
        self.cmd(CMD_CASET, &ca)?;
        self.cmd(CMD_RASET, &ra)
    }

    // First chunk starts a RAM write, later chunks continue at the GRAM cursor
    fn write_stage(&mut self, len: usize, first: bool) -> Result<(), SPI, RST> {
        if len == 0 {
            return Ok(());
        }
        let opcode = if first { CMD_RAMWR } else { CMD_RAMWRC };
        let hdr = [0x02, 0x00, opcode, 0x00];
        self.spi
            .transaction(&mut [Operation::Write(&hdr), Operation::Write(&self.stage[..len])])
            .map_err(Co5300Error::Spi)
    }

    fn cmd(&mut self, cmd: u8, data: &[u8]) -> Result<(), SPI, RST> {
        let hdr = [0x02, 0x00, cmd, 0x00];
        let res = if data.is_empty() {
            self.spi.write(&hdr)
        } else {
            self.spi
                .transaction(&mut [Operation::Write(&hdr), Operation::Write(data)])
        };
        res.map_err(Co5300Error::Spi)
    }
}

// -------------------- embedded-graphics integration --------------------
impl<SPI, RST> OriginDimensions for Co5300Display<'_, SPI, RST> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<SPI, RST> DrawTarget for Co5300Display<'_, SPI, RST> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        let (w, h) = (self.w as i32, self.h as i32);
        for Pixel(p, c) in pixels {
            if p.x < 0 || p.y < 0 || p.x >= w || p.y >= h {
                continue;
            }
            self.fb[p.y as usize * self.w as usize + p.x as usize] = c.into_storage();
            Dirty::grow(&mut self.dirty, p.x as u16, p.y as u16);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Rgb565) -> core::result::Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(br) = area.bottom_right() else {
            return Ok(());
        };
        let raw = color.into_storage();
        let fbw = self.w as usize;
        let (x0, x1) = (area.top_left.x as usize, br.x as usize);
        for y in area.top_left.y as usize..=br.y as usize {
            self.fb[y * fbw + x0..=y * fbw + x1].fill(raw);
        }
        Dirty::grow(&mut self.dirty, area.top_left.x as u16, area.top_left.y as u16);
        Dirty::grow(&mut self.dirty, br.x as u16, br.y as u16);
        Ok(())
    }

    fn clear(&mut self, color: Rgb565) -> core::result::Result<(), Self::Error> {
        self.fb.fill(color.into_storage());
        self.dirty = Some(Dirty { x0: 0, y0: 0, x1: self.w - 1, y1: self.h - 1 });
        Ok(())
    }
}

// Convenience builder for the 466x466 panel.
pub fn new_with_defaults<'fb, SPI, RST>(
    spi: SPI,
    rst: Option<RST>,
    delay: &mut impl DelayNs,
    fb: &'fb mut [u16],
) -> Result<Co5300Display<'fb, SPI, RST>, SPI, RST>
where
    SPI: SpiDevice<u8>,
    RST: OutputPin,
{
    Co5300Display::new(spi, rst, delay, CO5300_WIDTH, CO5300_HEIGHT, fb)
}
