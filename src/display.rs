//! Display setup for the CO5300 AMOLED panel (466x466, no D/C, 0x02 framing).
//
// SPI2 runs through DMA buffers; the driver itself only sees an
// embedded-hal `SpiDevice`.

use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use esp_hal::{
    dma::{DmaRxBuf, DmaTxBuf},
    dma_buffers,
    gpio::Output,
    spi::master::{Config, Spi, SpiDmaBus},
    spi::Mode,
    time::Rate,
    timer::systimer::{SystemTimer, Unit},
    Blocking,
};

use crate::co5300::{self, Co5300Display, Co5300Error};
use crate::wiring::DisplayPins;

pub type DisplayType<'a> =
    Co5300Display<'a, ExclusiveDevice<SpiDmaBus<'a, Blocking>, Output<'a>, NoDelay>, Output<'a>>;

pub type DisplayError = Co5300Error<
    embedded_hal_bus::spi::DeviceError<esp_hal::spi::Error, core::convert::Infallible>,
    core::convert::Infallible,
>;

/// Milliseconds since boot from the system timer.
pub fn uptime_ms() -> u64 {
    let t = SystemTimer::unit_value(Unit::Unit0);
    t.saturating_mul(1000) / SystemTimer::ticks_per_second()
}

/// Busy-wait delay on the system timer.
pub struct TimerDelay;

impl embedded_hal::delay::DelayNs for TimerDelay {
    fn delay_ns(&mut self, ns: u32) {
        let ticks = (ns as u64 * SystemTimer::ticks_per_second()).div_ceil(1_000_000_000);
        let start = SystemTimer::unit_value(Unit::Unit0);
        while SystemTimer::unit_value(Unit::Unit0).wrapping_sub(start) < ticks {
            core::hint::spin_loop();
        }
    }
}

pub fn setup_display<'a>(
    display_pins: DisplayPins<'a>,
    fb: &'a mut [u16],
) -> Result<DisplayType<'a>, DisplayError> {
    let DisplayPins {
        spi2,
        cs,
        clk,
        do0,
        rst,
        dma_ch0,
    } = display_pins;

    let mut delay = TimerDelay;

    // 40 MHz is known stable, 60 MHz works on most panels
    let spi = Spi::new(
        spi2,
        Config::default()
            .with_frequency(Rate::from_hz(40_000_000))
            .with_mode(Mode::_0),
    )
    .map_err(|e| {
        log::error!("SPI config rejected: {:?}", e);
        Co5300Error::Config
    })?
    .with_sck(clk)
    .with_mosi(do0)
    .with_dma(dma_ch0);

    let (rx_buf, rx_desc, tx_buf, tx_desc) = dma_buffers!(4096, co5300::STAGE_BYTES);
    let rx = DmaRxBuf::new(rx_desc, rx_buf).map_err(|e| {
        log::error!("DMA rx buffer rejected: {:?}", e);
        Co5300Error::Config
    })?;
    let tx = DmaTxBuf::new(tx_desc, tx_buf).map_err(|e| {
        log::error!("DMA tx buffer rejected: {:?}", e);
        Co5300Error::Config
    })?;

    let spi_bus: SpiDmaBus<'_, Blocking> = spi.with_buffers(rx, tx);
    // NoDelay on an exclusive bus never fails
    let spi_dev = ExclusiveDevice::new(spi_bus, cs, NoDelay).map_err(Co5300Error::Gpio)?;

    co5300::new_with_defaults(spi_dev, Some(rst), &mut delay, fb)
}
