// Board pin mapping for the Waveshare ESP32-S3 Touch AMOLED 1.43".
//! The following wiring is assumed:
//! - BUTTON (tap) => GPIO7, to GND when pressed (internal pull-up)
//! - CO5300 CS => GPIO9, SCK => GPIO10, IO0 => GPIO11, RST => GPIO21
//! - PCF85063 RTC on I2C0, SDA => GPIO47, SCL => GPIO48

use esp_hal::{
    gpio::{Event, Input, InputConfig, Io, Level, Output, OutputConfig, Pull},
    peripherals::{Peripherals, DMA_CH0, GPIO10, GPIO11, GPIO47, GPIO48, I2C0, SPI2},
};

/// Everything the display backend consumes.
pub struct DisplayPins<'a> {
    pub spi2: SPI2<'a>,
    pub cs: Output<'a>,
    pub clk: GPIO10<'a>,
    pub do0: GPIO11<'a>,
    pub rst: Output<'a>,
    pub dma_ch0: DMA_CH0<'a>,
}

pub struct RtcPins<'a> {
    pub i2c0: I2C0<'a>,
    pub sda: GPIO47<'a>,
    pub scl: GPIO48<'a>,
}

pub struct BoardPins<'a> {
    pub btn: Input<'a>,
    pub display_pins: DisplayPins<'a>,
    pub rtc_pins: RtcPins<'a>,
}

pub fn init_board_pins<'a>(p: Peripherals) -> (Io<'a>, BoardPins<'a>) {
    let io = Io::new(p.IO_MUX);

    let mut btn = Input::new(p.GPIO7, InputConfig::default().with_pull(Pull::Up));
    btn.listen(Event::AnyEdge);

    // do NOT touch GPIO10/11 here, they become SPI SCK/MOSI
    let cs = Output::new(p.GPIO9, Level::High, OutputConfig::default());
    let rst = Output::new(p.GPIO21, Level::High, OutputConfig::default());

    (
        io,
        BoardPins {
            btn,
            display_pins: DisplayPins {
                spi2: p.SPI2,
                cs,
                clk: p.GPIO10,
                do0: p.GPIO11,
                rst,
                dma_ch0: p.DMA_CH0,
            },
            rtc_pins: RtcPins {
                i2c0: p.I2C0,
                sda: p.GPIO47,
                scl: p.GPIO48,
            },
        },
    )
}
