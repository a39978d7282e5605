//! Googly-eyes watch face firmware
//! ========================================
//! needs to be run in WSL2 terminal
//! source ~/export-esp.sh
//! cargo run --release --features firmware
//! ========================================
//!
//! The button stands in for the touch screen: a short press toggles the
//! closed-eyes glyph. After a minute without input the face goes ambient.

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

esp_bootloader_esp_idf::esp_app_desc!();

use esp_backtrace as _;
use esp_hal::{
    handler,
    i2c::master::{Config as I2cConfig, I2c},
    main, psram, ram,
    time::Rate,
    Config,
};

use embedded_graphics::prelude::Dimensions;
use embedded_hal::delay::DelayNs;

use googly_watchface::{
    clock::{MinuteTicker, SoftClock},
    display::{setup_display, uptime_ms, DisplayType, TimerDelay},
    input::{handle_button_generic, AmbientTimer, ButtonState},
    rtc_pcf85063::{Pcf85063, RtcError},
    wiring::{init_board_pins, BoardPins, RtcPins},
    TimeZone, WallClock, WatchFaceEvents, WatchFaceHost, WatchFaceRenderer, WatchFaceStyle,
};

// Allocator for PSRAM
extern crate alloc;
use alloc::{boxed::Box, vec};

const DEBOUNCE_MS: u64 = 40;
const LONG_PRESS_MS: u64 = 600;
const AMBIENT_AFTER_MS: u64 = 60_000;
const ACTIVE_BRIGHTNESS: u8 = 0xFF;
const AMBIENT_BRIGHTNESS: u8 = 0x30;
// No network time on this board; the RTC holds local time
const LOCAL_ZONE: TimeZone = TimeZone::UTC;

static BUTTON: ButtonState<'static> = ButtonState::new("Button", DEBOUNCE_MS, LONG_PRESS_MS);

// Interrupt handler
#[handler]
#[ram]
fn handler() {
    handle_button_generic(&BUTTON, uptime_ms());
}

/// Main-loop side of the host seam: a redraw flag and a fixed zone.
struct FirmwareHost {
    redraw: bool,
    zone: TimeZone,
}

impl WatchFaceHost for FirmwareHost {
    fn invalidate(&mut self) {
        self.redraw = true;
    }

    fn register_time_zone_listener(&mut self) {
        log::info!("time-zone listener registered");
    }

    fn unregister_time_zone_listener(&mut self) {
        log::info!("time-zone listener unregistered");
    }

    fn default_time_zone(&self) -> TimeZone {
        self.zone
    }

    fn set_watch_face_style(&mut self, style: WatchFaceStyle) {
        log::info!("style: taps={} protection={:?}", style.accepts_taps, style.view_protection);
    }
}

// Seed the wall clock from the RTC, falling back to the epoch
fn seed_clock(rtc_pins: RtcPins<'static>) -> SoftClock {
    let RtcPins { i2c0, sda, scl } = rtc_pins;
    let cfg = I2cConfig::default().with_frequency(Rate::from_khz(400));
    let i2c = match I2c::new(i2c0, cfg) {
        Ok(i2c) => i2c.with_sda(sda).with_scl(scl),
        Err(e) => {
            log::error!("I2C init failed: {:?}", e);
            return SoftClock::new(uptime_ms);
        }
    };

    let mut rtc = Pcf85063::new(i2c);
    match rtc.read_unix() {
        Ok(ts) => {
            log::info!("RTC seed {}", ts);
            SoftClock::starting_at(ts, uptime_ms)
        }
        Err(RtcError::IntegrityLost) => {
            log::warn!("RTC oscillator stopped, time not trusted");
            SoftClock::new(uptime_ms)
        }
        Err(e) => {
            log::warn!("RTC read failed: {:?}", e);
            SoftClock::new(uptime_ms)
        }
    }
}

fn set_brightness(display: &mut DisplayType<'static>, level: u8) {
    if let Err(e) = display.set_brightness(level) {
        log::warn!("brightness write failed: {:?}", e);
    }
}

#[main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(Config::default());
    esp_alloc::psram_allocator!(&peripherals.PSRAM, psram);

    let (mut io, pins) = init_board_pins(peripherals);
    let BoardPins {
        btn,
        display_pins,
        rtc_pins,
    } = pins;

    critical_section::with(|cs| {
        BUTTON.input.borrow_ref_mut(cs).replace(btn);
    });
    io.set_interrupt_handler(handler);

    let clock = seed_clock(rtc_pins);

    const W: usize = googly_watchface::co5300::CO5300_WIDTH as usize;
    const H: usize = googly_watchface::co5300::CO5300_HEIGHT as usize;
    let fb: &'static mut [u16] = Box::leak(vec![0u16; W * H].into_boxed_slice());
    let mut display = match setup_display(display_pins, fb) {
        Ok(d) => d,
        Err(e) => panic!("CO5300 init failed: {:?}", e),
    };

    let host = FirmwareHost {
        redraw: true,
        zone: LOCAL_ZONE,
    };
    let mut face = WatchFaceRenderer::new(clock, host);
    face.on_create();
    let size = display.bounding_box().size;
    face.on_surface_changed(size.width, size.height);
    face.on_visibility_changed(true);

    let mut ticker = MinuteTicker::new();
    let mut ambient = AmbientTimer::new(AMBIENT_AFTER_MS, uptime_ms());
    let mut delay = TimerDelay;

    loop {
        let now_ms = uptime_ms();

        while let Some(tap) = BUTTON.take_event() {
            if let Some(false) = ambient.activity(now_ms) {
                face.on_ambient_mode_changed(false);
                set_brightness(&mut display, ACTIVE_BRIGHTNESS);
            }
            face.on_tap_command(tap, W as i32 / 2, H as i32 / 2, now_ms);
        }
        if let Some(tap) = BUTTON.poll(now_ms) {
            face.on_tap_command(tap, W as i32 / 2, H as i32 / 2, now_ms);
        }

        if let Some(true) = ambient.poll(now_ms) {
            face.on_ambient_mode_changed(true);
            set_brightness(&mut display, AMBIENT_BRIGHTNESS);
        }

        let unix = face.clock_mut().unix_seconds();
        if ticker.poll(unix) {
            face.on_time_tick();
        }

        if face.host().redraw {
            face.host_mut().redraw = false;
            match face.draw(&mut display) {
                Ok(reading) => log::debug!("frame {:02}:{:02}", reading.hour, reading.minute),
                Err(e) => log::error!("draw failed: {:?}", e),
            }
            if let Err(e) = display.flush() {
                log::error!("flush failed: {:?}", e);
            }
        }

        delay.delay_ms(20);
    }
}
