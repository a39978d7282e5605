#![cfg_attr(not(test), no_std)]

pub mod appearance;
pub mod canvas;
pub mod clock;
pub mod co5300;
pub mod config;
pub mod host;
pub mod input;
pub mod layout;
pub mod listener;
pub mod renderer;
pub mod rtc_pcf85063;
pub mod scene;

#[cfg(feature = "firmware")]
pub mod display;
#[cfg(feature = "firmware")]
pub mod wiring;

pub use appearance::{derive_appearance, AppearanceState, PaintColor, PaintDescriptor, PaintStyle, Paints};
pub use clock::{ClockReading, SoftClock, TimeZone, WallClock};
pub use config::FaceConfig;
pub use host::{InterruptionFilter, SurfaceProperties, TapType, WatchFaceEvents, WatchFaceHost, WatchFaceStyle};
pub use renderer::WatchFaceRenderer;
