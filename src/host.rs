//! The seam between the watch face and whatever drives it.
//!
//! The face owns no loop. A host (the firmware main loop on the board, a
//! recording stub in tests) calls one [`WatchFaceEvents`] method per
//! lifecycle notification, and the face calls back through [`WatchFaceHost`]
//! to ask for a redraw or to (un)register its time-zone listener.

use bitflags::bitflags;

use crate::clock::TimeZone;

/// Phase of a touch gesture.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TapType {
    /// The user started touching the screen.
    Touch,
    /// The gesture turned into something else or was abandoned.
    TouchCancel,
    /// The user completed a tap.
    Tap,
}

/// Do-not-disturb level reported by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InterruptionFilter {
    All,
    Priority,
    Alarms,
    /// Total silence; the face dims itself.
    None,
    Unknown,
}

impl InterruptionFilter {
    #[inline]
    pub fn is_muted(self) -> bool {
        self == InterruptionFilter::None
    }
}

/// Display capabilities reported once by the host.
///
/// Both flags are recorded but do not change what gets drawn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceProperties {
    pub low_bit_ambient: bool,
    pub burn_in_protection: bool,
}

/// Where the host places its status icons.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Gravity {
    #[default]
    Top,
    CenterHorizontal,
}

bitflags! {
    /// Host UI elements that get a scrim behind them.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct ViewProtection: u8 {
        const STATUS_BAR = 1 << 0;
        const HOTWORD_INDICATOR = 1 << 1;
    }
}

/// Options the face declares once at creation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WatchFaceStyle {
    pub accepts_taps: bool,
    pub status_bar_gravity: Gravity,
    pub view_protection: ViewProtection,
}

impl WatchFaceStyle {
    /// Style used by the googly-eyes face.
    pub fn googly_eyes() -> Self {
        Self {
            accepts_taps: true,
            status_bar_gravity: Gravity::CenterHorizontal,
            view_protection: ViewProtection::STATUS_BAR | ViewProtection::HOTWORD_INDICATOR,
        }
    }
}

/// Outbound calls from the face to its host.
pub trait WatchFaceHost {
    /// Ask for `draw` to be called again soon.
    fn invalidate(&mut self);

    /// Start delivering `on_time_zone_changed`.
    fn register_time_zone_listener(&mut self);

    /// Stop delivering `on_time_zone_changed`.
    fn unregister_time_zone_listener(&mut self);

    /// The zone the device is currently configured for.
    fn default_time_zone(&self) -> TimeZone;

    /// Declare style options. Called once, from `on_create`.
    fn set_watch_face_style(&mut self, style: WatchFaceStyle);
}

impl<H: WatchFaceHost + ?Sized> WatchFaceHost for &mut H {
    fn invalidate(&mut self) {
        (**self).invalidate()
    }

    fn register_time_zone_listener(&mut self) {
        (**self).register_time_zone_listener()
    }

    fn unregister_time_zone_listener(&mut self) {
        (**self).unregister_time_zone_listener()
    }

    fn default_time_zone(&self) -> TimeZone {
        (**self).default_time_zone()
    }

    fn set_watch_face_style(&mut self, style: WatchFaceStyle) {
        (**self).set_watch_face_style(style)
    }
}

/// Inbound lifecycle notifications, one per host callback.
///
/// Drawing is not part of this trait since it is generic over the draw target.
pub trait WatchFaceEvents {
    fn on_create(&mut self);
    fn on_surface_changed(&mut self, width: u32, height: u32);
    fn on_properties_changed(&mut self, properties: SurfaceProperties);
    fn on_ambient_mode_changed(&mut self, ambient: bool);
    fn on_interruption_filter_changed(&mut self, filter: InterruptionFilter);
    fn on_tap_command(&mut self, tap_type: TapType, x: i32, y: i32, event_time_ms: u64);
    fn on_visibility_changed(&mut self, visible: bool);
    fn on_time_tick(&mut self);
    fn on_time_zone_changed(&mut self, zone: TimeZone);
}
