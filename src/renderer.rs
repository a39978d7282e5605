//! The googly-eyes watch face.
//!
//! `WatchFaceRenderer` turns the current time, the appearance flags and the
//! screen layout into one frame of draw operations, and reacts to host
//! lifecycle notifications by updating that state. It never loops or sleeps
//! on its own; the host calls in and gets `invalidate()` calls back.
//!
//! Frame layout:
//! - two eye circles side by side, left one for the hour, right one for the minute
//! - a smaller pupil in each eye, rotated about that eye's centre by the hand angle
//! - the `HH:MM` readout under the eyes
//! - while tapped, the eyes are replaced with a "closed eyes" glyph

use embedded_graphics::{draw_target::DrawTarget, pixelcolor::Rgb565};

use crate::appearance::{derive_appearance, AppearanceState, Paints};
use crate::canvas::{Canvas, CanvasError};
use crate::clock::{ClockReading, TimeZone, WallClock};
use crate::config::FaceConfig;
use crate::host::{
    InterruptionFilter, SurfaceProperties, TapType, WatchFaceEvents, WatchFaceHost,
    WatchFaceStyle,
};
use crate::layout::{LayoutMetrics, PointF};
use crate::listener::TimeZoneListener;
use crate::scene::{DrawOp, Scene};

pub struct WatchFaceRenderer<C, H> {
    clock: C,
    host: H,
    config: FaceConfig,
    zone: TimeZone,
    layout: LayoutMetrics,
    state: AppearanceState,
    paints: Paints,
    properties: SurfaceProperties,
    tz_listener: TimeZoneListener,
}

impl<C, H> WatchFaceRenderer<C, H>
where
    C: WallClock,
    H: WatchFaceHost,
{
    pub fn new(clock: C, host: H) -> Self {
        Self::with_config(clock, host, FaceConfig::default())
    }

    pub fn with_config(clock: C, host: H, config: FaceConfig) -> Self {
        let zone = host.default_time_zone();
        Self {
            clock,
            host,
            zone,
            layout: LayoutMetrics::default(),
            state: AppearanceState::default(),
            paints: Paints::defaults(&config),
            properties: SurfaceProperties::default(),
            tz_listener: TimeZoneListener::new(),
            config,
        }
    }

    #[inline]
    pub fn appearance(&self) -> AppearanceState {
        self.state
    }

    #[inline]
    pub fn paints(&self) -> &Paints {
        &self.paints
    }

    #[inline]
    pub fn layout(&self) -> &LayoutMetrics {
        &self.layout
    }

    #[inline]
    pub fn properties(&self) -> SurfaceProperties {
        self.properties
    }

    #[inline]
    pub fn time_zone(&self) -> TimeZone {
        self.zone
    }

    #[inline]
    pub fn config(&self) -> &FaceConfig {
        &self.config
    }

    #[inline]
    pub fn is_listening_for_time_zone(&self) -> bool {
        self.tz_listener.is_registered()
    }

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[inline]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[inline]
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Snapshot the wall clock in the current zone.
    pub fn read_clock(&mut self) -> ClockReading {
        ClockReading::from_unix(self.clock.unix_seconds(), self.zone)
    }

    // Re-evaluate night time; true if it flipped.
    fn refresh_night(&mut self) -> bool {
        let night = self.read_clock().is_night(&self.config);
        let changed = night != self.state.night;
        self.state.night = night;
        changed
    }

    fn rederive(&mut self) {
        self.paints = derive_appearance(&self.state, &self.config);
    }

    /// Build the draw operations for `reading` without touching a display.
    pub fn compose(&self, reading: &ClockReading) -> Scene {
        let layout = &self.layout;
        let paints = &self.paints;
        let mut scene = Scene::new();

        scene.push(DrawOp::Clear(self.state.background()));

        if !self.state.tapped {
            for pivot in [layout.hour_pivot(), layout.minute_pivot()] {
                scene.push(DrawOp::Circle {
                    center: pivot,
                    radius: layout.eye_radius,
                    paint: paints.eye,
                });
            }

            for (pivot, degrees) in hand_placements(layout, reading) {
                // each pupil rotates about its own eye, never the screen centre
                scene.push(DrawOp::Save);
                scene.push(DrawOp::Rotate { degrees, pivot });
                scene.push(DrawOp::Circle {
                    center: layout.pupil_rest(pivot),
                    radius: layout.hand_radius,
                    paint: paints.hand,
                });
                scene.push(DrawOp::Restore);
            }
        } else {
            scene.push(DrawOp::text(
                self.config.tapped_glyph,
                layout.glyph_anchor(&self.config),
                paints.tapped,
            ));
        }

        scene.push(DrawOp::text(
            &reading.format_hhmm(),
            layout.time_anchor(&self.config),
            paints.text,
        ));

        scene
    }

    /// Read the clock and render one frame onto `target`.
    pub fn draw<D>(&mut self, target: &mut D) -> Result<ClockReading, CanvasError<D::Error>>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let reading = self.read_clock();
        let scene = self.compose(&reading);
        Canvas::new(target, &self.config).render(&scene)?;
        Ok(reading)
    }
}

impl<C, H> WatchFaceEvents for WatchFaceRenderer<C, H>
where
    C: WallClock,
    H: WatchFaceHost,
{
    fn on_create(&mut self) {
        self.host.set_watch_face_style(WatchFaceStyle::googly_eyes());
        // defaults are the day mapping; night at creation restyles straight away
        self.refresh_night();
        self.rederive();
        log::debug!("watch face created, night={}", self.state.night);
    }

    fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.layout = LayoutMetrics::from_surface(width, height, &self.config);
        log::debug!("surface {}x{} -> {:?}", width, height, self.layout);
    }

    fn on_properties_changed(&mut self, properties: SurfaceProperties) {
        self.properties = properties;
    }

    fn on_ambient_mode_changed(&mut self, ambient: bool) {
        self.state.ambient = ambient;
        if ambient {
            self.state.tapped = false;
        }
        self.refresh_night();
        self.rederive();
        log::debug!("ambient={} night={}", ambient, self.state.night);
        self.host.invalidate();
    }

    fn on_interruption_filter_changed(&mut self, filter: InterruptionFilter) {
        let muted = filter.is_muted();
        if muted == self.state.muted {
            return;
        }
        self.state.muted = muted;
        self.rederive();
        log::debug!("muted={}", muted);
        self.host.invalidate();
    }

    fn on_tap_command(&mut self, tap_type: TapType, _x: i32, _y: i32, _event_time_ms: u64) {
        if tap_type == TapType::Tap {
            self.state.tapped = !self.state.tapped;
            log::debug!("tapped={}", self.state.tapped);
        }
        self.host.invalidate();
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        if visible {
            self.tz_listener.acquire(&mut self.host);
            // the zone may have changed while nobody was listening
            self.zone = self.host.default_time_zone();
            self.host.invalidate();
        } else {
            self.tz_listener.release(&mut self.host);
        }
    }

    fn on_time_tick(&mut self) {
        if self.refresh_night() {
            self.rederive();
        }
        self.host.invalidate();
    }

    fn on_time_zone_changed(&mut self, zone: TimeZone) {
        if !self.tz_listener.is_registered() {
            log::debug!("time-zone change ignored, listener not registered");
            return;
        }
        self.zone = zone;
        self.host.invalidate();
    }
}

/// Pivot and angle of both pupils for `reading`, hour first.
pub fn hand_placements(layout: &LayoutMetrics, reading: &ClockReading) -> [(PointF, f32); 2] {
    [
        (layout.hour_pivot(), reading.hour_angle()),
        (layout.minute_pivot(), reading.minute_angle()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appearance::{PaintColor, PaintStyle};
    use crate::host::ViewProtection;

    struct FixedClock(u64);

    impl WallClock for FixedClock {
        fn unix_seconds(&mut self) -> u64 {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        invalidations: u32,
        registers: u32,
        unregisters: u32,
        style: Option<WatchFaceStyle>,
        zone: TimeZone,
    }

    impl WatchFaceHost for RecordingHost {
        fn invalidate(&mut self) {
            self.invalidations += 1;
        }
        fn register_time_zone_listener(&mut self) {
            self.registers += 1;
        }
        fn unregister_time_zone_listener(&mut self) {
            self.unregisters += 1;
        }
        fn default_time_zone(&self) -> TimeZone {
            self.zone
        }
        fn set_watch_face_style(&mut self, style: WatchFaceStyle) {
            self.style = Some(style);
        }
    }

    fn at(hour: u64, minute: u64) -> FixedClock {
        FixedClock(hour * 3600 + minute * 60)
    }

    fn face(hour: u64, minute: u64) -> WatchFaceRenderer<FixedClock, RecordingHost> {
        let mut r = WatchFaceRenderer::new(at(hour, minute), RecordingHost::default());
        r.on_create();
        r.on_surface_changed(400, 400);
        r
    }

    #[test]
    fn create_declares_style_and_evaluates_night() {
        let day = face(14, 30);
        let style = day.host().style.expect("style declared");
        assert!(style.accepts_taps);
        assert_eq!(
            style.view_protection,
            ViewProtection::STATUS_BAR | ViewProtection::HOTWORD_INDICATOR
        );
        assert!(!day.appearance().night);
        assert_eq!(day.paints().eye.color, PaintColor::Black);

        let night = face(23, 0);
        assert!(night.appearance().night);
        assert_eq!(night.paints().eye.style, PaintStyle::FillAndStroke);
    }

    #[test]
    fn only_completed_taps_toggle() {
        let mut r = face(10, 0);
        r.on_tap_command(TapType::Touch, 0, 0, 1);
        r.on_tap_command(TapType::TouchCancel, 0, 0, 2);
        assert!(!r.appearance().tapped);
        r.on_tap_command(TapType::Tap, 0, 0, 3);
        assert!(r.appearance().tapped);
        r.on_tap_command(TapType::Tap, 0, 0, 4);
        assert!(!r.appearance().tapped);
        assert_eq!(r.host().invalidations, 4);
    }

    #[test]
    fn entering_ambient_clears_tapped() {
        let mut r = face(10, 0);
        r.on_ambient_mode_changed(true);
        r.on_tap_command(TapType::Tap, 0, 0, 0);
        assert!(r.appearance().tapped);
        r.on_ambient_mode_changed(true);
        assert!(!r.appearance().tapped);

        // leaving ambient keeps whatever tapped was
        r.on_tap_command(TapType::Tap, 0, 0, 0);
        r.on_ambient_mode_changed(false);
        assert!(r.appearance().tapped);
    }

    #[test]
    fn mute_only_acts_on_change() {
        let mut r = face(10, 0);
        let before = r.host().invalidations;
        r.on_interruption_filter_changed(InterruptionFilter::All);
        assert_eq!(r.host().invalidations, before);

        r.on_interruption_filter_changed(InterruptionFilter::None);
        assert_eq!(r.paints().hand.alpha, 100);
        assert_eq!(r.paints().eye.alpha, 100);
        assert_eq!(r.paints().text.alpha, 255);
        assert_eq!(r.host().invalidations, before + 1);

        r.on_interruption_filter_changed(InterruptionFilter::None);
        assert_eq!(r.host().invalidations, before + 1);

        r.on_interruption_filter_changed(InterruptionFilter::Priority);
        assert_eq!(r.paints().hand.alpha, 255);
        assert_eq!(r.host().invalidations, before + 2);
    }

    #[test]
    fn mute_survives_ambient_restyle() {
        let mut r = face(10, 0);
        r.on_interruption_filter_changed(InterruptionFilter::None);
        r.on_ambient_mode_changed(true);
        assert_eq!(r.paints().hand.alpha, 100);
        assert_eq!(r.paints().hand.color, PaintColor::White);
    }

    #[test]
    fn tick_restyles_when_night_falls() {
        let mut r = face(17, 59);
        assert!(!r.appearance().night);
        r.clock_mut().0 = 18 * 3600;
        r.on_time_tick();
        assert!(r.appearance().night);
        assert_eq!(r.paints().eye.color, PaintColor::White);
    }

    #[test]
    fn tick_and_becoming_visible_request_redraws() {
        let mut r = face(10, 0);
        let before = r.host().invalidations;
        r.on_time_tick();
        assert!(!r.appearance().night);
        assert_eq!(r.host().invalidations, before + 1);

        r.on_visibility_changed(true);
        assert_eq!(r.host().invalidations, before + 2);

        r.on_visibility_changed(false);
        assert_eq!(r.host().invalidations, before + 2);
    }

    #[test]
    fn visibility_manages_listener_and_zone() {
        let mut r = face(10, 0);
        r.host_mut().zone = TimeZone::from_offset_minutes(60);
        r.on_visibility_changed(true);
        r.on_visibility_changed(true);
        assert_eq!(r.host().registers, 1);
        assert_eq!(r.time_zone(), TimeZone::from_offset_minutes(60));
        assert_eq!(r.read_clock().hour, 11);

        r.on_time_zone_changed(TimeZone::from_offset_minutes(-120));
        assert_eq!(r.read_clock().hour, 8);

        r.on_visibility_changed(false);
        r.on_visibility_changed(false);
        assert_eq!(r.host().unregisters, 1);

        r.on_time_zone_changed(TimeZone::UTC);
        assert_eq!(r.time_zone(), TimeZone::from_offset_minutes(-120));
    }

    #[test]
    fn properties_are_recorded_but_do_not_restyle() {
        let mut r = face(10, 0);
        let paints = *r.paints();
        let props = SurfaceProperties { low_bit_ambient: true, burn_in_protection: true };
        r.on_properties_changed(props);
        assert_eq!(r.properties(), props);
        assert_eq!(*r.paints(), paints);
    }

    #[test]
    fn surface_change_is_idempotent() {
        let mut r = face(10, 0);
        let first = *r.layout();
        let invalidations = r.host().invalidations;
        r.on_surface_changed(400, 400);
        assert_eq!(*r.layout(), first);
        assert_eq!(r.host().invalidations, invalidations);
    }

    #[test]
    fn open_eyes_scene_rotates_each_pupil_about_its_own_eye() {
        let r = face(14, 30);
        let reading = ClockReading::new(14, 30, 0);
        let scene = r.compose(&reading);

        assert_eq!(scene.ops()[0], DrawOp::Clear(PaintColor::White));
        assert_eq!(scene.circle_count(), 4);

        let rotations: std::vec::Vec<_> = scene
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rotate { degrees, pivot } => Some((*pivot, *degrees)),
                _ => None,
            })
            .collect();
        assert_eq!(rotations, hand_placements(r.layout(), &reading).to_vec());
        assert_eq!(rotations[0], (PointF::new(140.0, 200.0), 75.0));
        assert_eq!(rotations[1], (PointF::new(260.0, 200.0), 180.0));

        let saves = scene.ops().iter().filter(|op| **op == DrawOp::Save).count();
        let restores = scene.ops().iter().filter(|op| **op == DrawOp::Restore).count();
        assert_eq!((saves, restores), (2, 2));

        assert_eq!(scene.texts().collect::<std::vec::Vec<_>>(), ["14:30"]);
    }

    #[test]
    fn tapped_scene_shows_glyph_then_time() {
        let mut r = face(9, 5);
        r.on_tap_command(TapType::Tap, 0, 0, 0);
        let scene = r.compose(&ClockReading::new(9, 5, 0));
        assert_eq!(scene.circle_count(), 0);
        assert_eq!(scene.texts().collect::<std::vec::Vec<_>>(), ["> <", "09:05"]);
    }

    #[test]
    fn night_and_ambient_clear_black() {
        let mut r = face(2, 0);
        let scene = r.compose(&ClockReading::new(2, 0, 0));
        assert_eq!(scene.ops()[0], DrawOp::Clear(PaintColor::Black));

        r.clock_mut().0 = 12 * 3600;
        r.on_ambient_mode_changed(true);
        let scene = r.compose(&ClockReading::new(12, 0, 0));
        assert_eq!(scene.ops()[0], DrawOp::Clear(PaintColor::Black));
    }
}
