//! Input handling for the button that stands in for the touch screen.
//!
//! This module provides:
//! - `TapDetector`, which turns debounced button edges into `TapType` events
//! - `AmbientTimer`, which drops the face into ambient mode after a period without input
//! - (firmware) `ButtonState` and `handle_button_generic`, the interrupt-side glue
//!
//! The detector and the timer are plain state machines fed with timestamps, so
//! they run the same on the board and in host tests.

use crate::host::TapType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Press {
    at_ms: u64,
    cancelled: bool,
}

/// Debounced press/release to tap gesture conversion.
///
/// Press → `Touch`. Release before `long_press_ms` → `Tap`. Holding past
/// `long_press_ms` → `TouchCancel` (reported by `poll` while held, or on
/// release), after which the release produces nothing.
#[derive(Debug)]
pub struct TapDetector {
    debounce_ms: u64,
    long_press_ms: u64,
    last_edge_ms: Option<u64>,
    press: Option<Press>,
}

impl TapDetector {
    pub const fn new(debounce_ms: u64, long_press_ms: u64) -> Self {
        Self {
            debounce_ms,
            long_press_ms,
            last_edge_ms: None,
            press: None,
        }
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    /// Feed a level change. `level_is_low` is true while pressed (pull-up button).
    pub fn on_edge(&mut self, level_is_low: bool, now_ms: u64) -> Option<TapType> {
        if let Some(last) = self.last_edge_ms {
            if now_ms.saturating_sub(last) < self.debounce_ms {
                return None;
            }
        }

        match (level_is_low, self.press) {
            (true, None) => {
                self.last_edge_ms = Some(now_ms);
                self.press = Some(Press { at_ms: now_ms, cancelled: false });
                Some(TapType::Touch)
            }
            (false, Some(press)) => {
                self.last_edge_ms = Some(now_ms);
                self.press = None;
                if press.cancelled {
                    None
                } else if now_ms.saturating_sub(press.at_ms) >= self.long_press_ms {
                    Some(TapType::TouchCancel)
                } else {
                    Some(TapType::Tap)
                }
            }
            // level did not actually change
            _ => None,
        }
    }

    /// Report a cancel once a held press outlives the long-press window.
    pub fn poll(&mut self, now_ms: u64) -> Option<TapType> {
        let press = self.press.as_mut()?;
        if !press.cancelled && now_ms.saturating_sub(press.at_ms) >= self.long_press_ms {
            press.cancelled = true;
            return Some(TapType::TouchCancel);
        }
        None
    }
}

/// Idle timer driving ambient mode on hosts without an OS power manager.
#[derive(Debug)]
pub struct AmbientTimer {
    timeout_ms: u64,
    last_activity_ms: u64,
    ambient: bool,
}

impl AmbientTimer {
    pub const fn new(timeout_ms: u64, now_ms: u64) -> Self {
        Self {
            timeout_ms,
            last_activity_ms: now_ms,
            ambient: false,
        }
    }

    #[inline]
    pub fn is_ambient(&self) -> bool {
        self.ambient
    }

    /// Record user activity. Returns `Some(false)` if this wakes the face.
    pub fn activity(&mut self, now_ms: u64) -> Option<bool> {
        self.last_activity_ms = now_ms;
        if self.ambient {
            self.ambient = false;
            return Some(false);
        }
        None
    }

    /// Returns `Some(true)` once the idle timeout has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<bool> {
        if !self.ambient && now_ms.saturating_sub(self.last_activity_ms) >= self.timeout_ms {
            self.ambient = true;
            return Some(true);
        }
        None
    }
}

#[cfg(feature = "firmware")]
mod button {
    use core::cell::RefCell;

    use critical_section::Mutex;
    use esp_hal::gpio::Input;
    use heapless::Deque;

    use super::TapDetector;
    use crate::host::TapType;

    /// Button pin, its detector and the events waiting for the main loop.
    pub struct ButtonState<'a> {
        pub input: Mutex<RefCell<Option<Input<'a>>>>,
        pub detector: Mutex<RefCell<TapDetector>>,
        pub pending: Mutex<RefCell<Deque<TapType, 8>>>,
        pub name: &'static str,
    }

    impl<'a> ButtonState<'a> {
        pub const fn new(name: &'static str, debounce_ms: u64, long_press_ms: u64) -> Self {
            Self {
                input: Mutex::new(RefCell::new(None)),
                detector: Mutex::new(RefCell::new(TapDetector::new(debounce_ms, long_press_ms))),
                pending: Mutex::new(RefCell::new(Deque::new())),
                name,
            }
        }

        /// Pop the oldest queued tap event.
        pub fn take_event(&self) -> Option<TapType> {
            critical_section::with(|cs| self.pending.borrow_ref_mut(cs).pop_front())
        }

        /// Long-press check from the main loop.
        pub fn poll(&self, now_ms: u64) -> Option<TapType> {
            critical_section::with(|cs| self.detector.borrow_ref_mut(cs).poll(now_ms))
        }
    }

    // Handle an edge interrupt on the button pin
    pub fn handle_button_generic(btn: &ButtonState, now_ms: u64) {
        critical_section::with(|cs| {
            let mut input_binding = btn.input.borrow_ref_mut(cs);
            let Some(input) = input_binding.as_mut() else {
                return;
            };

            // Check if interrupt is actually pending
            if !input.is_interrupt_set() {
                return;
            }
            input.clear_interrupt();

            let level_is_low = input.is_low();
            let event = btn.detector.borrow_ref_mut(cs).on_edge(level_is_low, now_ms);
            if let Some(event) = event {
                log::debug!("{}: {:?}", btn.name, event);
                // drop the oldest if the main loop fell behind
                let mut pending = btn.pending.borrow_ref_mut(cs);
                if pending.is_full() {
                    pending.pop_front();
                }
                pending.push_back(event).ok();
            }
        });
    }
}

#[cfg(feature = "firmware")]
pub use button::{handle_button_generic, ButtonState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_press_is_touch_then_tap() {
        let mut d = TapDetector::new(20, 600);
        assert_eq!(d.on_edge(true, 1_000), Some(TapType::Touch));
        assert!(d.is_pressed());
        assert_eq!(d.on_edge(false, 1_150), Some(TapType::Tap));
        assert!(!d.is_pressed());
    }

    #[test]
    fn bounces_inside_the_window_are_ignored() {
        let mut d = TapDetector::new(20, 600);
        assert_eq!(d.on_edge(true, 1_000), Some(TapType::Touch));
        assert_eq!(d.on_edge(false, 1_005), None);
        assert_eq!(d.on_edge(true, 1_010), None);
        assert!(d.is_pressed());
        assert_eq!(d.on_edge(false, 1_200), Some(TapType::Tap));
    }

    #[test]
    fn long_hold_cancels_once() {
        let mut d = TapDetector::new(20, 600);
        d.on_edge(true, 0);
        assert_eq!(d.poll(300), None);
        assert_eq!(d.poll(600), Some(TapType::TouchCancel));
        assert_eq!(d.poll(900), None);
        assert_eq!(d.on_edge(false, 1_000), None);
    }

    #[test]
    fn long_release_without_poll_is_a_cancel() {
        let mut d = TapDetector::new(20, 600);
        d.on_edge(true, 0);
        assert_eq!(d.on_edge(false, 800), Some(TapType::TouchCancel));
    }

    #[test]
    fn repeated_level_is_not_an_edge() {
        let mut d = TapDetector::new(20, 600);
        assert_eq!(d.on_edge(false, 100), None);
        d.on_edge(true, 200);
        assert_eq!(d.on_edge(true, 300), None);
    }

    #[test]
    fn ambient_after_idle_and_wake_on_activity() {
        let mut t = AmbientTimer::new(10_000, 0);
        assert_eq!(t.poll(9_999), None);
        assert_eq!(t.poll(10_000), Some(true));
        assert_eq!(t.poll(20_000), None);
        assert!(t.is_ambient());
        assert_eq!(t.activity(21_000), Some(false));
        assert_eq!(t.activity(21_500), None);
        assert_eq!(t.poll(31_000), None);
        assert_eq!(t.poll(31_500), Some(true));
    }
}
