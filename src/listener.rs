//! Registration guard for the time-zone change listener.

use crate::host::WatchFaceHost;

/// Tracks whether the face is subscribed to time-zone changes.
///
/// `acquire` and `release` may be called any number of times in any order;
/// the host only sees alternating register/unregister calls.
#[derive(Debug, Default)]
pub struct TimeZoneListener {
    registered: bool,
}

impl TimeZoneListener {
    pub const fn new() -> Self {
        Self { registered: false }
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Register with the host unless already registered. Returns true if a
    /// registration happened.
    pub fn acquire<H: WatchFaceHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.registered {
            return false;
        }
        self.registered = true;
        host.register_time_zone_listener();
        log::info!("time-zone listener registered");
        true
    }

    /// Unregister from the host if registered. Returns true if an
    /// unregistration happened.
    pub fn release<H: WatchFaceHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if !self.registered {
            return false;
        }
        self.registered = false;
        host.unregister_time_zone_listener();
        log::info!("time-zone listener unregistered");
        true
    }
}
