pub mod bridge;
pub mod clock;

pub use bridge::PlaybackBridge;
pub use clock::FrameClock;

/// Notifications emitted by a transport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackEvent {
    /// Playback position moved to this time (seconds)
    TimeAdvanced(f64),
    /// Playback reached the end of the track
    Ended,
}

/// Commands and subscription surface of an audio transport.
pub trait PlaybackTransport {
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, time: f64);
    fn current_time(&self) -> f64;
    /// Next pending notification, if any. Drained once per event-loop turn.
    fn poll_event(&mut self) -> Option<PlaybackEvent>;
    /// A new track of `duration` seconds was loaded.
    fn load(&mut self, _duration: f64) {}
}

/// Playhead position as seen by the timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackCursor {
    pub current_time: f64,
    pub is_playing: bool,
}
