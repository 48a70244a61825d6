use std::collections::VecDeque;

use super::{PlaybackEvent, PlaybackTransport};

/// Transport driven by rendered frames instead of an audio device.
///
/// Used for offline rendering: each output frame advances the clock by
/// `1 / fps`, so the playhead in the video matches the muxed audio.
#[derive(Debug)]
pub struct FrameClock {
    duration: f64,
    position: f64,
    playing: bool,
    pending: VecDeque<PlaybackEvent>,
}

impl FrameClock {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            position: 0.0,
            playing: false,
            pending: VecDeque::new(),
        }
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Move the clock forward by `dt` seconds if playing.
    pub fn advance(&mut self, dt: f64) {
        if !self.playing || dt <= 0.0 {
            return;
        }
        self.position += dt;
        if self.position >= self.duration {
            self.position = self.duration;
            self.playing = false;
            self.pending.push_back(PlaybackEvent::TimeAdvanced(self.duration));
            self.pending.push_back(PlaybackEvent::Ended);
        } else {
            self.pending.push_back(PlaybackEvent::TimeAdvanced(self.position));
        }
    }
}

impl PlaybackTransport for FrameClock {
    fn play(&mut self) {
        if self.position >= self.duration {
            self.position = 0.0;
        }
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, time: f64) {
        self.position = time.clamp(0.0, self.duration);
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn poll_event(&mut self) -> Option<PlaybackEvent> {
        self.pending.pop_front()
    }

    /// Stops and rewinds onto the new track.
    fn load(&mut self, duration: f64) {
        *self = Self::new(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_while_playing() {
        let mut clock = FrameClock::new(10.0);
        clock.advance(1.0);
        assert_eq!(clock.current_time(), 0.0);
        assert_eq!(clock.poll_event(), None);

        clock.play();
        clock.advance(0.5);
        assert_eq!(clock.poll_event(), Some(PlaybackEvent::TimeAdvanced(0.5)));
        clock.pause();
        clock.advance(0.5);
        assert_eq!(clock.current_time(), 0.5);
    }

    #[test]
    fn reports_end_of_track() {
        let mut clock = FrameClock::new(1.0);
        clock.play();
        clock.advance(2.0);
        assert_eq!(clock.poll_event(), Some(PlaybackEvent::TimeAdvanced(1.0)));
        assert_eq!(clock.poll_event(), Some(PlaybackEvent::Ended));
        assert!(!clock.is_playing());
        clock.play();
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn load_rewinds_onto_new_track() {
        let mut clock = FrameClock::new(5.0);
        clock.play();
        clock.advance(1.0);
        clock.load(20.0);
        assert!(!clock.is_playing());
        assert_eq!(clock.current_time(), 0.0);
        assert_eq!(clock.poll_event(), None);
        clock.seek(15.0);
        assert_eq!(clock.current_time(), 15.0);
    }

    #[test]
    fn seek_is_clamped() {
        let mut clock = FrameClock::new(10.0);
        clock.seek(42.0);
        assert_eq!(clock.current_time(), 10.0);
        clock.seek(-1.0);
        assert_eq!(clock.current_time(), 0.0);
    }
}
