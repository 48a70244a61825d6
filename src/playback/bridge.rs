use super::{PlaybackCursor, PlaybackEvent, PlaybackTransport};

/// Keeps the cursor and the transport in step.
///
/// Transport notifications only reach the cursor through `handle_event`, and
/// user commands only reach the transport through `seek`/`play`/`pause`.
pub struct PlaybackBridge<T: PlaybackTransport> {
    transport: T,
    cursor: PlaybackCursor,
    duration: f64,
}

impl<T: PlaybackTransport> PlaybackBridge<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cursor: PlaybackCursor::default(),
            duration: 0.0,
        }
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// A new timeline was loaded: stop and rewind.
    pub fn reset(&mut self, duration: f64) {
        if self.cursor.is_playing {
            self.transport.pause();
        }
        self.transport.load(duration);
        // Stale notifications belong to the previous track
        while self.transport.poll_event().is_some() {}
        self.duration = duration.max(0.0);
        self.cursor = PlaybackCursor::default();
    }

    /// Drain pending transport notifications. Returns true if the cursor moved.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.transport.poll_event() {
            changed |= self.handle_event(event);
        }
        changed
    }

    /// Apply one transport notification. Returns true if the cursor changed.
    pub fn handle_event(&mut self, event: PlaybackEvent) -> bool {
        match event {
            PlaybackEvent::TimeAdvanced(time) => {
                if !self.cursor.is_playing {
                    return false;
                }
                let time = self.clamp_time(time);
                let changed = time != self.cursor.current_time;
                self.cursor.current_time = time;
                changed
            }
            PlaybackEvent::Ended => {
                log::debug!("Playback ended");
                let changed = self.cursor != PlaybackCursor::default();
                self.cursor = PlaybackCursor::default();
                changed
            }
        }
    }

    pub fn seek(&mut self, time: f64) {
        let time = self.clamp_time(time);
        log::debug!("Seek to {:.3}s", time);
        self.cursor.current_time = time;
        self.transport.seek(time);
    }

    pub fn play(&mut self) {
        if self.cursor.is_playing {
            return;
        }
        // Transport may still sit at the end after an Ended rewind
        if (self.transport.current_time() - self.cursor.current_time).abs() > f64::EPSILON {
            self.transport.seek(self.cursor.current_time);
        }
        self.transport.play();
        self.cursor.is_playing = true;
        log::info!("Play from {:.2}s", self.cursor.current_time);
    }

    pub fn pause(&mut self) {
        if !self.cursor.is_playing {
            return;
        }
        self.transport.pause();
        self.cursor.is_playing = false;
        log::info!("Pause at {:.2}s", self.cursor.current_time);
    }

    pub fn toggle_play(&mut self) {
        if self.cursor.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    fn clamp_time(&self, time: f64) -> f64 {
        if time.is_finite() {
            time.clamp(0.0, self.duration)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Transport double that records every command it receives.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingTransport {
        pub position: f64,
        pub playing: bool,
        pub seeks: Vec<f64>,
        pub plays: usize,
        pub pauses: usize,
        pub pending: VecDeque<PlaybackEvent>,
    }

    impl PlaybackTransport for RecordingTransport {
        fn play(&mut self) {
            self.plays += 1;
            self.playing = true;
        }

        fn pause(&mut self) {
            self.pauses += 1;
            self.playing = false;
        }

        fn seek(&mut self, time: f64) {
            self.seeks.push(time);
            self.position = time;
        }

        fn current_time(&self) -> f64 {
            self.position
        }

        fn poll_event(&mut self) -> Option<PlaybackEvent> {
            self.pending.pop_front()
        }
    }

    fn bridge(duration: f64) -> PlaybackBridge<RecordingTransport> {
        let mut bridge = PlaybackBridge::new(RecordingTransport::default());
        bridge.reset(duration);
        bridge
    }

    #[test]
    fn seek_updates_cursor_and_transport_once() {
        let mut b = bridge(100.0);
        b.seek(45.0);
        assert_eq!(b.cursor().current_time, 45.0);
        assert_eq!(b.transport().seeks, vec![45.0]);
    }

    #[test]
    fn seek_is_clamped_to_track() {
        let mut b = bridge(100.0);
        b.seek(250.0);
        assert_eq!(b.cursor().current_time, 100.0);
        b.seek(-3.0);
        assert_eq!(b.transport().seeks, vec![100.0, 0.0]);
    }

    #[test]
    fn time_advances_only_while_playing() {
        let mut b = bridge(100.0);
        assert!(!b.handle_event(PlaybackEvent::TimeAdvanced(3.0)));
        assert_eq!(b.cursor().current_time, 0.0);

        b.play();
        b.transport_mut().pending.push_back(PlaybackEvent::TimeAdvanced(3.0));
        b.transport_mut().pending.push_back(PlaybackEvent::TimeAdvanced(3.5));
        assert!(b.sync());
        assert_eq!(b.cursor().current_time, 3.5);
        assert!(!b.sync());
    }

    #[test]
    fn ended_rewinds_and_stops() {
        let mut b = bridge(10.0);
        b.play();
        b.handle_event(PlaybackEvent::TimeAdvanced(10.0));
        b.transport_mut().position = 10.0;
        assert!(b.handle_event(PlaybackEvent::Ended));
        assert_eq!(b.cursor(), PlaybackCursor::default());

        b.play();
        assert_eq!(b.transport().seeks, vec![0.0]);
        assert_eq!(b.transport().plays, 2);
    }

    #[test]
    fn toggle_alternates_play_and_pause() {
        let mut b = bridge(10.0);
        b.toggle_play();
        assert!(b.cursor().is_playing);
        b.toggle_play();
        assert!(!b.cursor().is_playing);
        assert_eq!(b.transport().plays, 1);
        assert_eq!(b.transport().pauses, 1);
    }

    #[test]
    fn reset_discards_stale_events() {
        let mut b = bridge(10.0);
        b.play();
        b.transport_mut().pending.push_back(PlaybackEvent::TimeAdvanced(4.0));
        b.reset(20.0);
        assert!(!b.cursor().is_playing);
        assert!(!b.sync());
        assert_eq!(b.cursor().current_time, 0.0);
    }
}
