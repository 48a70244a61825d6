/// Descriptive track metadata carried through from the analysis payload.
/// Only used for the header caption.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
}

impl TrackMetadata {
    /// "Title · Artist", or whichever half is present.
    pub fn caption(&self) -> Option<String> {
        match (&self.title, &self.artist) {
            (Some(title), Some(artist)) => Some(format!("{} · {}", title, artist)),
            (Some(title), None) => Some(title.clone()),
            (None, Some(artist)) => Some(artist.clone()),
            (None, None) => None,
        }
    }
}

/// Canonical audio analysis for one track. Built once by `normalize` and
/// never mutated; loading a new track replaces it wholesale.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisTimeline {
    /// Track length in seconds (always > 0)
    pub duration: f64,
    /// Loudness in dB, uniformly spaced across [0, duration)
    pub energy: Vec<f32>,
    /// Beat onsets in seconds, strictly increasing
    pub beats: Vec<f64>,
    /// Downbeat onsets in seconds, strictly increasing
    pub downbeats: Vec<f64>,
    /// Segment boundaries in seconds, strictly increasing
    pub segments: Vec<f64>,
    pub tempo_bpm: f64,
    pub metadata: TrackMetadata,
}

impl AnalysisTimeline {
    /// Energy samples per second of audio.
    pub fn energy_rate(&self) -> f64 {
        self.energy.len() as f64 / self.duration
    }

    /// Time of the i-th energy sample.
    pub fn energy_time(&self, index: usize) -> f64 {
        index as f64 * self.duration / self.energy.len().max(1) as f64
    }

    /// Duration is known but there is nothing to draw besides the grid.
    pub fn is_degenerate(&self) -> bool {
        self.energy.is_empty()
            && self.beats.is_empty()
            && self.downbeats.is_empty()
            && self.segments.is_empty()
    }

    /// Segment `[b_i, b_{i+1})`. The last boundary closes at the track end.
    pub fn segment_span(&self, index: usize) -> Option<(f64, f64)> {
        let start = *self.segments.get(index)?;
        let end = self.segments.get(index + 1).copied().unwrap_or(self.duration);
        Some((start, end))
    }

    /// Index of the segment containing `time`, if any boundary precedes it.
    pub fn segment_at(&self, time: f64) -> Option<usize> {
        let idx = self.segments.partition_point(|&b| b <= time);
        if idx == 0 {
            None
        } else {
            Some(idx - 1)
        }
    }
}

/// Which segment (if any) the user has focused. Cleared on every load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub segment: Option<usize>,
}

impl Selection {
    /// Select a segment, rejecting indices that do not exist in `timeline`.
    pub fn select(self, timeline: &AnalysisTimeline, segment: Option<usize>) -> Self {
        match segment {
            Some(idx) if idx < timeline.segments.len() => Self { segment: Some(idx) },
            Some(idx) => {
                log::debug!(
                    "Ignoring selection of segment {} ({} boundaries)",
                    idx,
                    timeline.segments.len()
                );
                self
            }
            None => Self { segment: None },
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_timeline(duration: f64) -> AnalysisTimeline {
    AnalysisTimeline {
        duration,
        energy: Vec::new(),
        beats: Vec::new(),
        downbeats: Vec::new(),
        segments: Vec::new(),
        tempo_bpm: 120.0,
        metadata: TrackMetadata::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_span_closes_at_track_end() {
        let mut tl = sample_timeline(100.0);
        tl.segments = vec![0.0, 30.0, 70.0];
        assert_eq!(tl.segment_span(0), Some((0.0, 30.0)));
        assert_eq!(tl.segment_span(2), Some((70.0, 100.0)));
        assert_eq!(tl.segment_span(3), None);
    }

    #[test]
    fn segment_at_uses_half_open_spans() {
        let mut tl = sample_timeline(100.0);
        tl.segments = vec![10.0, 30.0];
        assert_eq!(tl.segment_at(5.0), None);
        assert_eq!(tl.segment_at(10.0), Some(0));
        assert_eq!(tl.segment_at(29.9), Some(0));
        assert_eq!(tl.segment_at(30.0), Some(1));
    }

    #[test]
    fn selection_rejects_unknown_segment() {
        let mut tl = sample_timeline(100.0);
        tl.segments = vec![0.0, 50.0];
        let sel = Selection::default().select(&tl, Some(1));
        assert_eq!(sel.segment, Some(1));
        assert_eq!(sel.select(&tl, Some(5)).segment, Some(1));
        assert_eq!(sel.select(&tl, None).segment, None);
    }

    #[test]
    fn energy_times_are_uniform() {
        let mut tl = sample_timeline(10.0);
        tl.energy = vec![-20.0; 100];
        assert_eq!(tl.energy_rate(), 10.0);
        assert!((tl.energy_time(50) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn caption_joins_title_and_artist() {
        let meta = TrackMetadata {
            title: Some("Nightdrive".into()),
            artist: Some("Loma".into()),
            genre: None,
        };
        assert_eq!(meta.caption().as_deref(), Some("Nightdrive · Loma"));
        assert_eq!(TrackMetadata::default().caption(), None);
    }
}
