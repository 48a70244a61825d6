use serde_json::Value;
use thiserror::Error;

use super::model::{AnalysisTimeline, TrackMetadata};

pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Floor used when converting linear amplitude to dB.
const MIN_LINEAR_AMPLITUDE: f64 = 1e-6;

/// Objects that may wrap the actual analysis fields.
const NESTED_CONTAINERS: &[&str] = &["analysis", "features", "audio_features", "metadata"];

const DURATION_KEYS: &[&str] = &[
    "duration",
    "duration_sec",
    "duration_seconds",
    "durationSeconds",
    "length",
];
const TEMPO_KEYS: &[&str] = &["tempo", "tempo_bpm", "bpm"];
const ENERGY_DB_KEYS: &[&str] = &["energy_db", "rms_db", "loudness_db", "loudness"];
const ENERGY_AMBIGUOUS_KEYS: &[&str] = &["rms_energy", "energy", "rms"];
const BEAT_KEYS: &[&str] = &["beat_times_sec", "beat_times", "beats"];
const DOWNBEAT_KEYS: &[&str] = &["downbeats_sec", "downbeat_times", "downbeats"];
const SEGMENT_KEYS: &[&str] = &["segments_sec", "segment_boundaries", "segments", "sections"];

#[derive(Debug, Error, PartialEq)]
pub enum NormalizationError {
    #[error("analysis payload has no duration")]
    MissingDuration,
    #[error("analysis payload has invalid duration: {0}")]
    InvalidDuration(f64),
}

/// Turn a loosely-shaped analysis payload into an `AnalysisTimeline`.
///
/// Missing optional fields fall back to empty series and a 120 BPM tempo.
/// The only hard failure is a missing or non-positive duration.
pub fn normalize(payload: &Value) -> Result<AnalysisTimeline, NormalizationError> {
    let duration = read_duration(payload)?;

    let tempo_bpm = match find_number(payload, TEMPO_KEYS) {
        Some(bpm) if bpm.is_finite() && bpm > 0.0 => bpm,
        Some(bpm) => {
            log::warn!("Ignoring tempo {}, using {} BPM", bpm, DEFAULT_TEMPO_BPM);
            DEFAULT_TEMPO_BPM
        }
        None => DEFAULT_TEMPO_BPM,
    };

    let energy = read_energy(payload);
    let beats = read_times(payload, BEAT_KEYS, "beat_times_ms", duration);
    let downbeats = read_times(payload, DOWNBEAT_KEYS, "downbeats_ms", duration);
    let segments = read_times(payload, SEGMENT_KEYS, "segments_ms", duration);

    let metadata = TrackMetadata {
        title: find_string(payload, "title"),
        artist: find_string(payload, "artist"),
        genre: find_string(payload, "genre"),
    };

    let timeline = AnalysisTimeline {
        duration,
        energy,
        beats,
        downbeats,
        segments,
        tempo_bpm,
        metadata,
    };

    if timeline.is_degenerate() {
        log::warn!(
            "Degenerate timeline: {:.1}s with no energy, beats or segments",
            duration
        );
    } else {
        log::debug!(
            "Normalized timeline: {:.1}s, {} energy samples, {} beats, {} downbeats, {} segments, {:.1} BPM",
            duration,
            timeline.energy.len(),
            timeline.beats.len(),
            timeline.downbeats.len(),
            timeline.segments.len(),
            tempo_bpm
        );
    }

    Ok(timeline)
}

fn read_duration(payload: &Value) -> Result<f64, NormalizationError> {
    let duration = find_number(payload, DURATION_KEYS)
        .or_else(|| find_number(payload, &["duration_ms"]).map(|ms| ms / 1000.0))
        .ok_or(NormalizationError::MissingDuration)?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(NormalizationError::InvalidDuration(duration));
    }
    Ok(duration)
}

/// Look up the first matching key at the root, then inside known wrappers.
fn find_field<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let lookup = |obj: &'a Value| {
        keys.iter()
            .filter_map(|key| obj.get(*key))
            .find(|v| !v.is_null())
    };

    lookup(payload).or_else(|| {
        NESTED_CONTAINERS
            .iter()
            .filter_map(|name| payload.get(*name))
            .filter(|v| v.is_object())
            .find_map(lookup)
    })
}

fn find_number(payload: &Value, keys: &[&str]) -> Option<f64> {
    find_field(payload, keys).and_then(as_number)
}

fn find_string(payload: &Value, key: &str) -> Option<String> {
    find_field(payload, &[key])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Numbers and numeric strings both count.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A series is either a bare array or an object with a `values` array.
fn series(value: &Value) -> Option<&Vec<Value>> {
    value
        .as_array()
        .or_else(|| value.get("values").and_then(Value::as_array))
}

fn read_energy(payload: &Value) -> Vec<f32> {
    if let Some(values) = find_field(payload, ENERGY_DB_KEYS).and_then(series) {
        return values
            .iter()
            .filter_map(as_number)
            .filter(|v| v.is_finite())
            .map(|db| db as f32)
            .collect();
    }

    let Some(values) = find_field(payload, ENERGY_AMBIGUOUS_KEYS).and_then(series) else {
        return Vec::new();
    };
    let values: Vec<f64> = values
        .iter()
        .filter_map(as_number)
        .filter(|v| v.is_finite())
        .collect();

    // dB loudness is never positive; anything else is linear amplitude
    if values.iter().all(|&v| v <= 0.0) {
        values.into_iter().map(|db| db as f32).collect()
    } else {
        log::debug!("Converting {} linear energy values to dB", values.len());
        values.into_iter().map(|v| linear_to_db(v) as f32).collect()
    }
}

pub fn linear_to_db(amplitude: f64) -> f64 {
    20.0 * amplitude.max(MIN_LINEAR_AMPLITUDE).log10()
}

fn read_times(payload: &Value, keys: &[&str], ms_key: &str, duration: f64) -> Vec<f64> {
    let raw: Vec<f64> = if let Some(values) = find_field(payload, keys).and_then(series) {
        values.iter().flat_map(time_points).collect()
    } else if let Some(values) = find_field(payload, &[ms_key]).and_then(series) {
        values
            .iter()
            .flat_map(time_points)
            .map(|ms| ms / 1000.0)
            .collect()
    } else {
        return Vec::new();
    };

    sanitize_times(raw, duration)
}

/// A time entry is a number, or an object with `time`/`start` (and `end`).
fn time_points(value: &Value) -> Vec<f64> {
    if let Some(t) = as_number(value) {
        return vec![t];
    }
    let start = ["time", "start", "start_sec"]
        .iter()
        .find_map(|k| value.get(*k).and_then(as_number));
    let end = ["end", "end_sec"]
        .iter()
        .find_map(|k| value.get(*k).and_then(as_number));
    start.into_iter().chain(end).collect()
}

/// Drop out-of-range values, sort, and collapse duplicates so the result is
/// strictly increasing within [0, duration].
fn sanitize_times(mut times: Vec<f64>, duration: f64) -> Vec<f64> {
    let before = times.len();
    times.retain(|t| t.is_finite() && (0.0..=duration).contains(t));
    times.sort_by(f64::total_cmp);
    times.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);
    if times.len() != before {
        log::debug!("Dropped {} invalid time values", before - times.len());
    }
    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn missing_duration_is_an_error() {
        let payload = json!({ "tempo": 128, "beat_times_sec": [1.0, 2.0] });
        assert_eq!(normalize(&payload), Err(NormalizationError::MissingDuration));
    }

    #[test_case(json!({ "duration": 0 }) ; "zero")]
    #[test_case(json!({ "duration": -3.5 }) ; "negative")]
    #[test_case(json!({ "duration": "abc" }) ; "non numeric string")]
    fn bad_duration_is_rejected(payload: Value) {
        assert!(normalize(&payload).is_err());
    }

    #[test]
    fn absent_optional_fields_fall_back() {
        let tl = normalize(&json!({ "duration": 180 })).unwrap();
        assert_eq!(tl.duration, 180.0);
        assert_eq!(tl.tempo_bpm, DEFAULT_TEMPO_BPM);
        assert!(tl.energy.is_empty());
        assert!(tl.beats.is_empty());
        assert!(tl.downbeats.is_empty());
        assert!(tl.segments.is_empty());
        assert!(tl.is_degenerate());
    }

    #[test]
    fn reads_canonical_payload() {
        let payload = json!({
            "duration": 100.0,
            "tempo": 96.0,
            "rms_energy": [-30.0, -20.0, -12.5],
            "beat_times_sec": [0.5, 1.125, 1.75],
            "downbeats_sec": [0.5],
            "segments_sec": [0.0, 40.0, 80.0],
            "title": "Tide",
            "artist": "Arlo",
            "genre": "ambient"
        });
        let tl = normalize(&payload).unwrap();
        assert_eq!(tl.tempo_bpm, 96.0);
        assert_eq!(tl.energy, vec![-30.0, -20.0, -12.5]);
        assert_eq!(tl.beats, vec![0.5, 1.125, 1.75]);
        assert_eq!(tl.downbeats, vec![0.5]);
        assert_eq!(tl.segments, vec![0.0, 40.0, 80.0]);
        assert_eq!(tl.metadata.genre.as_deref(), Some("ambient"));
        assert!(!tl.is_degenerate());
    }

    #[test]
    fn reads_nested_and_aliased_fields() {
        let payload = json!({
            "analysis": {
                "duration_ms": 90000,
                "bpm": "140",
                "beats": [{ "time": 1.0 }, { "time": 2.0 }],
                "sections": [
                    { "start": 0.0, "end": 30.0 },
                    { "start": 30.0, "end": 90.0 }
                ]
            },
            "metadata": { "title": "  Ember  " }
        });
        let tl = normalize(&payload).unwrap();
        assert_eq!(tl.duration, 90.0);
        assert_eq!(tl.tempo_bpm, 140.0);
        assert_eq!(tl.beats, vec![1.0, 2.0]);
        assert_eq!(tl.segments, vec![0.0, 30.0, 90.0]);
        assert_eq!(tl.metadata.title.as_deref(), Some("Ember"));
    }

    #[test]
    fn millisecond_beats_are_converted() {
        let tl = normalize(&json!({ "duration": 10, "beat_times_ms": [500, 1000] })).unwrap();
        assert_eq!(tl.beats, vec![0.5, 1.0]);
    }

    #[test]
    fn non_positive_tempo_falls_back() {
        let tl = normalize(&json!({ "duration": 10, "tempo": 0 })).unwrap();
        assert_eq!(tl.tempo_bpm, DEFAULT_TEMPO_BPM);
    }

    #[test]
    fn linear_energy_is_converted_to_db() {
        let tl = normalize(&json!({ "duration": 10, "energy": { "values": [1.0, 0.1, 0.0] } }))
            .unwrap();
        assert_relative_eq!(tl.energy[0], 0.0, epsilon = 1e-5);
        assert_relative_eq!(tl.energy[1], -20.0, epsilon = 1e-4);
        assert_relative_eq!(tl.energy[2], -120.0, epsilon = 1e-3);
    }

    #[test]
    fn times_are_sorted_deduplicated_and_bounded() {
        let payload = json!({
            "duration": 10,
            "beat_times_sec": [3.0, 1.0, 1.0, -0.5, 12.0, "2.0", null, 10.0]
        });
        let tl = normalize(&payload).unwrap();
        assert_eq!(tl.beats, vec![1.0, 2.0, 3.0, 10.0]);
    }
}
