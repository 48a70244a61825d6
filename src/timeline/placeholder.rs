use serde_json::{json, Value};

/// Energy samples per second in generated payloads.
const ENERGY_RATE_HZ: f64 = 10.0;
const BEATS_PER_BAR: usize = 4;

/// Build a synthetic analysis payload for demos and previews.
///
/// Output is fully determined by `seed`. The result goes through `normalize`
/// like any real payload; the renderer never sees this module.
pub fn generate(duration: f64, tempo_bpm: f64, seed: u64) -> Value {
    let mut rng = fastrand::Rng::with_seed(seed);
    let beat_interval = 60.0 / tempo_bpm.max(1.0);

    let mut beats = Vec::new();
    let mut t = rng.f64() * beat_interval;
    while t <= duration {
        beats.push(round_ms(t));
        t += beat_interval;
    }
    let downbeats: Vec<f64> = beats.iter().step_by(BEATS_PER_BAR).copied().collect();

    // Sections of 4, 8 or 16 bars, aligned to downbeats
    let mut segments = vec![0.0];
    let mut bar = 0usize;
    loop {
        bar += [4, 8, 8, 16][rng.usize(..4)];
        match downbeats.get(bar) {
            Some(&boundary) => segments.push(boundary),
            None => break,
        }
    }

    let sample_count = (duration * ENERGY_RATE_HZ).ceil() as usize;
    let section_levels: Vec<f64> = segments.iter().map(|_| -30.0 + rng.f64() * 18.0).collect();
    let energy: Vec<f64> = (0..sample_count)
        .map(|i| {
            let time = i as f64 / ENERGY_RATE_HZ;
            let section = segments.partition_point(|&b| b <= time).saturating_sub(1);
            let jitter = (rng.f64() - 0.5) * 6.0;
            (section_levels[section] + jitter).clamp(-60.0, 0.0)
        })
        .collect();

    log::debug!(
        "Generated placeholder payload: {:.1}s, {} beats, {} segments (seed {})",
        duration,
        beats.len(),
        segments.len(),
        seed
    );

    json!({
        "duration": duration,
        "tempo": tempo_bpm,
        "energy_db": energy,
        "beat_times_sec": beats,
        "downbeats_sec": downbeats,
        "segments_sec": segments,
        "title": "Placeholder",
    })
}

fn round_ms(t: f64) -> f64 {
    (t * 1000.0).round() / 1000.0
}
