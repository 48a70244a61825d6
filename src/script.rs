use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::playback::PlaybackTransport;
use crate::view::TimelineView;

fn default_drag_steps() -> u32 {
    8
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Press and release at `x` (logical pixels)
    Click { x: f64 },
    /// Press at `from`, move to `to` in `steps` increments, release
    Drag {
        from: f64,
        to: f64,
        #[serde(default = "default_drag_steps")]
        steps: u32,
    },
    ZoomIn,
    ZoomOut,
    Reset,
    /// Shift the window by `seconds` (positive moves it earlier)
    Pan { seconds: f64 },
    Seek { time: f64 },
    SelectSegment {
        #[serde(default)]
        index: Option<usize>,
    },
    TogglePlay,
}

/// `{ "at": 3.5, "action": "drag", "from": 800, "to": 500 }`, with `at`
/// in seconds of rendered video.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptedAction {
    pub at: f64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Default)]
pub struct Script {
    actions: Vec<ScriptedAction>,
    next: usize,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid script {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut actions: Vec<ScriptedAction> = serde_json::from_str(json)?;
        if let Some(bad) = actions.iter().find(|a| !a.at.is_finite()) {
            anyhow::bail!("Action {:?} has a non-finite time", bad.action);
        }
        actions.sort_by(|a, b| a.at.total_cmp(&b.at));
        log::info!("Loaded {} scripted actions", actions.len());
        Ok(Self { actions, next: 0 })
    }

    pub fn remaining(&self) -> usize {
        self.actions.len() - self.next
    }

    /// Actions whose time is at or before `time` that have not fired yet.
    pub fn due(&mut self, time: f64) -> &[ScriptedAction] {
        let start = self.next;
        let end = start + self.actions[start..].partition_point(|a| a.at <= time);
        self.next = end;
        &self.actions[start..end]
    }
}

pub fn apply<T: PlaybackTransport>(view: &mut TimelineView<T>, action: &Action) {
    log::debug!("Scripted action: {:?}", action);
    match *action {
        Action::Click { x } => {
            view.pointer_down(x);
            view.pointer_up(x);
        }
        Action::Drag { from, to, steps } => {
            let steps = steps.max(1);
            view.pointer_down(from);
            for i in 1..=steps {
                view.pointer_move(from + (to - from) * i as f64 / steps as f64);
            }
            view.pointer_up(to);
        }
        Action::ZoomIn => view.zoom_in(),
        Action::ZoomOut => view.zoom_out(),
        Action::Reset => view.reset_view(),
        Action::Pan { seconds } => view.pan_by(seconds),
        Action::Seek { time } => view.seek(time),
        Action::SelectSegment { index } => view.select_segment(index),
        Action::TogglePlay => view.toggle_play(),
    }
}
