pub mod model;
pub mod normalize;
pub mod placeholder;

pub use model::{AnalysisTimeline, Selection, TrackMetadata};
pub use normalize::{normalize, NormalizationError};
