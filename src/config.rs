use serde::Deserialize;

use crate::error::{InputError, Result};
use crate::model::TurnShape;
use crate::operations::{ContinuationPreference, LinearizationConfig};

/// Parameters of a [`CrossroadSchematization`](crate::pipeline::CrossroadSchematization) run.
///
/// Missing fields take their default value when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchematizationConfig {
    /// Breadth added to every roadway width in the buffer used to end
    /// traffic island spokes.
    pub road_buffer_margin: f64,
    /// Offset between the kerb and the footway. Counted twice in branch
    /// widths, and used as the buffer margin when moving flexible corners.
    pub kerb_footway_distance: f64,
    /// Inward offset of the inner region.
    pub white_space_distance: f64,
    pub turn_shape: TurnShape,
    pub ignore_crossings_for_sidewalks: bool,
    /// Drop traffic islands without any crossing from the output.
    pub only_reachable_islands: bool,
    /// Distance along a sidewalk under which a crossing replaces a nearby
    /// point instead of being inserted.
    pub crossing_merge_epsilon: f64,
    /// Length above which a virtual island edge, one tracing a branch's
    /// medial axis, marks where an over-long island section is split.
    pub virtual_edge_length: f64,
    pub linearization: LinearizationConfig,
    pub continuation_preference: ContinuationPreference,
}

impl Default for SchematizationConfig {
    fn default() -> Self {
        Self {
            road_buffer_margin: 1.0,
            kerb_footway_distance: 0.5,
            white_space_distance: 1.5,
            turn_shape: TurnShape::default(),
            ignore_crossings_for_sidewalks: false,
            only_reachable_islands: true,
            crossing_merge_epsilon: 2.0,
            virtual_edge_length: 25.0,
            linearization: LinearizationConfig::default(),
            continuation_preference: ContinuationPreference::default(),
        }
    }
}

impl SchematizationConfig {
    /// Reads a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Json` if the text is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text).map_err(InputError::from)?)
    }
}
