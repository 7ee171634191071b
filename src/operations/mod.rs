mod extend;
mod linearize;
mod road_buffer;
mod width;

pub use extend::{BranchExtender, ContinuationPreference};
pub use linearize::{LinearizationConfig, Linearizer};
pub use road_buffer::RoadBuffer;
pub use width::evaluate_width_way;
