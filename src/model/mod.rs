//! Entities of a schematized crossroad, from the straight approximation of
//! each street to the assembled pedestrian region.

mod branch;
mod crossing;
mod inner_region;
mod straight_sidewalk;
mod straight_way;
mod traffic_island;
mod turning_sidewalk;

pub use branch::Branch;
pub use crossing::Crossing;
pub use inner_region::{BuildInnerRegion, InnerRegion};
pub use straight_sidewalk::{Side, StraightSidewalk};
pub use straight_way::StraightWay;
pub use traffic_island::{GeneralizeIsland, IslandGeneralization, TrafficIsland};
pub use turning_sidewalk::{BuildTurningSidewalk, PointData, TurnPoint, TurnShape, TurningSidewalk};
