use crate::engine::Point;
use crate::spawner::{Target, TargetId};

/// First target (insertion order) whose center lies within
/// `size * radius_factor` of `point`, boundary included.
pub fn find_hit(targets: &[Target], point: Point, radius_factor: f64) -> Option<TargetId> {
    targets
        .iter()
        .find(|target| point.distance_to(target.position) <= target.size * radius_factor)
        .map(|target| target.id)
}
