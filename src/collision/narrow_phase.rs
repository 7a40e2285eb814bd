//! Exact circle-circle overlap test
//!
//! Every entity is a circle, so the narrow phase is a single comparison of
//! squared distance against the squared radius sum.

use glam::Vec2;

use super::entity::Entity;

/// Circle overlap on raw geometry. Touching (distance == radius sum) is not
/// an overlap.
#[inline]
pub fn circles_overlap(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> bool {
    let dx = pos_a.x - pos_b.x;
    let dy = pos_a.y - pos_b.y;
    let reach = radius_a + radius_b;
    dx * dx + dy * dy < reach * reach
}

/// Whether two entities overlap. Entities with non-finite positions or a
/// non-positive radius never collide.
#[inline]
pub fn is_colliding(a: &Entity, b: &Entity) -> bool {
    if !a.has_valid_geometry() || !b.has_valid_geometry() {
        return false;
    }
    circles_overlap(a.pos, a.radius, b.pos, b.radius)
}
