//! Pointer queries over floating stars
//!
//! Flying and collected stars are never selectable. Queries only read.

use glam::Vec2;

use super::state::{Star, StarId};

/// Topmost floating star strictly within `radius` of `point`.
///
/// Scans newest-first, so the star drawn last (on top) wins overlaps.
pub fn hit_test(stars: &[Star], point: Vec2, radius: f32) -> Option<&Star> {
    stars
        .iter()
        .rev()
        .filter(|s| s.is_floating())
        .find(|s| s.pos.distance(point) < radius)
}

/// Ids of up to `k` floating stars nearest to `point`, closest first.
///
/// Equal distances keep insertion order.
pub fn k_nearest(stars: &[Star], point: Vec2, k: usize) -> Vec<StarId> {
    if k == 0 {
        return Vec::new();
    }
    let mut candidates: Vec<(StarId, f32)> = stars
        .iter()
        .filter(|s| s.is_floating())
        .map(|s| (s.id, s.pos.distance_squared(point)))
        .collect();
    // sort_by is stable
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    candidates.truncate(k);
    candidates.into_iter().map(|(id, _)| id).collect()
}
