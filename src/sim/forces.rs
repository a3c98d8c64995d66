use eframe::egui::Vec2;

use super::quadtree::QuadNode;
use crate::util::fallback_direction;

#[derive(Clone, Copy, Debug)]
pub(super) struct ChargeParams {
    /// Charge already scaled by alpha; negative values repel.
    pub(super) strength: f32,
    pub(super) distance_max_sq: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) max_reach_sq: f32,
}

fn charge_between(index: usize, other: usize, positions: &[Vec2], weight: f32, params: ChargeParams) -> Vec2 {
    let mut delta = positions[other] - positions[index];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= params.distance_max_sq {
        return Vec2::ZERO;
    }
    if distance_sq < 1e-6 {
        delta = fallback_direction(index, other);
        distance_sq = 1.0;
    } else if distance_sq < 1.0 {
        distance_sq = distance_sq.sqrt();
    }
    delta * (params.strength * weight / distance_sq)
}

/// Many-body force on `index`, walking the tree and treating far cells as a
/// single mass at their center. Cells past `distance_max` contribute nothing.
pub(super) fn accumulate_charge_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    velocity: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    if node.is_leaf() {
        for &other in &node.indices {
            if other != index {
                *velocity += charge_between(index, other, positions, 1.0, params);
            }
        }
        return;
    }

    let point = positions[index];
    let delta = node.center_of_mass - point;
    let distance_sq = delta.length_sq().max(1e-4);
    let far_enough = !node.bounds.contains(point)
        && node.bounds.side_length() / distance_sq.sqrt() < params.theta
        && node.mass > 1.0;

    if far_enough {
        if distance_sq < params.distance_max_sq {
            *velocity += delta * (params.strength * node.mass / distance_sq);
        }
        return;
    }

    for child in node.children() {
        accumulate_charge_for_node(child, index, positions, params, velocity);
    }
}

/// Overlap corrections for every pair of nodes whose collision circles
/// intersect. Pinned nodes never move; their partner takes the whole push.
#[allow(clippy::too_many_arguments)]
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    reach: &[f32],
    pinned: &[bool],
    params: CollisionParams,
    corrections: &mut [Vec2],
) {
    if node_a.bounds.gap_sq(node_b.bounds) > params.max_reach_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (slot, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[slot + 1..] {
                    separate(from, to, positions, reach, pinned, params, corrections);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    separate(from, to, positions, reach, pinned, params, corrections);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (slot, child_a) in children.iter().enumerate() {
            accumulate_collision_pairs(child_a, child_a, true, positions, reach, pinned, params, corrections);
            for child_b in &children[slot + 1..] {
                accumulate_collision_pairs(child_a, child_b, false, positions, reach, pinned, params, corrections);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collision_pairs(child, node_b, false, positions, reach, pinned, params, corrections);
        }
    } else {
        for child in node_b.children() {
            accumulate_collision_pairs(node_a, child, false, positions, reach, pinned, params, corrections);
        }
    }
}

fn separate(
    from: usize,
    to: usize,
    positions: &[Vec2],
    reach: &[f32],
    pinned: &[bool],
    params: CollisionParams,
    corrections: &mut [Vec2],
) {
    let min_distance = reach[from] + reach[to];
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    if distance >= min_distance {
        return;
    }

    let direction = if distance > 1e-4 {
        delta / distance
    } else {
        fallback_direction(from, to)
    };
    let push = (min_distance - distance) * params.strength;

    let (share_from, share_to) = match (pinned[from], pinned[to]) {
        (true, true) => return,
        (true, false) => (0.0, 1.0),
        (false, true) => (1.0, 0.0),
        (false, false) => {
            let weight_from = reach[from] * reach[from];
            let weight_to = reach[to] * reach[to];
            let total = (weight_from + weight_to).max(1e-6);
            (weight_to / total, weight_from / total)
        }
    };

    corrections[from] += direction * push * share_from;
    corrections[to] -= direction * push * share_to;
}
