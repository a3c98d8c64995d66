use std::f32::consts::TAU;

use eframe::egui::{Pos2, vec2};

use super::CanvasSize;
use crate::model::{EntityKind, GraphIndex};

const RING_FRACTION: f32 = 0.25;
const PERIPHERAL_FRACTION: f32 = 0.42;
const PERIPHERAL_PHASE: f32 = 0.3;
const COLUMN_OFFSET: f32 = 200.0;
const COLUMN_PADDING: f32 = 80.0;

pub(super) fn ring_point(canvas: CanvasSize, slot: usize, count: usize, radius: f32, phase: f32) -> Pos2 {
    let angle = (slot as f32 / count.max(1) as f32) * TAU + phase;
    canvas.center() + vec2(angle.cos(), angle.sin()) * radius
}

/// Places `members` evenly on a circle of a quarter of the short side.
pub(super) fn ring_seed(canvas: CanvasSize, members: &[usize], positions: &mut [Pos2]) {
    let radius = canvas.min_side() * RING_FRACTION;
    for (slot, &index) in members.iter().enumerate() {
        positions[index] = ring_point(canvas, slot, members.len(), radius, 0.0);
    }
}

/// Two vertical columns either side of the center, `left` kinds on the left
/// and `right` kinds on the right. Anything else falls back to the ring.
pub(super) fn bipartite_seed(
    canvas: CanvasSize,
    graph: &GraphIndex,
    members: &[usize],
    left: EntityKind,
    right: EntityKind,
    positions: &mut [Pos2],
) {
    let center = canvas.center();
    let mut lefts = Vec::new();
    let mut rights = Vec::new();
    let mut rest = Vec::new();
    for &index in members {
        match graph.kind(index) {
            kind if kind == left => lefts.push(index),
            kind if kind == right => rights.push(index),
            _ => rest.push(index),
        }
    }

    let span = (canvas.height - 2.0 * COLUMN_PADDING).max(0.0);
    let mut place_column = |column: &[usize], x: f32| {
        let steps = column.len().saturating_sub(1).max(1) as f32;
        for (slot, &index) in column.iter().enumerate() {
            let y = (slot as f32 / steps) * span + COLUMN_PADDING;
            positions[index] = Pos2::new(x, y);
        }
    };
    place_column(&lefts, center.x - COLUMN_OFFSET);
    place_column(&rights, center.x + COLUMN_OFFSET);

    ring_seed(canvas, &rest, positions);
}

/// Radius of the ring that holds nodes without edges. Kept inside the margin
/// band so a clamped canvas never cuts the ring.
pub fn peripheral_ring_radius(canvas: CanvasSize, margin: f32) -> f32 {
    let preferred = canvas.min_side() * PERIPHERAL_FRACTION;
    let limit = (canvas.min_side() * 0.5 - margin).max(0.0);
    preferred.min(limit)
}

pub(super) fn peripheral_ring(canvas: CanvasSize, margin: f32, members: &[usize], positions: &mut [Pos2]) {
    let radius = peripheral_ring_radius(canvas, margin);
    for (slot, &index) in members.iter().enumerate() {
        positions[index] = ring_point(canvas, slot, members.len(), radius, PERIPHERAL_PHASE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntitySummary, GraphData};

    #[test]
    fn ring_seed_spreads_members_around_the_center() {
        let canvas = CanvasSize::new(1000.0, 700.0);
        let mut positions = vec![Pos2::ZERO; 4];
        ring_seed(canvas, &[0, 1, 2, 3], &mut positions);

        for position in &positions {
            assert!((position.distance(canvas.center()) - 175.0).abs() < 1e-3);
        }
        assert!((positions[0].x - 675.0).abs() < 1e-3);
        assert!((positions[2].x - 325.0).abs() < 1e-3);
    }

    #[test]
    fn bipartite_seed_splits_columns_by_kind() {
        let data = GraphData {
            nodes: vec![
                EntitySummary::new("s1", "scenario", 1),
                EntitySummary::new("s2", "scenario", 1),
                EntitySummary::new("p1", "product", 1),
            ],
            edges: Vec::new(),
        };
        let graph = GraphIndex::new(&data);
        let canvas = CanvasSize::new(900.0, 600.0);
        let mut positions = vec![Pos2::ZERO; 3];
        bipartite_seed(
            canvas,
            &graph,
            &[0, 1, 2],
            EntityKind::Scenario,
            EntityKind::Product,
            &mut positions,
        );

        assert_eq!(positions[0], Pos2::new(250.0, 80.0));
        assert_eq!(positions[1], Pos2::new(250.0, 520.0));
        assert_eq!(positions[2], Pos2::new(650.0, 80.0));
    }

    #[test]
    fn peripheral_radius_stays_inside_margin() {
        assert!((peripheral_ring_radius(CanvasSize::new(1000.0, 700.0), 70.0) - 280.0).abs() < 1e-3);
        assert!((peripheral_ring_radius(CanvasSize::new(1000.0, 700.0), 10.0) - 294.0).abs() < 1e-3);
    }
}
