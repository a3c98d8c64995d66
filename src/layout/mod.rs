mod batch;
mod seed;

use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2, pos2, vec2};

pub use batch::{BatchLayout, LayoutConfig, SeedStrategy};
pub use seed::peripheral_ring_radius;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Pos2 {
        pos2(self.width * 0.5, self.height * 0.5)
    }

    pub fn min_side(self) -> f32 {
        self.width.min(self.height)
    }

    pub fn to_vec2(self) -> Vec2 {
        vec2(self.width, self.height)
    }

    /// Clamps `point` into the band `[margin, size - margin]` on both axes.
    /// A margin wider than half the canvas collapses the band to the center.
    pub fn clamp(self, point: Pos2, margin: f32) -> Pos2 {
        let clamp_axis = |value: f32, size: f32| {
            let low = margin.min(size * 0.5);
            let high = (size - margin).max(low);
            value.clamp(low, high)
        };
        pos2(clamp_axis(point.x, self.width), clamp_axis(point.y, self.height))
    }
}

/// Read side shared by the batch layout result and the live simulation.
pub trait PositionSource {
    fn position(&self, id: &str) -> Option<Pos2>;

    fn snapshot(&self) -> PositionMap;
}

/// Write side used by the interaction controller while a node is held.
pub trait PinTarget: PositionSource {
    /// Fixes `id` at `world`, overriding whatever the layout would compute.
    fn pin(&mut self, id: &str, world: Pos2);

    /// Hands `id` back to the layout.
    fn release(&mut self, id: &str);

    /// Called when a press lands on a node, before the pointer has moved.
    fn grab(&mut self, id: &str, world: Pos2) {
        self.pin(id, world);
    }
}

/// Positions keyed by node id, as produced by a one-shot layout run.
///
/// Dragging a node in a pre-converged layout simply moves it; there is no
/// simulation to hand it back to, so `release` leaves it where it was dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionMap {
    positions: HashMap<String, Pos2>,
    bounds: Option<(CanvasSize, f32)>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps dragged nodes inside `[margin, size - margin]`.
    pub fn with_bounds(mut self, canvas: CanvasSize, margin: f32) -> Self {
        self.bounds = Some((canvas, margin));
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, position: Pos2) {
        self.positions.insert(id.into(), position);
    }

    pub fn get(&self, id: &str) -> Option<Pos2> {
        self.positions.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Pos2)> {
        self.positions.iter().map(|(id, pos)| (id.as_str(), *pos))
    }
}

impl PositionSource for PositionMap {
    fn position(&self, id: &str) -> Option<Pos2> {
        self.get(id)
    }

    fn snapshot(&self) -> PositionMap {
        self.clone()
    }
}

impl PinTarget for PositionMap {
    fn pin(&mut self, id: &str, world: Pos2) {
        let Some(slot) = self.positions.get_mut(id) else {
            return;
        };
        *slot = match self.bounds {
            Some((canvas, margin)) => canvas.clamp(world, margin),
            None => world,
        };
    }

    fn release(&mut self, _id: &str) {}

    fn grab(&mut self, _id: &str, _world: Pos2) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_respects_margin_band() {
        let canvas = CanvasSize::new(1000.0, 700.0);
        assert_eq!(canvas.clamp(pos2(-40.0, 900.0), 70.0), pos2(70.0, 630.0));
        assert_eq!(canvas.clamp(pos2(500.0, 300.0), 70.0), pos2(500.0, 300.0));
        assert_eq!(CanvasSize::new(40.0, 40.0).clamp(pos2(0.0, 40.0), 30.0), pos2(20.0, 20.0));
    }

    #[test]
    fn position_map_drag_is_clamped_and_sticky() {
        let mut map = PositionMap::new().with_bounds(CanvasSize::new(1000.0, 700.0), 30.0);
        map.insert("a", pos2(500.0, 350.0));

        map.grab("a", pos2(0.0, 0.0));
        assert_eq!(map.get("a"), Some(pos2(500.0, 350.0)));

        map.pin("a", pos2(5.0, 690.0));
        map.release("a");
        assert_eq!(map.get("a"), Some(pos2(30.0, 670.0)));

        map.pin("missing", pos2(1.0, 1.0));
        assert_eq!(map.len(), 1);
    }
}
