use eframe::egui::{Pos2, Rect, Vec2};

pub const ZOOM_MIN: f32 = 0.4;
pub const ZOOM_MAX: f32 = 2.0;
pub const ZOOM_STEP: f32 = 0.15;

/// Pan/zoom between world (layout) space and screen space.
///
/// The world point `origin` lands on the center of the screen rect when pan
/// is zero, so a layout computed for a fixed canvas stays centered in any
/// panel size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    pub pan: Vec2,
    pub origin: Pos2,
}

impl ViewTransform {
    pub fn new(origin: Pos2) -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            origin,
        }
    }

    pub fn world_to_screen(&self, rect: Rect, world: Pos2) -> Pos2 {
        rect.center() + self.pan + (world - self.origin) * self.zoom
    }

    pub fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Pos2 {
        self.origin + (screen - rect.center() - self.pan) / self.zoom
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).min(ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).max(ZOOM_MIN);
    }

    /// Wheel zoom that keeps the world point under `pointer` fixed on screen.
    pub fn zoom_at(&mut self, rect: Rect, pointer: Pos2, scroll: f32) {
        if scroll.abs() <= f32::EPSILON {
            return;
        }
        let world_before = self.screen_to_world(rect, pointer);
        let factor = (1.0 + scroll * 0.0018).clamp(0.85, 1.15);
        self.zoom = (self.zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        self.pan = pointer - rect.center() - (world_before - self.origin) * self.zoom;
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
    }
}
