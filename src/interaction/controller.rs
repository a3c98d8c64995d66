use eframe::egui::{Pos2, Rect, Vec2};
use tracing::trace;

use super::transform::ViewTransform;
use crate::layout::PinTarget;
use crate::model::{EntityKind, GraphIndex};
use crate::nav::Route;
use crate::render::Focus;

/// Screen distance a press has to travel before it counts as a drag.
pub const DRAG_THRESHOLD: f32 = 4.0;

/// Circle in world space, one per drawn node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitShape {
    pub index: usize,
    pub center: Pos2,
    pub radius: f32,
}

/// Topmost shape under `point`. Shapes are in draw order, so the last one
/// containing the point wins.
pub fn hit_test(shapes: &[HitShape], point: Pos2) -> Option<usize> {
    shapes
        .iter()
        .rev()
        .find(|shape| shape.center.distance_sq(point) < shape.radius * shape.radius)
        .map(|shape| shape.index)
}

/// Pointer input in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerInput {
    Move(Pos2),
    Press(Pos2),
    Release(Pos2),
    Wheel { pointer: Pos2, scroll: f32 },
    Leave,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionEvent {
    /// A press and release on a node without a drag.
    Navigate(Route),
    NodeMoved { index: usize, position: Pos2 },
}

#[derive(Clone, Debug, PartialEq)]
enum Gesture {
    Idle,
    Panning {
        start: Pos2,
        origin: Vec2,
    },
    Pressing {
        index: usize,
        id: String,
        start: Pos2,
        node_origin: Pos2,
        dragging: bool,
    },
}

/// Turns raw pointer input into pan, zoom, hover, drag and click behavior
/// for one graph view. Owns the view transform and the hover, selection and
/// filter state read by the renderers.
#[derive(Clone, Debug)]
pub struct PointerController {
    transform: ViewTransform,
    gesture: Gesture,
    hovered: Option<usize>,
    selected: Option<usize>,
    filter: Option<EntityKind>,
}

impl PointerController {
    pub fn new(origin: Pos2) -> Self {
        Self {
            transform: ViewTransform::new(origin),
            gesture: Gesture::Idle,
            hovered: None,
            selected: None,
            filter: None,
        }
    }

    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut ViewTransform {
        &mut self.transform
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn filter(&self) -> Option<EntityKind> {
        self.filter
    }

    pub fn focus(&self) -> Focus {
        Focus {
            hovered: self.hovered,
            filter: self.filter,
        }
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Pressing { dragging: true, .. })
    }

    pub fn set_selected(&mut self, selected: Option<usize>) {
        self.selected = selected;
    }

    /// Picks a category filter; choosing the active one again clears it.
    pub fn toggle_filter(&mut self, kind: EntityKind) {
        self.filter = if self.filter == Some(kind) { None } else { Some(kind) };
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    /// Resets zoom, pan, filter, selection and hover in one step.
    pub fn home(&mut self) {
        self.transform.reset();
        self.filter = None;
        self.selected = None;
        self.hovered = None;
        self.gesture = Gesture::Idle;
    }

    pub fn handle<T: PinTarget + ?Sized>(
        &mut self,
        input: PointerInput,
        rect: Rect,
        shapes: &[HitShape],
        graph: &GraphIndex,
        target: &mut T,
    ) -> Option<InteractionEvent> {
        match input {
            PointerInput::Move(pointer) => self.on_move(pointer, rect, shapes, target),
            PointerInput::Press(pointer) => {
                self.on_press(pointer, rect, shapes, graph, target);
                None
            }
            PointerInput::Release(_) => self.on_release(target),
            PointerInput::Wheel { pointer, scroll } => {
                self.transform.zoom_at(rect, pointer, scroll);
                None
            }
            PointerInput::Leave => {
                self.hovered = None;
                if let Gesture::Pressing { id, .. } = &self.gesture {
                    target.release(id);
                }
                self.gesture = Gesture::Idle;
                None
            }
        }
    }

    fn on_press<T: PinTarget + ?Sized>(
        &mut self,
        pointer: Pos2,
        rect: Rect,
        shapes: &[HitShape],
        graph: &GraphIndex,
        target: &mut T,
    ) {
        let world = self.transform.screen_to_world(rect, pointer);
        let hit = hit_test(shapes, world).and_then(|index| Some((index, graph.node(index)?.id.clone())));

        self.gesture = match hit {
            Some((index, id)) => {
                target.grab(&id, world);
                let node_origin = target.position(&id).unwrap_or(world);
                trace!(%id, "node grabbed");
                Gesture::Pressing {
                    index,
                    id,
                    start: pointer,
                    node_origin,
                    dragging: false,
                }
            }
            None => Gesture::Panning {
                start: pointer,
                origin: self.transform.pan,
            },
        };
    }

    fn on_move<T: PinTarget + ?Sized>(
        &mut self,
        pointer: Pos2,
        rect: Rect,
        shapes: &[HitShape],
        target: &mut T,
    ) -> Option<InteractionEvent> {
        match &mut self.gesture {
            Gesture::Idle => {
                let world = self.transform.screen_to_world(rect, pointer);
                self.hovered = hit_test(shapes, world);
                None
            }
            Gesture::Panning { start, origin } => {
                self.transform.pan = *origin + (pointer - *start);
                None
            }
            Gesture::Pressing {
                index,
                id,
                start,
                node_origin,
                dragging,
            } => {
                let moved = pointer - *start;
                if !*dragging && moved.length() > DRAG_THRESHOLD {
                    *dragging = true;
                }
                if !*dragging {
                    return None;
                }

                target.pin(id, *node_origin + moved / self.transform.zoom);
                let position = target.position(id)?;
                Some(InteractionEvent::NodeMoved {
                    index: *index,
                    position,
                })
            }
        }
    }

    fn on_release<T: PinTarget + ?Sized>(&mut self, target: &mut T) -> Option<InteractionEvent> {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Pressing {
                index, id, dragging, ..
            } => {
                target.release(&id);
                if dragging {
                    return None;
                }
                self.selected = Some(index);
                Some(InteractionEvent::Navigate(Route::Entity(id)))
            }
            Gesture::Panning { .. } | Gesture::Idle => None,
        }
    }
}
