use eframe::egui::{Sense, Ui};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use super::super::paint::{draw_background, paint_display_list};
use super::{GraphView, empty_state, hover_card, pointer_inputs, set_pointer_cursor};
use crate::interaction::{InteractionEvent, PointerController};
use crate::layout::CanvasSize;
use crate::model::{GraphData, GraphIndex};
use crate::render::{DisplayList, FrameLoop, FrameState, RadiusScale, ResizeWatch, build_frame};
use crate::sim::{Simulation, SimulationConfig};

const INITIAL_CANVAS: CanvasSize = CanvasSize::new(800.0, 500.0);

/// The animated entity map: a continuous simulation ticked every frame and
/// redrawn from scratch.
pub(in crate::app) struct LiveView {
    graph: GraphIndex,
    radii: Vec<f32>,
    sim: Simulation,
    frames: FrameLoop,
    resize: ResizeWatch,
    controller: PointerController,
    rng: StdRng,
    measured: bool,
    inside: bool,
}

impl LiveView {
    pub(in crate::app) fn new(data: &GraphData, seed: u64) -> Self {
        let graph = GraphIndex::new(data);
        let radii = RadiusScale::LIVE_MAP.radii(&graph);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sim = Simulation::new(SimulationConfig::default(), INITIAL_CANVAS);
        sim.reseed(&graph, &radii, &mut rng);

        let mut frames = FrameLoop::default();
        frames.start();

        Self {
            graph,
            radii,
            sim,
            frames,
            resize: ResizeWatch::default(),
            controller: PointerController::new(INITIAL_CANVAS.center()),
            rng,
            measured: false,
            inside: false,
        }
    }

    /// Tracks the canvas size. The first real measurement rebuilds the
    /// simulation at that size; later changes only move its center.
    pub(in crate::app) fn fit(&mut self, size: CanvasSize) {
        if !self.resize.is_attached() {
            return;
        }
        if let Some(size) = self.resize.observe(size) {
            self.sim.resize(size);
            self.controller.transform_mut().origin = size.center();
            return;
        }
        if !self.measured {
            self.measured = true;
            if self.sim.canvas() != size {
                self.sim = Simulation::new(*self.sim.config(), size);
                self.sim.reseed(&self.graph, &self.radii, &mut self.rng);
                self.controller.transform_mut().origin = size.center();
            }
        }
    }

    /// Ticks the simulation, then builds the frame from the fresh positions.
    /// `None` once the frame loop has been cancelled.
    pub(in crate::app) fn advance(&mut self) -> Option<DisplayList> {
        let tick = self.frames.advance()?;
        self.sim.tick();
        Some(build_frame(
            &self.sim,
            &self.graph,
            FrameState {
                tick,
                focus: self.controller.focus(),
                selected: self.controller.selected(),
            },
        ))
    }

    /// Stops the simulation, cancels the frame loop and detaches the resize
    /// watch, in that order. Safe to call more than once.
    pub(in crate::app) fn teardown(&mut self) {
        if !self.frames.is_running() && !self.resize.is_attached() {
            return;
        }
        self.sim.stop();
        self.frames.cancel();
        self.resize.detach();
        debug!(frames = self.frames.tick(), "live view torn down");
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl GraphView for LiveView {
    fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    fn controller(&self) -> &PointerController {
        &self.controller
    }

    fn controller_mut(&mut self) -> &mut PointerController {
        &mut self.controller
    }

    fn select(&mut self, id: Option<&str>) {
        let index = id.and_then(|id| self.graph.index_of(id));
        self.controller.set_selected(index);
    }

    fn show(&mut self, ui: &mut Ui) -> Option<InteractionEvent> {
        if self.graph.is_empty() {
            empty_state(ui);
            return None;
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.fit(CanvasSize::new(rect.width(), rect.height()));

        let list = self.advance()?;

        let mut navigation = None;
        for input in pointer_inputs(ui, &response, &mut self.inside) {
            let event = self
                .controller
                .handle(input, rect, &list.hit_shapes, &self.graph, &mut self.sim);
            if let Some(event @ InteractionEvent::Navigate(_)) = event {
                navigation = Some(event);
            }
        }
        set_pointer_cursor(ui, &self.controller);
        if let Some(node) = self.controller.hovered().and_then(|index| self.graph.node(index)) {
            hover_card(response, node);
        }

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.controller.transform());
        paint_display_list(&painter, rect, self.controller.transform(), &list);
        ui.ctx().request_repaint();
        navigation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntitySummary, GraphEdge};

    fn view() -> LiveView {
        LiveView::new(
            &GraphData {
                nodes: vec![
                    EntitySummary::new("a", "brand", 50),
                    EntitySummary::new("b", "product", 20),
                    EntitySummary::new("c", "person", 5),
                ],
                edges: vec![GraphEdge::new("a", "b", "produces")],
            },
            3,
        )
    }

    #[test]
    fn each_frame_ticks_before_building() {
        let mut live = view();
        let before = live.sim.alpha();
        let list = live.advance().unwrap();
        assert!(live.sim.alpha() < before);
        assert_eq!(list.hit_shapes.len(), 3);
    }

    #[test]
    fn teardown_stops_everything_and_is_idempotent() {
        let mut live = view();
        live.teardown();
        live.teardown();

        assert!(!live.sim.is_running());
        assert!(!live.frames.is_running());
        assert!(!live.resize.is_attached());
        assert!(live.advance().is_none());
    }

    #[test]
    fn first_measurement_rebuilds_then_resizes_recenter() {
        let mut live = view();
        let first = CanvasSize::new(1200.0, 600.0);
        live.fit(first);
        assert_eq!(live.sim.canvas(), first);
        assert_eq!(live.controller.transform().origin, first.center());

        let wider = CanvasSize::new(1400.0, 600.0);
        live.fit(wider);
        assert_eq!(live.sim.canvas(), wider);
        assert_eq!(live.controller.transform().origin, wider.center());
        assert!(live.sim.is_running());
    }

    #[test]
    fn detached_watch_ignores_size_changes() {
        let mut live = view();
        live.fit(INITIAL_CANVAS);
        live.teardown();
        live.fit(CanvasSize::new(300.0, 300.0));
        assert_eq!(live.sim.canvas(), INITIAL_CANVAS);
    }
}
