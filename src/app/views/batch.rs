use eframe::egui::{Rect, Sense, Ui};
use tracing::debug;

use super::super::paint::{draw_background, paint_scene};
use super::{GraphView, empty_state, hover_card, pointer_inputs, set_pointer_cursor};
use crate::interaction::{InteractionEvent, PointerController, PointerInput};
use crate::layout::{BatchLayout, CanvasSize, LayoutConfig, PositionMap};
use crate::model::{GraphData, GraphIndex};
use crate::render::{RadiusScale, Scene};

/// A graph laid out once up front and drawn from a retained scene: the
/// knowledge graph and the scenario map.
pub(in crate::app) struct BatchView {
    graph: GraphIndex,
    positions: PositionMap,
    scene: Scene,
    controller: PointerController,
    inside: bool,
}

impl BatchView {
    pub(in crate::app) fn knowledge(data: &GraphData) -> Self {
        Self::new(
            GraphIndex::new(data),
            LayoutConfig::knowledge_graph(),
            LayoutConfig::KNOWLEDGE_CANVAS,
            RadiusScale::KNOWLEDGE_GRAPH,
        )
    }

    pub(in crate::app) fn scenario(data: &GraphData) -> Self {
        Self::new(
            GraphIndex::new(&data.scenario_subgraph()),
            LayoutConfig::scenario_map(),
            LayoutConfig::SCENARIO_CANVAS,
            RadiusScale::SCENARIO_MAP,
        )
    }

    fn new(graph: GraphIndex, config: LayoutConfig, canvas: CanvasSize, scale: RadiusScale) -> Self {
        let positions = BatchLayout::new(config).run(&graph, canvas);
        let scene = Scene::build(&graph, &positions, scale, canvas);
        debug!(nodes = graph.len(), edges = graph.edges().len(), "batch view built");
        Self {
            graph,
            positions,
            scene,
            controller: PointerController::new(canvas.center()),
            inside: false,
        }
    }

    pub(in crate::app) fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Feeds one input through the controller and mirrors the outcome into
    /// the scene.
    pub(in crate::app) fn apply(&mut self, input: PointerInput, rect: Rect) -> Option<InteractionEvent> {
        let shapes = self.scene.hit_shapes();
        let event = self
            .controller
            .handle(input, rect, &shapes, &self.graph, &mut self.positions);
        if let Some(InteractionEvent::NodeMoved { index, position }) = &event {
            self.scene.move_node(*index, *position);
        }
        self.sync_state();
        event
    }

    fn sync_state(&mut self) {
        self.scene.set_focus(&self.graph, self.controller.focus());
        self.scene.set_selected(self.controller.selected());
    }
}

impl GraphView for BatchView {
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
        self.sync_state();
    }

    fn show(&mut self, ui: &mut Ui) -> Option<InteractionEvent> {
        if self.graph.is_empty() {
            empty_state(ui);
            return None;
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        let mut navigation = None;
        for input in pointer_inputs(ui, &response, &mut self.inside) {
            if let Some(event @ InteractionEvent::Navigate(_)) = self.apply(input, rect) {
                navigation = Some(event);
            }
        }
        // Toolbar changes to filter or zoom land here too.
        self.sync_state();
        set_pointer_cursor(ui, &self.controller);
        if let Some(node) = self.controller.hovered().and_then(|index| self.graph.node(index)) {
            hover_card(response, node);
        }

        draw_background(&painter, rect, self.controller.transform());
        paint_scene(&painter, rect, self.controller.transform(), &self.scene);
        navigation
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{self, Pos2, vec2};

    use super::super::EMPTY_MESSAGE;
    use super::*;
    use crate::layout::PositionSource;
    use crate::model::{EntitySummary, GraphEdge};
    use crate::nav::Route;

    fn data() -> GraphData {
        GraphData {
            nodes: vec![
                EntitySummary::new("acme", "brand", 100),
                EntitySummary::new("rocket", "product", 40),
                EntitySummary::new("launch", "scenario", 20),
                EntitySummary::new("loner", "person", 3),
            ],
            edges: vec![
                GraphEdge::new("acme", "rocket", "produces"),
                GraphEdge::new("launch", "rocket", "needs"),
            ],
        }
    }

    fn rect() -> Rect {
        Rect::from_min_size(Pos2::ZERO, LayoutConfig::KNOWLEDGE_CANVAS.to_vec2())
    }

    #[test]
    fn dragging_moves_only_the_held_node_in_the_scene() {
        let mut view = BatchView::knowledge(&data());
        let start = view.scene().node("rocket").unwrap().center;
        let untouched = view.scene().node("acme").unwrap().center;

        view.apply(PointerInput::Press(start), rect());
        let event = view.apply(PointerInput::Move(start + vec2(40.0, 0.0)), rect());

        assert!(matches!(event, Some(InteractionEvent::NodeMoved { .. })));
        let moved = view.scene().node("rocket").unwrap().center;
        assert!((moved.x - start.x - 40.0).abs() < 1e-3);
        assert_eq!(view.positions.position("rocket"), Some(moved));
        assert_eq!(view.scene().node("acme").unwrap().center, untouched);
    }

    #[test]
    fn click_selects_and_navigates() {
        let mut view = BatchView::knowledge(&data());
        let at = view.scene().node("acme").unwrap().center;

        view.apply(PointerInput::Press(at), rect());
        let event = view.apply(PointerInput::Release(at), rect());

        assert_eq!(event, Some(InteractionEvent::Navigate(Route::entity("acme"))));
        assert_eq!(view.scene().selected(), view.graph().index_of("acme"));
    }

    #[test]
    fn scenario_view_keeps_only_scenarios_and_products() {
        let view = BatchView::scenario(&data());
        let ids = view.scene().nodes().iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["rocket", "launch"]);
        assert_eq!(view.graph().edges().len(), 1);
    }

    fn shown_texts(view: &mut BatchView) -> Vec<String> {
        let ctx = egui::Context::default();
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                assert_eq!(view.show(ui), None);
            });
        });
        output
            .shapes
            .iter()
            .filter_map(|clipped| match &clipped.shape {
                egui::Shape::Text(text) => Some(text.galley.text().to_owned()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn scenario_map_without_scenarios_shows_the_empty_state() {
        let brands = GraphData {
            nodes: vec![EntitySummary::new("acme", "brand", 10)],
            edges: Vec::new(),
        };
        let mut view = BatchView::scenario(&brands);

        assert!(view.graph().is_empty());
        assert!(shown_texts(&mut view).iter().any(|text| text == EMPTY_MESSAGE));
    }

    #[test]
    fn select_by_id_updates_the_scene() {
        let mut view = BatchView::knowledge(&data());
        view.select(Some("loner"));
        assert_eq!(view.scene().selected(), view.graph().index_of("loner"));
        view.select(Some("nobody"));
        assert_eq!(view.scene().selected(), None);
    }
}
