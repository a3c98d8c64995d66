use eframe::egui::{Color32, Pos2, Vec2};

use super::encoding::{
    DeltaBadge, EdgeStyle, Focus, RadiusScale, delta_badge, edge_style, node_color, shows_trend_glyphs,
    sparkline_points,
};
use crate::interaction::HitShape;
use crate::layout::{CanvasSize, PositionSource};
use crate::model::{EntityKind, GraphIndex};

const SPARKLINE_SIZE: Vec2 = Vec2::new(36.0, 12.0);
const CURVE_OFFSET_MAX: f32 = 30.0;
const CURVE_OFFSET_SHARE: f32 = 0.12;

#[derive(Clone, Debug, PartialEq)]
pub struct NodeElement {
    pub index: usize,
    pub id: String,
    pub label: String,
    pub kind: EntityKind,
    pub center: Pos2,
    pub radius: f32,
    pub color: Color32,
    pub opacity: f32,
    pub connected: bool,
    pub central: bool,
    pub selected: bool,
    pub hovered: bool,
    pub badge: Option<DeltaBadge>,
    /// Relative to the top-left corner of a `SPARKLINE_SIZE` box under the node.
    pub sparkline: Vec<Pos2>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeElement {
    pub source: usize,
    pub target: usize,
    pub link_type: String,
    pub style: EdgeStyle,
    pub from: Pos2,
    pub control: Pos2,
    pub to: Pos2,
    pub opacity: f32,
    pub emphasized: bool,
}

impl EdgeElement {
    fn reshape(&mut self, from: Pos2, to: Pos2) {
        self.from = from;
        self.to = to;
        self.control = curve_control(from, to);
    }
}

/// Control point of the quadratic curve from `from` to `to`: the midpoint
/// pushed sideways by 12% of the length, at most 30 units.
pub fn curve_control(from: Pos2, to: Pos2) -> Pos2 {
    let delta = to - from;
    let length = delta.length();
    let offset = (length * CURVE_OFFSET_SHARE).min(CURVE_OFFSET_MAX);
    let normal = if length > 0.0 {
        Vec2::new(-delta.y, delta.x) / length
    } else {
        Vec2::ZERO
    };
    from.lerp(to, 0.5) + normal * offset
}

/// Samples a quadratic Bézier into `segments + 1` points.
pub fn flatten_quadratic(from: Pos2, control: Pos2, to: Pos2, segments: usize) -> Vec<Pos2> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|step| {
            let t = step as f32 / segments as f32;
            let a = from.lerp(control, t);
            let b = control.lerp(to, t);
            a.lerp(b, t)
        })
        .collect()
}

/// Retained element tree for a pre-converged layout.
///
/// Built once from positions; afterwards focus changes touch only opacities
/// and a moved node touches only itself and its incident edges.
#[derive(Clone, Debug)]
pub struct Scene {
    canvas: CanvasSize,
    nodes: Vec<NodeElement>,
    edges: Vec<EdgeElement>,
    incident: Vec<Vec<usize>>,
    focus: Focus,
    selected: Option<usize>,
}

impl Scene {
    pub fn build(graph: &GraphIndex, positions: &impl PositionSource, scale: RadiusScale, canvas: CanvasSize) -> Self {
        let max = graph.max_mentions();
        let central = graph.most_connected();
        let fallback = canvas.center();

        let nodes = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let radius = scale.radius(node.mention_count, max);
                let connected = graph.is_connected(index);
                let glyphs = shows_trend_glyphs(radius, connected);
                NodeElement {
                    index,
                    id: node.id.clone(),
                    label: node.display_name().to_owned(),
                    kind: node.kind(),
                    center: positions.position(&node.id).unwrap_or(fallback),
                    radius,
                    color: node_color(node.kind()),
                    opacity: 1.0,
                    connected,
                    central: central == Some(index),
                    selected: false,
                    hovered: false,
                    badge: if glyphs { delta_badge(node.mention_delta) } else { None },
                    sparkline: if glyphs {
                        sparkline_points(&node.sparkline, SPARKLINE_SIZE)
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect::<Vec<_>>();

        let mut incident = vec![Vec::new(); nodes.len()];
        let edges = graph
            .edges()
            .iter()
            .enumerate()
            .map(|(slot, edge)| {
                incident[edge.source].push(slot);
                incident[edge.target].push(slot);
                let from = nodes[edge.source].center;
                let to = nodes[edge.target].center;
                EdgeElement {
                    source: edge.source,
                    target: edge.target,
                    link_type: edge.link_type.clone(),
                    style: edge_style(edge.kind),
                    from,
                    control: curve_control(from, to),
                    to,
                    opacity: 0.6,
                    emphasized: false,
                }
            })
            .collect();

        Self {
            canvas,
            nodes,
            edges,
            incident,
            focus: Focus::default(),
            selected: None,
        }
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn nodes(&self) -> &[NodeElement] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeElement] {
        &self.edges
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn node(&self, id: &str) -> Option<&NodeElement> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Rewrites opacities for a new hover/filter state. Geometry is untouched.
    pub fn set_focus(&mut self, graph: &GraphIndex, focus: Focus) {
        if self.focus == focus {
            return;
        }
        self.focus = focus;
        for node in &mut self.nodes {
            node.opacity = focus.node_opacity(graph, node.index);
            node.hovered = focus.hovered == Some(node.index);
        }
        for (element, edge) in self.edges.iter_mut().zip(graph.edges()) {
            element.opacity = focus.edge_opacity(graph, edge);
            element.emphasized =
                focus.hovered.is_some_and(|hovered| edge.source == hovered || edge.target == hovered);
        }
    }

    pub fn set_selected(&mut self, selected: Option<usize>) {
        if let Some(previous) = self.selected.and_then(|index| self.nodes.get_mut(index)) {
            previous.selected = false;
        }
        self.selected = selected.filter(|&index| index < self.nodes.len());
        if let Some(current) = self.selected.and_then(|index| self.nodes.get_mut(index)) {
            current.selected = true;
        }
    }

    /// Moves one node and re-shapes only the edges touching it.
    pub fn move_node(&mut self, index: usize, center: Pos2) {
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };
        node.center = center;

        for &slot in &self.incident[index] {
            let edge = &mut self.edges[slot];
            let from = self.nodes[edge.source].center;
            let to = self.nodes[edge.target].center;
            edge.reshape(from, to);
        }
    }

    /// Hit targets in draw order, bottom to top.
    pub fn hit_shapes(&self) -> Vec<HitShape> {
        self.nodes
            .iter()
            .map(|node| HitShape {
                index: node.index,
                center: node.center,
                radius: node.radius,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::layout::{BatchLayout, LayoutConfig};
    use crate::model::{EntitySummary, GraphData, GraphEdge};

    fn fixture() -> (GraphIndex, Scene) {
        let mut big = EntitySummary::new("A", "brand", 100);
        big.mention_delta = Some(5);
        big.sparkline = vec![1.0, 4.0, 2.0];
        let graph = GraphIndex::new(&GraphData {
            nodes: vec![
                big,
                EntitySummary::new("B", "product", 10),
                EntitySummary::new("C", "person", 1),
                EntitySummary::new("D", "place", 40),
            ],
            edges: vec![
                GraphEdge::new("A", "B", "produces"),
                GraphEdge::new("B", "C", "endorses"),
                GraphEdge::new("A", "D", "located_at"),
            ],
        });
        let canvas = LayoutConfig::KNOWLEDGE_CANVAS;
        let positions = BatchLayout::default().run(&graph, canvas);
        let scene = Scene::build(&graph, &positions, RadiusScale::KNOWLEDGE_GRAPH, canvas);
        (graph, scene)
    }

    #[test]
    fn focus_change_leaves_geometry_alone() {
        let (graph, mut scene) = fixture();
        let before = scene.clone();

        scene.set_focus(&graph, Focus { hovered: Some(2), filter: None });

        for (after, before) in scene.nodes().iter().zip(before.nodes()) {
            assert_eq!(after.center, before.center);
            assert_eq!(after.radius, before.radius);
        }
        for (after, before) in scene.edges().iter().zip(before.edges()) {
            assert_eq!((after.from, after.control, after.to), (before.from, before.control, before.to));
        }
        assert_eq!(scene.nodes()[0].opacity, 0.15);
        assert!(scene.nodes()[2].hovered);
        assert!(scene.edges()[1].emphasized);
    }

    #[test]
    fn moving_a_node_only_touches_its_edges() {
        let (_, mut scene) = fixture();
        let before = scene.clone();

        scene.move_node(2, pos2(90.0, 90.0));

        assert_eq!(scene.nodes()[2].center, pos2(90.0, 90.0));
        assert_eq!(scene.nodes()[0], before.nodes()[0]);
        assert_eq!(scene.edges()[0], before.edges()[0]);
        assert_eq!(scene.edges()[2], before.edges()[2]);
        assert_eq!(scene.edges()[1].to, pos2(90.0, 90.0));
        assert_ne!(scene.edges()[1].control, before.edges()[1].control);
    }

    #[test]
    fn trend_glyphs_only_on_big_connected_nodes() {
        let (_, scene) = fixture();
        let big = scene.node("A").unwrap();
        let small = scene.node("C").unwrap();

        assert!(big.central);
        assert_eq!(big.badge.as_ref().map(|badge| badge.label.as_str()), Some("+5"));
        assert_eq!(big.sparkline.len(), 3);
        assert!(small.badge.is_none() && small.sparkline.is_empty());
    }

    #[test]
    fn selection_moves_between_nodes() {
        let (_, mut scene) = fixture();
        scene.set_selected(Some(1));
        scene.set_selected(Some(3));

        assert!(!scene.nodes()[1].selected);
        assert!(scene.nodes()[3].selected);
        scene.set_selected(Some(99));
        assert_eq!(scene.selected(), None);
    }

    #[test]
    fn curve_bends_perpendicular_and_caps_offset() {
        let control = curve_control(pos2(0.0, 0.0), pos2(100.0, 0.0));
        assert_eq!(control, pos2(50.0, 12.0));
        let far = curve_control(pos2(0.0, 0.0), pos2(1000.0, 0.0));
        assert_eq!(far, pos2(500.0, 30.0));
        assert_eq!(curve_control(pos2(5.0, 5.0), pos2(5.0, 5.0)), pos2(5.0, 5.0));

        let points = flatten_quadratic(pos2(0.0, 0.0), control, pos2(100.0, 0.0), 4);
        assert_eq!(points.first(), Some(&pos2(0.0, 0.0)));
        assert_eq!(points.last(), Some(&pos2(100.0, 0.0)));
        assert!((points[2].y - 6.0).abs() < 1e-4);
    }
}
