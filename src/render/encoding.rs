//! Visual encoding shared by every view: sizes, palettes, focus dimming and
//! the small trend glyphs drawn on large nodes.

use eframe::egui::{Color32, Pos2, Vec2, pos2};

use crate::model::{EntityKind, GraphIndex, LinkKind, ResolvedEdge};

const fn hex(rgb: u32) -> Color32 {
    Color32::from_rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

pub const NEUTRAL: Color32 = hex(0x94a3b8);
pub const TREND_UP: Color32 = hex(0x10b981);
pub const TREND_DOWN: Color32 = hex(0xef4444);
pub const SENTIMENT_MID: Color32 = hex(0xeab308);
pub const LABEL: Color32 = hex(0x475569);

pub fn node_color(kind: EntityKind) -> Color32 {
    match kind {
        EntityKind::Brand => hex(0x3b82f6),
        EntityKind::Product => hex(0xa855f7),
        EntityKind::Place => hex(0x10b981),
        EntityKind::Person => hex(0xf97316),
        EntityKind::Work => hex(0xec4899),
        EntityKind::Event => hex(0xeab308),
        EntityKind::Organization => hex(0x14b8a6),
        EntityKind::ContentTopic => hex(0x6366f1),
        EntityKind::Scenario => hex(0x06b6d4),
        EntityKind::Unknown => NEUTRAL,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
    pub color: Color32,
    /// Dash and gap lengths; `None` draws a solid stroke.
    pub dash: Option<(f32, f32)>,
}

impl EdgeStyle {
    pub fn svg_dash(self) -> Option<String> {
        self.dash.map(|(dash, gap)| format!("{dash} {gap}"))
    }
}

pub fn edge_style(kind: LinkKind) -> EdgeStyle {
    let (rgb, dash) = match kind {
        LinkKind::Produces => (0x10b981, None),
        LinkKind::Competes => (0xef4444, Some((6.0, 4.0))),
        LinkKind::Location => (0x3b82f6, None),
        LinkKind::Endorses => (0xf97316, None),
        LinkKind::Founded => (0xa855f7, None),
        LinkKind::Discusses => (0x6366f1, Some((4.0, 2.0))),
        LinkKind::Relevant => (0x8b5cf6, None),
        LinkKind::Needs => (0x06b6d4, None),
        LinkKind::Involves => (0xf59e0b, Some((4.0, 2.0))),
        LinkKind::Other => (0x94a3b8, Some((3.0, 3.0))),
    };
    EdgeStyle { color: hex(rgb), dash }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Curve {
    Linear,
    Sqrt,
}

/// Maps a mention count onto a node radius in `[base, base + span]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusScale {
    base: f32,
    span: f32,
    curve: Curve,
}

impl RadiusScale {
    pub const KNOWLEDGE_GRAPH: Self = Self { base: 24.0, span: 36.0, curve: Curve::Linear };
    pub const LIVE_MAP: Self = Self { base: 8.0, span: 24.0, curve: Curve::Sqrt };
    pub const SCENARIO_MAP: Self = Self { base: 18.0, span: 22.0, curve: Curve::Linear };

    pub fn radius(self, mentions: u64, max_mentions: u64) -> f32 {
        if max_mentions == 0 {
            return self.base;
        }
        let share = (mentions as f32 / max_mentions as f32).clamp(0.0, 1.0);
        let share = match self.curve {
            Curve::Linear => share,
            Curve::Sqrt => share.sqrt(),
        };
        self.base + self.span * share
    }

    pub fn min(self) -> f32 {
        self.base
    }

    pub fn max(self) -> f32 {
        self.base + self.span
    }

    /// Radius for every node of `graph`, in index order.
    pub fn radii(self, graph: &GraphIndex) -> Vec<f32> {
        let max = graph.max_mentions();
        graph
            .nodes()
            .iter()
            .map(|node| self.radius(node.mention_count, max))
            .collect()
    }
}

/// Hover and category-filter state feeding the opacity rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Focus {
    pub hovered: Option<usize>,
    pub filter: Option<EntityKind>,
}

impl Focus {
    pub fn node_opacity(self, graph: &GraphIndex, index: usize) -> f32 {
        if let Some(kind) = self.filter
            && graph.kind(index) != kind
        {
            return 0.1;
        }
        if let Some(hovered) = self.hovered
            && hovered != index
            && !graph.are_adjacent(hovered, index)
        {
            return 0.15;
        }
        1.0
    }

    pub fn edge_opacity(self, graph: &GraphIndex, edge: &ResolvedEdge) -> f32 {
        if let Some(kind) = self.filter
            && graph.kind(edge.source) != kind
            && graph.kind(edge.target) != kind
        {
            return 0.05;
        }
        match self.hovered {
            Some(hovered) if edge.source == hovered || edge.target == hovered => 1.0,
            Some(_) => 0.08,
            None => 0.6,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeltaBadge {
    pub label: String,
    pub color: Color32,
    pub rising: bool,
}

/// Badge for a non-zero mention delta, `None` for zero or missing deltas.
pub fn delta_badge(delta: Option<i64>) -> Option<DeltaBadge> {
    match delta? {
        0 => None,
        up if up > 0 => Some(DeltaBadge { label: format!("+{up}"), color: TREND_UP, rising: true }),
        down => Some(DeltaBadge { label: down.to_string(), color: TREND_DOWN, rising: false }),
    }
}

/// Badges and sparklines are reserved for big connected nodes.
pub fn shows_trend_glyphs(radius: f32, connected: bool) -> bool {
    connected && radius > 24.0
}

pub fn sentiment_color(sentiment: f32) -> Color32 {
    if sentiment >= 0.7 {
        TREND_UP
    } else if sentiment >= 0.4 {
        SENTIMENT_MID
    } else {
        TREND_DOWN
    }
}

/// Polyline for `samples` scaled into a `size` box with its origin at the top
/// left. Fewer than two samples draw nothing.
pub fn sparkline_points(samples: &[f32], size: Vec2) -> Vec<Pos2> {
    if samples.len() < 2 {
        return Vec::new();
    }

    let pad = 1.0;
    let (min, max) = samples
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| (min.min(v), max.max(v)));
    let range = if max - min > 0.0 { max - min } else { 1.0 };
    let last = (samples.len() - 1) as f32;

    samples
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            pos2(
                pad + index as f32 / last * (size.x - pad * 2.0),
                pad + (1.0 - (value - min) / range) * (size.y - pad * 2.0),
            )
        })
        .collect()
}

pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntitySummary, GraphData, GraphEdge};

    fn chain() -> GraphIndex {
        GraphIndex::new(&GraphData {
            nodes: vec![
                EntitySummary::new("A", "brand", 3),
                EntitySummary::new("B", "product", 2),
                EntitySummary::new("C", "person", 1),
            ],
            edges: vec![GraphEdge::new("A", "B", "produces"), GraphEdge::new("B", "C", "endorses")],
        })
    }

    #[test]
    fn hovering_an_end_dims_everything_past_its_neighbors() {
        let graph = chain();
        let (a, b, c) = (0, 1, 2);
        let hovered = Focus { hovered: Some(a), filter: None };

        assert_eq!(hovered.node_opacity(&graph, a), 1.0);
        assert_eq!(hovered.node_opacity(&graph, b), 1.0);
        assert_eq!(hovered.node_opacity(&graph, c), 0.15);
        assert_eq!(hovered.edge_opacity(&graph, &graph.edges()[0]), 1.0);
        assert_eq!(hovered.edge_opacity(&graph, &graph.edges()[1]), 0.08);

        let cleared = Focus::default();
        for index in [a, b, c] {
            assert_eq!(cleared.node_opacity(&graph, index), 1.0);
        }
        for edge in graph.edges() {
            assert_eq!(cleared.edge_opacity(&graph, edge), 0.6);
        }
    }

    #[test]
    fn filter_combines_with_hover() {
        let graph = chain();
        let focus = Focus { hovered: Some(1), filter: Some(EntityKind::Person) };

        assert_eq!(focus.node_opacity(&graph, 0), 0.1);
        assert_eq!(focus.node_opacity(&graph, 2), 1.0);
        assert_eq!(focus.edge_opacity(&graph, &graph.edges()[0]), 0.05);
        assert_eq!(focus.edge_opacity(&graph, &graph.edges()[1]), 1.0);
    }

    #[test]
    fn radius_orders_by_mentions_within_band() {
        for scale in [RadiusScale::KNOWLEDGE_GRAPH, RadiusScale::LIVE_MAP, RadiusScale::SCENARIO_MAP] {
            let (a, b, c) = (scale.radius(100, 100), scale.radius(10, 100), scale.radius(1, 100));
            assert!(a > b && b > c, "{scale:?}");
            assert_eq!(a, scale.max());
            assert!(scale.radius(0, 100) >= scale.min());
            assert_eq!(scale.radius(0, 0), scale.min());
        }
        assert_eq!(RadiusScale::LIVE_MAP.radius(25, 100), 20.0);
    }

    #[test]
    fn unknown_kinds_fall_back_to_neutral_styles() {
        assert_eq!(node_color(EntityKind::Unknown), NEUTRAL);
        let other = edge_style(LinkKind::Other);
        assert_eq!(other.color, NEUTRAL);
        assert_eq!(other.svg_dash().as_deref(), Some("3 3"));
        assert_eq!(edge_style(LinkKind::Produces).svg_dash(), None);
    }

    #[test]
    fn delta_badge_skips_flat_deltas() {
        assert_eq!(delta_badge(None), None);
        assert_eq!(delta_badge(Some(0)), None);
        assert_eq!(delta_badge(Some(12)).unwrap().label, "+12");
        let down = delta_badge(Some(-3)).unwrap();
        assert_eq!((down.label.as_str(), down.color), ("-3", TREND_DOWN));

        assert!(shows_trend_glyphs(30.0, true));
        assert!(!shows_trend_glyphs(24.0, true));
        assert!(!shows_trend_glyphs(40.0, false));
    }

    #[test]
    fn sentiment_thresholds() {
        assert_eq!(sentiment_color(0.7), TREND_UP);
        assert_eq!(sentiment_color(0.4), SENTIMENT_MID);
        assert_eq!(sentiment_color(0.39), TREND_DOWN);
    }

    #[test]
    fn sparkline_fills_its_box() {
        let points = sparkline_points(&[1.0, 3.0, 2.0], Vec2::new(42.0, 12.0));
        assert_eq!(points, vec![pos2(1.0, 11.0), pos2(21.0, 1.0), pos2(41.0, 6.0)]);
        assert!(sparkline_points(&[5.0], Vec2::new(10.0, 10.0)).is_empty());
    }
}
