use eframe::egui::{Pos2, Vec2};
use tracing::debug;

use super::seed::{bipartite_seed, peripheral_ring, ring_seed};
use super::{CanvasSize, PositionMap};
use crate::model::{EntityKind, GraphIndex};
use crate::util::fallback_direction;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeedStrategy {
    Ring,
    Bipartite { left: EntityKind, right: EntityKind },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub iterations: usize,
    pub repulsion: f32,
    /// Floor applied to pair distances before the inverse-square repulsion.
    pub min_distance: f32,
    pub rest_length: f32,
    pub spring: f32,
    pub centering: f32,
    pub damping: f32,
    pub margin: f32,
    /// Where dragged nodes are allowed to go once the layout has run.
    pub drag_margin: f32,
    pub seed: SeedStrategy,
    pub isolate_disconnected: bool,
}

impl LayoutConfig {
    pub const KNOWLEDGE_CANVAS: CanvasSize = CanvasSize::new(1000.0, 700.0);
    pub const SCENARIO_CANVAS: CanvasSize = CanvasSize::new(900.0, 600.0);

    pub fn knowledge_graph() -> Self {
        Self {
            iterations: 120,
            repulsion: 3000.0,
            min_distance: 10.0,
            rest_length: 140.0,
            spring: 0.015,
            centering: 0.003,
            damping: 0.6,
            margin: 70.0,
            drag_margin: 30.0,
            seed: SeedStrategy::Ring,
            isolate_disconnected: true,
        }
    }

    pub fn scenario_map() -> Self {
        Self {
            iterations: 80,
            repulsion: 2000.0,
            min_distance: 10.0,
            rest_length: 180.0,
            spring: 0.01,
            centering: 0.002,
            damping: 0.5,
            margin: 60.0,
            drag_margin: 30.0,
            seed: SeedStrategy::Bipartite {
                left: EntityKind::Scenario,
                right: EntityKind::Product,
            },
            isolate_disconnected: false,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::knowledge_graph()
    }
}

/// One-shot force layout. Runs a fixed number of cooling iterations and
/// returns final positions; the same input always yields the same output.
#[derive(Clone, Debug, Default)]
pub struct BatchLayout {
    config: LayoutConfig,
}

impl BatchLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, graph: &GraphIndex, canvas: CanvasSize) -> PositionMap {
        self.run_with_observer(graph, canvas, |_, _| {})
    }

    /// Like [`BatchLayout::run`], calling `observer` after every iteration
    /// with the iteration number and the positions indexed like `graph`.
    pub fn run_with_observer<F>(&self, graph: &GraphIndex, canvas: CanvasSize, mut observer: F) -> PositionMap
    where
        F: FnMut(usize, &[Pos2]),
    {
        let config = &self.config;
        let mut map = PositionMap::new().with_bounds(canvas, config.drag_margin);
        let node_count = graph.len();
        if node_count == 0 {
            return map;
        }

        let (active, isolated): (Vec<usize>, Vec<usize>) = (0..node_count)
            .partition(|&index| !config.isolate_disconnected || graph.is_connected(index));

        let center = canvas.center();
        let mut positions = vec![center; node_count];
        let mut velocities = vec![Vec2::ZERO; node_count];

        match config.seed {
            SeedStrategy::Ring => ring_seed(canvas, &active, &mut positions),
            SeedStrategy::Bipartite { left, right } => {
                bipartite_seed(canvas, graph, &active, left, right, &mut positions);
            }
        }
        peripheral_ring(canvas, config.margin, &isolated, &mut positions);

        for iteration in 0..config.iterations {
            let alpha = 1.0 - iteration as f32 / config.iterations as f32;

            for (slot, &a) in active.iter().enumerate() {
                for &b in &active[slot + 1..] {
                    let delta = positions[a] - positions[b];
                    let length = delta.length();
                    let direction = if length > 0.0001 {
                        delta / length
                    } else {
                        fallback_direction(a, b)
                    };
                    let distance = length.max(config.min_distance);
                    let push = direction * (config.repulsion * alpha / (distance * distance));
                    velocities[a] += push;
                    velocities[b] -= push;
                }
            }

            for edge in graph.edges() {
                let delta = positions[edge.target] - positions[edge.source];
                let distance = delta.length().max(1.0);
                let pull = delta / distance * ((distance - config.rest_length) * config.spring * alpha);
                velocities[edge.source] += pull;
                velocities[edge.target] -= pull;
            }

            for &index in &active {
                velocities[index] += (center - positions[index]) * (config.centering * alpha);
                positions[index] += velocities[index];
                velocities[index] *= config.damping;
                positions[index] = canvas.clamp(positions[index], config.margin);
            }

            observer(iteration, &positions);
        }

        for (node, position) in graph.nodes().iter().zip(&positions) {
            map.insert(node.id.clone(), *position);
        }

        debug!(
            nodes = node_count,
            isolated = isolated.len(),
            iterations = config.iterations,
            "batch layout finished"
        );
        map
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::layout::peripheral_ring_radius;
    use crate::model::{EntitySummary, GraphData, GraphEdge};

    fn scenario_graph() -> GraphIndex {
        GraphIndex::new(&GraphData {
            nodes: vec![
                EntitySummary::new("A", "brand", 100),
                EntitySummary::new("B", "product", 10),
                EntitySummary::new("C", "person", 1),
            ],
            edges: vec![GraphEdge::new("A", "B", "produces")],
        })
    }

    fn within(position: Pos2, canvas: CanvasSize, margin: f32) -> bool {
        let eps = 1e-3;
        position.x >= margin - eps
            && position.x <= canvas.width - margin + eps
            && position.y >= margin - eps
            && position.y <= canvas.height - margin + eps
    }

    #[test]
    fn same_input_gives_same_positions() {
        let graph = scenario_graph();
        let layout = BatchLayout::new(LayoutConfig::knowledge_graph());
        let canvas = LayoutConfig::KNOWLEDGE_CANVAS;

        assert_eq!(layout.run(&graph, canvas), layout.run(&graph, canvas));
    }

    #[test]
    fn empty_graph_skips_iterations() {
        let graph = GraphIndex::new(&GraphData::default());
        let mut calls = 0;
        let map = BatchLayout::default().run_with_observer(&graph, LayoutConfig::KNOWLEDGE_CANVAS, |_, _| {
            calls += 1;
        });

        assert!(map.is_empty());
        assert_eq!(calls, 0);
    }

    #[test]
    fn disconnected_node_lands_on_peripheral_ring() {
        let graph = scenario_graph();
        let canvas = LayoutConfig::KNOWLEDGE_CANVAS;
        let config = LayoutConfig::knowledge_graph();
        let map = BatchLayout::new(config).run(&graph, canvas);

        let ring = peripheral_ring_radius(canvas, config.margin);
        let c = map.get("C").unwrap();
        assert!((c.distance(canvas.center()) - ring).abs() < 1e-3);

        for id in ["A", "B"] {
            let position = map.get(id).unwrap();
            assert!(position.distance(canvas.center()) < ring);
        }
    }

    #[test]
    fn connected_pair_settles_near_rest_length() {
        let map = BatchLayout::default().run(&scenario_graph(), LayoutConfig::KNOWLEDGE_CANVAS);
        let distance = map.get("A").unwrap().distance(map.get("B").unwrap());

        assert!(distance > 60.0 && distance < 400.0, "distance was {distance}");
    }

    #[test]
    fn dangling_edges_do_not_reach_the_layout() {
        let data = GraphData {
            nodes: vec![EntitySummary::new("A", "brand", 3), EntitySummary::new("B", "brand", 2)],
            edges: vec![
                GraphEdge::new("A", "ghost", "competes_with"),
                GraphEdge::new("A", "B", "competes_with"),
            ],
        };
        let map = BatchLayout::default().run(&GraphIndex::new(&data), LayoutConfig::KNOWLEDGE_CANVAS);

        assert_eq!(map.len(), 2);
        assert!(map.get("ghost").is_none());
    }

    #[test]
    fn scenario_preset_keeps_columns_apart() {
        let data = GraphData {
            nodes: vec![
                EntitySummary::new("s1", "scenario", 9),
                EntitySummary::new("s2", "scenario", 4),
                EntitySummary::new("p1", "product", 6),
                EntitySummary::new("p2", "product", 2),
                EntitySummary::new("p3", "product", 1),
            ],
            edges: vec![
                GraphEdge::new("s1", "p1", "needs"),
                GraphEdge::new("s1", "p2", "needs"),
                GraphEdge::new("s2", "p3", "needs"),
            ],
        };
        let graph = GraphIndex::new(&data);
        let canvas = LayoutConfig::SCENARIO_CANVAS;
        let map = BatchLayout::new(LayoutConfig::scenario_map()).run(&graph, canvas);

        let mean_x = |ids: &[&str]| ids.iter().map(|id| map.get(id).unwrap().x).sum::<f32>() / ids.len() as f32;
        assert!(mean_x(&["s1", "s2"]) < mean_x(&["p1", "p2", "p3"]));
        assert!(map.iter().all(|(_, position)| within(position, canvas, 60.0)));
    }

    fn arbitrary_graph() -> impl Strategy<Value = GraphData> {
        (1usize..14).prop_flat_map(|count| {
            (
                proptest::collection::vec(0u64..500, count),
                proptest::collection::vec((0..count, 0..count), 0..count * 2),
            )
                .prop_map(|(mentions, pairs)| GraphData {
                    nodes: mentions
                        .iter()
                        .enumerate()
                        .map(|(index, &mentions)| EntitySummary::new(format!("n{index}"), "brand", mentions))
                        .collect(),
                    edges: pairs
                        .iter()
                        .map(|(a, b)| GraphEdge::new(&format!("n{a}"), &format!("n{b}"), "competes_with"))
                        .collect(),
                })
        })
    }

    proptest! {
        #[test]
        fn every_iteration_stays_inside_the_margin(data in arbitrary_graph(), scenario in any::<bool>()) {
            let (config, canvas) = if scenario {
                (LayoutConfig::scenario_map(), LayoutConfig::SCENARIO_CANVAS)
            } else {
                (LayoutConfig::knowledge_graph(), LayoutConfig::KNOWLEDGE_CANVAS)
            };
            let graph = GraphIndex::new(&data);
            let mut iterations = 0;
            let mut violations = 0;
            BatchLayout::new(config).run_with_observer(&graph, canvas, |_, positions| {
                iterations += 1;
                violations += positions.iter().filter(|&&p| !within(p, canvas, config.margin)).count();
            });

            prop_assert_eq!(iterations, config.iterations);
            prop_assert_eq!(violations, 0);
        }
    }
}
