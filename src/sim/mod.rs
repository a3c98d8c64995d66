mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2, pos2};
use rand::Rng;
use tracing::{debug, trace};

use crate::layout::{CanvasSize, PinTarget, PositionMap, PositionSource};
use crate::model::GraphIndex;
use forces::{ChargeParams, CollisionParams, accumulate_charge_for_node, accumulate_collision_pairs};
use quadtree::QuadNode;

const DEFAULT_RADIUS: f32 = 8.0;
const SEED_REGION: f32 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub link_distance: f32,
    pub link_strength: f32,
    /// Many-body strength; negative repels.
    pub charge: f32,
    pub distance_max: f32,
    pub theta: f32,
    pub collide_buffer: f32,
    pub collide_strength: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    /// Energy used when a drag, resize or reseed wakes the simulation.
    pub restart_energy: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            link_distance: 80.0,
            link_strength: 0.3,
            charge: -120.0,
            distance_max: 300.0,
            theta: 0.9,
            collide_buffer: 4.0,
            collide_strength: 0.7,
            alpha_decay: 0.02,
            velocity_decay: 0.3,
            alpha_min: 0.001,
            restart_energy: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
    pub id: String,
    pub pos: Pos2,
    pub vel: Vec2,
    pub radius: f32,
    pub pin: Option<Pos2>,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    reach: Vec<f32>,
    pinned: Vec<bool>,
    corrections: Vec<Vec2>,
}

/// Persistent force simulation ticked once per frame.
///
/// Energy (`alpha`) eases toward `alpha_target` every tick and the simulation
/// halts on its own once it drops below `alpha_min`. Pinned nodes are held
/// exactly at their pin: no force, collision or clamp moves them.
pub struct Simulation {
    config: SimulationConfig,
    canvas: CanvasSize,
    nodes: Vec<SimNode>,
    index_by_id: HashMap<String, usize>,
    links: Vec<(usize, usize)>,
    degree: Vec<usize>,
    alpha: f32,
    alpha_target: f32,
    running: bool,
    ticks: u64,
    scratch: Scratch,
}

impl Simulation {
    pub fn new(config: SimulationConfig, canvas: CanvasSize) -> Self {
        Self {
            config,
            canvas,
            nodes: Vec::new(),
            index_by_id: HashMap::new(),
            links: Vec::new(),
            degree: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            running: false,
            ticks: 0,
            scratch: Scratch::default(),
        }
    }

    /// Replaces the node set with `graph`, scattering nodes at random inside
    /// the central part of the canvas and restarting at full energy.
    /// `radii` is indexed like `graph`.
    pub fn reseed<R: Rng + ?Sized>(&mut self, graph: &GraphIndex, radii: &[f32], rng: &mut R) {
        let center = self.canvas.center();
        let spread = self.canvas.to_vec2() * SEED_REGION;

        self.nodes = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| SimNode {
                id: node.id.clone(),
                pos: pos2(
                    center.x + (rng.r#gen::<f32>() - 0.5) * spread.x,
                    center.y + (rng.r#gen::<f32>() - 0.5) * spread.y,
                ),
                vel: Vec2::ZERO,
                radius: radii.get(index).copied().unwrap_or(DEFAULT_RADIUS),
                pin: None,
            })
            .collect();
        self.index_by_id = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        self.links = graph.edges().iter().map(|edge| (edge.source, edge.target)).collect();
        self.degree = vec![0; self.nodes.len()];
        for &(source, target) in &self.links {
            self.degree[source] += 1;
            self.degree[target] += 1;
        }

        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.running = !self.nodes.is_empty();
        debug!(nodes = self.nodes.len(), links = self.links.len(), "simulation reseeded");
    }

    /// Moves the centering target and wakes the simulation so the layout can
    /// drift to the new center.
    pub fn resize(&mut self, canvas: CanvasSize) {
        if self.canvas == canvas {
            return;
        }
        self.canvas = canvas;
        self.alpha = self.config.restart_energy;
        self.restart();
    }

    pub fn restart(&mut self) {
        self.running = !self.nodes.is_empty();
    }

    pub fn stop(&mut self) {
        if self.running {
            debug!(ticks = self.ticks, "simulation stopped");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&SimNode> {
        self.index_by_id.get(id).and_then(|&index| self.nodes.get(index))
    }

    /// Advances one step. Returns `false` without touching anything when the
    /// simulation is stopped.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.ticks += 1;

        self.apply_links();
        self.apply_charge();
        self.apply_centering();
        self.integrate();
        self.apply_collisions();
        self.clamp_free_nodes();

        if self.alpha < self.config.alpha_min {
            self.running = false;
            trace!(ticks = self.ticks, "simulation cooled down");
        }
        true
    }

    fn apply_links(&mut self) {
        let alpha = self.alpha;
        let SimulationConfig {
            link_distance,
            link_strength,
            ..
        } = self.config;

        for &(source, target) in &self.links {
            let ahead = |index: usize| self.nodes[index].pos + self.nodes[index].vel;
            let delta = ahead(target) - ahead(source);
            let length = delta.length().max(1e-3);
            let pull = delta * ((length - link_distance) / length * alpha * link_strength);

            let source_degree = self.degree[source] as f32;
            let target_degree = self.degree[target] as f32;
            let bias = source_degree / (source_degree + target_degree).max(1.0);

            self.nodes[target].vel -= pull * bias;
            self.nodes[source].vel += pull * (1.0 - bias);
        }
    }

    fn apply_charge(&mut self) {
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.positions.extend(self.nodes.iter().map(|node| node.pos.to_vec2()));

        let Some(tree) = QuadNode::build(&scratch.positions) else {
            return;
        };
        let params = ChargeParams {
            strength: self.config.charge * self.alpha,
            distance_max_sq: self.config.distance_max * self.config.distance_max,
            theta: self.config.theta,
        };
        for (index, node) in self.nodes.iter_mut().enumerate() {
            accumulate_charge_for_node(&tree, index, &scratch.positions, params, &mut node.vel);
        }
    }

    /// Shifts free nodes so their centroid sits on the canvas center.
    fn apply_centering(&mut self) {
        let (sum, count) = self
            .nodes
            .iter()
            .filter(|node| node.pin.is_none())
            .fold((Vec2::ZERO, 0usize), |(sum, count), node| (sum + node.pos.to_vec2(), count + 1));
        if count == 0 {
            return;
        }

        let shift = self.canvas.center() - (sum / count as f32).to_pos2();
        for node in self.nodes.iter_mut().filter(|node| node.pin.is_none()) {
            node.pos += shift;
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            match node.pin {
                Some(pin) => {
                    node.pos = pin;
                    node.vel = Vec2::ZERO;
                }
                None => {
                    node.vel *= keep;
                    node.pos += node.vel;
                }
            }
        }
    }

    fn apply_collisions(&mut self) {
        let buffer = self.config.collide_buffer;
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.reach.clear();
        scratch.pinned.clear();
        for node in &self.nodes {
            scratch.positions.push(node.pos.to_vec2());
            scratch.reach.push(node.radius + buffer);
            scratch.pinned.push(node.pin.is_some());
        }
        scratch.corrections.clear();
        scratch.corrections.resize(self.nodes.len(), Vec2::ZERO);

        let Some(tree) = QuadNode::build(&scratch.positions) else {
            return;
        };
        let max_reach = scratch.reach.iter().copied().fold(0.0_f32, f32::max) * 2.0;
        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            &scratch.positions,
            &scratch.reach,
            &scratch.pinned,
            CollisionParams {
                strength: self.config.collide_strength,
                max_reach_sq: max_reach * max_reach,
            },
            &mut scratch.corrections,
        );

        for (node, correction) in self.nodes.iter_mut().zip(&scratch.corrections) {
            if node.pin.is_none() {
                node.pos += *correction;
            }
        }
    }

    fn clamp_free_nodes(&mut self) {
        for node in self.nodes.iter_mut().filter(|node| node.pin.is_none()) {
            node.pos = self.canvas.clamp(node.pos, node.radius);
        }
    }
}

impl PositionSource for Simulation {
    fn position(&self, id: &str) -> Option<Pos2> {
        self.node(id).map(|node| node.pos)
    }

    fn snapshot(&self) -> PositionMap {
        let mut map = PositionMap::new();
        for node in &self.nodes {
            map.insert(node.id.clone(), node.pos);
        }
        map
    }
}

impl PinTarget for Simulation {
    fn pin(&mut self, id: &str, world: Pos2) {
        let Some(&index) = self.index_by_id.get(id) else {
            return;
        };
        let node = &mut self.nodes[index];
        let world = self.canvas.clamp(world, node.radius);
        node.pin = Some(world);
        node.pos = world;
        node.vel = Vec2::ZERO;
        self.alpha_target = self.config.restart_energy;
        self.restart();
    }

    fn release(&mut self, id: &str) {
        if let Some(&index) = self.index_by_id.get(id) {
            self.nodes[index].pin = None;
        }
        self.alpha_target = 0.0;
    }
}
