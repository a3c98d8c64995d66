use eframe::egui::{Color32, Pos2, vec2};

use super::encoding::{Focus, node_color, with_opacity};
use crate::interaction::HitShape;
use crate::layout::CanvasSize;
use crate::model::GraphIndex;
use crate::sim::Simulation;
use crate::util::truncate_label;

const HOVER_GROWTH: f32 = 1.3;
const LABEL_MIN_RADIUS: f32 = 14.0;
const LABEL_CHARS: usize = 6;
const RESTING_EDGE_OPACITY: f32 = 0.6;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Line {
        from: Pos2,
        to: Pos2,
        width: f32,
        color: Color32,
    },
    Circle {
        center: Pos2,
        radius: f32,
        fill: Color32,
    },
    Ring {
        center: Pos2,
        radius: f32,
        width: f32,
        color: Color32,
    },
    Text {
        pos: Pos2,
        text: String,
        size: f32,
        color: Color32,
    },
}

/// Everything needed to paint one frame of the live map, in world space.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
    /// Hit targets in draw order at their resting radius.
    pub hit_shapes: Vec<HitShape>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameState {
    pub tick: u64,
    pub focus: Focus,
    pub selected: Option<usize>,
}

pub fn edge_breath(tick: u64) -> f32 {
    0.18 + (tick as f32 * 0.03).sin() * 0.06
}

/// Rebuilds the whole frame from the simulation's current positions.
/// Simulation nodes are expected in the same order as `graph`.
pub fn build_frame(sim: &Simulation, graph: &GraphIndex, state: FrameState) -> DisplayList {
    let nodes = sim.nodes();
    let mut list = DisplayList {
        commands: Vec::with_capacity(graph.edges().len() + nodes.len() * 4),
        hit_shapes: Vec::with_capacity(nodes.len()),
    };
    let t = state.tick as f32;

    let breath = edge_breath(state.tick);
    for edge in graph.edges() {
        let (Some(source), Some(target)) = (nodes.get(edge.source), nodes.get(edge.target)) else {
            continue;
        };
        // Focus scales the breathing alpha relative to the resting edge.
        let emphasis = state.focus.edge_opacity(graph, edge) / RESTING_EDGE_OPACITY;
        list.commands.push(DrawCommand::Line {
            from: source.pos,
            to: target.pos,
            width: 1.0,
            color: with_opacity(node_color(graph.kind(edge.source)), breath * emphasis),
        });
    }

    for (index, node) in nodes.iter().enumerate() {
        let opacity = state.focus.node_opacity(graph, index);
        let color = with_opacity(node_color(graph.kind(index)), opacity);
        let hovered = state.focus.hovered == Some(index);
        let selected = state.selected == Some(index);
        let radius = if hovered { node.radius * HOVER_GROWTH } else { node.radius };
        let mut center = node.pos;
        if selected {
            center.y += (t * 0.05).sin() * 2.0;
            let pulse = node.radius + 5.0 + (t * 0.08).sin() * 3.0;
            list.commands.push(DrawCommand::Ring {
                center,
                radius: pulse,
                width: 2.0,
                color: with_opacity(color, 0.45),
            });
        }

        list.commands.push(DrawCommand::Circle {
            center: center + vec2(0.0, 2.0),
            radius: radius + if hovered { 6.0 } else { 3.0 },
            fill: with_opacity(color, 0.12),
        });
        list.commands.push(DrawCommand::Circle { center, radius, fill: color });
        list.commands.push(DrawCommand::Circle {
            center: center - vec2(radius, radius) * 0.3,
            radius: radius * 0.45,
            fill: with_opacity(Color32::WHITE, 0.3 * opacity),
        });

        if radius > LABEL_MIN_RADIUS {
            let name = graph.node(index).map(|entity| entity.display_name()).unwrap_or(node.id.as_str());
            list.commands.push(DrawCommand::Text {
                pos: center,
                text: truncate_label(name, LABEL_CHARS, "…"),
                size: (radius / 2.5).max(10.0),
                color: with_opacity(Color32::WHITE, 0.95 * opacity),
            });
        }

        list.hit_shapes.push(HitShape {
            index,
            center: node.pos,
            radius: node.radius,
        });
    }

    list
}

/// Start/stop handle for the per-frame redraw of an animated view.
#[derive(Debug, Default)]
pub struct FrameLoop {
    running: bool,
    tick: u64,
}

impl FrameLoop {
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Counts a frame. Returns the frame number, or `None` once cancelled.
    pub fn advance(&mut self) -> Option<u64> {
        if !self.running {
            return None;
        }
        self.tick += 1;
        Some(self.tick)
    }
}

/// Reports canvas size changes to the owner until detached.
#[derive(Debug)]
pub struct ResizeWatch {
    last: Option<CanvasSize>,
    attached: bool,
}

impl Default for ResizeWatch {
    fn default() -> Self {
        Self { last: None, attached: true }
    }
}

impl ResizeWatch {
    /// Returns the new size when it differs from the last observed one.
    /// The first observation only records the size.
    pub fn observe(&mut self, size: CanvasSize) -> Option<CanvasSize> {
        if !self.attached {
            return None;
        }
        let previous = self.last.replace(size);
        previous.filter(|&previous| previous != size).map(|_| size)
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}
