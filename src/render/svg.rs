use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::Color32;

use super::encoding::LABEL;
use super::scene::{NodeElement, Scene};
use crate::util::{escape_xml, truncate_label};

const BACKGROUND: &str = "#f8fafc";
const LABEL_CHARS: usize = 14;

fn css(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

/// Serializes `scene` as a standalone SVG document. Node groups carry a
/// `data-node` attribute with the entity id.
pub fn render_svg(scene: &Scene) -> String {
    let canvas = scene.canvas();
    let (width, height) = (canvas.width, canvas.height);
    let mut svg = String::new();

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );
    let _ = write!(svg, "<rect width=\"100%\" height=\"100%\" fill=\"{BACKGROUND}\"/>");

    svg.push_str("<g class=\"edges\">");
    for edge in scene.edges() {
        let dash = edge
            .style
            .svg_dash()
            .map(|dash| format!(" stroke-dasharray=\"{dash}\""))
            .unwrap_or_default();
        let _ = write!(
            svg,
            "<path d=\"M {:.2} {:.2} Q {:.2} {:.2} {:.2} {:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{dash} opacity=\"{:.2}\" data-link=\"{}\"/>",
            edge.from.x,
            edge.from.y,
            edge.control.x,
            edge.control.y,
            edge.to.x,
            edge.to.y,
            css(edge.style.color),
            if edge.emphasized { 3.0 } else { 1.5 },
            edge.opacity,
            escape_xml(&edge.link_type),
        );
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"nodes\">");
    for node in scene.nodes() {
        node_svg(&mut svg, node);
    }
    svg.push_str("</g>");

    svg.push_str("</svg>");
    svg
}

fn node_svg(svg: &mut String, node: &NodeElement) {
    let (x, y, r) = (node.center.x, node.center.y, node.radius);
    let color = css(node.color);
    let _ = write!(
        svg,
        "<g data-node=\"{}\" opacity=\"{:.2}\">",
        escape_xml(&node.id),
        node.opacity
    );

    if node.central {
        let _ = write!(
            svg,
            "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{:.2}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\" opacity=\"0.35\"/>",
            r + 6.0
        );
    }
    let border = if node.selected || node.hovered { 3 } else { 2 };
    let _ = write!(
        svg,
        "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{r:.2}\" fill=\"#ffffff\" stroke=\"{color}\" stroke-width=\"{border}\"/>"
    );
    let _ = write!(
        svg,
        "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{:.2}\" fill=\"{color}\" fill-opacity=\"0.8\"/>",
        r * 0.35
    );

    if let Some(badge) = &node.badge {
        let badge_color = css(badge.color);
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"9\" font-weight=\"700\" fill=\"{badge_color}\" text-anchor=\"middle\">{}</text>",
            x + r * 0.8,
            y - r * 0.75,
            escape_xml(&badge.label)
        );
    }

    if node.sparkline.len() >= 2 {
        let origin_x = x - 18.0;
        let origin_y = y + r * 0.25;
        let points = node
            .sparkline
            .iter()
            .map(|point| format!("{:.2},{:.2}", origin_x + point.x, origin_y + point.y))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            svg,
            "<polyline points=\"{points}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\"/>"
        );
    }

    if node.connected {
        let font_size = if r > 32.0 { 11 } else { 9 };
        let _ = write!(
            svg,
            "<text x=\"{x:.2}\" y=\"{:.2}\" font-size=\"{font_size}\" font-weight=\"600\" fill=\"{}\" text-anchor=\"middle\">{}</text>",
            y + r + 14.0,
            css(LABEL),
            escape_xml(&truncate_label(&node.label, LABEL_CHARS, "…"))
        );
    }

    svg.push_str("</g>");
}

pub fn write_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => print!("{svg}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BatchLayout, LayoutConfig};
    use crate::model::{EntitySummary, GraphData, GraphEdge, GraphIndex};
    use crate::render::RadiusScale;

    fn svg_for(data: &GraphData) -> String {
        let graph = GraphIndex::new(data);
        let canvas = LayoutConfig::KNOWLEDGE_CANVAS;
        let positions = BatchLayout::default().run(&graph, canvas);
        render_svg(&Scene::build(&graph, &positions, RadiusScale::KNOWLEDGE_GRAPH, canvas))
    }

    #[test]
    fn marks_nodes_and_draws_curved_dashed_edges() {
        let svg = svg_for(&GraphData {
            nodes: vec![
                EntitySummary::new("b<1>", "brand", 10),
                EntitySummary::new("b2", "brand", 4),
            ],
            edges: vec![GraphEdge::new("b<1>", "b2", "competes_with")],
        });

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("data-node=\"b&lt;1&gt;\""));
        assert!(svg.contains("data-node=\"b2\""));
        assert!(svg.contains(" Q "));
        assert!(svg.contains("stroke-dasharray=\"6 4\""));
        assert!(svg.contains("stroke=\"#ef4444\""));
    }

    #[test]
    fn dangling_edges_never_render() {
        let svg = svg_for(&GraphData {
            nodes: vec![EntitySummary::new("a", "brand", 1)],
            edges: vec![GraphEdge::new("a", "missing", "produces")],
        });

        assert!(!svg.contains("<path"));
        assert_eq!(svg.matches("data-node=").count(), 1);
    }
}
