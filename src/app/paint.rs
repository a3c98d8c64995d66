use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2, vec2};

use crate::interaction::ViewTransform;
use crate::render::encoding::{LABEL, with_opacity};
use crate::render::{DisplayList, DrawCommand, Scene, flatten_quadratic};
use crate::util::truncate_label;

const BACKGROUND: Color32 = Color32::from_rgb(248, 250, 252);
const GRID: Color32 = Color32::from_rgba_premultiplied(14, 17, 22, 14);
const CURVE_SEGMENTS: usize = 16;

pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: &ViewTransform) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let step = (48.0 * transform.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = transform.world_to_screen(rect, Pos2::ZERO);
    let stroke = Stroke::new(1.0, GRID);

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Paints a retained scene: curved styled edges, then nodes with their
/// badges, sparklines and labels.
pub(super) fn paint_scene(painter: &Painter, rect: Rect, transform: &ViewTransform, scene: &Scene) {
    let zoom = transform.zoom;
    let to_screen = |world: Pos2| transform.world_to_screen(rect, world);

    for edge in scene.edges() {
        let points = flatten_quadratic(edge.from, edge.control, edge.to, CURVE_SEGMENTS)
            .into_iter()
            .map(to_screen)
            .collect::<Vec<_>>();
        let width = (if edge.emphasized { 2.5 } else { 1.5 }) * zoom.sqrt();
        let stroke = Stroke::new(width, with_opacity(edge.style.color, edge.opacity));
        match edge.style.dash {
            Some((dash, gap)) => painter.extend(Shape::dashed_line(&points, stroke, dash * zoom, gap * zoom)),
            None => {
                painter.add(Shape::line(points, stroke));
            }
        }
    }

    for node in scene.nodes() {
        let center = to_screen(node.center);
        let radius = node.radius * zoom;
        if !circle_visible(rect, center, radius + 8.0) {
            continue;
        }

        if node.central {
            painter.circle_stroke(
                center,
                radius + 6.0 * zoom,
                Stroke::new(2.0, with_opacity(node.color, 0.35 * node.opacity)),
            );
        }
        painter.circle_filled(center, radius, with_opacity(node.color, 0.15 * node.opacity));
        painter.circle_filled(center, radius * 0.8, with_opacity(node.color, 0.8 * node.opacity));
        if node.selected || node.hovered {
            painter.circle_stroke(center, radius + 2.0, Stroke::new(2.0, with_opacity(node.color, node.opacity)));
        }

        if let Some(badge) = &node.badge {
            painter.text(
                center + vec2(radius * 0.7, -radius * 0.7),
                Align2::LEFT_BOTTOM,
                badge.label.as_str(),
                FontId::proportional(10.0),
                with_opacity(badge.color, node.opacity),
            );
        }

        if node.sparkline.len() >= 2 {
            let offset = node.center + Vec2::new(-18.0, node.radius * 0.25);
            let points = node
                .sparkline
                .iter()
                .map(|point| to_screen(offset + point.to_vec2()))
                .collect::<Vec<_>>();
            painter.add(Shape::line(points, Stroke::new(1.5, with_opacity(node.color, node.opacity))));
        }

        if node.connected {
            painter.text(
                center + vec2(0.0, radius + 4.0),
                Align2::CENTER_TOP,
                truncate_label(&node.label, 14, "…"),
                FontId::proportional((11.0 * zoom.sqrt()).clamp(9.0, 16.0)),
                with_opacity(LABEL, node.opacity),
            );
        }
    }
}

/// Replays a live-map display list through the view transform.
pub(super) fn paint_display_list(painter: &Painter, rect: Rect, transform: &ViewTransform, list: &DisplayList) {
    let zoom = transform.zoom;
    let to_screen = |world: Pos2| transform.world_to_screen(rect, world);

    for command in &list.commands {
        match command {
            DrawCommand::Line { from, to, width, color } => {
                painter.line_segment([to_screen(*from), to_screen(*to)], Stroke::new(*width, *color));
            }
            DrawCommand::Circle { center, radius, fill } => {
                painter.circle_filled(to_screen(*center), radius * zoom, *fill);
            }
            DrawCommand::Ring {
                center,
                radius,
                width,
                color,
            } => {
                painter.circle_stroke(to_screen(*center), radius * zoom, Stroke::new(*width, *color));
            }
            DrawCommand::Text { pos, text, size, color } => {
                painter.text(
                    to_screen(*pos),
                    Align2::CENTER_CENTER,
                    text.as_str(),
                    FontId::proportional(size * zoom.sqrt()),
                    *color,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn culls_circles_fully_outside_the_rect() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(50.0, 50.0), 5.0));
        assert!(circle_visible(rect, pos2(-4.0, 50.0), 5.0));
        assert!(!circle_visible(rect, pos2(-6.0, 50.0), 5.0));
        assert!(!circle_visible(rect, pos2(50.0, 120.0), 5.0));
    }
}
