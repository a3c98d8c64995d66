use eframe::egui::{self, Response, RichText, Ui};

use crate::interaction::{InteractionEvent, PointerController, PointerInput};
use crate::model::{EntitySummary, GraphIndex};
use crate::render::encoding::sentiment_color;

mod batch;
mod live;

pub(super) use batch::BatchView;
pub(super) use live::LiveView;

/// What the app shell needs from each graph view: the graph it shows, its
/// pointer state for the toolbar, and a way to paint and collect events.
pub(super) trait GraphView {
    fn graph(&self) -> &GraphIndex;

    fn controller(&self) -> &PointerController;

    fn controller_mut(&mut self) -> &mut PointerController;

    fn select(&mut self, id: Option<&str>);

    fn show(&mut self, ui: &mut Ui) -> Option<InteractionEvent>;
}

/// Translates this frame's egui pointer state into controller input.
/// `inside` remembers whether the pointer was over the canvas last frame so
/// leaving is reported once.
pub(super) fn pointer_inputs(ui: &Ui, response: &Response, inside: &mut bool) -> Vec<PointerInput> {
    let mut inputs = Vec::new();
    let active = response.hovered() || response.dragged() || response.drag_stopped();
    if !active {
        if std::mem::take(inside) {
            inputs.push(PointerInput::Leave);
        }
        return inputs;
    }
    *inside = true;

    let (pointer, pressed, released, scroll) = ui.input(|input| {
        (
            input.pointer.hover_pos().or(input.pointer.interact_pos()),
            input.pointer.primary_pressed(),
            input.pointer.primary_released(),
            input.raw_scroll_delta.y,
        )
    });
    let Some(pointer) = pointer else {
        return inputs;
    };

    if pressed && response.hovered() {
        inputs.push(PointerInput::Press(pointer));
    }
    inputs.push(PointerInput::Move(pointer));
    if released {
        inputs.push(PointerInput::Release(pointer));
    }
    if scroll.abs() > f32::EPSILON && response.hovered() {
        inputs.push(PointerInput::Wheel { pointer, scroll });
    }
    inputs
}

pub(super) fn set_pointer_cursor(ui: &Ui, controller: &PointerController) {
    let icon = if controller.is_dragging() || controller.is_panning() {
        egui::CursorIcon::Grabbing
    } else if controller.hovered().is_some() {
        egui::CursorIcon::PointingHand
    } else {
        return;
    };
    ui.output_mut(|output| output.cursor_icon = icon);
}

pub(super) const EMPTY_MESSAGE: &str = "No entities yet.";

pub(super) fn empty_state(ui: &mut Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.weak(EMPTY_MESSAGE);
    });
}

/// Small card shown next to the pointer while a node is hovered.
pub(super) fn hover_card(response: Response, node: &EntitySummary) {
    response.on_hover_ui_at_pointer(|ui| {
        ui.label(RichText::new(node.display_name()).strong());
        ui.weak(node.kind().label());
        ui.label(format!("{} mentions", node.mention_count));
        ui.colored_label(
            sentiment_color(node.avg_sentiment),
            format!("Sentiment {:.0}%", node.avg_sentiment * 100.0),
        );
    });
}
