use eframe::egui::{self, RichText, Ui};

use crate::nav::{Location, Route};
use crate::prefs::PreferenceStore;
use crate::render::encoding::{delta_badge, sentiment_color};

use super::super::ViewModel;
use super::super::views::GraphView;

struct Connection {
    id: String,
    name: String,
    link_type: String,
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui, id: &str, prefs: &mut PreferenceStore) {
        ui.horizontal(|ui| {
            ui.heading("Entity Details");
            if ui.small_button("✕").on_hover_text("Back to the graph").clicked() {
                self.navigate(Location::new(Route::Graph).with_period(self.location.period));
            }
        });
        ui.add_space(6.0);

        let graph = self.knowledge.graph();
        let Some(index) = graph.index_of(id) else {
            ui.label(format!("No entity with id `{id}` in the current graph."));
            return;
        };
        let Some(node) = graph.node(index) else {
            return;
        };

        ui.label(RichText::new(node.display_name()).strong());
        ui.small(id);
        ui.add_space(6.0);

        match &node.sub_type {
            Some(sub_type) => ui.label(format!("Type: {} ({sub_type})", node.kind().label())),
            None => ui.label(format!("Type: {}", node.kind().label())),
        };
        ui.horizontal(|ui| {
            ui.label(format!("Mentions: {}", node.mention_count));
            if let Some(badge) = delta_badge(node.mention_delta) {
                ui.colored_label(badge.color, badge.label);
            }
        });
        ui.colored_label(
            sentiment_color(node.avg_sentiment),
            format!("Sentiment: {:.0}%", node.avg_sentiment * 100.0),
        );
        ui.label(format!("Aspects: {}", node.aspect_count));

        let connections = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let other = if edge.source == index {
                    edge.target
                } else if edge.target == index {
                    edge.source
                } else {
                    return None;
                };
                let entity = graph.node(other)?;
                Some(Connection {
                    id: entity.id.clone(),
                    name: entity.display_name().to_owned(),
                    link_type: edge.link_type.replace('_', " "),
                })
            })
            .collect::<Vec<_>>();

        ui.add_space(6.0);
        let watched = prefs.is_watched(id);
        let label = if watched { "★ Watching" } else { "☆ Add to watchlist" };
        if ui.button(label).clicked() {
            prefs.toggle_watch(id);
        }

        ui.separator();
        ui.label(RichText::new(format!("Connections ({})", connections.len())).strong());
        if connections.is_empty() {
            ui.label("No relationships recorded for this entity.");
            return;
        }

        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("connections_scroll")
            .max_height(360.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for connection in &connections {
                    ui.horizontal(|ui| {
                        ui.weak(connection.link_type.as_str());
                        if ui.link(connection.name.as_str()).clicked() {
                            picked = Some(connection.id.clone());
                        }
                    });
                }
            });
        if let Some(id) = picked {
            self.navigate(Location::new(Route::entity(id)).with_period(self.location.period));
        }
    }
}
