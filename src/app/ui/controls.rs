use eframe::egui::{self, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::model::{EntityKind, GraphIndex, LinkKind};
use crate::nav::{Location, Period, Route};
use crate::prefs::PreferenceStore;
use crate::render::encoding::{edge_style, node_color};

use super::super::ViewModel;
use super::super::views::GraphView;

const SEARCH_RESULTS: usize = 8;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Best matches for `query` by display name or id, highest score first.
pub(in crate::app) fn search_entities(graph: &GraphIndex, query: &str, limit: usize) -> Vec<(String, String)> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = graph
        .nodes()
        .iter()
        .filter_map(|node| {
            let score = fuzzy_match_score(&matcher, node.display_name(), query)
                .max(fuzzy_match_score(&matcher, &node.id, query))?;
            Some((score, node.id.clone(), node.display_name().to_owned()))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.2.cmp(&b.2)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, id, name)| (id, name))
        .collect()
}

impl ViewModel {
    pub(in crate::app) fn draw_navigation(
        &mut self,
        ui: &mut Ui,
        prefs: &mut PreferenceStore,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        ui.horizontal(|ui| {
            let current = self.location.route.clone();
            for (route, label) in [
                (Route::Graph, "Knowledge Graph"),
                (Route::Scenarios, "Scenario Map"),
                (Route::Live, "Live Map"),
            ] {
                let active = current == route || (route == Route::Graph && matches!(current, Route::Entity(_)));
                if ui.selectable_label(active, label).clicked() && current != route {
                    self.navigate(Location::new(route).with_period(prefs.period()));
                }
            }

            ui.separator();
            let mut period = prefs.period();
            egui::ComboBox::from_id_salt("period")
                .selected_text(Period::label(period))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut period, None, Period::label(None));
                    for option in Period::ALL {
                        ui.selectable_value(&mut period, Some(option), Period::label(Some(option)));
                    }
                });
            prefs.set_period(period);

            ui.separator();
            ui.add_enabled_ui(!is_reloading, |ui| {
                if ui.button("Reload").on_hover_text("Fetch the graph again.").clicked() {
                    *reload_requested = true;
                }
            });
            if is_reloading {
                ui.spinner();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.weak(self.location.to_string());
            });
        });
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Find entity");
        ui.text_edit_singleline(&mut self.search);
        let matches = search_entities(self.knowledge.graph(), &self.search, SEARCH_RESULTS);
        let mut picked = None;
        for (id, name) in &matches {
            if ui.link(name.as_str()).on_hover_text(id.as_str()).clicked() {
                picked = Some(id.clone());
            }
        }
        if !self.search.trim().is_empty() && matches.is_empty() {
            ui.weak("No matching entities.");
        }
        if let Some(id) = picked {
            self.search.clear();
            self.navigate(Location::new(Route::entity(id)).with_period(self.location.period));
        }

        ui.separator();
        let view = self.active_view();

        ui.label(RichText::new("Zoom").strong());
        ui.horizontal(|ui| {
            let controller = view.controller_mut();
            if ui.button("−").on_hover_text("Zoom out").clicked() {
                controller.transform_mut().zoom_out();
            }
            if ui.button("+").on_hover_text("Zoom in").clicked() {
                controller.transform_mut().zoom_in();
            }
            if ui
                .button("Home")
                .on_hover_text("Reset zoom, pan, filter and selection.")
                .clicked()
            {
                controller.home();
            }
            ui.weak(format!("{:.0}%", controller.transform().zoom * 100.0));
        });

        ui.separator();
        ui.label(RichText::new("Filter by type").strong());
        let counts = view.graph().count_by_kind();
        let filter = view.controller().filter();
        ui.horizontal_wrapped(|ui| {
            for kind in EntityKind::FILTERABLE {
                let count = counts.get(&kind).copied().unwrap_or(0);
                if count == 0 {
                    continue;
                }
                let text = RichText::new(format!("{} {count}", kind.label())).color(node_color(kind));
                if ui.selectable_label(filter == Some(kind), text).clicked() {
                    view.controller_mut().toggle_filter(kind);
                }
            }
        });
        if filter.is_some() && ui.small_button("Clear filter").clicked() {
            view.controller_mut().clear_filter();
        }

        ui.separator();
        ui.label(RichText::new("Relationships").strong());
        for kind in LinkKind::LEGEND {
            let style = edge_style(kind);
            let stroke = if style.dash.is_some() { "╌╌" } else { "──" };
            ui.colored_label(style.color, format!("{stroke} {}", kind.label()));
        }

        ui.separator();
        let graph = view.graph();
        let connected = (0..graph.len()).filter(|&index| graph.is_connected(index)).count();
        ui.weak(format!(
            "{connected} connected · {} peripheral · {} edges",
            graph.len() - connected,
            graph.edges().len()
        ));
        if graph.dropped_edges() > 0 {
            ui.weak(format!("{} edges skipped (unknown endpoint or self-loop)", graph.dropped_edges()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntitySummary, GraphData};

    #[test]
    fn search_ranks_by_name_and_respects_limit() {
        let mut carrefour = EntitySummary::new("b-1", "brand", 10);
        carrefour.canonical_name = "Carrefour".into();
        let mut cars = EntitySummary::new("t-9", "content_topic", 4);
        cars.canonical_name = "Cars and Racing".into();
        let graph = GraphIndex::new(&GraphData {
            nodes: vec![carrefour, cars, EntitySummary::new("p-2", "product", 1)],
            edges: Vec::new(),
        });

        let hits = search_entities(&graph, "carref", 5);
        assert_eq!(hits, vec![("b-1".to_owned(), "Carrefour".to_owned())]);
        assert_eq!(search_entities(&graph, "car", 1).len(), 1);
        assert!(search_entities(&graph, "   ", 5).is_empty());
        assert_eq!(search_entities(&graph, "P-2", 5)[0].0, "p-2");
    }
}
