use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};
use tracing::{debug, error, info};

use crate::interaction::InteractionEvent;
use crate::model::GraphData;
use crate::nav::{Location, Period, Route};
use crate::prefs::{PreferenceStore, SubscriptionId};
use crate::source::GraphSource;

mod paint;
mod ui;
mod views;

use views::{BatchView, GraphView, LiveView};

type LoadResult = Result<GraphData, String>;

pub struct EntityMapApp {
    source: GraphSource,
    start: Location,
    seed: u64,
    prefs: PreferenceStore,
    subscription: SubscriptionId,
    period_rx: Receiver<Option<Period>>,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    data: GraphData,
    knowledge: BatchView,
    scenario: BatchView,
    live: Option<LiveView>,
    location: Location,
    search: String,
    seed: u64,
}

impl ViewModel {
    fn new(data: GraphData, location: Location, seed: u64) -> Self {
        let mut model = Self {
            knowledge: BatchView::knowledge(&data),
            scenario: BatchView::scenario(&data),
            live: None,
            data,
            location: Location::new(Route::Graph),
            search: String::new(),
            seed,
        };
        model.navigate(location);
        model
    }

    /// The view for the current route. Entity routes keep the knowledge
    /// graph on screen next to the details panel.
    fn active_view(&mut self) -> &mut dyn GraphView {
        match self.location.route {
            Route::Graph | Route::Entity(_) => &mut self.knowledge,
            Route::Scenarios => &mut self.scenario,
            Route::Live => self.live.get_or_insert_with(|| LiveView::new(&self.data, self.seed)),
        }
    }

    fn navigate(&mut self, location: Location) {
        if location.route != Route::Live && self.live.take().is_some() {
            debug!("live map closed");
        }
        if let Route::Entity(id) = &location.route {
            self.knowledge.select(Some(id.as_str()));
        }
        info!(%location, "navigate");
        self.location = location;
    }

    fn show(&mut self, ctx: &Context, prefs: &mut PreferenceStore, reload_requested: &mut bool, is_reloading: bool) {
        egui::TopBottomPanel::top("navigation").show(ctx, |ui| {
            ui.add_space(4.0);
            self.draw_navigation(ui, prefs, reload_requested, is_reloading);
            ui.add_space(4.0);
        });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        if let Route::Entity(id) = self.location.route.clone() {
            egui::SidePanel::right("details")
                .resizable(true)
                .default_width(300.0)
                .show(ctx, |ui| self.draw_details(ui, &id, prefs));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if self.data.is_empty() {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(views::EMPTY_MESSAGE);
                    });
                    return;
                }
                let event = self.active_view().show(ui);
                if let Some(InteractionEvent::Navigate(route)) = event {
                    self.navigate(Location::new(route).with_period(self.location.period));
                }
            });
    }
}

impl EntityMapApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: GraphSource,
        mut prefs: PreferenceStore,
        start: Location,
        seed: u64,
    ) -> Self {
        let (period_tx, period_rx) = mpsc::channel();
        let subscription = prefs.subscribe(move |changed| {
            let _ = period_tx.send(changed.period);
        });
        if start.period.is_some() {
            prefs.set_period(start.period);
        }
        let start = start.with_period(prefs.period());

        let state = Self::start_load(source.clone());
        Self {
            source,
            start,
            seed,
            prefs,
            subscription,
            period_rx,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: GraphSource) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source.load().map_err(|load_error| {
                let load_error = anyhow::Error::from(load_error);
                error!("graph load failed: {load_error:#}");
                format!("{load_error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: GraphSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, graph: GraphData) -> AppState {
        let location = match &self.state {
            AppState::Ready(model) => model.location.clone(),
            _ => self.start.clone(),
        };
        AppState::Ready(Box::new(ViewModel::new(graph, location, self.seed)))
    }

    fn apply_period_changes(&mut self) {
        while let Ok(period) = self.period_rx.try_recv() {
            if let AppState::Ready(model) = &mut self.state {
                model.location.period = period;
            }
            self.start.period = period;
        }
    }
}

impl Drop for EntityMapApp {
    fn drop(&mut self) {
        self.prefs.unsubscribe(self.subscription);
    }
}

impl eframe::App for EntityMapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading entity graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the entity graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut self.prefs, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            info!(source = %self.source, "retrying graph load");
            self.state = Self::start_load(self.source.clone());
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(graph) => self.ready(graph),
                Err(error) => AppState::Error(error),
            };
        }

        self.apply_period_changes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntitySummary, GraphEdge};

    fn model() -> ViewModel {
        let data = GraphData {
            nodes: vec![
                EntitySummary::new("a", "brand", 10),
                EntitySummary::new("b", "product", 4),
            ],
            edges: vec![GraphEdge::new("a", "b", "produces")],
        };
        ViewModel::new(data, Location::new(Route::entity("b")), 1)
    }

    #[test]
    fn entity_route_selects_in_the_knowledge_graph() {
        let mut model = model();
        assert_eq!(model.knowledge.scene().selected(), model.knowledge.graph().index_of("b"));
        assert_eq!(model.active_view().graph().len(), 2);
    }

    #[test]
    fn leaving_the_live_map_drops_its_simulation() {
        let mut model = model();
        model.navigate(Location::new(Route::Live));
        model.active_view();
        assert!(model.live.is_some());

        model.navigate(Location::new(Route::Scenarios));
        assert!(model.live.is_none());
        assert_eq!(model.location.route, Route::Scenarios);
    }
}
