//! The annotation controller: entry point for presentation events
//!
//! Presentation calls the `on_*` handlers and reads [`ViewModel`]s. Each
//! handler dispatches one action; the reducer's effects become tasks whose
//! results come back on the action channel. Those results are applied only
//! when the owner drives the controller with [`AnnotationController::pump`]
//! or [`AnnotationController::settle`], so all mutation stays on the
//! owner's task while remote calls run concurrently.
//!
//! ```ignore
//! let mut controller = AnnotationController::new(&config, predictions, geocoder);
//! let watch = controller.on_draw_created(Coordinate::new(19.076, 72.8777));
//! controller.settle().await;
//! let vm = controller.view_model();
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::action::Action;
use crate::action_log::{ActionLog, ActionLogConfig, ActionLogMiddleware};
use crate::cache::PredictionWatch;
use crate::client::{GeocodeClient, PredictionClient};
use crate::config::DashboardConfig;
use crate::coordinate::Coordinate;
use crate::effect::Effect;
use crate::reducer::reducer;
use crate::state::{DashboardState, ViewModel};
use crate::store::Store;
use crate::tasks::{TaskKey, TaskManager};

/// How often `next_result` re-checks running tasks while waiting
const SETTLE_POLL: Duration = Duration::from_millis(10);

pub struct AnnotationController<P, G> {
    store: Store<ActionLogMiddleware>,
    tasks: TaskManager,
    action_rx: mpsc::UnboundedReceiver<Action>,
    predictions: Arc<P>,
    geocoder: Arc<G>,
    search_debounce: Duration,
}

impl<P, G> AnnotationController<P, G>
where
    P: PredictionClient,
    G: GeocodeClient,
{
    pub fn new(config: &DashboardConfig, predictions: P, geocoder: G) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let middleware =
            ActionLogMiddleware::new(ActionLogConfig::with_capacity(config.action_log_capacity));
        Self {
            store: Store::new(DashboardState::new(config), reducer, middleware),
            tasks: TaskManager::new(action_tx),
            action_rx,
            predictions: Arc::new(predictions),
            geocoder: Arc::new(geocoder),
            search_debounce: config.search_debounce(),
        }
    }

    // ===== Presentation events =====

    /// A marker was drawn. Returns a watch on the coordinate's prediction.
    pub fn on_draw_created(&mut self, coordinate: Coordinate) -> Option<PredictionWatch> {
        self.dispatch(Action::MarkerDrawCreated(coordinate));
        self.state().cache.watch(&coordinate.key())
    }

    /// Markers were deleted. Their cache entries are kept.
    pub fn on_draw_deleted(&mut self, coordinates: &[Coordinate]) {
        self.dispatch(Action::MarkerDrawDeleted(coordinates.to_vec()));
    }

    /// Remove all markers, invalidate their predictions and clear the selection.
    pub fn on_clear_all(&mut self) {
        self.dispatch(Action::MarkersClear);
    }

    /// A search result was picked. No marker is added.
    pub fn on_location_selected(&mut self, coordinate: Coordinate) -> Option<PredictionWatch> {
        self.dispatch(Action::LocationSelect(coordinate));
        self.state().cache.watch(&coordinate.key())
    }

    pub fn on_panel_toggle(&mut self) {
        self.dispatch(Action::PanelToggle);
    }

    pub fn on_panel_dismiss(&mut self) {
        self.dispatch(Action::PanelDismiss);
    }

    pub fn on_search_input(&mut self, text: impl Into<String>) {
        self.dispatch(Action::SearchQueryChange(text.into()));
    }

    // ===== Reads =====

    pub fn view_model(&self) -> ViewModel {
        self.state().view_model()
    }

    pub fn state(&self) -> &DashboardState {
        self.store.state()
    }

    pub fn action_log(&self) -> &ActionLog {
        self.store.middleware().log()
    }

    /// Number of remote calls still running
    pub fn outstanding(&mut self) -> usize {
        self.tasks.running()
    }

    // ===== Driving the loop =====

    /// Apply every result that has already arrived. Returns whether state changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(action) = self.action_rx.try_recv() {
            changed |= self.dispatch(action);
        }
        changed
    }

    /// Wait for every running task and apply its result.
    pub async fn settle(&mut self) {
        while self.next_result().await.is_some() {}
    }

    /// Wait for the next result and apply it.
    ///
    /// Returns `None` once nothing is running and nothing is queued.
    pub async fn next_result(&mut self) -> Option<Action> {
        loop {
            if let Ok(action) = self.action_rx.try_recv() {
                self.dispatch(action.clone());
                return Some(action);
            }
            if self.tasks.running() == 0 {
                // A task that finished after the first check has already sent
                let action = self.action_rx.try_recv().ok()?;
                self.dispatch(action.clone());
                return Some(action);
            }
            // A task may have sent but not yet be marked finished; re-check
            // instead of blocking on a channel that may stay empty
            tokio::select! {
                Some(action) = self.action_rx.recv() => {
                    self.dispatch(action.clone());
                    return Some(action);
                }
                _ = tokio::time::sleep(SETTLE_POLL) => {}
            }
        }
    }

    /// Abort all running tasks. Their results never arrive.
    pub fn shutdown(&mut self) {
        self.tasks.cancel_all();
    }

    fn dispatch(&mut self, action: Action) -> bool {
        let result = self.store.dispatch(action);
        for effect in result.effects {
            self.handle_effect(effect);
        }
        result.changed
    }

    fn handle_effect(&mut self, effect: Effect) {
        match effect {
            Effect::FetchPrediction {
                coordinate,
                key,
                epoch,
            } => {
                let client = Arc::clone(&self.predictions);
                self.tasks
                    .spawn(TaskKey::prediction(&key, epoch), async move {
                        match client.fetch(coordinate).await {
                            Ok(record) => Action::PredictionDidLoad { key, epoch, record },
                            Err(error) => Action::PredictionDidError { key, epoch, error },
                        }
                    });
            }
            Effect::SearchPlaces { query } => {
                let geocoder = Arc::clone(&self.geocoder);
                self.tasks
                    .debounce(TaskKey::search(), self.search_debounce, async move {
                        let places = geocoder.search(&query).await;
                        Action::SearchDidLoad { query, places }
                    });
            }
            Effect::CancelSearch => {
                self.tasks.cancel(&TaskKey::search());
            }
        }
    }
}
