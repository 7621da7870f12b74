//! State core for the air-quality map dashboard
//!
//! Users drop markers on a bounded map; each marker triggers a remote
//! air-quality prediction keyed by its coordinate. This crate tracks the
//! markers, caches and deduplicates the predictions, and decides which one
//! the detail panel shows. Rendering is left to whatever reads the
//! [`ViewModel`].
//!
//! # Components
//!
//! - [`MarkerStore`]: ordered markers; duplicates allowed
//! - [`PredictionCache`]: one entry per [`CoordinateKey`], at most one
//!   outstanding request per key, epoch-stamped against late results
//! - [`SelectionController`]: active prediction and panel visibility
//! - [`AnnotationController`]: takes presentation events, owns the above
//!
//! # Data flow
//!
//! Presentation events become [`Action`]s. The [`reducer`](reducer::reducer)
//! applies them to [`DashboardState`] and declares [`Effect`]s. The controller
//! runs effects as tasks whose results come back as `*Did*` actions:
//!
//! ```text
//! on_draw_created(c)
//!   -> MarkerDrawCreated(c)            reducer: add marker, cache Pending
//!   -> Effect::FetchPrediction         task: PredictionClient::fetch(c)
//!   -> PredictionDidLoad{key, epoch}   reducer: cache Ready, select key
//! ```
//!
//! # Example
//!
//! ```ignore
//! use aqmap_core::prelude::*;
//!
//! let config = DashboardConfig::default();
//! let mut controller = AnnotationController::new(
//!     &config,
//!     HttpPredictionClient::new(&config)?,
//!     NominatimClient::new(&config)?,
//! );
//!
//! controller.on_draw_created(Coordinate::new(19.076, 72.8777));
//! controller.settle().await;
//! println!("{:?}", controller.view_model().selection);
//! ```

pub mod action;
pub mod action_log;
pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod controller;
pub mod coordinate;
pub mod effect;
pub mod markers;
pub mod prediction;
pub mod reducer;
pub mod selection;
pub mod state;
pub mod store;
pub mod tasks;
pub mod testing;

pub use action::{Action, ActionCategory};
pub use action_log::{ActionFilter, ActionLog, ActionLogConfig, ActionLogMiddleware};
pub use api::{GeocodeError, HttpPredictionClient, NominatimClient};
pub use cache::{Epoch, Lookup, PredictionCache, PredictionWatch, Resolution};
pub use client::{GeocodeClient, Place, PredictionClient};
pub use config::DashboardConfig;
pub use controller::AnnotationController;
pub use coordinate::{Coordinate, CoordinateKey, MapBounds, KEY_PRECISION};
pub use effect::{DispatchResult, Effect};
pub use markers::{Marker, MarkerStore};
pub use prediction::{format_metric, PredictionEntry, PredictionError, PredictionRecord};
pub use selection::{SelectionController, SelectionState};
pub use state::{DashboardState, MarkerStatus, MarkerView, SearchState, ViewModel};
pub use store::{Middleware, NoopMiddleware, Store};
pub use tasks::{TaskKey, TaskManager};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::{GeocodeClient, Place, PredictionClient};
    pub use crate::config::DashboardConfig;
    pub use crate::controller::AnnotationController;
    pub use crate::coordinate::{Coordinate, CoordinateKey};
    pub use crate::prediction::{PredictionEntry, PredictionError, PredictionRecord};
    pub use crate::state::ViewModel;
    pub use crate::{HttpPredictionClient, NominatimClient};
}
