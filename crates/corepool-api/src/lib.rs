//! corepool-api — REST configuration and stats surface.
//!
//! The external configuration contract: every tunable is a named
//! setting readable and writable as a single plain-text value, applied
//! immediately (the next tick observes it). Malformed writes are
//! rejected with no side effect.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/conf` | All tunables as JSON |
//! | GET | `/api/v1/conf/{name}` | One tunable, plain text |
//! | PUT | `/api/v1/conf/{name}` | Write one tunable, plain text |
//! | GET | `/api/v1/enabled` | Governor enabled flag (`0`/`1`) |
//! | PUT | `/api/v1/enabled` | Enable/disable the governor |
//! | GET | `/api/v1/pool` | Unit pool snapshot |
//! | POST | `/api/v1/power/suspend` | Inject a suspend event |
//! | POST | `/api/v1/power/resume` | Inject a resume event |
//! | GET | `/api/v1/stats/times_toggled` | Per-unit toggle counters (`stats` feature) |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use corepool_governor::{Coordinator, PowerEventBus, SharedGovernorState};
use corepool_state::SharedParams;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub params: SharedParams,
    pub governor: SharedGovernorState,
    pub coordinator: Arc<Coordinator>,
    pub power: PowerEventBus,
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/conf", get(handlers::list_settings))
        .route(
            "/conf/{name}",
            get(handlers::get_setting).put(handlers::put_setting),
        )
        .route(
            "/enabled",
            get(handlers::get_enabled).put(handlers::put_enabled),
        )
        .route("/pool", get(handlers::get_pool))
        .route("/power/suspend", post(handlers::post_suspend))
        .route("/power/resume", post(handlers::post_resume));

    #[cfg(feature = "stats")]
    let api_routes = api_routes.route(
        "/stats/times_toggled",
        get(handlers::get_times_toggled),
    );

    Router::new().nest("/api/v1", api_routes.with_state(state))
}
