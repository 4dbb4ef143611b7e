//! REST API handlers.
//!
//! Single-setting reads and writes speak plain text (one unsigned
//! integer, or `0`/`1` for booleans) so automation can treat them like
//! attribute files. Collection endpoints speak JSON.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{debug, info};

use corepool_state::Params;

use crate::ApiState;

/// Response wrapper for consistent JSON API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Settings ───────────────────────────────────────────────────

/// GET /api/v1/conf
pub async fn list_settings(State(state): State<ApiState>) -> impl IntoResponse {
    let params = state.params.read().await.clone();
    ApiResponse::ok(params)
}

/// GET /api/v1/conf/{name}
pub async fn get_setting(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let params = state.params.read().await.clone();
    match read_setting(&params, &name) {
        Some(value) => (StatusCode::OK, format!("{value}\n")).into_response(),
        None => error_response("unknown setting", StatusCode::NOT_FOUND).into_response(),
    }
}

/// PUT /api/v1/conf/{name}
///
/// The parse happens before any state is touched: malformed input is a
/// 400 with no side effect.
pub async fn put_setting(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: String,
) -> impl IntoResponse {
    let raw = body.trim();
    let parsed = match parse_setting(&name, raw) {
        Ok(v) => v,
        Err(SettingError::Unknown) => {
            return error_response("unknown setting", StatusCode::NOT_FOUND).into_response();
        }
        Err(SettingError::Malformed) => {
            debug!(setting = %name, value = raw, "rejected malformed write");
            return error_response("malformed value", StatusCode::BAD_REQUEST).into_response();
        }
    };

    let mut params = state.params.write().await;
    apply_setting(&mut params, parsed);
    info!(setting = %name, value = raw, "setting updated");
    (StatusCode::OK, "ok\n").into_response()
}

/// GET /api/v1/enabled
pub async fn get_enabled(State(state): State<ApiState>) -> impl IntoResponse {
    let enabled = state.coordinator.is_enabled().await;
    (StatusCode::OK, format!("{}\n", enabled as u8))
}

/// PUT /api/v1/enabled
pub async fn put_enabled(State(state): State<ApiState>, body: String) -> impl IntoResponse {
    match parse_bool(body.trim()) {
        Some(true) => {
            state.coordinator.enable().await;
            (StatusCode::OK, "ok\n").into_response()
        }
        Some(false) => {
            state.coordinator.disable().await;
            (StatusCode::OK, "ok\n").into_response()
        }
        None => error_response("malformed value", StatusCode::BAD_REQUEST).into_response(),
    }
}

// ── Pool & power ───────────────────────────────────────────────

/// GET /api/v1/pool
pub async fn get_pool(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.governor.lock().await.pool.snapshot();
    ApiResponse::ok(snapshot)
}

/// POST /api/v1/power/suspend
pub async fn post_suspend(State(state): State<ApiState>) -> impl IntoResponse {
    state.power.emit(corepool_governor::PowerEvent::Suspend);
    (StatusCode::ACCEPTED, "ok\n")
}

/// POST /api/v1/power/resume
pub async fn post_resume(State(state): State<ApiState>) -> impl IntoResponse {
    state.power.emit(corepool_governor::PowerEvent::Resume);
    (StatusCode::ACCEPTED, "ok\n")
}

// ── Stats ──────────────────────────────────────────────────────

/// Per-unit toggle counter entry.
#[cfg(feature = "stats")]
#[derive(serde::Serialize)]
pub struct ToggleStat {
    pub unit: u32,
    pub times_toggled: u64,
}

/// GET /api/v1/stats/times_toggled
#[cfg(feature = "stats")]
pub async fn get_times_toggled(State(state): State<ApiState>) -> impl IntoResponse {
    let stats: Vec<ToggleStat> = state
        .governor
        .lock()
        .await
        .pool
        .times_toggled()
        .into_iter()
        .map(|(unit, times_toggled)| ToggleStat {
            unit,
            times_toggled,
        })
        .collect();
    ApiResponse::ok(stats)
}

// ── Setting name mapping ───────────────────────────────────────

enum SettingValue {
    PollIntervalMs(u64),
    MinUnits(u32),
    MaxUnits(u32),
    LoadThresholdUp(u64),
    LoadThresholdDown(u64),
    CyclesUp(u32),
    CyclesDown(u32),
    SingleUnitOnSuspend(bool),
}

enum SettingError {
    Unknown,
    Malformed,
}

fn read_setting(params: &Params, name: &str) -> Option<String> {
    Some(match name {
        "poll_interval_ms" => params.poll_interval_ms.to_string(),
        "min_units" => params.min_units.to_string(),
        "max_units" => params.max_units.to_string(),
        "load_threshold_up" => params.load_threshold_up.to_string(),
        "load_threshold_down" => params.load_threshold_down.to_string(),
        "cycles_up" => params.cycles_up.to_string(),
        "cycles_down" => params.cycles_down.to_string(),
        "single_unit_on_suspend" => (params.single_unit_on_suspend as u8).to_string(),
        _ => return None,
    })
}

fn parse_setting(name: &str, raw: &str) -> Result<SettingValue, SettingError> {
    use SettingValue::*;

    let value = match name {
        "poll_interval_ms" => PollIntervalMs(parse_u64(raw)?),
        "min_units" => MinUnits(parse_u32(raw)?),
        "max_units" => MaxUnits(parse_u32(raw)?),
        "load_threshold_up" => LoadThresholdUp(parse_u64(raw)?),
        "load_threshold_down" => LoadThresholdDown(parse_u64(raw)?),
        "cycles_up" => CyclesUp(parse_u32(raw)?),
        "cycles_down" => CyclesDown(parse_u32(raw)?),
        "single_unit_on_suspend" => {
            SingleUnitOnSuspend(parse_bool(raw).ok_or(SettingError::Malformed)?)
        }
        _ => return Err(SettingError::Unknown),
    };
    Ok(value)
}

fn apply_setting(params: &mut Params, value: SettingValue) {
    use SettingValue::*;
    match value {
        PollIntervalMs(v) => params.poll_interval_ms = v,
        MinUnits(v) => params.min_units = v,
        MaxUnits(v) => params.max_units = v,
        LoadThresholdUp(v) => params.load_threshold_up = v,
        LoadThresholdDown(v) => params.load_threshold_down = v,
        CyclesUp(v) => params.cycles_up = v,
        CyclesDown(v) => params.cycles_down = v,
        SingleUnitOnSuspend(v) => params.single_unit_on_suspend = v,
    }
}

fn parse_u64(raw: &str) -> Result<u64, SettingError> {
    raw.parse().map_err(|_| SettingError::Malformed)
}

fn parse_u32(raw: &str) -> Result<u32, SettingError> {
    raw.parse().map_err(|_| SettingError::Malformed)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
