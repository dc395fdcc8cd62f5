//! HTTP surface: the live event view and a health endpoint.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::json;

use crate::model::SportEvent;
use crate::service::{HealthState, SharedStore};
use crate::store::EventStore;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub health: HealthState,
}

pub fn router(store: SharedStore, health: HealthState) -> Router {
    Router::new()
        .route("/client/state", get(state_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { store, health })
}

#[derive(Debug, Serialize)]
struct CompetitorView {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ScoreView {
    home: u32,
    away: u32,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventView {
    id: String,
    sport: &'static str,
    competition: String,
    /// RFC 3339 with milliseconds, `None` when the timestamp is out of range.
    start_time: Option<String>,
    competitors: BTreeMap<&'static str, CompetitorView>,
    status: &'static str,
    scores: BTreeMap<String, ScoreView>,
}

impl From<SportEvent> for EventView {
    fn from(event: SportEvent) -> Self {
        let start_time = Utc
            .timestamp_millis_opt(event.start_time_ts)
            .single()
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true));

        let competitors = BTreeMap::from([
            (
                "HOME",
                CompetitorView {
                    name: event.home_competitor,
                    kind: "HOME",
                },
            ),
            (
                "AWAY",
                CompetitorView {
                    name: event.away_competitor,
                    kind: "AWAY",
                },
            ),
        ]);

        let scores = event
            .scores
            .iter()
            .map(|(period, score)| {
                let kind = period.to_string();
                (
                    kind.clone(),
                    ScoreView {
                        home: score.home,
                        away: score.away,
                        kind,
                    },
                )
            })
            .collect();

        Self {
            id: event.id,
            sport: event.sport.as_str(),
            competition: event.competition,
            start_time,
            competitors,
            status: event.status.as_str(),
            scores,
        }
    }
}

/// Live events keyed by id.
async fn state_handler(State(state): State<AppState>) -> Json<BTreeMap<String, EventView>> {
    let events = state.store.read().await.list();
    Json(
        events
            .into_iter()
            .map(|event| (event.id.clone(), EventView::from(event)))
            .collect(),
    )
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let health = state.health;
    let last_poll = *health.last_poll_time.read().await;
    let last_count = *health.last_poll_count.read().await;
    let errors = *health.error_count.read().await;

    let status = if errors > 5 { "degraded" } else { "ok" };

    let http_status = if errors > 10 {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        http_status,
        Json(json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "status": status,
            "last_poll": last_poll.map(|t| t.to_rfc3339()),
            "last_poll_count": last_count,
            "consecutive_errors": errors
        })),
    )
}
