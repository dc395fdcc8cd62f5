//! Local upstream used by the integration tests.
//!
//! Serves `/api/state` and `/api/mappings` with configurable bodies, ETags and
//! statuses, and counts HEAD and GET requests per endpoint.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;

use sport_events_ingestion::Config;

struct EndpointState {
    body: String,
    etag: Option<String>,
    status: StatusCode,
    heads: usize,
    gets: usize,
}

#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<Mutex<EndpointState>>,
}

impl Endpoint {
    pub fn new(body: impl Into<String>, etag: Option<&str>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EndpointState {
                body: body.into(),
                etag: etag.map(str::to_string),
                status: StatusCode::OK,
                heads: 0,
                gets: 0,
            })),
        }
    }

    pub fn odds(odds: &str, etag: Option<&str>) -> Self {
        Self::new(serde_json::json!({ "odds": odds }).to_string(), etag)
    }

    pub fn mappings(mappings: &str, etag: Option<&str>) -> Self {
        Self::new(serde_json::json!({ "mappings": mappings }).to_string(), etag)
    }

    pub fn set(&self, body: impl Into<String>, etag: Option<&str>) {
        let mut state = self.inner.lock().unwrap();
        state.body = body.into();
        state.etag = etag.map(str::to_string);
    }

    pub fn set_status(&self, status: StatusCode) {
        self.inner.lock().unwrap().status = status;
    }

    pub fn heads(&self) -> usize {
        self.inner.lock().unwrap().heads
    }

    pub fn gets(&self) -> usize {
        self.inner.lock().unwrap().gets
    }
}

async fn serve(method: Method, State(endpoint): State<Endpoint>) -> Response {
    let mut state = endpoint.inner.lock().unwrap();
    let body = if method == Method::HEAD {
        state.heads += 1;
        Body::empty()
    } else {
        state.gets += 1;
        Body::from(state.body.clone())
    };

    let mut response = axum::http::Response::builder()
        .status(state.status)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(etag) = &state.etag {
        response = response.header(header::ETAG, etag.as_str());
    }
    response.body(body).unwrap()
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    pub odds: Endpoint,
    pub mappings: Endpoint,
}

impl MockUpstream {
    pub async fn start(odds: Endpoint, mappings: Endpoint) -> Self {
        let app = Router::new()
            .route("/api/state", any(serve))
            .with_state(odds.clone())
            .merge(
                Router::new()
                    .route("/api/mappings", any(serve))
                    .with_state(mappings.clone()),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            odds,
            mappings,
        }
    }

    pub fn config(&self) -> Config {
        config_for(self.addr)
    }
}

pub fn config_for(addr: SocketAddr) -> Config {
    let port = addr.port().to_string();
    Config::from_lookup(|name| match name {
        "RTC_API_URL" => Some("http://127.0.0.1".to_string()),
        "RTC_API_PORT" => Some(port.clone()),
        "REQUEST_TIMEOUT_SECONDS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

pub const MAPPINGS: &str =
    "a:id;b:FOOTBALL;c:La Liga;e:FC Barcelona;f:Real Madrid;g:PRE;l:LIVE;h:CURRENT;i:PERIOD_1";
