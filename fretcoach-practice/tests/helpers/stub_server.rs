//! Stub sensor server for integration tests
//!
//! Serves the same routes as the real sensor server from canned data, counts
//! requests per route and can be switched into failure modes while running.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

/// Chord table served by `GET /api/chords`
pub fn default_chord_table() -> Value {
    json!({
        "C major": {"fret_positions": [1, 3, 3], "string_positions": [1, 3, 4]},
        "E minor": {"fret_positions": [3, 3], "string_positions": [3, 4]},
        "A minor": {"fret_positions": [1, 3, 3], "string_positions": [1, 2, 3]},
        "Broken": {"fret_positions": [1, 3], "string_positions": [1]}
    })
}

#[derive(Default)]
pub struct StubState {
    pub chord_table: Mutex<Value>,
    /// Only reachable through `GET /api/chords/{name}`
    pub single_chords: Mutex<BTreeMap<String, Value>>,
    pub reading: Mutex<Value>,
    pub fail_chords: AtomicBool,
    pub fail_sensor: AtomicBool,
    pub sensor_delay_ms: AtomicUsize,
    pub chords_hits: AtomicUsize,
    pub chord_hits: AtomicUsize,
    pub processed_hits: AtomicUsize,
    pub read_hits: AtomicUsize,
}

pub struct StubServer {
    pub addr: SocketAddr,
    pub state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        *state.chord_table.lock().unwrap() = default_chord_table();
        *state.reading.lock().unwrap() =
            json!({"chord": "Unknown", "fret_positions": [], "string_positions": []});

        let router = Router::new()
            .route("/api/chords", get(chord_table))
            .route("/api/chords/:name", get(single_chord))
            .route("/api/sensor/processed", post(processed))
            .route("/api/sensor/read", get(raw_read))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        StubServer { addr, state, task }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Set the reading returned by `POST /api/sensor/processed`
    pub fn set_reading(&self, chord: &str, frets: &[u32], strings: &[u32]) {
        *self.state.reading.lock().unwrap() = json!({
            "chord": chord,
            "fret_positions": frets,
            "string_positions": strings,
        });
    }

    pub fn add_single_chord(&self, name: &str, body: Value) {
        self.state
            .single_chords
            .lock()
            .unwrap()
            .insert(name.to_string(), body);
    }

    pub fn fail_sensor(&self, fail: bool) {
        self.state.fail_sensor.store(fail, Ordering::SeqCst);
    }

    pub fn fail_chords(&self, fail: bool) {
        self.state.fail_chords.store(fail, Ordering::SeqCst);
    }

    pub fn delay_sensor(&self, delay: Duration) {
        self.state
            .sensor_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    pub fn chords_hits(&self) -> usize {
        self.state.chords_hits.load(Ordering::SeqCst)
    }

    pub fn chord_hits(&self) -> usize {
        self.state.chord_hits.load(Ordering::SeqCst)
    }

    pub fn processed_hits(&self) -> usize {
        self.state.processed_hits.load(Ordering::SeqCst)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Base URL of a port nothing listens on
pub async fn unused_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn chord_table(State(state): State<Arc<StubState>>) -> Response {
    state.chords_hits.fetch_add(1, Ordering::SeqCst);
    if state.fail_chords.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "chord table unavailable").into_response();
    }
    Json(state.chord_table.lock().unwrap().clone()).into_response()
}

async fn single_chord(State(state): State<Arc<StubState>>, Path(name): Path<String>) -> Response {
    state.chord_hits.fetch_add(1, Ordering::SeqCst);
    if state.fail_chords.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "chord lookup unavailable").into_response();
    }
    match state.single_chords.lock().unwrap().get(&name) {
        Some(body) => Json(body.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "Chord not found"}))).into_response(),
    }
}

async fn processed(State(state): State<Arc<StubState>>) -> Response {
    state.processed_hits.fetch_add(1, Ordering::SeqCst);
    let delay = state.sensor_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay as u64)).await;
    }
    if state.fail_sensor.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "sensor offline").into_response();
    }
    Json(state.reading.lock().unwrap().clone()).into_response()
}

async fn raw_read(State(state): State<Arc<StubState>>) -> Response {
    state.read_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"timestamp": 1700000000, "pins": [0, 1, 0, 0, 1, 0]})).into_response()
}
