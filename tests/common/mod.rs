//! Local stand-in for the Gemini endpoint

#![allow(dead_code)]

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;

pub const GOOD_KEY: &str = "test-key";

/// Monitor reply the fake model gives; fenced like real models do
pub const MONITOR_REPLY: &str =
    "```json\n{\"new_tension\": 40, \"reasoning\": \"validated her fear\", \"technique_used\": \"validation\"}\n```";

pub const ACTOR_REPLY: &str = "Okay... okay. I'm listening.";

pub const COMPLICATION: &str = "A loud alarm goes off.";

/// User text that makes the Actor call fail after the Monitor succeeded
pub const ACTOR_FAILS_ON: &str = "walk away";

async fn generate(
    Path(call): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if query.get("key").map(String::as_str) != Some(GOOD_KEY) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}})),
        );
    }
    if call == "broken:generateContent" {
        return (StatusCode::OK, Json(json!({"candidates": []})));
    }

    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    let reply = if prompt.contains("psychological monitor") {
        if prompt.contains("gibberish") {
            "I think the tension went down a bit."
        } else {
            MONITOR_REPLY
        }
    } else if prompt.contains("'Director'") {
        COMPLICATION
    } else if prompt.contains(ACTOR_FAILS_ON) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"code": 503, "message": "The model is overloaded."}})),
        );
    } else {
        ACTOR_REPLY
    };

    (
        StatusCode::OK,
        Json(json!({"candidates": [{"content": {"parts": [{"text": reply}], "role": "model"}}]})),
    )
}

/// Spawn the fake model server, returning its base URL
pub async fn spawn_fake_gemini() -> String {
    let app = Router::new().route("/v1beta/models/:call", post(generate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1beta", addr)
}
