//! Integration tests: run a stub chat orchestrator on a free loopback port and drive the
//! real HTTP client and conversation against it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use transito::api::{ApiError, ChatClient, Responder};
use transito::conversation::{Conversation, TurnState, ERROR_REPLY_TEXT};
use transito::normalize::EMPTY_REPLY_TEXT;
use transito::session::SessionStorage;

type Seen = Arc<Mutex<Vec<Value>>>;

async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

async fn rasa_like(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    seen.lock().unwrap().push(body.clone());
    Json(json!({
        "sender_id": body["sender_id"],
        "messages": [
            {
                "text": "La multa es de 15 SMLDV.",
                "custom": {
                    "sources": [{
                        "article": "Artículo 131 - Código Nacional de Tránsito Infracción C14",
                        "law": "Ley 769 de 2002",
                        "description": "Restricciones a la circulación de vehículos automotores"
                    }],
                    "origin": "backrag"
                }
            },
            {
                "text": "¿Te ayudo con algo más?",
                "buttons": [
                    {"title": "Sí", "payload": "/affirm"},
                    {"title": "No", "payload": "/deny"}
                ]
            }
        ],
        "timestamp": "2025-10-16T10:30:00Z"
    }))
}

fn recording_backend(seen: Seen) -> Router {
    Router::new()
        .route("/api/v1/chat/message", post(rasa_like))
        .with_state(seen)
}

#[tokio::test]
async fn send_message_posts_wire_shape_and_returns_items() {
    let seen: Seen = Arc::default();
    let base = spawn_backend(recording_backend(seen.clone())).await;
    let client = ChatClient::new(Some(base), SessionStorage::new());

    let response = client
        .send_message("¿Cuál es la multa por pico y placa?")
        .await
        .expect("chat response");
    assert_eq!(response.messages.len(), 2);
    assert_eq!(
        response.messages[1].buttons.as_ref().map(|b| b.len()),
        Some(2)
    );

    let requests = seen.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req["message"], "¿Cuál es la multa por pico y placa?");
    assert_eq!(req["metadata"]["channel"], "web");
    assert!(req["sender_id"].as_str().unwrap().starts_with("user_"));
    let ts = req["metadata"]["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
}

#[tokio::test]
async fn sender_id_is_reused_until_storage_is_cleared() {
    let seen: Seen = Arc::default();
    let base = spawn_backend(recording_backend(seen.clone())).await;
    let storage = SessionStorage::new();
    let client = ChatClient::new(Some(base), storage.clone()).with_channel("desktop");

    client.send_message("uno").await.unwrap();
    client.send_message("dos").await.unwrap();
    storage.clear();
    client.send_message("tres").await.unwrap();

    let requests = seen.lock().unwrap().clone();
    let ids: Vec<&str> = requests
        .iter()
        .map(|r| r["sender_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_eq!(requests[0]["metadata"]["channel"], "desktop");
}

#[tokio::test]
async fn conversation_normalizes_remote_reply() {
    let seen: Seen = Arc::default();
    let base = spawn_backend(recording_backend(seen)).await;
    let client = ChatClient::new(Some(base), SessionStorage::new());
    let mut conversation = Conversation::new();

    let appended = conversation.send(&client, "pico y placa").await.unwrap();
    assert_eq!(appended, 2);
    let messages = conversation.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(
        messages[1].citation().map(|s| s.law.as_str()),
        Some("Ley 769 de 2002")
    );
    assert_eq!(messages[2].buttons().len(), 2);

    let id = messages[2].id.clone();
    conversation.press_button(&client, &id, 1).await.unwrap();
    assert_eq!(conversation.messages()[3].text, "/deny");
    assert!(!conversation.messages()[3].is_bot);
    assert_eq!(conversation.messages().len(), 6);
}

#[tokio::test]
async fn empty_messages_yield_fallback_message() {
    let app = Router::new().route(
        "/api/v1/chat/message",
        post(|| async { Json(json!({"sender_id": "user_x", "messages": [], "timestamp": "2025-10-16T10:30:00Z"})) }),
    );
    let base = spawn_backend(app).await;
    let client = ChatClient::new(Some(base), SessionStorage::new());
    let mut conversation = Conversation::new();
    conversation.send(&client, "hola").await.unwrap();
    assert_eq!(conversation.messages().len(), 2);
    assert_eq!(conversation.messages()[1].text, EMPTY_REPLY_TEXT);
}

#[tokio::test]
async fn non_success_status_is_transport_error() {
    let app = Router::new().route(
        "/api/v1/chat/message",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "rasa down") }),
    );
    let base = spawn_backend(app).await;
    let client = ChatClient::new(Some(base.clone()), SessionStorage::new());

    match client.send_message("hola").await {
        Err(ApiError::Transport { status, reason }) => {
            assert_eq!(status, 503);
            assert_eq!(reason, "Service Unavailable");
        }
        other => panic!("expected transport error, got {:?}", other.map(|_| ())),
    }

    let mut conversation = Conversation::new();
    conversation.send(&client, "hola").await.unwrap();
    assert_eq!(conversation.turn(), TurnState::Idle);
    let last = conversation.messages().last().unwrap();
    assert!(last.is_bot);
    assert!(last.text.starts_with(ERROR_REPLY_TEXT));
    assert!(last.text.contains(&base));
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let app = Router::new().route("/api/v1/chat/message", post(|| async { "<html>oops</html>" }));
    let base = spawn_backend(app).await;
    let client = ChatClient::new(Some(base), SessionStorage::new());
    let err = client.reply("hola").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let app = Router::new().route(
        "/api/v1/chat/message",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"sender_id": "user_x", "messages": []}))
        }),
    );
    let base = spawn_backend(app).await;
    let client = ChatClient::new(Some(base), SessionStorage::new())
        .with_timeout(Duration::from_millis(200));
    let err = client.reply("hola").await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn unreachable_backend_is_connect_error() {
    let base = format!("http://127.0.0.1:{}", free_port());
    let client = ChatClient::new(Some(base), SessionStorage::new());
    let err = client.reply("hola").await.unwrap_err();
    assert!(matches!(err, ApiError::Connect(_)), "got {:?}", err);
}

#[tokio::test]
async fn health_probe_decodes_status() {
    let app = Router::new().route(
        "/api/v1/health",
        get(|| async {
            Json(json!({"status": "healthy", "version": "0.1.0", "database_status": "connected"}))
        }),
    );
    let base = spawn_backend(app).await;
    let client = ChatClient::new(Some(format!("{}/", base)), SessionStorage::new());
    let health = client.check_health().await.expect("health");
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "0.1.0");
    assert_eq!(health.database_status, "connected");
}
