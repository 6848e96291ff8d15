use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, BodyDataStream, to_bytes},
    http::{Request, StatusCode, header},
};
use futures::StreamExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use chess_link_back::{
    config::AppConfig,
    dao::{
        game_store::{StorageHandles, memory::MemoryGameStore},
        models::{GameResult, GameStatus},
    },
    routes,
    state::AppState,
};

async fn app() -> (Router, Arc<MemoryGameStore>) {
    let store = Arc::new(MemoryGameStore::new());
    let state =
        AppState::with_storage(AppConfig::default(), StorageHandles::shared(store.clone())).await;
    (routes::router(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn create(app: &Router) -> String {
    let (status, body) = send(app, post("/game/create", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    body["gameId"].as_str().unwrap().to_string()
}

async fn seat_both(app: &Router, game_id: &str) {
    for player in ["white-1", "black-1"] {
        let (status, _) = send(
            app,
            post("/game/join", json!({ "gameId": game_id, "playerId": player })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

async fn play(app: &Router, game_id: &str, from: &str, to: &str, player: &str) -> (StatusCode, Value) {
    send(
        app,
        post(
            "/game/move",
            json!({ "gameId": game_id, "from": from, "to": to, "playerId": player }),
        ),
    )
    .await
}

#[tokio::test]
async fn created_game_has_defaults() {
    let (app, _store) = app().await;
    let game_id = create(&app).await;

    let (status, game) = send(&app, get(&format!("/game/{game_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["status"], "waiting");
    assert_eq!(game["pgn"], "");
    assert!(game["result"].is_null());
    assert!(game["playerWhite"].is_null());
    assert!(game["playerBlack"].is_null());
    assert_eq!(game["turn"], "white");
}

#[tokio::test]
async fn legal_move_activates_the_game() {
    let (app, store) = app().await;
    let game_id = create(&app).await;
    seat_both(&app, &game_id).await;

    let (status, body) = play(&app, &game_id, "e2", "e4", "white-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "pgn": "1. e4" }));

    let stored = store.get(Uuid::parse_str(&game_id).unwrap()).unwrap();
    assert_eq!(stored.status, GameStatus::Active);

    let (_, game) = send(&app, get(&format!("/game/{game_id}"))).await;
    assert_eq!(game["turn"], "black");
    assert!(
        game["fen"]
            .as_str()
            .unwrap()
            .starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq")
    );
}

#[tokio::test]
async fn illegal_move_is_rejected_without_changes() {
    let (app, store) = app().await;
    let game_id = create(&app).await;
    seat_both(&app, &game_id).await;
    let before = store.get(Uuid::parse_str(&game_id).unwrap());

    let (status, body) = play(&app, &game_id, "e2", "e5", "white-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("illegal move"));
    assert_eq!(store.get(Uuid::parse_str(&game_id).unwrap()), before);
}

#[tokio::test]
async fn fools_mate_ends_the_game() {
    let (app, store) = app().await;
    let game_id = create(&app).await;
    seat_both(&app, &game_id).await;

    for (from, to, player) in [
        ("f2", "f3", "white-1"),
        ("e7", "e5", "black-1"),
        ("g2", "g4", "white-1"),
        ("d8", "h4", "black-1"),
    ] {
        let (status, _) = play(&app, &game_id, from, to, player).await;
        assert_eq!(status, StatusCode::OK);
    }

    let id = Uuid::parse_str(&game_id).unwrap();
    let stored = store.get(id).unwrap();
    assert_eq!(stored.status, GameStatus::Complete);
    assert_eq!(stored.result, Some(GameResult::BlackWins));

    let (status, _) = play(&app, &game_id, "a2", "a3", "white-1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(store.get(id), Some(stored));

    let (_, moves) = send(&app, get(&format!("/game/{game_id}/moves"))).await;
    assert_eq!(moves, json!({ "moves": [] }));
}

#[tokio::test]
async fn moves_out_of_turn_are_forbidden() {
    let (app, _store) = app().await;
    let game_id = create(&app).await;
    seat_both(&app, &game_id).await;

    let (status, _) = play(&app, &game_id, "e7", "e5", "black-1").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = play(&app, &game_id, "e2", "e4", "someone-else").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_games_are_not_found() {
    let (app, _store) = app().await;
    let unknown = Uuid::new_v4().to_string();

    let (status, _) = play(&app, &unknown, "e2", "e4", "white-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = play(&app, "not-a-uuid", "e2", "e4", "white-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, get(&format!("/game/{unknown}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let (app, _store) = app().await;
    let game_id = create(&app).await;

    let (status, _) = send(&app, post("/game/move", json!({ "gameId": game_id, "from": "e2" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post("/game/move", json!({ "from": "e2", "to": "e4" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::post("/game/move")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn third_joiner_spectates() {
    let (app, _store) = app().await;
    let game_id = create(&app).await;
    seat_both(&app, &game_id).await;

    let (status, body) = send(
        &app,
        post("/game/join", json!({ "gameId": game_id, "playerId": "watcher" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seat"], "spectator");
    assert_eq!(body["game"]["playerWhite"], "white-1");
    assert_eq!(body["game"]["playerBlack"], "black-1");
}

#[tokio::test]
async fn healthcheck_reports_storage_state() {
    let (app, _store) = app().await;
    let (status, body) = send(&app, get("/healthcheck")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let degraded = routes::router(AppState::new(AppConfig::default()));
    let (_, body) = send(&degraded, get("/healthcheck")).await;
    assert_eq!(body, json!({ "status": "degraded" }));

    let (status, _) = send(&degraded, post("/game/create", json!({}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _store) = app().await;
    let (status, doc) = send(&app, get("/api-doc/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"].get("/game/move").is_some());
    assert!(doc["paths"].get("/game/{id}/events").is_some());
}

async fn next_frame(frames: &mut BodyDataStream) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(5), frames.next())
        .await
        .expect("frame within timeout")
        .expect("stream still open")
        .unwrap();
    String::from_utf8(frame.to_vec()).unwrap()
}

#[tokio::test]
async fn event_stream_sends_snapshot_then_updates() {
    let (app, _store) = app().await;
    let game_id = create(&app).await;
    seat_both(&app, &game_id).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/game/{game_id}/events")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let mut frames = response.into_body().into_data_stream();

    let snapshot = next_frame(&mut frames).await;
    assert!(snapshot.contains("event: game.snapshot"));
    assert!(snapshot.contains("\"status\":\"waiting\""));

    let (status, _) = play(&app, &game_id, "e2", "e4", "white-1").await;
    assert_eq!(status, StatusCode::OK);

    let update = next_frame(&mut frames).await;
    assert!(update.contains("event: game.updated"));
    assert!(update.contains("\"pgn\":\"1. e4\""));
}

#[tokio::test]
async fn event_stream_for_unknown_game_is_not_found() {
    let (app, _store) = app().await;
    let (status, _) = send(&app, get(&format!("/game/{}/events", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
