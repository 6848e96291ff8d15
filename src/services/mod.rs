/// OpenAPI documentation generation.
pub mod documentation;
/// Change feed payloads published to game subscribers.
pub mod feed_events;
/// Game creation, lookup and seat assignment.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Validated, serialized move application.
pub mod move_service;
/// Server-Sent Events streaming of game feeds.
pub mod sse_service;
/// Background storage connection supervision.
pub mod storage_supervisor;
