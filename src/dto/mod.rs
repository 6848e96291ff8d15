//! Wire types of the HTTP and SSE surface.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Game requests, responses and views.
pub mod game;
/// Healthcheck payload.
pub mod health;
/// Events written to game streams.
pub mod sse;
/// Field validators shared by the requests.
pub mod validation;

/// RFC 3339 rendering used for every timestamp sent to clients.
fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
