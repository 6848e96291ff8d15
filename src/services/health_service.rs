use tracing::{debug, warn};

use crate::{dto::health::HealthResponse, state::SharedState};

/// `degraded` while no store is installed or the installed one fails its ping.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let reachable = match state.require_public().await {
        Ok(reader) => match reader.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "storage ping failed");
                false
            }
        },
        Err(_) => {
            debug!("no storage installed");
            false
        }
    };

    HealthResponse::from(!reachable)
}
