use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Chess Link Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::make_move,
        crate::routes::game::join_game,
        crate::routes::game::get_game,
        crate::routes::game::legal_moves,
        crate::routes::sse::game_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::game::CreateGameResponse,
            crate::dto::game::MoveRequest,
            crate::dto::game::MoveResponse,
            crate::dto::game::JoinRequest,
            crate::dto::game::JoinResponse,
            crate::dto::game::SeatView,
            crate::dto::game::GameView,
            crate::dto::game::LegalMovesResponse,
            crate::dao::models::GameStatus,
            crate::dao::models::GameResult,
            crate::dao::models::Seat,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Game creation, seats and moves"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
/// OpenAPI document of every route.
pub struct ApiDoc;
