use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Mindscale Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::ws::ClientMessage,
            crate::dto::events::ServerMessage,
            crate::dto::events::RoomSnapshot,
            crate::dto::events::PhaseChangedEvent,
            crate::dto::events::AssignmentsEvent,
            crate::dto::events::PromptCurrentEvent,
            crate::dto::events::RevealEvent,
            crate::dto::events::RoundOverEvent,
            crate::dto::phase::VisiblePhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "WebSocket operations for game participants"),
    )
)]
pub struct ApiDoc;
