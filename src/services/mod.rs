/// Per-player writing assignment generation.
pub mod assignment;
/// Outbound event composition and room/addressed delivery.
pub mod broadcast;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Core session engine operations.
pub mod room_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
