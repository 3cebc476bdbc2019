// Presentation layer - HTTP surface for operator commands and feeds
pub mod app_state;
pub mod handlers;
pub mod router;
