// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod event_mapper;
pub mod http_response;
pub mod http_sensor_client;
pub mod report;
