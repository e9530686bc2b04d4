//! HTTP API handlers for songlib-server

pub mod health;
pub mod songs;
pub mod verses;

pub use health::health_routes;
pub use songs::{create_song, delete_song, get_song, list_songs, update_song};
pub use verses::get_verses;

use crate::error::ApiError;
use uuid::Uuid;

/// Parse a path id, rejecting malformed values with 400
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid song id '{}'", raw)))
}
