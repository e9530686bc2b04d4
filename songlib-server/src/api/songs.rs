//! Song CRUD and filtered listing

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use songlib_common::{Song, SongFilter, SongUpdate};

use super::parse_id;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const MAX_FIELD_CHARS: usize = 100;

/// Body of POST /api/song
#[derive(Debug, Deserialize)]
pub struct CreateSongRequest {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub title: String,
}

impl CreateSongRequest {
    /// Trimmed `(group, title)`, each required and at most 100 characters
    pub fn validate(&self) -> Result<(&str, &str), ApiError> {
        Ok((
            required_field("group", &self.group)?,
            required_field("title", &self.title)?,
        ))
    }
}

fn required_field<'a>(name: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", name)));
    }
    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(ApiError::BadRequest(format!(
            "{} must be at most {} characters",
            name, MAX_FIELD_CHARS
        )));
    }
    Ok(value)
}

/// Envelope for single-song responses
#[derive(Debug, Serialize, Deserialize)]
pub struct StandardResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<Song>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SongsResponse {
    pub songs: Vec<Song>,
}

/// POST /api/song
pub async fn create_song(
    State(state): State<AppState>,
    payload: Result<Json<CreateSongRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StandardResponse>)> {
    let Json(request) = payload?;
    let (group, title) = request.validate()?;

    let song = state.lifecycle.create_song(group, title).await?;

    Ok((
        StatusCode::CREATED,
        Json(StandardResponse {
            song: Some(song),
            message: Some("Song created".to_string()),
        }),
    ))
}

/// GET /api/song/:id
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StandardResponse>> {
    let id = parse_id(&id)?;
    let song = state.lifecycle.get_song(id).await?;

    Ok(Json(StandardResponse {
        song: Some(song),
        message: None,
    }))
}

/// PUT /api/song/:id
///
/// Merge-patch: absent or empty fields keep their stored values.
pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SongUpdate>, JsonRejection>,
) -> ApiResult<Json<StandardResponse>> {
    let id = parse_id(&id)?;
    let Json(update) = payload?;

    let song = state.lifecycle.update_song(id, update).await?;

    Ok(Json(StandardResponse {
        song: Some(song),
        message: Some("Song updated".to_string()),
    }))
}

/// DELETE /api/song/:id
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StandardResponse>> {
    let id = parse_id(&id)?;
    state.lifecycle.delete_song(id).await?;

    Ok(Json(StandardResponse {
        song: None,
        message: Some(format!("Song {} deleted", id)),
    }))
}

/// GET /api/song?title=&group_name=&release_date=&text=&link=
pub async fn list_songs(
    State(state): State<AppState>,
    filter: Result<Query<SongFilter>, QueryRejection>,
) -> ApiResult<Json<SongsResponse>> {
    let Query(filter) = filter?;
    let songs = state.lifecycle.list_songs(&filter).await?;

    Ok(Json(SongsResponse { songs }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(group: &str, title: &str) -> CreateSongRequest {
        CreateSongRequest {
            group: group.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_validate_trims_fields() {
        let req = request("  Muse ", "Hysteria\n");
        assert_eq!(req.validate().unwrap(), ("Muse", "Hysteria"));
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(request("", "Hysteria").validate().is_err());
        assert!(request("Muse", "   ").validate().is_err());
    }

    #[test]
    fn test_validate_limits_length_in_characters() {
        let hundred = "ж".repeat(100);
        assert!(request(&hundred, "t").validate().is_ok());
        assert!(request(&format!("{}ж", hundred), "t").validate().is_err());
    }
}
