//! Paginated verse retrieval

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use songlib_common::VersePage;

use super::parse_id;
use crate::error::ApiResult;
use crate::AppState;

/// Query parameters for verse pages
#[derive(Debug, Deserialize)]
pub struct VersesQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Verses per page
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

/// GET /api/verses/:id?page=&limit=
///
/// `total` counts the verses on the returned page only.
pub async fn get_verses(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<VersesQuery>, QueryRejection>,
) -> ApiResult<Json<VersePage>> {
    let id = parse_id(&id)?;
    let Query(query) = query?;

    let page = state.lifecycle.verses_page(id, query.page, query.limit).await?;
    Ok(Json(page))
}
