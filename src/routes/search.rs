//! Free-text search endpoint.

use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;

use crate::archive::ArchiveService;
use crate::error::ApiError;
use crate::models::SearchResponse;
use crate::routes::params::{SearchParams, validate_token};

/// Search one list through the archive's own search.
///
/// Missing `q` or `list` returns an empty result set.
#[openapi(tag = "Search")]
#[get("/search?<params..>")]
pub async fn search_messages(
    params: SearchParams,
    archive: &State<ArchiveService>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.query();
    let list_id = params.list();

    if query.is_empty() || list_id.is_empty() {
        return Ok(Json(SearchResponse {
            results: Vec::new(),
            query: query.to_string(),
            has_more: false,
        }));
    }

    let list_id = validate_token("list", list_id)?;
    let response = archive.search(list_id, query, params.page()).await?;
    Ok(Json(response))
}
