//! Thread list endpoint.

use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;

use crate::archive::ArchiveService;
use crate::error::ApiError;
use crate::models::ThreadsResponse;
use crate::routes::params::validate_token;

/// Recently active threads of a list, most recent first.
///
/// `qdr` is the archive's relative date filter (e.g. `1w`). Upstream page
/// failures shrink the result instead of failing the request.
#[openapi(tag = "Threads")]
#[get("/threads/<list_id>?<qdr>")]
pub async fn list_threads(
    list_id: String,
    qdr: Option<String>,
    archive: &State<ArchiveService>,
) -> Result<Json<ThreadsResponse>, ApiError> {
    let list_id = validate_token("list", &list_id)?;
    let qdr = match qdr.as_deref().map(str::trim) {
        Some("") | None => None,
        Some(value) => Some(validate_token("qdr", value)?),
    };

    Ok(Json(archive.threads(list_id, qdr).await))
}
