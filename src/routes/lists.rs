//! Mailing list catalog endpoint.

use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;

use crate::archive::ArchiveService;
use crate::models::ListsResponse;

/// Curated lists with message counts, plus their sorted areas.
#[openapi(tag = "Lists")]
#[get("/lists")]
pub async fn list_mailing_lists(archive: &State<ArchiveService>) -> Json<ListsResponse> {
    Json(archive.lists().await)
}
