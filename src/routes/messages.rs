//! Message detail endpoint.

use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;

use crate::archive::ArchiveService;
use crate::error::ApiError;
use crate::models::MessageDetail;
use crate::routes::params::validate_token;

/// Retrieve one archived message with its thread snippet.
#[openapi(tag = "Messages")]
#[get("/messages/<list_id>/<hash>")]
pub async fn get_message(
    list_id: String,
    hash: String,
    archive: &State<ArchiveService>,
) -> Result<Json<MessageDetail>, ApiError> {
    let list_id = validate_token("list", &list_id)?;
    let hash = validate_token("hash", &hash)?;

    let detail = archive.message(list_id, hash).await?;
    Ok(Json(detail))
}
