//! HTTP route handlers grouped by resource.
//!
//! Each submodule exposes typed Rocket handlers annotated with `#[openapi]`
//! so `rocket_okapi` can derive an OpenAPI document automatically. All
//! handlers read through the managed [`crate::archive::ArchiveService`].

pub mod health;
pub mod lists;
pub mod messages;
pub mod params;
pub mod search;
pub mod threads;
