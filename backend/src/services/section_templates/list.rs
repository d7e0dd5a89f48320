use crate::errors::EditorError;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::{SectionLibrary, SqliteStore};
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// Actix web handler for `GET /api/section-templates`.
///
/// # Returns
/// - `200 OK` with the section library ordered by name, each entry carrying
///   the `type_key` and HTML used when a section is added to an email.
pub async fn process(_identity: Identity, store: web::Data<SqliteStore>) -> impl Responder {
    match run_blocking(store, |store| {
        store.list_available_sections().map_err(EditorError::from)
    })
    .await
    {
        Ok(sections) => HttpResponse::Ok().json(sections),
        Err(e) => e.error_response(),
    }
}
