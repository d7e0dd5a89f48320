use crate::editor::session::EditingSession;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::SqliteStore;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// Actix web handler for `GET /api/emails-editable`.
///
/// # Returns
/// - `200 OK` with every email, most recently updated first, including who
///   created, last modified and currently locks it.
/// - `503 Service Unavailable` if the list cannot be read.
pub async fn process(_identity: Identity, store: web::Data<SqliteStore>) -> impl Responder {
    match run_blocking(store, |store| EditingSession::new(store).list_emails()).await {
        Ok(emails) => HttpResponse::Ok().json(emails),
        Err(e) => e.error_response(),
    }
}
