use crate::editor::session::EditingSession;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::SqliteStore;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// Actix web handler for `POST /api/emails-editable/{uuid}/open`.
///
/// Acquires the edit lock for the caller and returns the reconciled content
/// together with the section library.
///
/// # Arguments
/// * `identity` - The requester, from the identity headers.
/// * `uuid` - The email to open, extracted from the URL path.
///
/// # Returns
/// - `200 OK` with an `OpenedEmail`; `mode` is `read_only` for an admin who
///   found the email locked by someone else.
/// - `409 Conflict` with `locked_by` when another user holds the lock.
/// - `404 Not Found` if the email or its template is missing.
pub async fn process(
    identity: Identity,
    uuid: web::Path<String>,
    store: web::Data<SqliteStore>,
) -> impl Responder {
    let uuid = uuid.into_inner();
    match run_blocking(store, move |store| {
        EditingSession::new(store).open_for_edit(&uuid, &identity)
    })
    .await
    {
        Ok(opened) => HttpResponse::Ok().json(opened),
        Err(e) => e.error_response(),
    }
}
