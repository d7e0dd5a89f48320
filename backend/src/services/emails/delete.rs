use crate::editor::session::EditingSession;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::SqliteStore;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::responses::MessageResponse;

/// `DELETE /api/emails-editable/{uuid}`. Refused with `409` while another
/// user holds the lock.
pub async fn process(
    identity: Identity,
    uuid: web::Path<String>,
    store: web::Data<SqliteStore>,
) -> impl Responder {
    let uuid = uuid.into_inner();
    match run_blocking(store, move |store| {
        EditingSession::new(store).delete_email(&uuid, &identity)
    })
    .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new("Correo eliminado exitosamente.")),
        Err(e) => e.error_response(),
    }
}
