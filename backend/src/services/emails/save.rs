use crate::editor::session::EditingSession;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::SqliteStore;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::UpdateEmailRequest;
use common::responses::MessageResponse;

/// `PUT /api/emails-editable/{uuid}`. Replaces the whole document, so
/// repeated autosaves of the same content are harmless.
pub async fn process(
    identity: Identity,
    uuid: web::Path<String>,
    store: web::Data<SqliteStore>,
    payload: web::Json<UpdateEmailRequest>,
) -> impl Responder {
    let uuid = uuid.into_inner();
    let request = payload.into_inner();
    match run_blocking(store, move |store| {
        EditingSession::new(store).save(&uuid, &identity, &request.updated_content)
    })
    .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new(
            "Contenido del correo actualizado exitosamente.",
        )),
        Err(e) => e.error_response(),
    }
}
